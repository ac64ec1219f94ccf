use super::analytics_model::StatisticKind;
use crate::constants::STATISTICS_COLUMN;
use crate::errors::Result;
use crate::retrieval::RetrievalError;
use crate::table::{normalize_table, Column, ColumnType, Table, Value};

/// Builds the statistics table for `table`.
///
/// Every numeric column except `date_column` is summarized. The result has
/// one row per requested statistic, in [`StatisticKind::ALL`] order, with the
/// statistic name in the `Statistics` column. `Maximum` and `Minimum` are
/// each followed by a `"<kind> <date_column>"` row holding the date of the
/// first row where the extreme occurs.
pub fn summarize(table: &Table, statistics: &[StatisticKind], date_column: &str) -> Result<Table> {
    let date_index = table
        .column_index(date_column)
        .ok_or_else(|| RetrievalError::MissingTemporalContext(date_column.to_string()))?;

    let summarized: Vec<usize> = table
        .columns()
        .iter()
        .enumerate()
        .filter(|(index, column)| *index != date_index && column.kind.is_numeric())
        .map(|(index, _)| index)
        .collect();

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for kind in StatisticKind::ALL {
        if !statistics.contains(&kind) {
            continue;
        }
        let mut row = vec![Value::from(kind.as_str())];
        let mut dates = vec![Value::from(format!("{} {}", kind, date_column))];
        for &index in &summarized {
            let cells = table.rows().iter().map(|r| &r[index]);
            match kind {
                StatisticKind::Average => row.push(mean(cells)),
                StatisticKind::Sum => row.push(sum(cells, table.columns()[index].kind)),
                StatisticKind::StandardDeviation => row.push(sample_std(cells)),
                StatisticKind::Maximum | StatisticKind::Minimum => {
                    match extreme_row(table, index, kind == StatisticKind::Maximum) {
                        Some(at) => {
                            row.push(table.rows()[at][index].clone());
                            dates.push(table.rows()[at][date_index].clone());
                        }
                        None => {
                            row.push(Value::Null);
                            dates.push(Value::Null);
                        }
                    }
                }
            }
        }
        rows.push(row);
        if kind.is_extreme() {
            rows.push(dates);
        }
    }

    let mut columns = vec![Column::new(STATISTICS_COLUMN, ColumnType::Text)];
    for (position, &index) in summarized.iter().enumerate() {
        let kind = ColumnType::infer(rows.iter().map(|r| &r[position + 1]));
        columns.push(Column::new(table.columns()[index].name.clone(), kind));
    }
    Ok(normalize_table(Table::from_rows(columns, rows)))
}

fn numbers<'a>(cells: impl Iterator<Item = &'a Value>) -> Vec<f64> {
    cells.filter_map(Value::as_f64).filter(|v| !v.is_nan()).collect()
}

fn mean<'a>(cells: impl Iterator<Item = &'a Value>) -> Value {
    let values = numbers(cells);
    if values.is_empty() {
        return Value::Null;
    }
    Value::Real(values.iter().sum::<f64>() / values.len() as f64)
}

fn sum<'a>(cells: impl Iterator<Item = &'a Value>, kind: ColumnType) -> Value {
    let cells: Vec<&Value> = cells.collect();
    if kind == ColumnType::Integer && cells.iter().all(|c| matches!(c, Value::Integer(_) | Value::Null)) {
        let total = cells
            .iter()
            .filter_map(|c| match c {
                Value::Integer(i) => Some(*i),
                _ => None,
            })
            .try_fold(0i64, |acc, i| acc.checked_add(i));
        if let Some(total) = total {
            return Value::Integer(total);
        }
    }
    Value::Real(numbers(cells.into_iter()).iter().sum())
}

/// Sample standard deviation (n - 1 denominator).
fn sample_std<'a>(cells: impl Iterator<Item = &'a Value>) -> Value {
    let values = numbers(cells);
    if values.len() < 2 {
        return Value::Null;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Value::Real(variance.sqrt())
}

/// Index of the first row holding the column's maximum (or minimum).
fn extreme_row(table: &Table, index: usize, maximum: bool) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (at, row) in table.rows().iter().enumerate() {
        let Some(value) = row[index].as_f64().filter(|v| !v.is_nan()) else {
            continue;
        };
        let better = match best {
            None => true,
            Some((_, current)) if maximum => value > current,
            Some((_, current)) => value < current,
        };
        if better {
            best = Some((at, value));
        }
    }
    best.map(|(at, _)| at)
}
