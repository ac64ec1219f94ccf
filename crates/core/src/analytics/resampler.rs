//! Restates a merged, time-indexed table at a coarser granularity.
//!
//! Monthly and yearly resampling is a first-observation downsample per
//! identifier: within each bin the first non-null value of every column is
//! kept, in chronological order. Seasonal resampling keeps every row and
//! labels it with its season; grouping by season is left to the caller.

use chrono::{Datelike, NaiveDateTime};
use std::collections::{BTreeMap, HashMap};

use super::analytics_model::Interval;
use super::season::Season;
use crate::constants::SEASON_COLUMN;
use crate::errors::Result;
use crate::retrieval::RetrievalError;
use crate::schema::schema_policy::find_identifier_column;
use crate::table::{Column, ColumnType, Table, Value};
use crate::utils::time_utils::{format_day, format_month, format_year, value_to_timestamp};

/// Resamples `table` to `interval` using `date_column` as the time axis.
///
/// `Interval::Daily` returns the table unchanged.
pub fn resample(table: Table, date_column: &str, interval: Interval) -> Result<Table> {
    if interval == Interval::Daily {
        return Ok(table);
    }
    let date_index = table
        .column_index(date_column)
        .ok_or_else(|| RetrievalError::MissingTemporalContext(date_column.to_string()))?;
    if !table.is_empty()
        && table
            .rows()
            .iter()
            .all(|row| value_to_timestamp(&row[date_index]).is_none())
    {
        log::warn!(
            "No '{}' value reads as a calendar date; cannot resample to {}",
            date_column,
            interval
        );
        return Err(RetrievalError::MissingTemporalContext(date_column.to_string()).into());
    }

    match interval {
        Interval::Daily => Ok(table),
        Interval::Seasonal => Ok(label_seasons(table, date_index)),
        Interval::Monthly => Ok(first_per_bin(table, date_index, month_bin, format_month)),
        Interval::Yearly => Ok(first_per_bin(table, date_index, year_bin, format_year)),
    }
}

fn month_bin(ts: &NaiveDateTime) -> (i32, u32) {
    (ts.year(), ts.month())
}

fn year_bin(ts: &NaiveDateTime) -> (i32, u32) {
    (ts.year(), 0)
}

fn first_per_bin(
    table: Table,
    date_index: usize,
    bin: fn(&NaiveDateTime) -> (i32, u32),
    format: fn(&NaiveDateTime) -> String,
) -> Table {
    let id_index = find_identifier_column(&table.column_names())
        .and_then(|name| table.column_index(name));
    let (mut columns, rows) = table.into_parts();
    let width = columns.len();

    // Rows grouped by identifier key; a table without identifiers is one group.
    let mut groups: HashMap<Option<String>, (Value, Vec<(NaiveDateTime, Vec<Value>)>)> =
        HashMap::new();
    let mut unparsed = 0usize;
    for row in rows {
        let Some(ts) = value_to_timestamp(&row[date_index]) else {
            unparsed += 1;
            continue;
        };
        let id = match id_index {
            Some(index) if row[index].is_null() => continue,
            Some(index) => row[index].clone(),
            None => Value::Null,
        };
        groups
            .entry(id.key_repr())
            .or_insert_with(|| (id, Vec::new()))
            .1
            .push((ts, row));
    }
    if unparsed > 0 {
        log::warn!(
            "Dropped {} rows with an unreadable '{}' value while resampling",
            unparsed,
            columns[date_index].name
        );
    }
    let mut groups: Vec<_> = groups.into_values().collect();
    groups.sort_by(|(a, _), (b, _)| a.total_cmp(b));

    let mut out = Vec::new();
    for (_, mut members) in groups {
        members.sort_by_key(|(ts, _)| *ts);
        let mut bins: BTreeMap<(i32, u32), (NaiveDateTime, Vec<Value>)> = BTreeMap::new();
        for (ts, row) in members {
            match bins.get_mut(&bin(&ts)) {
                None => {
                    bins.insert(bin(&ts), (ts, row));
                }
                Some((_, first)) => {
                    for (slot, value) in first.iter_mut().zip(row) {
                        if slot.is_null() {
                            *slot = value;
                        }
                    }
                }
            }
        }
        for (_, (ts, mut row)) in bins {
            debug_assert_eq!(row.len(), width);
            row[date_index] = Value::Text(format(&ts));
            out.push(row);
        }
    }

    columns[date_index].kind = ColumnType::Text;
    Table::from_rows(columns, out)
}

fn label_seasons(table: Table, date_index: usize) -> Table {
    let (columns, rows) = table.into_parts();
    let mut labelled = Table::new(columns);
    let mut seasons = Vec::with_capacity(rows.len());
    for mut row in rows {
        match value_to_timestamp(&row[date_index]) {
            Some(ts) => {
                row[date_index] = Value::Text(format_day(&ts));
                seasons.push(Value::from(Season::for_date(ts.date()).as_str()));
            }
            None => seasons.push(Value::Null),
        }
        labelled.push_row(row);
    }
    labelled.set_column_kind(date_index, ColumnType::Text);
    labelled.push_column(Column::new(SEASON_COLUMN, ColumnType::Text), seasons);
    labelled
}
