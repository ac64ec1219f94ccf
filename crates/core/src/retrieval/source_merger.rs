use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::retrieval_errors::RetrievalError;
use super::retrieval_model::ColumnRequest;
use super::table_fetcher::{ColumnSelection, FetchFilters, RequestedColumn, TableFetcher};
use crate::constants::TABLE_COLUMN_SEPARATOR;
use crate::errors::Result;
use crate::schema::schema_policy::find_identifier_column;
use crate::schema::SchemaCache;
use crate::source::SourceSpec;
use crate::table::{Table, Value};

/// Parameters of one merge.
#[derive(Debug, Clone, Copy)]
pub struct MergeRequest<'a> {
    pub sources: &'a [SourceSpec],
    pub columns: &'a ColumnRequest,
    pub filters: FetchFilters<'a>,
    pub date_column: Option<&'a str>,
}

/// Combines per-source fetches into one table, in request order.
pub struct SourceMerger {
    cache: Arc<SchemaCache>,
    fetcher: TableFetcher,
}

impl SourceMerger {
    pub fn new(cache: Arc<SchemaCache>, fetcher: TableFetcher) -> Self {
        Self { cache, fetcher }
    }

    /// Fetches every contributing source and joins them on their shared key
    /// columns. Sources must have been described beforehand.
    ///
    /// Rows that find no partner on the join keys are dropped, so the result
    /// never holds null keys. An empty result is [`RetrievalError::EmptyResult`].
    pub fn merge(&self, request: &MergeRequest<'_>) -> Result<Table> {
        let mut remaining: Option<Vec<String>> = match request.columns {
            ColumnRequest::All => None,
            ColumnRequest::Named(names) => Some(names.clone()),
        };
        let mut disambiguated: HashSet<String> = HashSet::new();
        let mut merged: Option<Table> = None;
        let mut date_column = request.date_column.map(String::from);

        for source in request.sources {
            let entry = self
                .cache
                .get(source)
                .ok_or_else(|| RetrievalError::SchemaUnavailable {
                    database: source.database.clone(),
                    table: source.table.clone(),
                })?;

            let selection = match remaining.as_mut() {
                None => ColumnSelection::All,
                Some(names) => {
                    let picked: Vec<RequestedColumn> = names
                        .iter()
                        .filter_map(|name| RequestedColumn::parse(name, &entry))
                        .filter(|c| !entry.is_key_column(&c.column))
                        .collect();
                    if picked.is_empty() {
                        log::debug!("{} contributes no requested column; skipping", source);
                        continue;
                    }
                    names.retain(|name| !picked.iter().any(|c| c.requested == *name));
                    disambiguated.extend(
                        picked
                            .iter()
                            .filter(|c| c.is_disambiguated())
                            .map(|c| c.requested.clone()),
                    );
                    ColumnSelection::Columns(picked)
                }
            };

            let fetched = self.fetcher.fetch(&entry, &selection, request.filters)?;
            if date_column.is_none() {
                date_column = entry.date_column().map(String::from);
            }

            merged = Some(match merged {
                None => fetched,
                Some(left) => join(left, fetched, source, &disambiguated)?,
            });
        }

        let mut merged = match merged {
            Some(table) if !table.is_empty() => table,
            _ => return Err(RetrievalError::EmptyResult.into()),
        };

        let id_column = find_identifier_column(&merged.column_names()).map(String::from);
        let front: Vec<&str> = date_column.iter().chain(id_column.iter()).map(String::as_str).collect();
        merged.move_to_front(&front);
        Ok(merged)
    }
}

/// Joins `right` onto `left` on the columns both carry under the same,
/// non-disambiguated name. Rows without a partner on the other side are
/// dropped; left row order is kept.
fn join(
    left: Table,
    right: Table,
    source: &SourceSpec,
    disambiguated: &HashSet<String>,
) -> Result<Table> {
    let keys: Vec<(usize, usize)> = left
        .column_names()
        .iter()
        .enumerate()
        .filter(|(_, name)| !disambiguated.contains(**name))
        .filter_map(|(l, name)| right.column_index(name).map(|r| (l, r)))
        .collect();
    if keys.is_empty() {
        return Err(RetrievalError::NoJoinKeys {
            database: source.database.clone(),
            table: source.table.clone(),
        }
        .into());
    }
    let right_keys: HashSet<usize> = keys.iter().map(|(_, r)| *r).collect();
    let key_names: Vec<String> = keys
        .iter()
        .map(|(l, _)| left.columns()[*l].name.clone())
        .collect();

    let mut index: HashMap<Vec<String>, Vec<usize>> = HashMap::new();
    for (at, row) in right.rows().iter().enumerate() {
        if let Some(key) = join_key(keys.iter().map(|(_, r)| &row[*r])) {
            index.entry(key).or_default().push(at);
        }
    }

    let (left_columns, left_rows) = left.into_parts();
    let (right_columns, right_rows) = right.into_parts();

    let mut columns = left_columns;
    let carried: Vec<usize> = (0..right_columns.len())
        .filter(|r| !right_keys.contains(r))
        .collect();
    for &r in &carried {
        let mut column = right_columns[r].clone();
        if columns.iter().any(|c| c.name == column.name) {
            column.name = format!("{}{}{}", source.table, TABLE_COLUMN_SEPARATOR, column.name);
        }
        columns.push(column);
    }

    let mut joined = Table::new(columns);
    let mut matched_right: HashSet<usize> = HashSet::new();
    let mut dropped_left = 0usize;
    for row in left_rows {
        let partners = join_key(keys.iter().map(|(l, _)| &row[*l])).and_then(|key| index.get(&key));
        let Some(partners) = partners else {
            dropped_left += 1;
            continue;
        };
        for &at in partners {
            matched_right.insert(at);
            let mut out = row.clone();
            out.extend(carried.iter().map(|&r| right_rows[at][r].clone()));
            joined.push_row(out);
        }
    }

    let dropped_right = right_rows.len() - matched_right.len();
    if dropped_left > 0 || dropped_right > 0 {
        log::warn!(
            "Joining {} on {:?} dropped {} accumulated and {} incoming rows without a match",
            source,
            key_names,
            dropped_left,
            dropped_right
        );
    }
    Ok(joined)
}

/// Canonical key of a row, `None` when any key cell is null.
fn join_key<'a>(cells: impl Iterator<Item = &'a Value>) -> Option<Vec<String>> {
    cells.map(Value::key_repr).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::AliasRegistry;
    use crate::errors::Error;
    use crate::schema::SchemaService;
    use crate::source::test_store::{daily_rows, MemoryStore};
    use crate::table::{Column, ColumnType};
    use chrono::{Datelike, NaiveDate};

    struct Fixture {
        merger: SourceMerger,
        schema: SchemaService,
    }

    fn fixture(store: MemoryStore) -> Fixture {
        let store = Arc::new(store);
        let registry = Arc::new(AliasRegistry::new());
        let cache = Arc::new(SchemaCache::new());
        Fixture {
            merger: SourceMerger::new(
                cache.clone(),
                TableFetcher::new(store.clone(), registry.clone()),
            ),
            schema: SchemaService::new(store, registry, cache),
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, d).unwrap()
    }

    fn two_sources() -> MemoryStore {
        let columns = [("Time", "TEXT"), ("ID", "INTEGER"), ("Temperature", "REAL")];
        MemoryStore::new()
            .with_table(
                "a.db3",
                "Flow",
                &columns,
                daily_rows(day(1), day(3), &[1, 2], |d, id| d.ordinal() as f64 + id as f64 * 10.0),
            )
            .with_table(
                "a.db3",
                "Precip",
                &columns,
                daily_rows(day(2), day(4), &[2, 3], |d, _| -(d.ordinal() as f64)),
            )
    }

    fn sources() -> Vec<SourceSpec> {
        vec![SourceSpec::new("a.db3", "Flow"), SourceSpec::new("a.db3", "Precip")]
    }

    fn merge(f: &Fixture, sources: &[SourceSpec], columns: ColumnRequest, ids: &[String]) -> Result<Table> {
        f.merger.merge(&MergeRequest {
            sources,
            columns: &columns,
            filters: FetchFilters { ids, window: None },
            date_column: Some("Time"),
        })
    }

    #[test]
    fn test_prefixed_columns_stay_distinct() {
        let f = fixture(two_sources());
        f.schema.describe_many(&sources()).unwrap();

        let table = merge(
            &f,
            &sources(),
            ColumnRequest::Named(vec![
                "Flow-Temperature".to_string(),
                "Precip-Temperature".to_string(),
            ]),
            &[],
        )
        .unwrap();

        assert_eq!(
            table.column_names(),
            vec!["Time", "ID", "Flow-Temperature", "Precip-Temperature"]
        );
        // Only (2020-01-02, 2) and (2020-01-03, 2) exist in both sources.
        assert_eq!(
            table.rows().to_vec(),
            vec![
                vec![Value::from("2020-01-02"), Value::Integer(2), Value::Real(22.0), Value::Real(-2.0)],
                vec![Value::from("2020-01-03"), Value::Integer(2), Value::Real(23.0), Value::Real(-3.0)],
            ]
        );
    }

    #[test]
    fn test_single_source_merge_is_a_fetch() {
        let f = fixture(two_sources());
        let flow = vec![SourceSpec::new("a.db3", "Flow")];
        f.schema.describe_many(&flow).unwrap();

        let table = merge(&f, &flow, ColumnRequest::All, &[]).unwrap();

        assert_eq!(table.len(), 6);
        assert_eq!(table.column_names(), vec!["Time", "ID", "Temperature"]);
    }

    #[test]
    fn test_claimed_column_is_not_fetched_twice() {
        let f = fixture(two_sources());
        f.schema.describe_many(&sources()).unwrap();

        let table = merge(
            &f,
            &sources(),
            ColumnRequest::Named(vec!["Temperature".to_string()]),
            &[],
        )
        .unwrap();

        assert_eq!(table.column_names(), vec!["Time", "ID", "Temperature"]);
        assert_eq!(table.len(), 6);
    }

    #[test]
    fn test_unknown_identifier_yields_empty_result() {
        let f = fixture(two_sources());
        f.schema.describe_many(&sources()).unwrap();

        let err = merge(&f, &sources(), ColumnRequest::All, &["99".to_string()]).unwrap_err();

        assert!(matches!(err, Error::Retrieval(RetrievalError::EmptyResult)));
        assert_eq!(err.to_string(), "No data found for the specified filters.");
    }

    #[test]
    fn test_undescribed_source_is_rejected() {
        let f = fixture(two_sources());

        let err = merge(&f, &sources(), ColumnRequest::All, &[]).unwrap_err();

        assert!(matches!(
            err,
            Error::Retrieval(RetrievalError::SchemaUnavailable { .. })
        ));
    }

    #[test]
    fn test_sources_without_shared_keys_cannot_join() {
        let store = two_sources().with_table(
            "b.db3",
            "Costs",
            &[("Year", "INTEGER"), ("Cost", "REAL")],
            vec![vec![Value::Integer(2020), Value::Real(1.0)]],
        );
        let f = fixture(store);
        let sources = vec![SourceSpec::new("a.db3", "Flow"), SourceSpec::new("b.db3", "Costs")];
        for source in &sources {
            f.schema.describe(source).unwrap();
        }

        let err = merge(&f, &sources, ColumnRequest::All, &[]).unwrap_err();

        assert!(matches!(
            err,
            Error::Retrieval(RetrievalError::NoJoinKeys { .. })
        ));
    }

    #[test]
    fn test_join_keeps_left_order_and_non_key_nulls() {
        let left = Table::from_rows(
            vec![
                Column::new("Time", ColumnType::Text),
                Column::new("A", ColumnType::Real),
            ],
            vec![
                vec![Value::from("d2"), Value::Null],
                vec![Value::from("d1"), Value::Real(1.0)],
                vec![Value::Null, Value::Real(9.0)],
            ],
        );
        let right = Table::from_rows(
            vec![
                Column::new("Time", ColumnType::Text),
                Column::new("B", ColumnType::Real),
            ],
            vec![
                vec![Value::from("d1"), Value::Real(10.0)],
                vec![Value::from("d2"), Value::Real(20.0)],
                vec![Value::from("d3"), Value::Real(30.0)],
            ],
        );

        let joined = join(left, right, &SourceSpec::new("x.db3", "T"), &HashSet::new()).unwrap();

        assert_eq!(
            joined.rows().to_vec(),
            vec![
                vec![Value::from("d2"), Value::Null, Value::Real(20.0)],
                vec![Value::from("d1"), Value::Real(1.0), Value::Real(10.0)],
            ]
        );
    }
}
