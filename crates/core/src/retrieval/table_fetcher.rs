use std::sync::Arc;

use super::retrieval_errors::RetrievalError;
use crate::alias::AliasRegistry;
use crate::constants::TABLE_COLUMN_SEPARATOR;
use crate::errors::{Error, Result};
use crate::schema::{DateKind, SchemaEntry};
use crate::source::{DateFilter, IdFilter, SelectQuery, SourceStoreTrait};
use crate::table::{normalize_table, Column, ColumnType, Table};

/// One requested column as it applies to a single source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestedColumn {
    /// Name as requested, and as it appears in the output.
    pub requested: String,
    /// Column name within the source (alias form, prefix stripped).
    pub column: String,
}

impl RequestedColumn {
    /// Matches a requested name against `entry`. A `"<table>-<column>"` name
    /// matches when `<table>` is the table as named in the request and the
    /// remainder is one of its columns; otherwise the name must be a column
    /// of the table verbatim.
    pub fn parse(requested: &str, entry: &SchemaEntry) -> Option<RequestedColumn> {
        let stripped = requested
            .strip_prefix(entry.source.table.as_str())
            .and_then(|rest| rest.strip_prefix(TABLE_COLUMN_SEPARATOR))
            .filter(|rest| entry.has_column(rest));
        match stripped {
            Some(column) => Some(RequestedColumn {
                requested: requested.to_string(),
                column: column.to_string(),
            }),
            None if entry.has_column(requested) => Some(RequestedColumn {
                requested: requested.to_string(),
                column: requested.to_string(),
            }),
            None => None,
        }
    }

    pub fn is_disambiguated(&self) -> bool {
        self.requested != self.column
    }
}

/// Which columns to read from a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSelection {
    All,
    Columns(Vec<RequestedColumn>),
}

/// Row filters shared by every source of a request.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchFilters<'a> {
    pub ids: &'a [String],
    pub window: Option<(&'a str, &'a str)>,
}

/// Reads one source into an alias-named, normalized table.
pub struct TableFetcher {
    store: Arc<dyn SourceStoreTrait>,
    registry: Arc<AliasRegistry>,
}

impl TableFetcher {
    pub fn new(store: Arc<dyn SourceStoreTrait>, registry: Arc<AliasRegistry>) -> Self {
        Self { store, registry }
    }

    /// Fetches `selection` from the source described by `entry`.
    ///
    /// Key columns are always read and come first. Storage failures are
    /// reported as [`RetrievalError::Fetch`] tagged with the source.
    pub fn fetch(
        &self,
        entry: &SchemaEntry,
        selection: &ColumnSelection,
        filters: FetchFilters<'_>,
    ) -> Result<Table> {
        let aliases = self.registry.snapshot()?;
        let keys = entry.key_columns();

        // (real name, output name)
        let mut projection: Vec<(String, String)> =
            keys.iter().map(|k| (k.to_string(), k.to_string())).collect();
        match selection {
            ColumnSelection::All => {
                for column in &entry.columns {
                    if !keys.contains(&column.real.as_str()) {
                        projection.push((column.real.clone(), column.alias.clone()));
                    }
                }
            }
            ColumnSelection::Columns(requested) => {
                for column in requested {
                    let real = entry
                        .columns
                        .iter()
                        .find(|c| c.alias == column.column)
                        .map(|c| c.real.clone())
                        .unwrap_or_else(|| {
                            aliases
                                .real_column(&entry.real_table, &column.column)
                                .to_string()
                        });
                    if !projection.iter().any(|(r, _)| *r == real) {
                        projection.push((real, column.requested.clone()));
                    }
                }
            }
        }

        let id_filter = match (&entry.id_column, filters.ids.is_empty()) {
            (Some(column), false) => Some(IdFilter {
                column: column.clone(),
                ids: filters.ids.to_vec(),
            }),
            (None, false) => {
                log::debug!("{} has no identifier column; ignoring id filter", entry.source);
                None
            }
            _ => None,
        };
        let date_filter = match (entry.date_kind, filters.window) {
            (Some(kind), Some((start, end))) => Some(DateFilter {
                column: kind.as_str().to_string(),
                start: date_bound(kind, start),
                end: date_bound(kind, end),
            }),
            _ => None,
        };

        let query = SelectQuery {
            table: entry.real_table.clone(),
            columns: Some(projection.iter().map(|(real, _)| real.clone()).collect()),
            id_filter,
            date_filter,
        };
        let rows = self
            .store
            .select(&entry.source.database, &query)
            .map_err(|e| fetch_error(entry, e))?;

        let mut columns = Vec::with_capacity(projection.len());
        for (index, (real, output)) in projection.iter().enumerate() {
            let kind = entry
                .column_by_real(real)
                .and_then(|c| c.kind)
                .unwrap_or_else(|| ColumnType::infer(rows.rows.iter().map(|r| &r[index])));
            columns.push(Column::new(output.clone(), kind));
        }

        Ok(normalize_table(Table::from_rows(columns, rows.rows)))
    }
}

/// Year columns hold integers, so a calendar-date bound is cut to its year.
fn date_bound(kind: DateKind, bound: &str) -> String {
    match kind {
        DateKind::Year => bound.split('-').next().unwrap_or(bound).to_string(),
        _ => bound.to_string(),
    }
}

fn fetch_error(entry: &SchemaEntry, err: Error) -> Error {
    let message = match err {
        Error::Database(db) => db.to_string(),
        other => return other,
    };
    RetrievalError::Fetch {
        database: entry.source.database.clone(),
        table: entry.source.table.clone(),
        message,
    }
    .into()
}
