//! In-memory `SourceStoreTrait` used by the engine's unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{
    AliasRow, EntryKind, FolderEntry, FolderListing, RowSet, SelectQuery, SourceColumn,
    SourceStoreTrait,
};
use crate::errors::{DatabaseError, Result};
use crate::table::Value;

struct MemoryTable {
    columns: Vec<SourceColumn>,
    rows: Vec<Vec<Value>>,
}

impl MemoryTable {
    fn index_of(&self, column: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.name == column)
            .ok_or_else(|| DatabaseError::QueryFailed(format!("no such column: {}", column)).into())
    }
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    tables: HashMap<(String, String), MemoryTable>,
    lookups: HashMap<String, Vec<AliasRow>>,
    selects: Mutex<Vec<SelectQuery>>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_table(
        mut self,
        database: &str,
        table: &str,
        columns: &[(&str, &str)],
        rows: Vec<Vec<Value>>,
    ) -> Self {
        let columns = columns
            .iter()
            .map(|(name, declared)| SourceColumn::new(*name, *declared))
            .collect();
        self.tables.insert(
            (database.to_string(), table.to_string()),
            MemoryTable { columns, rows },
        );
        self
    }

    pub(crate) fn with_lookup(mut self, lookup_table: &str, rows: Vec<AliasRow>) -> Self {
        self.lookups.insert(lookup_table.to_string(), rows);
        self
    }

    pub(crate) fn recorded_selects(&self) -> Vec<SelectQuery> {
        self.selects.lock().unwrap().clone()
    }

    fn table(&self, database: &str, table: &str) -> Result<&MemoryTable> {
        self.tables
            .get(&(database.to_string(), table.to_string()))
            .ok_or_else(|| DatabaseError::NotFound(format!("{} in {}", table, database)).into())
    }
}

impl SourceStoreTrait for MemoryStore {
    fn scan_folder(&self, folder: &str) -> Result<FolderListing> {
        let mut databases: Vec<String> = self.tables.keys().map(|(db, _)| db.clone()).collect();
        databases.sort();
        databases.dedup();
        let lookup = format!("{}/lookup.db3", folder);
        let mut entries: Vec<FolderEntry> = databases
            .iter()
            .map(|db| FolderEntry {
                kind: EntryKind::Database,
                name: db.clone(),
            })
            .collect();
        entries.push(FolderEntry {
            kind: EntryKind::Database,
            name: lookup.clone(),
        });
        Ok(FolderListing {
            entries,
            databases,
            lookup: Some(lookup),
        })
    }

    fn list_tables(&self, database: &str) -> Result<Vec<String>> {
        let mut tables: Vec<String> = self
            .tables
            .keys()
            .filter(|(db, _)| db == database)
            .map(|(_, table)| table.clone())
            .collect();
        tables.sort();
        Ok(tables)
    }

    fn table_columns(&self, database: &str, table: &str) -> Result<Vec<SourceColumn>> {
        Ok(self.table(database, table)?.columns.clone())
    }

    fn column_bounds(&self, database: &str, table: &str, column: &str) -> Result<(Value, Value)> {
        let source = self.table(database, table)?;
        let index = source.index_of(column)?;
        let values = source.rows.iter().map(|r| &r[index]).filter(|v| !v.is_null());
        let min = values.clone().min_by(|a, b| a.total_cmp(b)).cloned();
        let max = values.max_by(|a, b| a.total_cmp(b)).cloned();
        Ok((min.unwrap_or_default(), max.unwrap_or_default()))
    }

    fn distinct_values(&self, database: &str, table: &str, column: &str) -> Result<Vec<Value>> {
        let source = self.table(database, table)?;
        let index = source.index_of(column)?;
        let mut values: Vec<Value> = Vec::new();
        for row in &source.rows {
            if !values.contains(&row[index]) {
                values.push(row[index].clone());
            }
        }
        Ok(values)
    }

    fn select(&self, database: &str, query: &SelectQuery) -> Result<RowSet> {
        self.selects.lock().unwrap().push(query.clone());
        let source = self.table(database, &query.table)?;

        let indices: Vec<usize> = match &query.columns {
            None => (0..source.columns.len()).collect(),
            Some(columns) => columns
                .iter()
                .map(|c| source.index_of(c))
                .collect::<Result<_>>()?,
        };
        let id_filter = match &query.id_filter {
            Some(filter) => Some((source.index_of(&filter.column)?, &filter.ids)),
            None => None,
        };
        let date_filter = match &query.date_filter {
            Some(filter) => Some((source.index_of(&filter.column)?, filter)),
            None => None,
        };

        let rows = source
            .rows
            .iter()
            .filter(|row| match id_filter {
                Some((index, ids)) => row[index]
                    .key_repr()
                    .map(|key| ids.contains(&key))
                    .unwrap_or(false),
                None => true,
            })
            .filter(|row| match date_filter {
                Some((index, filter)) => {
                    let value = row[index].to_string();
                    value.as_str() >= filter.start.as_str() && value.as_str() <= filter.end.as_str()
                }
                None => true,
            })
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();

        Ok(RowSet {
            columns: indices
                .iter()
                .map(|&i| source.columns[i].name.clone())
                .collect(),
            rows,
        })
    }

    fn alias_rows(&self, _lookup_database: &str, lookup_table: &str) -> Result<Vec<AliasRow>> {
        self.lookups
            .get(lookup_table)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound(format!("no such table: {}", lookup_table)).into())
    }
}

/// Daily rows `(Time, ID, value)` for every day in `[start, end]` and each id.
pub(crate) fn daily_rows(
    start: chrono::NaiveDate,
    end: chrono::NaiveDate,
    ids: &[i64],
    value: impl Fn(chrono::NaiveDate, i64) -> f64,
) -> Vec<Vec<Value>> {
    let mut rows = Vec::new();
    let mut day = start;
    while day <= end {
        for id in ids {
            rows.push(vec![
                Value::Text(day.format("%Y-%m-%d").to_string()),
                Value::Integer(*id),
                Value::Real(value(day, *id)),
            ]);
        }
        day = day.succ_opt().expect("date in range");
    }
    rows
}
