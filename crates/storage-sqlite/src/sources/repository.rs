use std::path::{Path, PathBuf};
use std::sync::RwLock;

use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection, OpenFlags};
use watershed_core::source::{
    AliasRow, FolderListing, RowSet, SelectQuery, SourceColumn, SourceStoreTrait,
};
use watershed_core::{Result, Value};

use super::model::{filter_param, value_from_sql};
use super::scan::scan_folder;
use crate::errors::{IntoCore, StorageError};
use crate::utils::{chunk_for_sqlite, placeholders, quote_identifier};

const LOOKUP_COLUMNS: [&str; 4] = ["Table Name", "Table Alias", "Column Name", "Column Alias"];

/// Read-only source store over the `.db3` files below a data root.
///
/// Every call opens its own connection, so the store can be shared freely
/// between blocking workers.
pub struct SqliteSourceStore {
    root: RwLock<PathBuf>,
    lookup_marker: String,
}

impl SqliteSourceStore {
    pub fn new(root: impl Into<PathBuf>, lookup_marker: impl Into<String>) -> Self {
        SqliteSourceStore {
            root: RwLock::new(root.into()),
            lookup_marker: lookup_marker.into(),
        }
    }

    /// Directory relative database paths are resolved against.
    pub fn root(&self) -> Result<PathBuf> {
        self.root
            .read()
            .map(|root| root.clone())
            .map_err(|e| StorageError::LockPoisoned(e.to_string()).into())
    }

    fn set_root(&self, root: PathBuf) -> Result<()> {
        let mut guard = self
            .root
            .write()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        log::info!("Data root set to {}", root.display());
        *guard = root;
        Ok(())
    }

    fn open(&self, database: &str) -> Result<Connection> {
        let path = self.root()?.join(database);
        if !path.is_file() {
            return Err(StorageError::NotFound(format!("database {}", database)).into());
        }
        Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .into_core()
    }

    fn query_rows(
        conn: &Connection,
        sql: &str,
        params: &[SqlValue],
        width: usize,
        out: &mut Vec<Vec<Value>>,
    ) -> Result<()> {
        let mut stmt = conn.prepare(sql).into_core()?;
        let mut rows = stmt.query(params_from_iter(params.iter())).into_core()?;
        while let Some(row) = rows.next().into_core()? {
            let mut cells = Vec::with_capacity(width);
            for index in 0..width {
                cells.push(value_from_sql(row.get_ref(index).into_core()?));
            }
            out.push(cells);
        }
        Ok(())
    }

    fn read_tables(&self, database: &str) -> Result<Vec<String>> {
        let conn = self.open(database)?;
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'")
            .into_core()?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .into_core()?
            .collect::<std::result::Result<Vec<_>, _>>()
            .into_core()?;
        Ok(names)
    }

    fn read_columns(&self, database: &str, table: &str) -> Result<Vec<SourceColumn>> {
        let conn = self.open(database)?;
        let mut stmt = conn
            .prepare("SELECT name, type FROM pragma_table_info(?1)")
            .into_core()?;
        let columns = stmt
            .query_map([table], |row| {
                Ok(SourceColumn::new(
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                ))
            })
            .into_core()?
            .collect::<std::result::Result<Vec<_>, _>>()
            .into_core()?;
        if columns.is_empty() {
            return Err(StorageError::NotFound(format!("table {} in {}", table, database)).into());
        }
        Ok(columns)
    }

    fn run_select(&self, database: &str, query: &SelectQuery) -> Result<RowSet> {
        let conn = self.open(database)?;
        let columns = match &query.columns {
            Some(columns) => columns.clone(),
            None => self
                .read_columns(database, &query.table)?
                .into_iter()
                .map(|c| c.name)
                .collect(),
        };
        let projection = columns
            .iter()
            .map(|c| quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ");
        let base = format!(
            "SELECT {} FROM {}",
            projection,
            quote_identifier(&query.table)
        );

        let date_clause = query.date_filter.as_ref().map(|filter| {
            (
                format!("{} BETWEEN ? AND ?", quote_identifier(&filter.column)),
                [filter_param(&filter.start), filter_param(&filter.end)],
            )
        });

        let mut rows = Vec::new();
        match &query.id_filter {
            Some(filter) => {
                for chunk in chunk_for_sqlite(&filter.ids) {
                    let mut sql = format!(
                        "{} WHERE {} IN ({})",
                        base,
                        quote_identifier(&filter.column),
                        placeholders(chunk.len())
                    );
                    let mut params: Vec<SqlValue> = chunk.iter().map(|id| filter_param(id)).collect();
                    if let Some((clause, bounds)) = &date_clause {
                        sql.push_str(" AND ");
                        sql.push_str(clause);
                        params.extend(bounds.iter().cloned());
                    }
                    Self::query_rows(&conn, &sql, &params, columns.len(), &mut rows)?;
                }
            }
            None => {
                let (sql, params) = match &date_clause {
                    Some((clause, bounds)) => (format!("{} WHERE {}", base, clause), bounds.to_vec()),
                    None => (base, Vec::new()),
                };
                Self::query_rows(&conn, &sql, &params, columns.len(), &mut rows)?;
            }
        }

        Ok(RowSet { columns, rows })
    }
}

impl SourceStoreTrait for SqliteSourceStore {
    fn scan_folder(&self, folder: &str) -> Result<FolderListing> {
        let path = Path::new(folder);
        if path.is_absolute() {
            // An absolute folder moves the data root to its parent.
            let parent = path.parent().unwrap_or(path).to_path_buf();
            let base = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            self.set_root(parent.clone())?;
            return scan_folder(&parent, &base, &self.lookup_marker);
        }
        scan_folder(&self.root()?, folder, &self.lookup_marker)
    }

    fn list_tables(&self, database: &str) -> Result<Vec<String>> {
        self.read_tables(database)
    }

    fn table_columns(&self, database: &str, table: &str) -> Result<Vec<SourceColumn>> {
        self.read_columns(database, table)
    }

    fn column_bounds(&self, database: &str, table: &str, column: &str) -> Result<(Value, Value)> {
        let conn = self.open(database)?;
        let column = quote_identifier(column);
        let sql = format!(
            "SELECT MIN({}), MAX({}) FROM {}",
            column,
            column,
            quote_identifier(table)
        );
        conn.query_row(&sql, [], |row| {
            Ok((
                value_from_sql(row.get_ref(0)?),
                value_from_sql(row.get_ref(1)?),
            ))
        })
        .into_core()
    }

    fn distinct_values(&self, database: &str, table: &str, column: &str) -> Result<Vec<Value>> {
        let conn = self.open(database)?;
        let sql = format!(
            "SELECT DISTINCT {} FROM {}",
            quote_identifier(column),
            quote_identifier(table)
        );
        let mut values = Vec::new();
        Self::query_rows(&conn, &sql, &[], 1, &mut values)?;
        Ok(values.into_iter().flatten().collect())
    }

    fn select(&self, database: &str, query: &SelectQuery) -> Result<RowSet> {
        self.run_select(database, query)
    }

    fn alias_rows(&self, lookup_database: &str, lookup_table: &str) -> Result<Vec<AliasRow>> {
        let conn = self.open(lookup_database)?;
        let sql = format!(
            "SELECT {} FROM {}",
            LOOKUP_COLUMNS.map(quote_identifier).join(", "),
            quote_identifier(lookup_table)
        );
        let mut stmt = conn.prepare(&sql).into_core()?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, Option<String>>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            })
            .into_core()?
            .collect::<std::result::Result<Vec<_>, _>>()
            .into_core()?;

        Ok(rows
            .into_iter()
            .filter_map(|(table_name, table_alias, column_name, column_alias)| {
                Some(AliasRow {
                    table_name: table_name?,
                    table_alias,
                    column_name: column_name.unwrap_or_default(),
                    column_alias,
                })
            })
            .collect())
    }
}
