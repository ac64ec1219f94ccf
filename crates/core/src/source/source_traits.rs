use super::source_model::{AliasRow, FolderListing, RowSet, SelectQuery, SourceColumn};
use crate::errors::Result;
use crate::table::Value;

/// Read-only access to the source databases.
///
/// `database` arguments are paths as the client names them (usually relative
/// to the data root); `table` arguments are always real table names.
pub trait SourceStoreTrait: Send + Sync {
    /// Walks `folder` and reports the folders, databases and files found.
    fn scan_folder(&self, folder: &str) -> Result<FolderListing>;

    /// Real names of all tables in `database`.
    fn list_tables(&self, database: &str) -> Result<Vec<String>>;

    /// Columns of `table` in declaration order. Fails if the table does not exist.
    fn table_columns(&self, database: &str, table: &str) -> Result<Vec<SourceColumn>>;

    /// Smallest and largest value stored in `column`.
    fn column_bounds(&self, database: &str, table: &str, column: &str)
        -> Result<(Value, Value)>;

    /// Distinct values stored in `column`.
    fn distinct_values(&self, database: &str, table: &str, column: &str) -> Result<Vec<Value>>;

    /// Runs a filtered projection of one table.
    fn select(&self, database: &str, query: &SelectQuery) -> Result<RowSet>;

    /// Reads the `(Table Name, Table Alias, Column Name, Column Alias)` rows
    /// of one lookup table.
    fn alias_rows(&self, lookup_database: &str, lookup_table: &str) -> Result<Vec<AliasRow>>;
}
