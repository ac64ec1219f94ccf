use serde::{Deserialize, Serialize};
use std::fmt;

use crate::table::Value;

/// One `(database, table)` pair contributing to a request.
///
/// `table` may be a real table name or its alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceSpec {
    #[serde(rename = "db", alias = "database")]
    pub database: String,
    pub table: String,
}

impl SourceSpec {
    pub fn new(database: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            table: table.into(),
        }
    }
}

impl fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.database, self.table)
    }
}

/// Column as declared in a source table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceColumn {
    pub name: String,
    pub declared_type: String,
}

impl SourceColumn {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
        }
    }
}

/// One row of a lookup table mapping real names to human-facing aliases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasRow {
    pub table_name: String,
    pub table_alias: Option<String>,
    pub column_name: String,
    pub column_alias: Option<String>,
}

/// Restricts the identifier column to a set of values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdFilter {
    pub column: String,
    pub ids: Vec<String>,
}

/// Inclusive `BETWEEN` constraint on the date column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFilter {
    pub column: String,
    pub start: String,
    pub end: String,
}

/// A filtered projection of one source table, expressed in real names.
///
/// Filter values are always bound as statement parameters by the store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectQuery {
    pub table: String,
    /// `None` selects every column.
    pub columns: Option<Vec<String>>,
    pub id_filter: Option<IdFilter>,
    pub date_filter: Option<DateFilter>,
}

/// Raw rows returned by a store, named by the real column names.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Folder,
    Database,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderEntry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub name: String,
}

/// Result of walking a data folder.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FolderListing {
    pub entries: Vec<FolderEntry>,
    /// Source databases (every `.db3` except the lookup database).
    #[serde(skip)]
    pub databases: Vec<String>,
    /// The alias lookup database, if one was found.
    #[serde(skip)]
    pub lookup: Option<String>,
}
