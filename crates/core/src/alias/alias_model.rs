use std::collections::HashMap;

use crate::source::AliasRow;

/// Aliases registered for one real table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct TableAliases {
    alias: Option<String>,
    /// real column -> alias column
    to_alias: HashMap<String, String>,
    /// alias column -> real column
    to_real: HashMap<String, String>,
}

/// Bidirectional real/alias mapping for tables and their columns.
///
/// Names that were never registered resolve to themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasMap {
    tables: HashMap<String, TableAliases>,
    /// alias table -> real table
    reals: HashMap<String, String>,
}

impl AliasMap {
    pub fn from_rows(rows: impl IntoIterator<Item = AliasRow>) -> Self {
        let mut map = AliasMap::default();
        for row in rows {
            map.insert(row);
        }
        map
    }

    /// Registers one lookup row in both directions. Blank aliases are treated
    /// as absent. Later rows overwrite earlier ones.
    pub fn insert(&mut self, row: AliasRow) {
        let table_alias = non_blank(row.table_alias);
        let column_alias = non_blank(row.column_alias);

        let entry = self.tables.entry(row.table_name.clone()).or_default();
        if let Some(alias) = table_alias {
            entry.alias = Some(alias.clone());
            self.reals.insert(alias, row.table_name.clone());
        }
        if let Some(alias) = column_alias {
            entry.to_alias.insert(row.column_name.clone(), alias.clone());
            entry.to_real.insert(alias, row.column_name);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Real table name for an alias or real name.
    pub fn real_table<'a>(&'a self, name: &'a str) -> &'a str {
        self.reals.get(name).map(String::as_str).unwrap_or(name)
    }

    /// Alias of a real table name.
    pub fn alias_table<'a>(&'a self, real: &'a str) -> &'a str {
        self.tables
            .get(real)
            .and_then(|t| t.alias.as_deref())
            .unwrap_or(real)
    }

    /// Alias of a real column of `table` (alias or real table name).
    pub fn alias_column<'a>(&'a self, table: &str, real_column: &'a str) -> &'a str {
        self.tables
            .get(self.real_table(table))
            .and_then(|t| t.to_alias.get(real_column))
            .map(String::as_str)
            .unwrap_or(real_column)
    }

    /// Real column for an alias column of `table` (alias or real table name).
    pub fn real_column<'a>(&'a self, table: &str, alias_column: &'a str) -> &'a str {
        self.tables
            .get(self.real_table(table))
            .and_then(|t| t.to_real.get(alias_column))
            .map(String::as_str)
            .unwrap_or(alias_column)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
