use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::source::SourceSpec;
use crate::table::{ColumnType, Value};

/// Which well-known column carries a table's time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateKind {
    Time,
    Date,
    Month,
    Year,
}

impl DateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateKind::Time => "Time",
            DateKind::Date => "Date",
            DateKind::Month => "Month",
            DateKind::Year => "Year",
        }
    }

    pub fn granularity(&self) -> Granularity {
        match self {
            DateKind::Time | DateKind::Date => Granularity::Daily,
            DateKind::Month => Granularity::Monthly,
            DateKind::Year => Granularity::Yearly,
        }
    }

    /// Calendar-date columns hold `YYYY-MM-DD` text; the others hold integers.
    pub fn is_calendar_date(&self) -> bool {
        matches!(self, DateKind::Time | DateKind::Date)
    }
}

impl fmt::Display for DateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Native sampling interval of a source table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Daily,
    Monthly,
    Yearly,
}

/// One column of a source table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaColumn {
    pub real: String,
    pub alias: String,
    /// `None` when the declared type does not pin a storage class.
    pub kind: Option<ColumnType>,
}

/// Cached description of one source table.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaEntry {
    pub source: SourceSpec,
    pub real_table: String,
    pub columns: Vec<SchemaColumn>,
    pub date_kind: Option<DateKind>,
    /// Real name of the identifier column.
    pub id_column: Option<String>,
    pub id_domain: Vec<String>,
    pub start: Value,
    pub end: Value,
}

impl SchemaEntry {
    pub fn granularity(&self) -> Option<Granularity> {
        self.date_kind.map(|kind| kind.granularity())
    }

    /// Real name of the date column.
    pub fn date_column(&self) -> Option<&str> {
        self.date_kind.map(|kind| kind.as_str())
    }

    pub fn alias_columns(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.alias.as_str()).collect()
    }

    pub fn has_column(&self, alias: &str) -> bool {
        self.columns.iter().any(|c| c.alias == alias)
    }

    /// Join-key columns of this table: date column first, then identifier.
    pub fn key_columns(&self) -> Vec<&str> {
        self.date_column()
            .into_iter()
            .chain(self.id_column.as_deref())
            .collect()
    }

    pub fn is_key_column(&self, name: &str) -> bool {
        self.key_columns().contains(&name)
    }

    pub fn column_by_real(&self, real: &str) -> Option<&SchemaColumn> {
        self.columns.iter().find(|c| c.real == real)
    }
}

/// Schema discovery result for one table, as shown to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableDetails {
    pub columns: Vec<String>,
    pub start_date: Value,
    pub end_date: Value,
    pub ids: Vec<String>,
    pub date_type: Option<DateKind>,
    pub interval: Option<Granularity>,
}

impl From<&SchemaEntry> for TableDetails {
    fn from(entry: &SchemaEntry) -> Self {
        Self {
            columns: entry.alias_columns().into_iter().map(String::from).collect(),
            start_date: entry.start.clone(),
            end_date: entry.end.clone(),
            ids: entry.id_domain.clone(),
            date_type: entry.date_kind,
            interval: entry.granularity(),
        }
    }
}

/// Schema discovery result merged across several sources.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiTableDetails {
    pub columns: Vec<String>,
    /// Known columns per source, keyed by the source's display form.
    pub global_columns: BTreeMap<String, Vec<String>>,
    pub start_date: Value,
    pub end_date: Value,
    pub ids: Vec<String>,
    pub date_type: Option<DateKind>,
    pub interval: Option<Granularity>,
}
