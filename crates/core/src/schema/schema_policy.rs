//! Column-name policies that decide a table's join keys.
//!
//! Source tables carry no metadata about their time axis or identifier, so
//! both are recognised by name:
//!
//! - the date column is the first of `Time`, `Date`, `Month`, `Year` present
//!   (exact, case-sensitive match); only one date semantics per table is
//!   supported;
//! - the identifier column is the first column whose name contains `"ID"`.

use super::schema_model::DateKind;
use crate::constants::ID_MARKER;

/// Date-column precedence, highest first.
pub const DATE_COLUMN_PRECEDENCE: [DateKind; 4] =
    [DateKind::Time, DateKind::Date, DateKind::Month, DateKind::Year];

/// Every date-like column present, in precedence order.
pub fn date_columns_present<S: AsRef<str>>(columns: &[S]) -> Vec<DateKind> {
    DATE_COLUMN_PRECEDENCE
        .iter()
        .copied()
        .filter(|kind| columns.iter().any(|c| c.as_ref() == kind.as_str()))
        .collect()
}

pub fn is_identifier_column(name: &str) -> bool {
    name.contains(ID_MARKER)
}

pub fn find_identifier_column<S: AsRef<str>>(columns: &[S]) -> Option<&str> {
    columns
        .iter()
        .map(|c| c.as_ref())
        .find(|c| is_identifier_column(c))
}
