//! Conversions between SQLite cells and engine values.

use rusqlite::types::{Value as SqlValue, ValueRef};
use watershed_core::Value;

/// Reads one SQLite cell. Blobs carry no tabular meaning here and read as null.
pub fn value_from_sql(cell: ValueRef<'_>) -> Value {
    match cell {
        ValueRef::Null | ValueRef::Blob(_) => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(r) => Value::Real(r),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
    }
}

/// Filter values arrive as strings; integral ones are bound as integers so
/// they compare equal to integer cells regardless of column affinity.
pub fn filter_param(text: &str) -> SqlValue {
    match text.trim().parse::<i64>() {
        Ok(i) => SqlValue::Integer(i),
        Err(_) => SqlValue::Text(text.to_string()),
    }
}
