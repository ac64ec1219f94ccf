//! Utility functions for SQLite storage operations.
//!
//! This module provides helpers for building dynamic statements over source
//! tables whose names are only known at runtime, including chunking utilities
//! to avoid parameter limits.

/// Maximum number of parameters for SQLite IN (...) queries.
///
/// SQLite has a compile-time limit on the number of parameters in a SQL
/// statement (SQLITE_MAX_VARIABLE_NUMBER). To stay safely under it and leave
/// room for the date-window parameters, identifier lists are bound in chunks
/// of 500.
pub const SQLITE_MAX_PARAMS_CHUNK: usize = 500;

/// Chunk a slice into smaller slices for batch SQLite queries.
pub fn chunk_for_sqlite<T>(items: &[T]) -> impl Iterator<Item = &[T]> {
    items.chunks(SQLITE_MAX_PARAMS_CHUNK)
}

/// Quotes a table or column name for interpolation into a statement.
///
/// Source tables use arbitrary names (spaces, dashes, reserved words), so
/// every identifier is wrapped in double quotes with embedded quotes doubled.
/// Values are never interpolated; they are always bound as parameters.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `?, ?, ...` with `count` placeholders.
pub fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
