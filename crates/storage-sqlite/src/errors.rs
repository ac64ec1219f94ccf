//! Storage-specific error types for SQLite operations.
//!
//! This module provides error types that wrap `rusqlite` and filesystem errors
//! and convert them to the database-agnostic error types defined in
//! `watershed_core`.

use rusqlite::ErrorCode;
use thiserror::Error;
use watershed_core::errors::{DatabaseError, Error};

/// Storage-specific errors.
///
/// These errors are internal to the storage layer and are converted to
/// `watershed_core::Error` before being returned to callers.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Query execution failed: {0}")]
    QueryFailed(#[from] rusqlite::Error),

    #[error("Filesystem error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::QueryFailed(rusqlite::Error::QueryReturnedNoRows) => {
                Error::Database(DatabaseError::NotFound("Record not found".to_string()))
            }
            StorageError::QueryFailed(rusqlite::Error::SqliteFailure(e, message))
                if e.code == ErrorCode::CannotOpen || e.code == ErrorCode::NotADatabase =>
            {
                let detail = message.unwrap_or_else(|| e.to_string());
                Error::Database(DatabaseError::ConnectionFailed(detail))
            }
            StorageError::QueryFailed(e) => Error::Database(DatabaseError::QueryFailed(e.to_string())),
            StorageError::Io(e) => Error::Database(DatabaseError::Io(e.to_string())),
            StorageError::NotFound(what) => Error::Database(DatabaseError::NotFound(what)),
            StorageError::LockPoisoned(e) => Error::Cache(e),
        }
    }
}

/// Extension trait for converting driver and filesystem results to core
/// results.
///
/// This provides a `.into_core()` method on any `Result<T, rusqlite::Error>`
/// or `Result<T, std::io::Error>` which handles the conversion through
/// StorageError.
pub trait IntoCore<T> {
    fn into_core(self) -> watershed_core::Result<T>;
}

impl<T> IntoCore<T> for std::result::Result<T, rusqlite::Error> {
    fn into_core(self) -> watershed_core::Result<T> {
        self.map_err(|e| StorageError::from(e).into())
    }
}

impl<T> IntoCore<T> for std::result::Result<T, std::io::Error> {
    fn into_core(self) -> watershed_core::Result<T> {
        self.map_err(|e| StorageError::from(e).into())
    }
}
