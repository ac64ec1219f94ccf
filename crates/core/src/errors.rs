//! Core error types for the Watershed engine.
//!
//! This module defines database-agnostic error types. Storage-specific errors
//! (from SQLite, the filesystem, etc.) are converted to these types by the
//! storage layer.

use chrono::ParseError as ChronoParseError;
use thiserror::Error;

use crate::retrieval::RetrievalError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the engine.
///
/// Retrieval failures are user-facing and render without a prefix so their
/// message can be handed to a client unchanged.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("{0}")]
    Retrieval(#[from] RetrievalError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Database-agnostic error type for storage operations.
///
/// This enum uses `String` for all error details, allowing the storage layer
/// to convert driver-specific errors into this format.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open a source database.
    #[error("Failed to open database: {0}")]
    ConnectionFailed(String),

    /// A query failed to execute.
    #[error("Database query failed: {0}")]
    QueryFailed(String),

    /// The requested database, table or column does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Filesystem failure while scanning for sources.
    #[error("I/O failure: {0}")]
    Io(String),

    /// Internal/unexpected database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Validation errors for user input and data parsing.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Failed to parse date/time: {0}")]
    DateTimeParse(#[from] ChronoParseError),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}

impl From<ChronoParseError> for Error {
    fn from(err: ChronoParseError) -> Self {
        Error::Validation(ValidationError::DateTimeParse(err))
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
