//! Watershed Core - retrieval, merge, resampling and statistics engine.
//!
//! This crate holds the logic that turns a request over one or more
//! `(database, table)` sources into a single tabular result. It is
//! database-agnostic: all access to the underlying stores goes through
//! [`source::SourceStoreTrait`], which is implemented by the
//! `storage-sqlite` crate.

pub mod alias;
pub mod analytics;
pub mod constants;
pub mod errors;
pub mod retrieval;
pub mod schema;
pub mod source;
pub mod table;
pub mod utils;

// Re-export the types most callers need
pub use retrieval::{DataRequest, DataResponse, DataService, DataServiceTrait};
pub use table::{Column, ColumnType, Table, Value};

// Re-export error types
pub use errors::Error;
pub use errors::Result;
