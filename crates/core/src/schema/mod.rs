//! Schema discovery and the per-source schema cache.

mod schema_cache;
mod schema_model;
pub mod schema_policy;
mod schema_service;

pub use schema_cache::SchemaCache;
pub use schema_model::{
    DateKind, Granularity, MultiTableDetails, SchemaColumn, SchemaEntry, TableDetails,
};
pub use schema_service::SchemaService;
