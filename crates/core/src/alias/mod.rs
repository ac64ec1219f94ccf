//! Real/alias name mapping for tables and columns.

mod alias_model;
mod alias_registry;

pub use alias_model::AliasMap;
pub use alias_registry::{AliasLoadReport, AliasRegistry};
