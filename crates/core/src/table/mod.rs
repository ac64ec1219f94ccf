//! Tabular values exchanged between the engine's stages.

mod numeric;
mod table_model;

pub use numeric::{normalize_table, round_numeric, round_to_precision};
pub use table_model::{Column, ColumnType, Record, Records, Table, Value};
