use num_traits::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use super::{Table, Value};
use crate::constants::NUMERIC_PRECISION;

/// Rounds `value` to `places` decimal places, half to even.
///
/// Values outside the range `Decimal` can represent are returned unchanged;
/// at that magnitude an `f64` carries no fractional digits anyway.
pub fn round_to_precision(value: f64, places: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

/// Rounds numeric cells to the engine's output precision; other cells pass
/// through unchanged.
pub fn round_numeric(value: Value) -> Value {
    match value {
        Value::Real(r) => Value::Real(round_to_precision(r, NUMERIC_PRECISION)),
        other => other,
    }
}

/// Applies [`round_numeric`] to every cell of `table`.
pub fn normalize_table(table: Table) -> Table {
    table.map_values(round_numeric)
}
