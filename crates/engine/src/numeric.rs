//! Decimal <-> f64 conversion at the boundary of the float math
//!
//! Trend fitting and curve fractions run in `f64`; every value that leaves
//! the engine is a `Decimal` rounded to [`DECIMAL_PLACES`].

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

/// Scale of every float-derived decimal
pub const DECIMAL_PLACES: u32 = 10;

/// Convert a float result to a decimal, saturating at the decimal range.
/// NaN maps to zero.
pub fn to_decimal(value: f64) -> Decimal {
    if value.is_nan() {
        return Decimal::ZERO;
    }
    match Decimal::from_f64(value) {
        Some(d) => d.round_dp(DECIMAL_PLACES),
        None if value > 0.0 => Decimal::MAX,
        None => Decimal::MIN,
    }
}

pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}
