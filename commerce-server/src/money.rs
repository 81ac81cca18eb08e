//! Money calculation utilities using rust_decimal for precision
//!
//! All arithmetic is done on `Decimal`; values are converted back to `f64`
//! (rounded to 2 decimal places) only for storage and serialization.

use rust_decimal::prelude::*;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(value = ?value, "Non-finite f64 in monetary calculation, defaulting to zero");
        Decimal::ZERO
    })
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Catalog price rounded to 2 decimal places
///
/// Order lines store this value, and every line total is computed from it,
/// so `total == Σ(quantity × price)` holds for the stored rows.
#[inline]
pub fn unit_price(price: f64) -> Decimal {
    to_decimal(price).round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// rounded unit price × quantity
#[inline]
pub fn line_total(price: f64, quantity: i64) -> Decimal {
    unit_price(price) * Decimal::from(quantity)
}

/// Σ(price × quantity)
pub fn sum_lines<I>(lines: I) -> Decimal
where
    I: IntoIterator<Item = (f64, i64)>,
{
    lines
        .into_iter()
        .map(|(price, quantity)| line_total(price, quantity))
        .sum()
}

/// Equal within [`MONEY_TOLERANCE`]
#[inline]
pub fn money_eq(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() < MONEY_TOLERANCE
}
