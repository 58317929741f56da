//! Money calculation utilities using rust_decimal for precision
//!
//! Prices travel as `f64`. Sums are done in `Decimal` and rounded back to
//! 2 decimal places, so a total computed at write time and one recomputed at
//! read time always agree.

use rust_decimal::prelude::*;

/// Rounding strategy for monetary values (2 decimal places, half away from zero)
const DECIMAL_PLACES: u32 = 2;

/// Maximum accepted price (1,000,000)
pub const MAX_PRICE: f64 = 1_000_000.0;

/// Convert f64 to Decimal, non-finite values become zero
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(value = ?value, "Non-finite f64 in monetary calculation, defaulting to zero");
        Decimal::ZERO
    })
}

/// Convert Decimal back to f64 rounded to 2dp
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Sum a sequence of prices
pub fn sum_prices(prices: impl IntoIterator<Item = f64>) -> f64 {
    to_f64(prices.into_iter().map(to_decimal).sum())
}

/// Price is finite, non-negative and within [`MAX_PRICE`]
pub fn is_valid_price(value: f64) -> bool {
    value.is_finite() && (0.0..=MAX_PRICE).contains(&value)
}

/// Price carries no more than 2 decimal places
///
/// A sum of such prices is exact, so rounding in [`sum_prices`] never moves it.
pub fn is_whole_cents(value: f64) -> bool {
    let decimal = to_decimal(value);
    decimal == decimal.round_dp(DECIMAL_PLACES)
}
