//! Price display helpers.
//!
//! Totals are computed in [`Decimal`] so that line totals and subtotals
//! never accumulate floating point error.

use rust_decimal::{Decimal, RoundingStrategy};

/// Format a price for display (e.g., `$179.90`).
///
/// Half-cent values round away from zero.
///
/// ```rust
/// # use rocketshoes_core::format_price;
/// # use rust_decimal::Decimal;
/// assert_eq!(format_price(Decimal::new(1799, 1)), "$179.90");
/// ```
#[must_use]
pub fn format_price(amount: Decimal) -> String {
    format!("${:.2}", amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}
