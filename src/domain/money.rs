//! Decimal helpers shared by the tariff engines.
//!
//! Calculations keep full precision. Rounding to cents only happens here, at
//! display time.

use rust_decimal::{Decimal, RoundingStrategy};

/// Computes `percent`% of `value`, or `None` on overflow.
#[must_use]
pub fn percent_of(value: Decimal, percent: Decimal) -> Option<Decimal> {
    value.checked_mul(percent)?.checked_div(Decimal::ONE_HUNDRED)
}

/// Rounds to two decimal places, half away from zero, keeping exactly two
/// digits of scale.
#[must_use]
pub fn two_places(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Formats an amount with exactly two decimal places, e.g. `"509.43"`.
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    two_places(amount).to_string()
}
