//! Currency conversion arithmetic.
//!
//! Converted amounts are rounded to [`BASE_AMOUNT_SCALE`] places with banker's
//! rounding (round half to even) so repeated conversions do not drift.

use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places kept on base-currency amounts.
pub const BASE_AMOUNT_SCALE: u32 = 4;

/// Exclusive upper bound on any ledger amount (10^15).
///
/// Matches the 15 integer digits of a `NUMERIC(19, 4)` column.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

/// Converts `amount` at `rate`, rounded to [`BASE_AMOUNT_SCALE`] places.
///
/// Returns `None` if the product overflows `Decimal`.
#[must_use]
pub fn convert_amount(amount: Decimal, rate: Decimal) -> Option<Decimal> {
    amount.checked_mul(rate).map(round_amount)
}

/// Rounds to [`BASE_AMOUNT_SCALE`] places using banker's rounding.
#[must_use]
pub fn round_amount(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(BASE_AMOUNT_SCALE, RoundingStrategy::MidpointNearestEven)
}

/// Returns true if `amount` fits in a ledger amount column.
#[must_use]
pub fn is_storable(amount: Decimal) -> bool {
    amount.abs() < MAX_AMOUNT
}
