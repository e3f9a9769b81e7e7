//! Decimal helpers shared by the reporting pipeline.

use rust_decimal::{Decimal, RoundingStrategy};

const DECIMAL_PLACES: u32 = 2;

/// Round a money amount to cents, half away from zero.
#[must_use]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// `numer / denom`, rounded to cents. `None` when `denom` is zero.
#[must_use]
pub fn ratio(numer: Decimal, denom: Decimal) -> Option<Decimal> {
    if denom.is_zero() {
        return None;
    }
    numer.checked_div(denom).map(round_money)
}

/// `numer / denom * 100`, rounded to two places. `None` when `denom` is zero.
#[must_use]
pub fn percent(numer: Decimal, denom: Decimal) -> Option<Decimal> {
    if denom.is_zero() {
        return None;
    }
    numer
        .checked_div(denom)
        .and_then(|q| q.checked_mul(Decimal::ONE_HUNDRED))
        .map(round_money)
}
