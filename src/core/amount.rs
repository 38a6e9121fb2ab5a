use crate::core::{AppError, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Convert a major-unit amount to provider minor units (cents/piastres)
///
/// Fails if the amount carries more than two decimal places or does not fit
/// in an i64 once scaled.
pub fn to_cents(amount: Decimal) -> Result<i64> {
    if amount < Decimal::ZERO {
        return Err(AppError::validation("Amount cannot be negative"));
    }

    let scaled = amount
        .checked_mul(Decimal::from(100))
        .ok_or_else(|| AppError::validation("Amount out of range"))?;

    if !scaled.fract().is_zero() {
        return Err(AppError::validation(format!(
            "Amount {} has more than two decimal places",
            amount
        )));
    }

    scaled
        .to_i64()
        .ok_or_else(|| AppError::validation("Amount out of range"))
}

/// Convert provider minor units back to a major-unit amount
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Convert minor units to the major-unit figure the intention endpoint expects
///
/// The provider's intention API takes amounts in the base currency unit while
/// every other endpoint takes minor units. The division by 100 here is that
/// endpoint's contract, not a rounding choice.
pub fn cents_to_major_units(cents: i64) -> Decimal {
    from_cents(cents)
}
