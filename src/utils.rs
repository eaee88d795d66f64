use crate::error::{Result, ShapleyError};
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};

/// Factorials that fit in a `u64` (0! through 20!)
pub(crate) const FACTORIAL_LIMIT: usize = 21;
pub(crate) const FACTORIALS: [u64; FACTORIAL_LIMIT] = {
    let mut facts = [1u64; FACTORIAL_LIMIT];
    let mut i = 1;
    while i < FACTORIAL_LIMIT {
        facts[i] = facts[i - 1] * (i as u64);
        i += 1;
    }
    facts
};

/// Exact factorial, `None` once it no longer fits in a `u64`
pub(crate) fn factorial(n: usize) -> Option<u64> {
    FACTORIALS.get(n).copied()
}

/// Convert a float into a decimal, rejecting NaN and infinities
pub fn f64_to_decimal(value: f64) -> Result<Decimal> {
    if !value.is_finite() {
        return Err(ShapleyError::InvalidInput(format!(
            "{value} is not a finite number"
        )));
    }
    Decimal::from_f64(value)
        .map(|d| d.normalize())
        .ok_or_else(|| ShapleyError::InvalidInput(format!("{value} is out of decimal range")))
}

/// Lossy conversion for callers that work in floats
pub fn decimal_to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// Round to `dp` decimal places, midpoint away from zero
pub fn round_decimal(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}
