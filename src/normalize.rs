use crate::error::{Result, ShapleyError};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::warn;

/// Decimal places kept on each amount (wei resolution)
const SHARE_SCALE: u32 = 18;
/// Digits a decimal mantissa can always hold
const MANTISSA_DIGITS: u32 = 28;

/// Rescaled amounts plus whether the equal-split fallback was used
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Normalized<B> {
    pub amounts: BTreeMap<B, Decimal>,
    pub equal_split: bool,
}

/// Scale raw contributions so they add up to `price` exactly.
///
/// - positive total: amount_i = raw_i / Σ raw · price
/// - zero total (every buyer is a null player): price / n each, flagged
/// - zero price: every amount is zero, nothing to flag
///
/// Negative raw values are treated as zero. Amounts are rounded to at most 18
/// decimal places (fewer for very large prices, more if the price itself has
/// them) so every partial sum is exact, and the rounding residual is added to
/// the largest amount (smallest buyer on ties).
pub(crate) fn normalize<B: Ord>(raw: BTreeMap<B, Decimal>, price: Decimal) -> Result<Normalized<B>> {
    let n = raw.len();
    if n == 0 {
        return Ok(Normalized {
            amounts: raw,
            equal_split: false,
        });
    }

    if price.is_zero() {
        return Ok(Normalized {
            amounts: raw.into_keys().map(|buyer| (buyer, Decimal::ZERO)).collect(),
            equal_split: false,
        });
    }

    let raw: BTreeMap<B, Decimal> = raw
        .into_iter()
        .map(|(buyer, value)| (buyer, value.max(Decimal::ZERO)))
        .collect();
    let total = raw
        .values()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))
        .ok_or_else(|| ShapleyError::ArithmeticOverflow("raw contribution total".to_string()))?;

    let scale = share_scale(price);
    let (mut amounts, equal_split) = if total.is_zero() {
        warn!(
            buyers = n,
            %price,
            "no buyer contributes any value; splitting the price equally"
        );
        let each = (price / Decimal::from(n)).round_dp(scale);
        (
            raw.into_keys().map(|buyer| (buyer, each)).collect(),
            true,
        )
    } else {
        let amounts = raw
            .into_iter()
            .map(|(buyer, value)| {
                // value <= total, so the ratio is in [0, 1] and the product cannot overflow
                (buyer, (value / total * price).round_dp(scale))
            })
            .collect::<BTreeMap<_, _>>();
        (amounts, false)
    };

    absorb_residual(&mut amounts, price);

    Ok(Normalized {
        amounts,
        equal_split,
    })
}

/// Scale at which the price and any sum of amounts stay exactly representable
fn share_scale(price: Decimal) -> u32 {
    SHARE_SCALE
        .min(MANTISSA_DIGITS.saturating_sub(integer_digits(price)))
        .max(price.scale())
}

fn integer_digits(value: Decimal) -> u32 {
    let mut int_part = value.abs().trunc();
    let mut digits = 0;
    while int_part >= Decimal::ONE {
        int_part = (int_part / Decimal::TEN).trunc();
        digits += 1;
    }
    digits
}

fn absorb_residual<B: Ord>(amounts: &mut BTreeMap<B, Decimal>, price: Decimal) {
    let residual = price - amounts.values().copied().sum::<Decimal>();
    if residual.is_zero() {
        return;
    }

    let mut largest: Option<(usize, Decimal)> = None;
    for (idx, amount) in amounts.values().enumerate() {
        if largest.is_none_or(|(_, best)| *amount > best) {
            largest = Some((idx, *amount));
        }
    }

    if let Some((idx, _)) = largest {
        if let Some(amount) = amounts.values_mut().nth(idx) {
            *amount += residual;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    fn raw(values: &[(&'static str, Decimal)]) -> BTreeMap<&'static str, Decimal> {
        values.iter().copied().collect()
    }

    #[test]
    fn test_scales_to_price() {
        let result = normalize(raw(&[("a", dec!(1)), ("b", dec!(3))]), dec!(100)).unwrap();
        assert_eq!(result.amounts["a"], dec!(25));
        assert_eq!(result.amounts["b"], dec!(75));
        assert!(!result.equal_split);
    }

    #[test]
    fn test_sum_is_exact_after_rounding() {
        let result = normalize(
            raw(&[("a", dec!(1)), ("b", dec!(1)), ("c", dec!(1))]),
            dec!(100),
        )
        .unwrap();
        let total: Decimal = result.amounts.values().copied().sum();
        assert_eq!(total, dec!(100));
        for amount in result.amounts.values() {
            assert!((*amount - dec!(33.333333333333)).abs() < dec!(0.000000001));
        }
    }

    #[test]
    fn test_amounts_rounded_to_wei() {
        let result = normalize(
            raw(&[("a", dec!(1)), ("b", dec!(1)), ("c", dec!(1))]),
            dec!(1),
        )
        .unwrap();
        assert_eq!(result.amounts["a"], dec!(0.333333333333333334));
        assert_eq!(result.amounts["b"], dec!(0.333333333333333333));
        assert_eq!(result.amounts["c"], dec!(0.333333333333333333));
    }

    #[test]
    fn test_share_scale() {
        assert_eq!(share_scale(dec!(100)), 18);
        assert_eq!(share_scale(dec!(0.5)), 18);
        assert_eq!(share_scale(dec!(1234567890123)), 15);
        assert_eq!(share_scale(dec!(1.0000000000000000000001)), 22);
    }

    #[test]
    fn test_all_null_players_split_equally() {
        let result = normalize(raw(&[("a", dec!(0)), ("b", dec!(0))]), dec!(50)).unwrap();
        assert_eq!(result.amounts["a"], dec!(25));
        assert_eq!(result.amounts["b"], dec!(25));
        assert!(result.equal_split);
    }

    #[test]
    fn test_zero_price() {
        let result = normalize(raw(&[("a", dec!(0)), ("b", dec!(2))]), dec!(0)).unwrap();
        assert!(result.amounts.values().all(|a| a.is_zero()));
        assert!(!result.equal_split);
    }

    #[test]
    fn test_negative_raw_treated_as_zero() {
        let result = normalize(raw(&[("a", dec!(-5)), ("b", dec!(5))]), dec!(10)).unwrap();
        assert_eq!(result.amounts["a"], dec!(0));
        assert_eq!(result.amounts["b"], dec!(10));
    }

    #[test]
    fn test_empty() {
        let result = normalize(BTreeMap::<&str, Decimal>::new(), dec!(10)).unwrap();
        assert!(result.amounts.is_empty());
    }
}
