use crate::{
    error::{Result, ShapleyError},
    types::{DemandProfile, ItemValues},
};
use rust_decimal::Decimal;
use std::{collections::BTreeSet, fmt::Debug};

/// Default ceiling on buyers for the exact solver; 10! is about 3.6M orderings
pub const DEFAULT_MAX_EXACT_BUYERS: usize = 10;

/// Validate the inputs shared by both solvers
pub(crate) fn check_inputs<B, I: Ord + Debug>(
    price: Decimal,
    demand: &DemandProfile<B, I>,
    item_values: Option<&ItemValues<I>>,
    bundle_items: Option<&BTreeSet<I>>,
) -> Result<()> {
    if price < Decimal::ZERO {
        return Err(ShapleyError::InvalidInput(format!(
            "price must be non-negative, got {price}"
        )));
    }

    if demand.is_empty() {
        return Err(ShapleyError::InvalidInput(
            "at least one buyer is required to share the price".to_string(),
        ));
    }

    if let Some(values) = item_values {
        if let Some((item, value)) = values.iter().find(|(_, v)| **v < Decimal::ZERO) {
            return Err(ShapleyError::InvalidInput(format!(
                "item {item:?} has negative value {value}"
            )));
        }
    }

    // Check that every demanded item belongs to the declared bundle
    if let Some(bundle) = bundle_items {
        if let Some(item) = demand.values().flatten().find(|item| !bundle.contains(*item)) {
            return Err(ShapleyError::InvalidInput(format!(
                "item {item:?} is not part of the bundle"
            )));
        }
    }

    Ok(())
}

/// Refuse exact computations whose n! enumeration exceeds the configured limit
pub(crate) fn check_exact_complexity(n_buyers: usize, limit: usize) -> Result<()> {
    if n_buyers > limit {
        return Err(ShapleyError::TooManyBuyers {
            count: n_buyers,
            limit,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::demand_profile;
    use rust_decimal::dec;

    fn profile() -> DemandProfile<&'static str, u32> {
        demand_profile(vec![("a", vec![1, 2]), ("b", vec![3])])
    }

    #[test]
    fn test_valid_inputs() {
        let values = ItemValues::from([(1, dec!(1)), (2, dec!(0)), (3, dec!(2.5))]);
        let bundle = BTreeSet::from([1, 2, 3, 4]);
        assert!(check_inputs(dec!(100), &profile(), Some(&values), Some(&bundle)).is_ok());
        assert!(check_inputs(dec!(0), &profile(), None, None).is_ok());
    }

    #[test]
    fn test_negative_price() {
        let result = check_inputs(dec!(-1), &profile(), None, None);
        assert!(matches!(result, Err(ShapleyError::InvalidInput(msg)) if msg.contains("price")));
    }

    #[test]
    fn test_empty_buyers() {
        let empty: DemandProfile<&str, u32> = DemandProfile::new();
        let result = check_inputs(dec!(10), &empty, None, None);
        assert!(matches!(result, Err(ShapleyError::InvalidInput(msg)) if msg.contains("buyer")));
    }

    #[test]
    fn test_negative_item_value() {
        let values = ItemValues::from([(1, dec!(1)), (2, dec!(-0.5))]);
        let result = check_inputs(dec!(10), &profile(), Some(&values), None);
        assert!(matches!(result, Err(ShapleyError::InvalidInput(msg)) if msg.contains("item 2")));
    }

    #[test]
    fn test_item_outside_bundle() {
        let bundle = BTreeSet::from([1, 2]);
        let result = check_inputs(dec!(10), &profile(), None, Some(&bundle));
        assert!(matches!(result, Err(ShapleyError::InvalidInput(msg)) if msg.contains("item 3")));
    }

    #[test]
    fn test_complexity_guard() {
        assert!(check_exact_complexity(10, DEFAULT_MAX_EXACT_BUYERS).is_ok());
        assert!(matches!(
            check_exact_complexity(11, DEFAULT_MAX_EXACT_BUYERS),
            Err(ShapleyError::TooManyBuyers {
                count: 11,
                limit: 10
            })
        ));
    }
}
