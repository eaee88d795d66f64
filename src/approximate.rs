use crate::{
    error::{Result, ShapleyError},
    types::DemandProfile,
};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::debug;

/// Congestion credit per buyer, in the profile's buyer order.
///
/// Congestion is the number of buyers demanding an item. Every demanded item
/// is worth 1/congestion to each buyer that wants it, whatever value the
/// item carries in the exact game. Runs in time linear in the total size of
/// the demand sets.
///
/// With equal item values this matches the exact Shapley value of the
/// coverage game. With an uneven value table the two solvers diverge, and
/// `BundleShapley::compare` reports by how much.
pub(crate) fn congestion_scores<B: Ord, I: Ord>(demand: &DemandProfile<B, I>) -> Result<Vec<Decimal>> {
    let mut congestion: BTreeMap<&I, usize> = BTreeMap::new();
    for item in demand.values().flatten() {
        *congestion.entry(item).or_insert(0) += 1;
    }

    let per_unit: BTreeMap<&I, Decimal> = congestion
        .into_iter()
        .map(|(item, count)| {
            Decimal::ONE
                .checked_div(Decimal::from(count))
                .map(|share| (item, share))
                .ok_or_else(|| ShapleyError::ArithmeticOverflow("item credit".to_string()))
        })
        .collect::<Result<_>>()?;

    let scores = demand
        .values()
        .map(|items| {
            items.iter().try_fold(Decimal::ZERO, |acc, item| {
                acc.checked_add(per_unit[item])
                    .ok_or_else(|| ShapleyError::ArithmeticOverflow("buyer credit".to_string()))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(
        buyers = demand.len(),
        items = per_unit.len(),
        "congestion scores computed"
    );
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::demand_profile;
    use rust_decimal::dec;

    #[test]
    fn test_unshared_items_score_one() {
        let profile = demand_profile(vec![("a", vec![1u32]), ("b", vec![2]), ("c", vec![3])]);
        let scores = congestion_scores(&profile).unwrap();
        assert_eq!(scores, vec![dec!(1), dec!(1), dec!(1)]);
    }

    #[test]
    fn test_shared_item_is_divided() {
        let profile = demand_profile(vec![("a", vec![1u32, 2]), ("b", vec![2]), ("c", vec![])]);
        let scores = congestion_scores(&profile).unwrap();
        assert_eq!(scores, vec![dec!(1.5), dec!(0.5), dec!(0)]);
    }

    #[test]
    fn test_every_item_counts_once() {
        let profile = demand_profile(vec![("a", vec![1u32, 2]), ("b", vec![2, 3])]);
        let scores = congestion_scores(&profile).unwrap();
        assert_eq!(scores, vec![dec!(1.5), dec!(1.5)]);
    }
}
