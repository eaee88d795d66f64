use crate::{
    error::{Result, ShapleyError},
    types::{DemandProfile, ItemValues},
};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Coalition value function v(S) for one bundle.
///
/// Buyers are addressed by their index in the profile's key order and items by
/// a dense index over the union of demanded items. v(S) sums the value of every
/// item demanded by at least one member of S, counting shared items once.
#[derive(Debug, Clone)]
pub struct CharacteristicFunction {
    demand: Vec<Vec<usize>>,
    values: Vec<Decimal>,
    grand_value: Decimal,
}

impl CharacteristicFunction {
    /// Build from an explicit value table. Demanded items missing from the
    /// table are worth nothing.
    pub fn new<B: Ord, I: Ord>(demand: &DemandProfile<B, I>, values: &ItemValues<I>) -> Result<Self> {
        Self::build(demand, |item| {
            values.get(item).copied().unwrap_or(Decimal::ZERO)
        })
    }

    /// Build with the default table: `price` split evenly across every item
    /// demanded by any buyer.
    pub fn with_equal_values<B: Ord, I: Ord>(
        demand: &DemandProfile<B, I>,
        price: Decimal,
    ) -> Result<Self> {
        let n_items = demanded_items(demand).len();
        let per_item = if n_items == 0 {
            Decimal::ZERO
        } else {
            price
                .checked_div(Decimal::from(n_items))
                .ok_or_else(|| ShapleyError::ArithmeticOverflow("default item value".to_string()))?
        };
        Self::build(demand, |_| per_item)
    }

    /// Explicit table when given, equal split of `price` otherwise
    pub fn from_profile<B: Ord, I: Ord>(
        demand: &DemandProfile<B, I>,
        price: Decimal,
        item_values: Option<&ItemValues<I>>,
    ) -> Result<Self> {
        match item_values {
            Some(values) => Self::new(demand, values),
            None => Self::with_equal_values(demand, price),
        }
    }

    fn build<B: Ord, I: Ord>(
        demand: &DemandProfile<B, I>,
        value_of: impl Fn(&I) -> Decimal,
    ) -> Result<Self> {
        let index = demanded_items(demand);

        let mut values = vec![Decimal::ZERO; index.len()];
        for (item, &idx) in &index {
            values[idx] = value_of(*item);
        }

        // Every coalition value is bounded by the grand coalition's, so a
        // checked sum here rules out overflow in later evaluations.
        let grand_value = values
            .iter()
            .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))
            .ok_or_else(|| ShapleyError::ArithmeticOverflow("grand coalition value".to_string()))?;

        let demand = demand
            .values()
            .map(|items| items.iter().map(|item| index[item]).collect())
            .collect();

        Ok(Self {
            demand,
            values,
            grand_value,
        })
    }

    pub fn buyer_count(&self) -> usize {
        self.demand.len()
    }

    /// Number of distinct demanded items
    pub fn item_count(&self) -> usize {
        self.values.len()
    }

    /// v(N), the value of the coalition of all buyers
    pub fn grand_value(&self) -> Decimal {
        self.grand_value
    }

    /// v(S) for the buyers at the given indices.
    ///
    /// Fails with `InvalidInput` when an index is not below `buyer_count()`.
    pub fn value(&self, coalition: &[usize]) -> Result<Decimal> {
        if let Some(&buyer) = coalition.iter().find(|&&buyer| buyer >= self.buyer_count()) {
            return Err(ShapleyError::InvalidInput(format!(
                "buyer index {buyer} out of range for {} buyers",
                self.buyer_count()
            )));
        }
        let mut coverage = Coverage::new(self.item_count());
        Ok(coalition
            .iter()
            .map(|&buyer| self.join(&mut coverage, buyer))
            .sum())
    }

    /// Add `buyer` to the coalition tracked by `coverage` and return the
    /// marginal contribution v(S ∪ {buyer}) − v(S).
    pub(crate) fn join(&self, coverage: &mut Coverage, buyer: usize) -> Decimal {
        let mut marginal = Decimal::ZERO;
        for &item in &self.demand[buyer] {
            if coverage.cover(item) {
                marginal += self.values[item];
            }
        }
        marginal
    }
}

/// Items already demanded by the coalition being walked.
///
/// Cleared in O(1) by bumping the epoch instead of zeroing the marks.
#[derive(Debug)]
pub(crate) struct Coverage {
    marks: Vec<u64>,
    epoch: u64,
}

impl Coverage {
    pub(crate) fn new(n_items: usize) -> Self {
        Self {
            marks: vec![0; n_items],
            epoch: 1,
        }
    }

    /// Start an empty coalition
    pub(crate) fn clear(&mut self) {
        self.epoch += 1;
    }

    /// Mark `item` as covered, returning whether it was newly covered
    fn cover(&mut self, item: usize) -> bool {
        if self.marks[item] == self.epoch {
            false
        } else {
            self.marks[item] = self.epoch;
            true
        }
    }
}

/// Dense index over the union of demanded items, numbered by first appearance
fn demanded_items<B, I: Ord>(demand: &DemandProfile<B, I>) -> BTreeMap<&I, usize> {
    let mut index = BTreeMap::new();
    for item in demand.values().flatten() {
        let next = index.len();
        index.entry(item).or_insert(next);
    }
    index
}
