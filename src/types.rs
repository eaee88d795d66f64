use crate::{
    error::{Result, ShapleyError},
    utils::f64_to_decimal,
};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::{Display, Formatter},
};

#[cfg(feature = "borsh")]
use borsh::{BorshDeserialize, BorshSerialize};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Buyer -> set of items that buyer wants out of the bundle
pub type DemandProfile<B, I> = BTreeMap<B, BTreeSet<I>>;

/// Item -> non-negative value
pub type ItemValues<I> = BTreeMap<I, Decimal>;

/// Build a demand profile from `(buyer, items)` pairs.
///
/// Repeated items in one buyer's list collapse into a single entry. A buyer
/// listed twice keeps the union of both lists.
pub fn demand_profile<B, I, J>(entries: impl IntoIterator<Item = (B, J)>) -> DemandProfile<B, I>
where
    B: Ord,
    I: Ord,
    J: IntoIterator<Item = I>,
{
    let mut profile = DemandProfile::new();
    for (buyer, items) in entries {
        profile
            .entry(buyer)
            .or_insert_with(BTreeSet::new)
            .extend(items);
    }
    profile
}

/// Build an item value table from floats, rejecting NaN and infinities
pub fn item_values_from_f64<I: Ord>(
    entries: impl IntoIterator<Item = (I, f64)>,
) -> Result<ItemValues<I>> {
    entries
        .into_iter()
        .map(|(item, value)| f64_to_decimal(value).map(|value| (item, value)))
        .collect()
}

/// Which solver produced an allocation
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "borsh", derive(BorshSerialize, BorshDeserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllocationMethod {
    /// Full permutation enumeration
    Exact,
    /// Congestion heuristic, 1/congestion per item
    Approximate,
}

impl Display for AllocationMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AllocationMethod::Exact => write!(f, "exact"),
            AllocationMethod::Approximate => write!(f, "approximate"),
        }
    }
}

/// Amount a single buyer owes
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "borsh", derive(BorshSerialize, BorshDeserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Share {
    pub amount: Decimal,
    /// Fraction of the bundle price, in [0, 1]
    pub proportion: Decimal,
}

impl Display for Share {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "amount: {}, proportion: {}", self.amount, self.proportion)
    }
}

/// Payment schedule for one bundle: buyer -> share, sorted by buyer
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "borsh", derive(BorshSerialize, BorshDeserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation<B: Ord> {
    method: AllocationMethod,
    price: Decimal,
    shares: BTreeMap<B, Share>,
    equal_split: bool,
}

impl<B: Ord> Allocation<B> {
    pub(crate) fn new(
        method: AllocationMethod,
        price: Decimal,
        amounts: BTreeMap<B, Decimal>,
        equal_split: bool,
    ) -> Self {
        let shares = amounts
            .into_iter()
            .map(|(buyer, amount)| {
                let proportion = if price.is_zero() {
                    Decimal::ZERO
                } else {
                    amount / price
                };
                (buyer, Share { amount, proportion })
            })
            .collect();

        Self {
            method,
            price,
            shares,
            equal_split,
        }
    }

    pub fn method(&self) -> AllocationMethod {
        self.method
    }

    /// The bundle price the shares add up to
    pub fn price(&self) -> Decimal {
        self.price
    }

    /// True when every buyer was a null player and the price was split evenly.
    ///
    /// This usually means buyers registered interest without naming any item.
    pub fn is_equal_split(&self) -> bool {
        self.equal_split
    }

    pub fn shares(&self) -> &BTreeMap<B, Share> {
        &self.shares
    }

    pub fn into_shares(self) -> BTreeMap<B, Share> {
        self.shares
    }

    pub fn get(&self, buyer: &B) -> Option<&Share> {
        self.shares.get(buyer)
    }

    /// Amount owed by `buyer`, if they take part in the allocation
    pub fn amount(&self, buyer: &B) -> Option<Decimal> {
        self.shares.get(buyer).map(|share| share.amount)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&B, &Share)> {
        self.shares.iter()
    }

    pub fn len(&self) -> usize {
        self.shares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }

    /// Sum of all amounts; equals `price()` by construction
    pub fn total(&self) -> Decimal {
        self.shares.values().map(|share| share.amount).sum()
    }

    /// Convert shares into integer amounts of the smallest currency unit.
    ///
    /// `decimals` is the number of base units per whole unit as a power of ten
    /// (18 for wei). Each share is floored, then the leftover units go one at a
    /// time to the largest fractional remainders, ties resolved by buyer order,
    /// so the result sums exactly to the price in base units.
    pub fn to_base_units(&self, decimals: u32) -> Result<BTreeMap<&B, u128>> {
        let factor = pow10(decimals)?;
        let total = self
            .price
            .checked_mul(factor)
            .ok_or_else(|| ShapleyError::ArithmeticOverflow("base-unit price".to_string()))?;
        if !total.fract().is_zero() {
            return Err(ShapleyError::InvalidInput(format!(
                "price {} is not representable with {decimals} decimal places",
                self.price
            )));
        }
        let total = to_units(total)?;

        let mut units = BTreeMap::new();
        let mut remainders = Vec::with_capacity(self.shares.len());
        let mut assigned: u128 = 0;
        for (buyer, share) in &self.shares {
            let exact = share
                .amount
                .checked_mul(factor)
                .ok_or_else(|| ShapleyError::ArithmeticOverflow("base-unit share".to_string()))?;
            let floor = exact.floor();
            let floor_units = to_units(floor)?;
            assigned += floor_units;
            remainders.push((exact - floor, buyer));
            units.insert(buyer, floor_units);
        }

        let leftover = total.checked_sub(assigned).ok_or_else(|| {
            ShapleyError::ArithmeticOverflow("base-unit leftover distribution".to_string())
        })?;
        if leftover > 0 && !remainders.is_empty() {
            // Stable sort keeps buyer order among equal remainders
            remainders.sort_by(|a, b| b.0.cmp(&a.0));
            for k in 0..leftover {
                let (_, buyer) = remainders[(k % remainders.len() as u128) as usize];
                if let Some(value) = units.get_mut(buyer) {
                    *value += 1;
                }
            }
        }

        Ok(units)
    }
}

fn pow10(decimals: u32) -> Result<Decimal> {
    (0..decimals).try_fold(Decimal::ONE, |acc, _| {
        acc.checked_mul(Decimal::TEN).ok_or_else(|| {
            ShapleyError::InvalidInput(format!("{decimals} decimal places exceed decimal range"))
        })
    })
}

fn to_units(value: Decimal) -> Result<u128> {
    value
        .to_u128()
        .ok_or_else(|| ShapleyError::InvalidInput(format!("{value} is not a valid base-unit amount")))
}

/// Exact and approximate amounts for one buyer
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShareComparison {
    pub exact: Decimal,
    pub approximate: Decimal,
    /// `approximate - exact`
    pub difference: Decimal,
}

/// Side-by-side view of both solvers on the same input
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Divergence<B: Ord> {
    pub entries: BTreeMap<B, ShareComparison>,
    pub max_abs_difference: Decimal,
}

impl<B: Ord> Divergence<B> {
    pub(crate) fn new(exact: &Allocation<B>, approximate: &Allocation<B>) -> Self
    where
        B: Clone,
    {
        let entries: BTreeMap<B, ShareComparison> = exact
            .iter()
            .map(|(buyer, share)| {
                let approx = approximate.amount(buyer).unwrap_or(Decimal::ZERO);
                (
                    buyer.clone(),
                    ShareComparison {
                        exact: share.amount,
                        approximate: approx,
                        difference: approx - share.amount,
                    },
                )
            })
            .collect();
        let max_abs_difference = entries
            .values()
            .map(|c| c.difference.abs())
            .max()
            .unwrap_or(Decimal::ZERO);

        Self {
            entries,
            max_abs_difference,
        }
    }

    /// True when no buyer's amounts differ by more than `tolerance`
    pub fn within(&self, tolerance: Decimal) -> bool {
        self.max_abs_difference <= tolerance
    }
}
