use crate::{
    approximate::congestion_scores,
    coalition::CharacteristicFunction,
    error::Result,
    normalize::{Normalized, normalize},
    shapley::shapley_values,
    types::{Allocation, AllocationMethod, DemandProfile, Divergence, ItemValues},
    validation::{DEFAULT_MAX_EXACT_BUYERS, check_exact_complexity, check_inputs},
};
use derive_builder::Builder;
use rust_decimal::Decimal;
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Debug,
};
use tracing::debug;

/// Price-sharing engine for one bundle.
///
/// ```
/// use bundle_shapley::{BundleShapleyBuilder, demand_profile};
/// use rust_decimal::dec;
///
/// let allocation = BundleShapleyBuilder::default()
///     .price(dec!(150))
///     .demand(demand_profile(vec![("alice", vec![1u32]), ("bob", vec![1])]))
///     .build()
///     .unwrap()
///     .compute_exact()
///     .unwrap();
///
/// assert_eq!(allocation.amount(&"alice"), Some(dec!(75)));
/// ```
#[derive(Debug, Clone, Builder)]
pub struct BundleShapley<B: Ord + Clone, I: Ord + Clone> {
    price: Decimal,
    demand: DemandProfile<B, I>,
    #[builder(default, setter(strip_option))]
    item_values: Option<ItemValues<I>>,
    /// Items the bundle is made of; when set, demand outside it is rejected
    #[builder(default, setter(strip_option))]
    bundle_items: Option<BTreeSet<I>>,
    #[builder(default = "DEFAULT_MAX_EXACT_BUYERS")]
    max_exact_buyers: usize,
    #[builder(default = "true")]
    parallel: bool,
}

impl<B, I> BundleShapley<B, I>
where
    B: Ord + Clone + Debug,
    I: Ord + Clone + Debug,
{
    pub fn compute(&self, method: AllocationMethod) -> Result<Allocation<B>> {
        match method {
            AllocationMethod::Exact => self.compute_exact(),
            AllocationMethod::Approximate => self.compute_approximate(),
        }
    }

    /// Exact Shapley shares, rejected above `max_exact_buyers` buyers
    pub fn compute_exact(&self) -> Result<Allocation<B>> {
        exact(
            self.price,
            &self.demand,
            self.item_values.as_ref(),
            self.bundle_items.as_ref(),
            self.max_exact_buyers,
            self.parallel,
        )
    }

    /// Congestion shares in linear time, for any number of buyers.
    ///
    /// The value table is validated but does not weight the shares.
    pub fn compute_approximate(&self) -> Result<Allocation<B>> {
        approximate(
            self.price,
            &self.demand,
            self.item_values.as_ref(),
            self.bundle_items.as_ref(),
        )
    }

    /// Run both solvers and report how far apart they land per buyer
    pub fn compare(&self) -> Result<Divergence<B>> {
        let exact = self.compute_exact()?;
        let approximate = self.compute_approximate()?;
        let divergence = Divergence::new(&exact, &approximate);
        debug!(
            max_abs_difference = %divergence.max_abs_difference,
            "compared exact and approximate allocations"
        );
        Ok(divergence)
    }
}

/// Exact Shapley shares of `price`, using the default buyer limit
pub fn compute_exact<B, I>(
    price: Decimal,
    demand: &DemandProfile<B, I>,
    item_values: Option<&ItemValues<I>>,
) -> Result<Allocation<B>>
where
    B: Ord + Clone,
    I: Ord + Debug,
{
    exact(price, demand, item_values, None, DEFAULT_MAX_EXACT_BUYERS, true)
}

/// Congestion shares of `price`; `item_values` is validated only
pub fn compute_approximate<B, I>(
    price: Decimal,
    demand: &DemandProfile<B, I>,
    item_values: Option<&ItemValues<I>>,
) -> Result<Allocation<B>>
where
    B: Ord + Clone,
    I: Ord + Debug,
{
    approximate(price, demand, item_values, None)
}

fn exact<B, I>(
    price: Decimal,
    demand: &DemandProfile<B, I>,
    item_values: Option<&ItemValues<I>>,
    bundle_items: Option<&BTreeSet<I>>,
    max_buyers: usize,
    parallel: bool,
) -> Result<Allocation<B>>
where
    B: Ord + Clone,
    I: Ord + Debug,
{
    check_inputs(price, demand, item_values, bundle_items)?;
    check_exact_complexity(demand.len(), max_buyers)?;

    let game = CharacteristicFunction::from_profile(demand, price, item_values)?;
    let raw = shapley_values(&game, parallel)?;

    allocate(AllocationMethod::Exact, price, demand, raw)
}

fn approximate<B, I>(
    price: Decimal,
    demand: &DemandProfile<B, I>,
    item_values: Option<&ItemValues<I>>,
    bundle_items: Option<&BTreeSet<I>>,
) -> Result<Allocation<B>>
where
    B: Ord + Clone,
    I: Ord + Debug,
{
    check_inputs(price, demand, item_values, bundle_items)?;

    let raw = congestion_scores(demand)?;

    allocate(AllocationMethod::Approximate, price, demand, raw)
}

/// Pair raw values with their buyers and scale them to the price
fn allocate<B: Ord + Clone, I>(
    method: AllocationMethod,
    price: Decimal,
    demand: &DemandProfile<B, I>,
    raw: Vec<Decimal>,
) -> Result<Allocation<B>> {
    let raw: BTreeMap<B, Decimal> = demand.keys().cloned().zip(raw).collect();
    let Normalized {
        amounts,
        equal_split,
    } = normalize(raw, price)?;

    Ok(Allocation::new(method, price, amounts, equal_split))
}
