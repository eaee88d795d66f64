//! Bundle Shapley cost-sharing library
//!
//! Splits a fixed bundle price among buyers who each want a subset of the
//! bundle's items. The exact solver averages every buyer's marginal
//! contribution over all join orders (the Shapley value); the approximate
//! solver credits each buyer with 1/k for every item it shares with k - 1
//! others. Both rescale the result so the shares add up to the price.

mod approximate;
pub mod bundle_shapley;
pub mod coalition;
pub mod error;
mod normalize;
pub mod permutations;
mod shapley;
pub mod types;
mod utils;
pub mod validation;

// Re-export main types and functions
pub use bundle_shapley::{
    BundleShapley, BundleShapleyBuilder, BundleShapleyBuilderError, compute_approximate,
    compute_exact,
};
pub use coalition::CharacteristicFunction;
pub use error::{Result, ShapleyError};
pub use permutations::Permutations;
pub use types::{
    Allocation, AllocationMethod, DemandProfile, Divergence, ItemValues, Share, ShareComparison,
    demand_profile, item_values_from_f64,
};
pub use utils::{decimal_to_f64, f64_to_decimal, round_decimal};
pub use validation::DEFAULT_MAX_EXACT_BUYERS;
