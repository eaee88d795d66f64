use crate::bundle_shapley::BundleShapleyBuilderError;
use thiserror::Error;

/// Error types for the bundle cost-sharing engine
#[derive(Debug, Error)]
pub enum ShapleyError {
    /// Rejected input (empty buyer set, negative price or value, unknown item, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Exact computation refused because n! orderings would be enumerated
    #[error(
        "There are too many buyers for an exact computation ({count}); the limit is {limit}. Raise the limit or use the approximate solver."
    )]
    TooManyBuyers { count: usize, limit: usize },

    /// A checked decimal operation overflowed
    #[error("Arithmetic overflow while computing {0}")]
    ArithmeticOverflow(String),

    #[error("BundleShapley configuration build error: {0}")]
    Build(#[from] BundleShapleyBuilderError),
}

/// Result type alias for Shapley operations
pub type Result<T> = std::result::Result<T, ShapleyError>;
