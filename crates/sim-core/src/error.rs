//! Error types for sim-core operations.

use thiserror::Error;

/// Result type for sim-core operations.
pub type Result<T> = std::result::Result<T, SimCoreError>;

/// Malformed or out-of-range market state. Always fatal to a run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimCoreError {
    #[error("order-flow imbalance is not finite: {0}")]
    NonFiniteImbalance(f64),

    #[error("price computation produced a non-finite value: {0}")]
    NonFinitePrice(f64),

    #[error("fundamental value computation produced a non-finite value: {0}")]
    NonFiniteFundamental(f64),

    #[error("arithmetic overflow while {0}")]
    Overflow(&'static str),
}
