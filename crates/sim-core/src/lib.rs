//! Sim-core: price formation for the market simulation.
//!
//! This crate provides the serialized half of each step:
//! - Order aggregation into a signed order-flow imbalance
//! - Linear price impact with floor/ceiling clamping
//! - The fundamental-value stochastic process
//! - [`Market`], which owns price and fundamental value and applies both atomically

mod aggregator;
mod error;
mod fundamental;
mod impact;
mod market;

pub use aggregator::{AggregatedFlow, aggregate};
pub use error::{Result, SimCoreError};
pub use fundamental::FundamentalProcess;
pub use impact::LinearImpact;
pub use market::{Market, MarketConfig, MarketUpdate};
