//! Core types for the market simulation.
//!
//! This crate provides the shared data types used across the workspace:
//! fixed-point monetary values, agent identifiers, order intents, fills,
//! risk limits, market snapshots, and the per-step history records that
//! the engine hands to external analysis.

pub mod config;
pub mod ids;
pub mod market_data;
pub mod money;
pub mod order;
pub mod record;

pub use config::{RiskLimits, RiskViolation};
pub use ids::{AgentId, AgentKind, LIQUIDITY_PROVIDER_ID, PRICE_SCALE, Tick};
pub use market_data::MarketSnapshot;
pub use money::{Cash, Price, Quantity};
pub use order::{Fill, Order, OrderSide};
pub use record::{AgentSummary, KindTotals, StepRecord};
