//! Agents crate: trading agents for the market simulation.
//!
//! This crate provides:
//! - The [`Agent`] trait every strategy implements
//! - [`AgentState`], the ledger account (cash, position, entry price, risk limits)
//! - Concrete strategies in [`strategies`]
//!
//! # Architecture
//! Each step an agent receives an immutable [`types::MarketSnapshot`] and returns
//! at most one order intent. It may update private memory while deciding but
//! never touches market state. The engine clips and executes intents, then
//! writes the result back through [`AgentState`].
//!
//! # Available Strategies
//! - [`strategies::Fundamentalist`] - Trades toward the fundamental value
//! - [`strategies::Chartist`] - Follows the moving-average trend of recent prices
//! - [`strategies::NoiseTrader`] - Random limit orders near the current price

mod error;
mod state;
pub mod strategies;
mod traits;

pub use error::AgentError;
pub use state::AgentState;
pub use strategies::{
    Chartist, ChartistConfig, Fundamentalist, FundamentalistConfig, NoiseTrader,
    NoiseTraderConfig,
};
pub use traits::Agent;
