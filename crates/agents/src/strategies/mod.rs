//! Trading strategy implementations.

mod chartist;
mod fundamentalist;
mod noise_trader;

pub use chartist::{Chartist, ChartistConfig};
pub use fundamentalist::{Fundamentalist, FundamentalistConfig};
pub use noise_trader::{NoiseTrader, NoiseTraderConfig};
