//! Read-only market view handed to agents each step.

use crate::ids::Tick;
use crate::money::Price;
use serde::{Deserialize, Serialize};

/// Immutable snapshot of market state taken before agents decide.
///
/// `step` is the step about to be executed (the first decision sees step 1).
/// `last_*` fields describe the previous step and are zero before any trading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub step: Tick,
    /// Current trade price.
    pub price: Price,
    /// Current fundamental value.
    pub fundamental_value: Price,
    /// Net signed intent of the previous step.
    pub last_imbalance: i64,
    /// Shares executed by agents in the previous step.
    pub last_volume: u64,
}

impl MarketSnapshot {
    /// Snapshot of a market that has not traded yet.
    pub fn initial(price: Price, fundamental_value: Price) -> Self {
        Self {
            step: 1,
            price,
            fundamental_value,
            last_imbalance: 0,
            last_volume: 0,
        }
    }

    /// Relative gap `(fundamental - price) / price`. Positive means undervalued.
    pub fn relative_mispricing(&self) -> f64 {
        let price = self.price.to_float();
        (self.fundamental_value.to_float() - price) / price
    }
}
