//! Noise Trader - random limit orders near the current price.
//!
//! With probability `trade_probability` per step, picks a random side and a
//! random size in `[0, max_order_size]` and quotes a limit price within
//! `price_range` of the current price. A zero size means no order. Buys are
//! capped at 90% of what the agent's cash affords at its limit; long-only
//! agents only sell shares they hold.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use types::{AgentId, AgentKind, MarketSnapshot, Order, OrderSide, Price, Quantity};

use crate::Agent;
use crate::error::AgentError;
use crate::state::AgentState;

/// Fraction of cash a noise trader will commit to one buy.
const CASH_FRACTION: f64 = 0.9;

/// Configuration for a [`NoiseTrader`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseTraderConfig {
    /// Probability of placing an order each step (0.0 to 1.0).
    pub trade_probability: f64,
    /// Largest order size.
    pub max_order_size: u64,
    /// Maximum relative deviation of the limit price from the current price.
    pub price_range: f64,
}

impl Default for NoiseTraderConfig {
    fn default() -> Self {
        Self {
            trade_probability: 0.5,
            max_order_size: 12,
            price_range: 0.008,
        }
    }
}

/// A random trader that generates market activity.
pub struct NoiseTrader {
    id: AgentId,
    config: NoiseTraderConfig,
    state: AgentState,
    /// Private random stream (Send-compatible).
    rng: StdRng,
}

impl NoiseTrader {
    /// Create a NoiseTrader with its own seeded random stream.
    pub fn new(id: AgentId, config: NoiseTraderConfig, state: AgentState, seed: u64) -> Self {
        Self {
            id,
            config,
            state,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn quote(&mut self, reference: Price) -> Price {
        let range = self.config.price_range;
        let deviation = if range > 0.0 {
            self.rng.random_range(-range..=range)
        } else {
            0.0
        };
        Price::from_float(reference.to_float() * (1.0 + deviation)).max(Price(1))
    }
}

impl Agent for NoiseTrader {
    fn id(&self) -> AgentId {
        self.id
    }

    fn kind(&self) -> AgentKind {
        AgentKind::NoiseTrader
    }

    fn decide(&mut self, snapshot: &MarketSnapshot) -> Result<Option<Order>, AgentError> {
        // A uniform draw in [0, 1) never falls below a probability of 0.
        if self.rng.random::<f64>() >= self.config.trade_probability {
            return Ok(None);
        }

        let side = if self.rng.random_bool(0.5) {
            OrderSide::Buy
        } else {
            OrderSide::Sell
        };
        let size = self.rng.random_range(0..=self.config.max_order_size);
        let limit = self.quote(snapshot.price);

        let quantity = match side {
            OrderSide::Buy => {
                let budget = (self.state.cash().to_float() * CASH_FRACTION / limit.to_float())
                    .floor()
                    .max(0.0) as u64;
                size.min(budget)
            }
            OrderSide::Sell => {
                let capacity = self
                    .state
                    .risk_limits()
                    .sell_capacity(self.state.position());
                size.min(capacity)
            }
        };

        if quantity == 0 {
            return Ok(None);
        }

        self.state.record_order();
        Ok(Some(Order::limit(self.id, side, limit, Quantity(quantity))))
    }

    fn name(&self) -> &str {
        "NoiseTrader"
    }

    fn state(&self) -> &AgentState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AgentState {
        &mut self.state
    }
}
