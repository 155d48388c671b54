//! Chartist - follows the trend of its own recent price memory.
//!
//! Keeps the last `memory` observed prices. Once the window is full it
//! combines a short/long moving-average crossover with short-term momentum,
//! damps the result by relative volatility, and scales it by
//! `confidence * sensitivity`:
//!
//! ```text
//! ma_signal = (short_ma - long_ma) / long_ma
//! momentum  = last / price_two_steps_back - 1
//! trend     = clip((ma_signal + 1.5 * momentum) * (1 - std / mean) * confidence * sensitivity, -1, 1)
//! ```
//!
//! The order size is `cash * |trend| * position_scale / price`.

use quant::RollingWindow;
use serde::{Deserialize, Serialize};
use types::{AgentId, AgentKind, MarketSnapshot, Order, OrderSide, Quantity};

use crate::Agent;
use crate::error::{AgentError, ensure_finite};
use crate::state::AgentState;

/// Weight of momentum relative to the moving-average signal.
const MOMENTUM_WEIGHT: f64 = 1.5;

/// Configuration for a [`Chartist`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartistConfig {
    /// Number of past prices remembered (long moving-average window).
    pub memory: usize,
    /// Responsiveness to the trend signal.
    pub sensitivity: f64,
    /// Trust in the trend signal (0.0 to 1.0).
    pub confidence: f64,
    /// Minimum `|trend|` that triggers an order.
    pub signal_threshold: f64,
    /// Multiplier from trend strength to fraction of cash traded.
    pub position_scale: f64,
    /// Largest fraction of cash committed to a single buy.
    pub cash_fraction: f64,
}

impl Default for ChartistConfig {
    fn default() -> Self {
        Self {
            memory: 8,
            sensitivity: 0.4,
            confidence: 0.8,
            signal_threshold: 0.02,
            position_scale: 3.0,
            cash_fraction: 0.7,
        }
    }
}

/// Trend follower with a private rolling price window.
pub struct Chartist {
    id: AgentId,
    config: ChartistConfig,
    state: AgentState,
    prices: RollingWindow,
}

impl Chartist {
    pub fn new(id: AgentId, config: ChartistConfig, state: AgentState) -> Self {
        let prices = RollingWindow::new(config.memory);
        Self {
            id,
            config,
            state,
            prices,
        }
    }

    /// Trend signal in `[-1, 1]`, or `None` until the window is full.
    pub fn trend(&self) -> Option<f64> {
        if !self.prices.is_full() {
            return None;
        }

        let short_window = (self.config.memory / 5).max(2);
        let long_ma = self.prices.mean()?;
        let short_ma = self.prices.tail_mean(short_window)?;
        let last = self.prices.last()?;
        let reference = self.prices.back(self.prices.len().min(3) - 1)?;
        let std = self.prices.std_dev().unwrap_or(0.0);

        let ma_signal = (short_ma - long_ma) / long_ma;
        let momentum = last / reference - 1.0;
        let volatility = std / long_ma;

        let trend = (ma_signal + MOMENTUM_WEIGHT * momentum)
            * (1.0 - volatility)
            * self.config.confidence
            * self.config.sensitivity;
        Some(trend.clamp(-1.0, 1.0))
    }
}

impl Agent for Chartist {
    fn id(&self) -> AgentId {
        self.id
    }

    fn kind(&self) -> AgentKind {
        AgentKind::Chartist
    }

    fn decide(&mut self, snapshot: &MarketSnapshot) -> Result<Option<Order>, AgentError> {
        let price = snapshot.price.to_float();
        self.prices.push(price);

        let Some(trend) = self.trend() else {
            return Ok(None);
        };
        // `clamp` passes NaN through.
        let trend = ensure_finite("Chartist", "trend", trend)?;
        if trend.abs() < self.config.signal_threshold {
            return Ok(None);
        }

        let cash = self.state.cash().to_float().max(0.0);
        let raw = ensure_finite(
            "Chartist",
            "order size",
            cash * trend.abs() * self.config.position_scale / price,
        )?;
        let desired = ((raw + 1e-9).floor() as u64).max(1);

        let limits = self.state.risk_limits();
        let position = self.state.position();

        let (side, quantity) = if trend > 0.0 {
            let headroom = limits.buy_headroom(position);
            let budget = (cash * self.config.cash_fraction / price).floor();
            if headroom == 0 || budget < 1.0 {
                return Ok(None);
            }
            (OrderSide::Buy, desired.min(headroom).min(budget as u64))
        } else {
            let capacity = limits.sell_capacity(position);
            if capacity == 0 {
                return Ok(None);
            }
            (OrderSide::Sell, desired.min(capacity))
        };

        self.state.record_order();
        Ok(Some(Order::market(self.id, side, Quantity(quantity))))
    }

    fn name(&self) -> &str {
        "Chartist"
    }

    fn state(&self) -> &AgentState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AgentState {
        &mut self.state
    }
}
