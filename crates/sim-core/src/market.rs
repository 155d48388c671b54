//! Market state: price, fundamental value, and their per-step update.
//!
//! A step's update is computed with [`Market::stage`] and only written with
//! [`Market::commit`], so a failure anywhere between the two leaves the
//! market exactly as it was after the last completed step.

use serde::{Deserialize, Serialize};
use tracing::trace;
use types::{MarketSnapshot, Price, Tick};

use crate::error::Result;
use crate::fundamental::FundamentalProcess;
use crate::impact::LinearImpact;

// =============================================================================
// Configuration
// =============================================================================

/// Price-formation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Relative price move per `liquidity_scale` shares of imbalance.
    pub impact_coefficient: f64,
    /// Shares of imbalance that move the price by `impact_coefficient`.
    pub liquidity_scale: f64,
    /// Lowest price the impact rule may produce.
    pub price_floor: f64,
    /// Highest price the impact rule may produce.
    pub price_ceiling: f64,
    /// Lowest fundamental value.
    pub fundamental_floor: f64,
    /// Fundamental shocks are clamped to this many standard deviations.
    pub shock_bound: f64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            impact_coefficient: 0.5,
            liquidity_scale: 1_000.0,
            price_floor: 0.01,
            price_ceiling: 1_000_000.0,
            fundamental_floor: 0.01,
            shock_bound: 3.0,
        }
    }
}

impl MarketConfig {
    pub fn with_impact(mut self, coefficient: f64, liquidity_scale: f64) -> Self {
        self.impact_coefficient = coefficient;
        self.liquidity_scale = liquidity_scale;
        self
    }

    pub fn with_price_bounds(mut self, floor: f64, ceiling: f64) -> Self {
        self.price_floor = floor;
        self.price_ceiling = ceiling;
        self
    }
}

// =============================================================================
// Market
// =============================================================================

/// Proposed end-of-step market state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketUpdate {
    pub step: Tick,
    pub price: Price,
    pub fundamental_value: Price,
}

/// Single-asset market.
#[derive(Debug, Clone)]
pub struct Market {
    step: Tick,
    price: Price,
    impact: LinearImpact,
    fundamental: FundamentalProcess,
    last_imbalance: i64,
    last_volume: u64,
}

impl Market {
    pub fn new(
        config: &MarketConfig,
        initial_price: Price,
        initial_fundamental: Price,
        volatility: f64,
        seed: u64,
    ) -> Self {
        Self {
            step: 0,
            price: initial_price,
            impact: LinearImpact::new(
                config.impact_coefficient,
                config.liquidity_scale,
                config.price_floor,
                config.price_ceiling,
            ),
            fundamental: FundamentalProcess::new(
                initial_fundamental,
                volatility,
                config.shock_bound,
                config.fundamental_floor,
                seed,
            ),
            last_imbalance: 0,
            last_volume: 0,
        }
    }

    /// Last completed step (0 before the first).
    pub fn step(&self) -> Tick {
        self.step
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn fundamental_value(&self) -> Price {
        self.fundamental.value()
    }

    pub fn impact(&self) -> &LinearImpact {
        &self.impact
    }

    /// Read-only view for the next step's decisions.
    pub fn snapshot(&self) -> MarketSnapshot {
        MarketSnapshot {
            step: self.step + 1,
            price: self.price,
            fundamental_value: self.fundamental.value(),
            last_imbalance: self.last_imbalance,
            last_volume: self.last_volume,
        }
    }

    /// Evolve the fundamental value, then apply price impact for `imbalance`.
    ///
    /// Nothing observable changes until [`commit`](Self::commit).
    pub fn stage(&mut self, imbalance: f64) -> Result<MarketUpdate> {
        let fundamental_value = self.fundamental.propose()?;
        let price = self.impact.apply(self.price, imbalance)?;
        trace!(
            step = self.step + 1,
            imbalance,
            %price,
            %fundamental_value,
            "Staged market update"
        );
        Ok(MarketUpdate {
            step: self.step + 1,
            price,
            fundamental_value,
        })
    }

    /// Write a staged update and the step's executed flow.
    pub fn commit(&mut self, update: MarketUpdate, imbalance: i64, volume: u64) {
        self.step = update.step;
        self.price = update.price;
        self.fundamental.commit(update.fundamental_value);
        self.last_imbalance = imbalance;
        self.last_volume = volume;
    }
}
