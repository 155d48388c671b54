//! Linear price impact.
//!
//! `new_price = clamp(old_price * (1 + coefficient * imbalance / liquidity_scale), floor, ceiling)`
//!
//! Net buying raises the price and net selling lowers it. The result is
//! rounded to the nearest price tick, so the map is monotone non-decreasing in
//! the imbalance and a zero imbalance returns the old price unchanged.

use types::Price;

use crate::error::{Result, SimCoreError};

/// Linear impact rule with clamping bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearImpact {
    coefficient: f64,
    liquidity_scale: f64,
    floor: Price,
    ceiling: Price,
}

impl LinearImpact {
    /// Bounds are given in price units. The floor is raised to one tick.
    pub fn new(coefficient: f64, liquidity_scale: f64, floor: f64, ceiling: f64) -> Self {
        let floor = Price::from_float(floor).max(Price(1));
        Self {
            coefficient,
            liquidity_scale,
            floor,
            ceiling: Price::from_float(ceiling).max(floor),
        }
    }

    pub fn floor(&self) -> Price {
        self.floor
    }

    pub fn ceiling(&self) -> Price {
        self.ceiling
    }

    /// Compute the price that follows `price` under `imbalance`.
    ///
    /// Fails on a non-finite imbalance or if the product overflows `f64`; it
    /// never substitutes an arbitrary price for malformed input.
    pub fn apply(&self, price: Price, imbalance: f64) -> Result<Price> {
        if !imbalance.is_finite() {
            return Err(SimCoreError::NonFiniteImbalance(imbalance));
        }
        if imbalance == 0.0 {
            return Ok(price);
        }

        let relative = self.coefficient * imbalance / self.liquidity_scale;
        let next = price.to_float() * (1.0 + relative);
        if !next.is_finite() {
            return Err(SimCoreError::NonFinitePrice(next));
        }

        let clamped = next.clamp(self.floor.to_float(), self.ceiling.to_float());
        Ok(Price::from_float(clamped).clamp(self.floor, self.ceiling))
    }
}
