//! Fundamental-value process.
//!
//! A bounded multiplicative random walk: each step draws a standard normal
//! shock, clamps it to `±shock_bound`, and moves the value by
//! `volatility * shock` in relative terms. The value never falls below the
//! configured floor.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use types::Price;

use crate::error::{Result, SimCoreError};

/// Seeded fundamental-value process.
#[derive(Debug, Clone)]
pub struct FundamentalProcess {
    value: Price,
    volatility: f64,
    shock_bound: f64,
    floor: Price,
    rng: StdRng,
}

impl FundamentalProcess {
    pub fn new(initial: Price, volatility: f64, shock_bound: f64, floor: f64, seed: u64) -> Self {
        Self {
            value: initial,
            volatility,
            shock_bound,
            floor: Price::from_float(floor).max(Price(1)),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Current value.
    pub fn value(&self) -> Price {
        self.value
    }

    /// Draw the next value without committing it.
    ///
    /// The random stream advances even if the caller discards the result.
    pub fn propose(&mut self) -> Result<Price> {
        if self.volatility == 0.0 {
            return Ok(self.value);
        }

        let shock: f64 = self.rng.sample(StandardNormal);
        let shock = shock.clamp(-self.shock_bound, self.shock_bound);
        let next = self.value.to_float() * (1.0 + self.volatility * shock);
        if !next.is_finite() {
            return Err(SimCoreError::NonFiniteFundamental(next));
        }

        Ok(Price::from_float(next).max(self.floor))
    }

    /// Commit a value returned by [`propose`](Self::propose).
    pub fn commit(&mut self, value: Price) {
        self.value = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_volatility_is_constant() {
        let mut process = FundamentalProcess::new(Price::from_float(80.0), 0.0, 3.0, 0.01, 7);
        for _ in 0..50 {
            let next = process.propose().unwrap();
            process.commit(next);
        }
        assert_eq!(process.value(), Price::from_float(80.0));
    }

    #[test]
    fn test_same_seed_same_path() {
        let mut a = FundamentalProcess::new(Price::from_float(100.0), 0.02, 3.0, 0.01, 42);
        let mut b = FundamentalProcess::new(Price::from_float(100.0), 0.02, 3.0, 0.01, 42);
        for _ in 0..100 {
            let (na, nb) = (a.propose().unwrap(), b.propose().unwrap());
            assert_eq!(na, nb);
            a.commit(na);
            b.commit(nb);
        }
    }

    #[test]
    fn test_step_is_bounded() {
        let mut process = FundamentalProcess::new(Price::from_float(100.0), 0.01, 2.0, 0.01, 3);
        for _ in 0..1_000 {
            let before = process.value().to_float();
            let next = process.propose().unwrap();
            let change = (next.to_float() - before).abs() / before;
            assert!(change <= 0.02 + 1e-4, "relative move {change} exceeds bound");
            process.commit(next);
        }
    }

    #[test]
    fn test_floor_holds() {
        let mut process = FundamentalProcess::new(Price::from_float(1.0), 0.9, 3.0, 0.5, 11);
        for _ in 0..500 {
            let next = process.propose().unwrap();
            assert!(next >= Price::from_float(0.5));
            process.commit(next);
        }
    }
}
