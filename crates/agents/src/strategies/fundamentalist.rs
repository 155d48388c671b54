//! Fundamentalist - trades the gap between price and fundamental value.
//!
//! Buys when the asset is undervalued and sells when it is overvalued. The
//! order size is `reaction_speed * confidence * |gap| * cash / price`, where
//! `gap = (fundamental - price) / price`, and at least one share.
//!
//! # Large gaps
//! Once `|gap|` reaches `liquidation_gap` the agent moves all the way in one
//! step: it sells its whole long position, or buys as much as its position
//! limit and cash fraction allow. A long-only agent facing a persistently
//! overvalued market therefore empties its position and then stays inactive
//! until the gap reverses.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use types::{AgentId, AgentKind, MarketSnapshot, Order, OrderSide, Quantity};

use crate::Agent;
use crate::error::{AgentError, ensure_finite};
use crate::state::AgentState;

/// Configuration for a [`Fundamentalist`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalistConfig {
    /// Trust in the fundamental estimate (0.0 to 1.0).
    pub confidence: f64,
    /// Fraction of the gap acted on per step.
    pub reaction_speed: f64,
    /// Relative gap below which the agent holds.
    pub hold_band: f64,
    /// Relative gap at which the agent liquidates or maximizes in one step.
    pub liquidation_gap: f64,
    /// Relative noise on the fundamental estimate, scaled by `1 - confidence`.
    pub valuation_noise: f64,
    /// Largest fraction of cash committed to a single buy.
    pub cash_fraction: f64,
}

impl Default for FundamentalistConfig {
    fn default() -> Self {
        Self {
            confidence: 0.75,
            reaction_speed: 0.6,
            hold_band: 0.002,
            liquidation_gap: 0.5,
            valuation_noise: 0.0,
            cash_fraction: 0.7,
        }
    }
}

/// Value investor reacting to mispricing.
pub struct Fundamentalist {
    id: AgentId,
    config: FundamentalistConfig,
    state: AgentState,
    rng: StdRng,
}

impl Fundamentalist {
    pub fn new(id: AgentId, config: FundamentalistConfig, state: AgentState, seed: u64) -> Self {
        Self {
            id,
            config,
            state,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Fundamental value as perceived this step.
    fn estimate(&mut self, snapshot: &MarketSnapshot) -> f64 {
        let fundamental = snapshot.fundamental_value.to_float();
        let sigma = self.config.valuation_noise * (1.0 - self.config.confidence);
        if sigma <= 0.0 {
            return fundamental;
        }
        let z: f64 = self.rng.sample(StandardNormal);
        fundamental * (1.0 + sigma * z)
    }

    fn sell_quantity(&self, gap: f64, desired: u64) -> Option<u64> {
        let capacity = self
            .state
            .risk_limits()
            .sell_capacity(self.state.position());
        if capacity == 0 {
            return None;
        }

        let held = self.state.position().max(0).unsigned_abs();
        if gap.abs() >= self.config.liquidation_gap && held > 0 {
            Some(held.min(capacity))
        } else {
            Some(desired.min(capacity))
        }
    }

    fn buy_quantity(&self, gap: f64, desired: u64, price: f64) -> Option<u64> {
        let headroom = self
            .state
            .risk_limits()
            .buy_headroom(self.state.position());
        if headroom == 0 {
            return None;
        }

        let cash = self.state.cash().to_float();
        let budget = (cash * self.config.cash_fraction / price).floor();
        if budget < 1.0 {
            return None;
        }
        let ceiling = headroom.min(budget as u64);

        if gap.abs() >= self.config.liquidation_gap {
            Some(ceiling)
        } else {
            Some(desired.min(ceiling))
        }
    }
}

impl Agent for Fundamentalist {
    fn id(&self) -> AgentId {
        self.id
    }

    fn kind(&self) -> AgentKind {
        AgentKind::Fundamentalist
    }

    fn decide(&mut self, snapshot: &MarketSnapshot) -> Result<Option<Order>, AgentError> {
        let price = snapshot.price.to_float();
        let estimate = self.estimate(snapshot);
        let estimate = ensure_finite("Fundamentalist", "fundamental estimate", estimate)?;
        let gap = ensure_finite("Fundamentalist", "mispricing", (estimate - price) / price)?;

        if gap.abs() < self.config.hold_band {
            return Ok(None);
        }

        let cash = self.state.cash().to_float().max(0.0);
        let raw = self.config.reaction_speed * self.config.confidence * gap.abs() * cash / price;
        let raw = ensure_finite("Fundamentalist", "order size", raw)?;
        // Tolerate float round-off just below a whole share.
        let desired = ((raw + 1e-9).floor() as u64).max(1);

        let (side, quantity) = if gap > 0.0 {
            (OrderSide::Buy, self.buy_quantity(gap, desired, price))
        } else {
            (OrderSide::Sell, self.sell_quantity(gap, desired))
        };

        Ok(quantity.map(|q| {
            self.state.record_order();
            Order::market(self.id, side, Quantity(q))
        }))
    }

    fn name(&self) -> &str {
        "Fundamentalist"
    }

    fn state(&self) -> &AgentState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AgentState {
        &mut self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{Cash, Price, RiskLimits};

    fn agent(confidence: f64, position: i64, cash: f64) -> Fundamentalist {
        let config = FundamentalistConfig {
            confidence,
            ..Default::default()
        };
        let state = AgentState::new(
            Cash::from_float(cash),
            position,
            Price::from_float(100.0),
            RiskLimits::default(),
        );
        Fundamentalist::new(AgentId(1), config, state, 1)
    }

    fn snapshot(price: f64, fundamental: f64) -> MarketSnapshot {
        MarketSnapshot::initial(Price::from_float(price), Price::from_float(fundamental))
    }

    #[test]
    fn test_overvalued_sells() {
        let mut f = agent(0.5, 100, 10_000.0);
        let order = f.decide(&snapshot(100.0, 80.0)).unwrap().unwrap();
        assert_eq!(order.side, OrderSide::Sell);
        // 0.6 * 0.5 * 0.2 * 10_000 / 100
        assert_eq!(order.quantity, Quantity(6));
        assert_eq!(order.limit_price, None);
        assert_eq!(f.state().orders_placed(), 1);
    }

    #[test]
    fn test_undervalued_buys() {
        let mut f = agent(0.75, 10, 10_000.0);
        let order = f.decide(&snapshot(100.0, 110.0)).unwrap().unwrap();
        assert_eq!(order.side, OrderSide::Buy);
        // 0.6 * 0.75 * 0.1 * 100 = 4.5
        assert_eq!(order.quantity, Quantity(4));
    }

    #[test]
    fn test_holds_inside_band() {
        let mut f = agent(0.75, 10, 10_000.0);
        assert_eq!(f.decide(&snapshot(100.0, 100.1)).unwrap(), None);
    }

    #[test]
    fn test_small_gap_trades_at_least_one_share() {
        let mut f = agent(0.75, 10, 100.0);
        let order = f.decide(&snapshot(100.0, 99.0)).unwrap().unwrap();
        assert_eq!(order.quantity, Quantity(1));
    }

    #[test]
    fn test_large_gap_liquidates_then_goes_inactive() {
        let mut f = agent(0.75, 40, 10_000.0);
        let order = f.decide(&snapshot(100.0, 40.0)).unwrap().unwrap();
        assert_eq!(order.side, OrderSide::Sell);
        assert_eq!(order.quantity, Quantity(40));

        let price = Price::from_float(100.0);
        f.state_mut()
            .apply_fill(-40, price, price.checked_notional(-40).unwrap());
        assert_eq!(f.decide(&snapshot(100.0, 40.0)).unwrap(), None);
    }

    #[test]
    fn test_large_undervaluation_buys_to_limit() {
        let mut f = agent(0.75, 30, 100_000.0);
        let order = f.decide(&snapshot(50.0, 100.0)).unwrap().unwrap();
        assert_eq!(order.side, OrderSide::Buy);
        assert_eq!(order.quantity, Quantity(120));
    }

    #[test]
    fn test_large_undervaluation_capped_by_cash() {
        let mut f = agent(0.75, 0, 1_000.0);
        let order = f.decide(&snapshot(50.0, 100.0)).unwrap().unwrap();
        // 0.7 * 1_000 / 50
        assert_eq!(order.quantity, Quantity(14));
    }

    #[test]
    fn test_unbounded_limits_do_not_overflow() {
        let limits = RiskLimits::new(u64::MAX, 0.1, 0.2).with_short_selling(true);
        let state = AgentState::new(
            Cash::from_float(10_000.0),
            30,
            Price::from_float(100.0),
            limits,
        );
        let mut f = Fundamentalist::new(AgentId(1), FundamentalistConfig::default(), state, 1);

        let sell = f.decide(&snapshot(100.0, 90.0)).unwrap().unwrap();
        assert_eq!(sell.side, OrderSide::Sell);
        let buy = f.decide(&snapshot(100.0, 110.0)).unwrap().unwrap();
        assert_eq!(buy.side, OrderSide::Buy);
    }

    #[test]
    fn test_buy_respects_cash_fraction() {
        let mut f = agent(1.0, 0, 1_000.0);
        let config_gap = snapshot(100.0, 140.0);
        let order = f.decide(&config_gap).unwrap().unwrap();
        // desired 0.6 * 0.4 * 10 = 2.4 -> 2, budget 7
        assert_eq!(order.quantity, Quantity(2));

        let mut broke = agent(1.0, 0, 50.0);
        assert_eq!(broke.decide(&config_gap).unwrap(), None);
    }

    #[test]
    fn test_zero_price_is_a_signal_error() {
        let mut f = agent(0.75, 10, 10_000.0);
        let err = f.decide(&snapshot(0.0, 100.0)).unwrap_err();
        assert!(matches!(err, AgentError::NonFiniteSignal { .. }));
    }

    #[test]
    fn test_valuation_noise_is_seeded() {
        let config = FundamentalistConfig {
            valuation_noise: 0.05,
            confidence: 0.0,
            ..Default::default()
        };
        let make = || {
            let state = AgentState::new(
                Cash::from_float(10_000.0),
                50,
                Price::from_float(100.0),
                RiskLimits::default(),
            );
            Fundamentalist::new(AgentId(3), config.clone(), state, 99)
        };
        let (mut a, mut b) = (make(), make());
        for _ in 0..20 {
            let s = snapshot(100.0, 100.0);
            assert_eq!(a.decide(&s).unwrap(), b.decide(&s).unwrap());
        }
    }
}
