//! Per-step history records and the final agent roster summary.
//!
//! These are the engine's public output: an ordered sequence of
//! [`StepRecord`]s plus one [`AgentSummary`] per agent.

use crate::ids::{AgentId, AgentKind, Tick};
use crate::money::{Cash, Price};
use serde::{Deserialize, Serialize};

// =============================================================================
// Kind Totals
// =============================================================================

/// Holdings aggregated over all agents of one kind at the end of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KindTotals {
    pub agents: usize,
    pub position: i64,
    pub cash: Cash,
    /// `cash + position * price`, marked at the step's price.
    pub wealth: Cash,
}

impl KindTotals {
    /// Add one agent's holdings.
    pub fn add(&mut self, position: i64, cash: Cash, price: Price) {
        self.agents += 1;
        self.position += position;
        self.cash += cash;
        self.wealth += cash + Cash(price.raw().saturating_mul(position));
    }

    /// Mean wealth per agent, or zero for an empty group.
    pub fn average_wealth(&self) -> f64 {
        if self.agents == 0 {
            0.0
        } else {
            self.wealth.to_float() / self.agents as f64
        }
    }
}

// =============================================================================
// Step Record
// =============================================================================

/// One entry of the run history, appended after each completed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: Tick,
    /// Price formed this step.
    pub price: Price,
    pub fundamental_value: Price,
    /// Sum of absolute filled sizes over all agents.
    pub volume: u64,
    /// Net signed intent that moved the price.
    pub imbalance: i64,
    /// Agents with a non-zero fill.
    pub trades: usize,
    /// Stop-loss and take-profit liquidations.
    pub forced_liquidations: usize,
    /// Inventory of the liquidity provider after execution.
    pub liquidity_provider_position: i64,
    pub fundamentalists: KindTotals,
    pub chartists: KindTotals,
    pub noise_traders: KindTotals,
}

impl StepRecord {
    /// Totals for one agent kind.
    pub fn totals(&self, kind: AgentKind) -> &KindTotals {
        match kind {
            AgentKind::Fundamentalist => &self.fundamentalists,
            AgentKind::Chartist => &self.chartists,
            AgentKind::NoiseTrader => &self.noise_traders,
        }
    }

    pub fn totals_mut(&mut self, kind: AgentKind) -> &mut KindTotals {
        match kind {
            AgentKind::Fundamentalist => &mut self.fundamentalists,
            AgentKind::Chartist => &mut self.chartists,
            AgentKind::NoiseTrader => &mut self.noise_traders,
        }
    }

    /// Sum of positions held by strategy agents.
    pub fn agent_position(&self) -> i64 {
        self.fundamentalists.position + self.chartists.position + self.noise_traders.position
    }

    /// `price - fundamental_value` in float units.
    pub fn mispricing(&self) -> f64 {
        self.price.to_float() - self.fundamental_value.to_float()
    }
}

// =============================================================================
// Agent Summary
// =============================================================================

/// Final ledger state of one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSummary {
    pub id: AgentId,
    pub kind: AgentKind,
    pub cash: Cash,
    pub position: i64,
    /// Average entry price of the open position.
    pub entry_price: Price,
    pub realized_pnl: Cash,
    /// Wealth marked at the final price.
    pub wealth: Cash,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_totals_accumulate() {
        let price = Price::from_float(10.0);
        let mut totals = KindTotals::default();
        totals.add(3, Cash::from_float(100.0), price);
        totals.add(-1, Cash::from_float(50.0), price);

        assert_eq!(totals.agents, 2);
        assert_eq!(totals.position, 2);
        assert_eq!(totals.cash, Cash::from_float(150.0));
        assert_eq!(totals.wealth, Cash::from_float(170.0));
        assert!((totals.average_wealth() - 85.0).abs() < 1e-9);
    }

    #[test]
    fn test_record_serializes() {
        let record = StepRecord {
            step: 4,
            price: Price::from_float(101.5),
            fundamental_value: Price::from_float(100.0),
            volume: 12,
            imbalance: -3,
            trades: 2,
            forced_liquidations: 0,
            liquidity_provider_position: 3,
            fundamentalists: KindTotals::default(),
            chartists: KindTotals::default(),
            noise_traders: KindTotals::default(),
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: StepRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
        assert!((record.mispricing() - 1.5).abs() < 1e-9);
    }
}
