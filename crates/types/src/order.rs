//! Order intents and execution fills.
//!
//! An [`Order`] is a transient value produced by an agent's decision and
//! consumed within the same step. A [`Fill`] records what the ledger actually
//! executed for that agent after risk clipping.

use crate::config::RiskViolation;
use crate::ids::AgentId;
use crate::money::{Cash, Price, Quantity};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Order Side
// =============================================================================

/// Which side of the market the order is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Returns the opposite side.
    pub fn opposite(self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }

    /// `+1` for buys, `-1` for sells.
    #[inline]
    pub fn sign(self) -> i64 {
        match self {
            OrderSide::Buy => 1,
            OrderSide::Sell => -1,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

// =============================================================================
// Order
// =============================================================================

/// An order intent submitted by an agent for one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Agent who submitted the order.
    pub agent_id: AgentId,
    /// Buy or Sell.
    pub side: OrderSide,
    /// Requested number of shares.
    pub quantity: Quantity,
    /// Worst acceptable execution price, or `None` for a market order.
    pub limit_price: Option<Price>,
}

impl Order {
    /// Create an order that executes at whatever price the step produces.
    pub fn market(agent_id: AgentId, side: OrderSide, quantity: Quantity) -> Self {
        Self {
            agent_id,
            side,
            quantity,
            limit_price: None,
        }
    }

    /// Create an order that only executes at `price` or better.
    pub fn limit(agent_id: AgentId, side: OrderSide, price: Price, quantity: Quantity) -> Self {
        Self {
            agent_id,
            side,
            quantity,
            limit_price: Some(price),
        }
    }

    /// Signed share count: positive for buys, negative for sells.
    #[inline]
    pub fn signed_quantity(&self) -> i64 {
        self.side.sign() * self.quantity.as_signed()
    }

    /// Whether an execution at `price` satisfies the limit.
    pub fn accepts_price(&self, price: Price) -> bool {
        match (self.limit_price, self.side) {
            (None, _) => true,
            (Some(limit), OrderSide::Buy) => price <= limit,
            (Some(limit), OrderSide::Sell) => price >= limit,
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.limit_price {
            Some(limit) => write!(f, "{} {} {} @ {}", self.agent_id, self.side, self.quantity, limit),
            None => write!(f, "{} {} {} @ MKT", self.agent_id, self.side, self.quantity),
        }
    }
}

// =============================================================================
// Fill
// =============================================================================

/// Result of executing one agent's intent (or forced exit) in a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    pub agent_id: AgentId,
    /// Signed size the agent asked for (0 when the fill is a forced exit with no intent).
    pub requested: i64,
    /// Signed size actually executed.
    pub filled: i64,
    /// Execution price (the step's new market price).
    pub price: Price,
    /// Why `filled` differs from `requested`, if it does.
    pub clip: Option<RiskViolation>,
}

impl Fill {
    /// Signed cash value of the fill. The agent's cash moves by `-value()`.
    #[inline]
    pub fn value(&self) -> Option<Cash> {
        self.price.checked_notional(self.filled)
    }

    #[inline]
    pub fn is_clipped(&self) -> bool {
        self.clip.is_some()
    }

    /// Whether the fill was triggered by a stop-loss or take-profit exit.
    pub fn is_forced_exit(&self) -> bool {
        matches!(
            self.clip,
            Some(RiskViolation::StopLoss) | Some(RiskViolation::TakeProfit)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_quantity() {
        let buy = Order::market(AgentId(1), OrderSide::Buy, Quantity(20));
        let sell = Order::market(AgentId(1), OrderSide::Sell, Quantity(6));
        assert_eq!(buy.signed_quantity(), 20);
        assert_eq!(sell.signed_quantity(), -6);
    }

    #[test]
    fn test_limit_acceptance() {
        let limit = Price::from_float(100.0);
        let buy = Order::limit(AgentId(1), OrderSide::Buy, limit, Quantity(1));
        let sell = Order::limit(AgentId(1), OrderSide::Sell, limit, Quantity(1));

        assert!(buy.accepts_price(Price::from_float(99.0)));
        assert!(!buy.accepts_price(Price::from_float(100.5)));
        assert!(sell.accepts_price(Price::from_float(100.5)));
        assert!(!sell.accepts_price(Price::from_float(99.0)));
        assert!(sell.accepts_price(limit));
    }

    #[test]
    fn test_market_order_accepts_any_price() {
        let order = Order::market(AgentId(2), OrderSide::Sell, Quantity(3));
        assert!(order.accepts_price(Price(1)));
        assert_eq!(order.to_string(), "Agent#2 SELL 3 @ MKT");
    }

    #[test]
    fn test_fill_value_and_flags() {
        let fill = Fill {
            agent_id: AgentId(1),
            requested: -10,
            filled: -4,
            price: Price::from_float(10.0),
            clip: Some(RiskViolation::ShortSellingDisabled),
        };
        assert_eq!(fill.value(), Some(Cash::from_float(-40.0)));
        assert!(fill.is_clipped());
        assert!(!fill.is_forced_exit());
    }
}
