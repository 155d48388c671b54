//! Per-agent ledger state.
//!
//! Tracks cash, signed position, and the weighted average entry price of the
//! open position. The entry price is the reference for stop-loss and
//! take-profit checks.
//!
//! ## Entry Price
//!
//! - Opening or adding in the same direction:
//!   `entry = (|pos| * entry + |q| * price) / (|pos| + |q|)`
//! - Reducing: `realized_pnl += (price - entry) * closed * sign(pos)`, entry unchanged
//! - Crossing through zero: the remainder opens at `price`
//! - Flat: entry is zero

use types::{Cash, Price, RiskLimits};

/// Ledger account of one agent.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentState {
    /// Current position in shares (positive = long, negative = short).
    position: i64,
    cash: Cash,
    /// Weighted average entry price of the open position.
    entry_price: Price,
    realized_pnl: Cash,
    risk_limits: RiskLimits,
    orders_placed: u64,
    fills_received: u64,
}

impl AgentState {
    /// Create an account holding `initial_position` shares bought at `reference_price`.
    pub fn new(
        initial_cash: Cash,
        initial_position: i64,
        reference_price: Price,
        risk_limits: RiskLimits,
    ) -> Self {
        Self {
            position: initial_position,
            cash: initial_cash,
            entry_price: if initial_position == 0 {
                Price::ZERO
            } else {
                reference_price
            },
            realized_pnl: Cash::ZERO,
            risk_limits,
            orders_placed: 0,
            fills_received: 0,
        }
    }

    pub fn position(&self) -> i64 {
        self.position
    }

    pub fn cash(&self) -> Cash {
        self.cash
    }

    pub fn entry_price(&self) -> Price {
        self.entry_price
    }

    pub fn realized_pnl(&self) -> Cash {
        self.realized_pnl
    }

    pub fn risk_limits(&self) -> &RiskLimits {
        &self.risk_limits
    }

    pub fn orders_placed(&self) -> u64 {
        self.orders_placed
    }

    pub fn fills_received(&self) -> u64 {
        self.fills_received
    }

    /// `cash + position * price`, saturating on overflow.
    pub fn wealth(&self, price: Price) -> Cash {
        let holdings = price.raw().saturating_mul(self.position);
        Cash(self.cash.raw().saturating_add(holdings))
    }

    /// Relative move of `price` from the entry price, signed by position
    /// direction: positive is a gain for the holder.
    ///
    /// `None` when flat or without an entry price.
    pub fn unrealized_return(&self, price: Price) -> Option<f64> {
        if self.position == 0 || !self.entry_price.is_positive() {
            return None;
        }
        let entry = self.entry_price.to_float();
        let change = (price.to_float() - entry) / entry;
        Some(if self.position > 0 { change } else { -change })
    }

    pub fn record_order(&mut self) {
        self.orders_placed += 1;
    }

    /// Apply an executed fill of `filled` shares (signed) at `price`.
    ///
    /// `value` must equal `price * filled`; the ledger computes it with checked
    /// arithmetic before calling.
    pub fn apply_fill(&mut self, filled: i64, price: Price, value: Cash) {
        if filled == 0 {
            return;
        }

        let old = self.position;
        let new = old + filled;

        if old == 0 || old.signum() == filled.signum() {
            self.entry_price = weighted_entry(old, self.entry_price, filled, price);
        } else {
            let closed = filled.abs().min(old.abs());
            let per_share = price.raw() - self.entry_price.raw();
            let pnl = per_share.saturating_mul(closed).saturating_mul(old.signum());
            self.realized_pnl = Cash(self.realized_pnl.raw().saturating_add(pnl));

            if new == 0 {
                self.entry_price = Price::ZERO;
            } else if new.signum() != old.signum() {
                self.entry_price = price;
            }
        }

        self.position = new;
        self.cash -= value;
        self.fills_received += 1;
    }
}

fn weighted_entry(old: i64, entry: Price, filled: i64, price: Price) -> Price {
    let old_abs = old.unsigned_abs() as i128;
    let add_abs = filled.unsigned_abs() as i128;
    let total = old_abs + add_abs;
    if total == 0 {
        return price;
    }
    let weighted = old_abs * entry.raw() as i128 + add_abs * price.raw() as i128;
    Price((weighted / total) as i64)
}
