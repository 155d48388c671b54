//! Risk limits and the reasons an intent gets clipped.

use crate::money::Cash;
use serde::{Deserialize, Serialize};

// =============================================================================
// Risk Limits
// =============================================================================

/// Per-agent risk limits, fixed at creation and applied every step before execution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskLimits {
    /// Upper bound on `|position|` after any fill.
    pub max_position: u64,
    /// Loss (relative to entry price) that forces a full liquidation.
    pub stop_loss_fraction: f64,
    /// Gain (relative to entry price) that forces a full liquidation.
    pub take_profit_fraction: f64,
    /// Whether the agent may hold a negative position.
    pub allow_short: bool,
    /// Cash the agent may go below zero before buys are clipped.
    pub overdraft_tolerance: Cash,
}

impl RiskLimits {
    pub fn new(max_position: u64, stop_loss_fraction: f64, take_profit_fraction: f64) -> Self {
        Self {
            max_position,
            stop_loss_fraction,
            take_profit_fraction,
            allow_short: false,
            overdraft_tolerance: Cash::ZERO,
        }
    }

    pub fn with_short_selling(mut self, allow: bool) -> Self {
        self.allow_short = allow;
        self
    }

    pub fn with_overdraft(mut self, tolerance: Cash) -> Self {
        self.overdraft_tolerance = tolerance;
        self
    }

    /// `max_position` as a signed share count.
    #[inline]
    pub fn max_position_signed(&self) -> i64 {
        i64::try_from(self.max_position).unwrap_or(i64::MAX)
    }

    /// Shares that can be bought from `position` before hitting `max_position`.
    #[inline]
    pub fn buy_headroom(&self, position: i64) -> u64 {
        let headroom = self.max_position_signed().saturating_sub(position).max(0);
        headroom.unsigned_abs()
    }

    /// Shares that can be sold from `position`: down to `-max_position` with
    /// shorting, down to zero without.
    #[inline]
    pub fn sell_capacity(&self, position: i64) -> u64 {
        let floor = if self.allow_short {
            self.max_position_signed()
        } else {
            0
        };
        position.saturating_add(floor).max(0).unsigned_abs()
    }
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self::new(150, 0.1, 0.2)
    }
}

// =============================================================================
// Risk Violation
// =============================================================================

/// Reasons the ledger changed an agent's requested trade.
///
/// These are always recovered locally by clipping or overriding the intent;
/// they are reported on fills, never returned as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskViolation {
    /// Position would exceed `max_position`.
    MaxPosition,
    /// Agent cannot pay for the full buy.
    InsufficientCash,
    /// Sell would take a long-only agent below zero.
    ShortSellingDisabled,
    /// Execution price is worse than the order's limit.
    LimitPriceNotMet,
    /// Loss from entry breached the stop-loss fraction; position liquidated.
    StopLoss,
    /// Gain from entry reached the take-profit fraction; position liquidated.
    TakeProfit,
    /// Scaled down so buys and sells balance without a liquidity provider.
    Rationed,
}

impl std::fmt::Display for RiskViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MaxPosition => write!(f, "Position limit reached"),
            Self::InsufficientCash => write!(f, "Insufficient cash"),
            Self::ShortSellingDisabled => write!(f, "Short selling is disabled"),
            Self::LimitPriceNotMet => write!(f, "Limit price not met"),
            Self::StopLoss => write!(f, "Stop-loss triggered"),
            Self::TakeProfit => write!(f, "Take-profit triggered"),
            Self::Rationed => write!(f, "Rationed against opposite flow"),
        }
    }
}

impl std::error::Error for RiskViolation {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = RiskLimits::default();
        assert_eq!(limits.max_position, 150);
        assert!(!limits.allow_short);
        assert_eq!(limits.overdraft_tolerance, Cash::ZERO);
    }

    #[test]
    fn test_builders() {
        let limits = RiskLimits::new(50, 0.05, 0.5)
            .with_short_selling(true)
            .with_overdraft(Cash::from_float(25.0));
        assert!(limits.allow_short);
        assert_eq!(limits.max_position_signed(), 50);
        assert_eq!(limits.overdraft_tolerance, Cash::from_float(25.0));
    }

    #[test]
    fn test_headroom_and_capacity() {
        let long_only = RiskLimits::new(50, 0.1, 0.2);
        assert_eq!(long_only.buy_headroom(45), 5);
        assert_eq!(long_only.buy_headroom(60), 0);
        assert_eq!(long_only.sell_capacity(10), 10);
        assert_eq!(long_only.sell_capacity(-3), 0);

        let short = long_only.with_short_selling(true);
        assert_eq!(short.sell_capacity(10), 60);
        assert_eq!(short.buy_headroom(-20), 70);
    }

    #[test]
    fn test_unbounded_limits_saturate() {
        let limits = RiskLimits::new(u64::MAX, 0.1, 0.2).with_short_selling(true);
        assert_eq!(limits.sell_capacity(30), i64::MAX as u64);
        assert_eq!(limits.sell_capacity(-30), (i64::MAX - 30) as u64);
        assert_eq!(limits.buy_headroom(-30), i64::MAX as u64);
        assert_eq!(limits.buy_headroom(30), (i64::MAX - 30) as u64);
    }
}
