//! Fixed-point monetary types.
//!
//! Prices and cash balances use fixed-point arithmetic with 4 decimal places,
//! so executing a fill moves exactly `price * quantity` between an agent's
//! cash and its counterparty. Share counts are whole numbers.

use crate::ids::PRICE_SCALE;
use derive_more::{Add, AddAssign, From, Into, Neg, Sub, SubAssign, Sum};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Mul;

// =============================================================================
// Quantity Type (Newtype for order sizes)
// =============================================================================

/// Unsigned number of shares in an order.
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Default,
    Add,
    Sub,
    AddAssign,
    SubAssign,
    Sum,
    From,
    Into,
)]
pub struct Quantity(pub u64);

impl Quantity {
    pub const ZERO: Quantity = Quantity(0);

    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Minimum of two quantities.
    #[inline]
    pub fn min(self, other: Self) -> Self {
        Quantity(self.0.min(other.0))
    }

    /// Size as a signed share count, saturating at `i64::MAX`.
    #[inline]
    pub fn as_signed(self) -> i64 {
        i64::try_from(self.0).unwrap_or(i64::MAX)
    }
}

impl fmt::Debug for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Qty({})", self.0)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq<u64> for Quantity {
    fn eq(&self, other: &u64) -> bool {
        self.0 == *other
    }
}

// =============================================================================
// Fixed-Point Price Type
// =============================================================================

/// Fixed-point price with 4 decimal places.
///
/// # Examples
/// - `Price(10000)` = $1.00
/// - `Price(15000)` = $1.50
/// - `Price(1)` = $0.0001
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Default,
    Add,
    Sub,
    Neg,
    AddAssign,
    SubAssign,
    From,
    Into,
)]
pub struct Price(pub i64);

impl Price {
    pub const ZERO: Price = Price(0);

    /// Create a Price from a floating-point value, rounding to the nearest tick.
    #[inline]
    pub fn from_float(v: f64) -> Self {
        Self((v * PRICE_SCALE as f64).round() as i64)
    }

    #[inline]
    pub fn to_float(self) -> f64 {
        self.0 as f64 / PRICE_SCALE as f64
    }

    #[inline]
    pub fn raw(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Cash value of a signed share count at this price.
    ///
    /// Returns `None` on overflow.
    #[inline]
    pub fn checked_notional(self, shares: i64) -> Option<Cash> {
        self.0.checked_mul(shares).map(Cash)
    }

    /// Largest whole number of shares that `budget` buys at this price.
    ///
    /// Zero for a non-positive budget or price.
    pub fn affordable_shares(self, budget: Cash) -> u64 {
        if self.0 <= 0 || budget.0 <= 0 {
            return 0;
        }
        (budget.0 / self.0) as u64
    }
}

impl fmt::Debug for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Price(${:.4})", self.to_float())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.4}", self.to_float())
    }
}

// =============================================================================
// Fixed-Point Cash Type
// =============================================================================

/// Fixed-point cash balance with 4 decimal places. May be negative.
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Default,
    Add,
    Sub,
    Neg,
    AddAssign,
    SubAssign,
    Sum,
    From,
    Into,
)]
pub struct Cash(pub i64);

impl Cash {
    pub const ZERO: Cash = Cash(0);

    #[inline]
    pub fn from_float(v: f64) -> Self {
        Self((v * PRICE_SCALE as f64).round() as i64)
    }

    #[inline]
    pub fn to_float(self) -> f64 {
        self.0 as f64 / PRICE_SCALE as f64
    }

    #[inline]
    pub fn raw(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub fn checked_add(self, rhs: Cash) -> Option<Cash> {
        self.0.checked_add(rhs.0).map(Cash)
    }

    #[inline]
    pub fn checked_sub(self, rhs: Cash) -> Option<Cash> {
        self.0.checked_sub(rhs.0).map(Cash)
    }
}

impl fmt::Debug for Cash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cash(${:.4})", self.to_float())
    }
}

impl fmt::Display for Cash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.4}", self.to_float())
    }
}

// =============================================================================
// Price-Quantity Operations
// =============================================================================

impl Mul<Quantity> for Price {
    type Output = Cash;

    /// Multiply price by quantity to get total cash value.
    fn mul(self, qty: Quantity) -> Cash {
        Cash(self.0 * qty.0 as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_from_float_rounds_to_tick() {
        assert_eq!(Price::from_float(1.0), Price(10_000));
        assert_eq!(Price::from_float(99.70004), Price(997_000));
        assert_eq!(Price::from_float(0.01), Price(100));
    }

    #[test]
    fn test_notional_is_signed() {
        let price = Price::from_float(50.0);
        assert_eq!(price.checked_notional(3), Some(Cash::from_float(150.0)));
        assert_eq!(price.checked_notional(-3), Some(Cash::from_float(-150.0)));
        assert_eq!(Price(i64::MAX).checked_notional(2), None);
    }

    #[test]
    fn test_affordable_shares() {
        let price = Price::from_float(100.0);
        assert_eq!(price.affordable_shares(Cash::from_float(1_050.0)), 10);
        assert_eq!(price.affordable_shares(Cash::from_float(99.99)), 0);
        assert_eq!(price.affordable_shares(Cash::from_float(-5.0)), 0);
        assert_eq!(Price::ZERO.affordable_shares(Cash::from_float(5.0)), 0);
    }

    #[test]
    fn test_price_quantity_multiplication() {
        let cash = Price::from_float(2.5) * Quantity(4);
        assert_eq!(cash, Cash::from_float(10.0));
    }

    #[test]
    fn test_cash_sum() {
        let total: Cash = [Cash(1), Cash(2), Cash(-4)].into_iter().sum();
        assert_eq!(total, Cash(-1));
    }
}
