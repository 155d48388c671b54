//! Order aggregation.
//!
//! Nets one step's intents into a signed order-flow imbalance. The result is a
//! plain sum, so it does not depend on the order in which agents were
//! evaluated.

use serde::{Deserialize, Serialize};
use types::{Order, OrderSide};

use crate::error::{Result, SimCoreError};

/// Net order flow for one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AggregatedFlow {
    /// `sum(buy sizes) - sum(sell sizes)`.
    pub imbalance: i64,
    pub buy_volume: u64,
    pub sell_volume: u64,
    /// Number of intents that contributed.
    pub orders: usize,
}

impl AggregatedFlow {
    /// Imbalance as a float for the price-impact rule.
    #[inline]
    pub fn imbalance_f64(&self) -> f64 {
        self.imbalance as f64
    }

    /// Whether no agent submitted anything this step.
    pub fn is_empty(&self) -> bool {
        self.orders == 0
    }
}

/// Aggregate a step's intents.
///
/// Pure function of the intent list. Fails only if the totals overflow.
pub fn aggregate<'a, I>(orders: I) -> Result<AggregatedFlow>
where
    I: IntoIterator<Item = &'a Order>,
{
    let mut flow = AggregatedFlow::default();

    for order in orders {
        let size = order.quantity.raw();
        match order.side {
            OrderSide::Buy => {
                flow.buy_volume = flow
                    .buy_volume
                    .checked_add(size)
                    .ok_or(SimCoreError::Overflow("summing buy volume"))?;
            }
            OrderSide::Sell => {
                flow.sell_volume = flow
                    .sell_volume
                    .checked_add(size)
                    .ok_or(SimCoreError::Overflow("summing sell volume"))?;
            }
        }
        flow.orders += 1;
    }

    let buys = i64::try_from(flow.buy_volume);
    let sells = i64::try_from(flow.sell_volume);
    flow.imbalance = match (buys, sells) {
        (Ok(buys), Ok(sells)) => buys - sells,
        _ => return Err(SimCoreError::Overflow("netting imbalance")),
    };

    Ok(flow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{AgentId, Price, Quantity};

    fn orders() -> Vec<Order> {
        vec![
            Order::market(AgentId(1), OrderSide::Buy, Quantity(10)),
            Order::market(AgentId(2), OrderSide::Sell, Quantity(4)),
            Order::limit(AgentId(3), OrderSide::Sell, Price::from_float(99.0), Quantity(9)),
            Order::market(AgentId(4), OrderSide::Buy, Quantity(1)),
        ]
    }

    #[test]
    fn test_aggregate_nets_sides() {
        let flow = aggregate(&orders()).unwrap();
        assert_eq!(flow.imbalance, -2);
        assert_eq!(flow.buy_volume, 11);
        assert_eq!(flow.sell_volume, 13);
        assert_eq!(flow.orders, 4);
    }

    #[test]
    fn test_aggregate_is_order_independent() {
        let forward = aggregate(&orders()).unwrap();
        let mut reversed = orders();
        reversed.reverse();
        assert_eq!(aggregate(&reversed).unwrap(), forward);

        let mut rotated = orders();
        rotated.rotate_left(2);
        assert_eq!(aggregate(&rotated).unwrap(), forward);
    }

    #[test]
    fn test_aggregate_empty() {
        let flow = aggregate(&[]).unwrap();
        assert!(flow.is_empty());
        assert_eq!(flow.imbalance, 0);
    }

    #[test]
    fn test_aggregate_overflow_is_an_error() {
        let huge = vec![
            Order::market(AgentId(1), OrderSide::Buy, Quantity(u64::MAX)),
            Order::market(AgentId(2), OrderSide::Buy, Quantity(1)),
        ];
        assert!(matches!(aggregate(&huge), Err(SimCoreError::Overflow(_))));
    }
}
