//! Risk enforcement and execution.
//!
//! The ledger turns each agent's raw intent into an executed [`Fill`] at the
//! step's new price. Planning is pure: [`Ledger::plan`] reads agent state and
//! computes every fill with checked arithmetic, and only [`Ledger::apply`]
//! writes. A step that fails to plan leaves every account untouched.
//!
//! Per agent, in roster order:
//! 1. Stop-loss / take-profit exits replace the intent with a full liquidation;
//!    covering a short is still capped by what the agent can afford
//! 2. Limit orders fill only at their limit or better
//! 3. Position clip to `max_position` (and to zero for long-only sellers)
//! 4. Affordability clip to `floor((cash + overdraft) / price)`
//! 5. Counterparty: the liquidity provider absorbs the net, or the heavier
//!    side is rationed pro-rata

use agents::{Agent, AgentState};
use sim_core::SimCoreError;
use tracing::debug;
use types::{Cash, Fill, Order, OrderSide, Price, RiskViolation};

use crate::config::ExecutionMode;

type Result<T> = std::result::Result<T, SimCoreError>;

// =============================================================================
// Execution Plan
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
struct PlannedFill {
    index: usize,
    fill: Fill,
    value: Cash,
}

/// Fills computed for one step, not yet applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPlan {
    price: Price,
    planned: Vec<PlannedFill>,
    provider_shares: i64,
    provider_cash: Cash,
    volume: u64,
    shares_outstanding: i64,
}

impl ExecutionPlan {
    pub fn price(&self) -> Price {
        self.price
    }

    /// Fills in roster order, one per agent that had an intent or a forced exit.
    pub fn fills(&self) -> Vec<Fill> {
        self.planned.iter().map(|p| p.fill).collect()
    }

    /// Sum of absolute filled sizes over agents.
    pub fn volume(&self) -> u64 {
        self.volume
    }

    /// Signed shares the liquidity provider takes this step.
    pub fn provider_shares(&self) -> i64 {
        self.provider_shares
    }

    /// Shares held by agents plus the provider once the plan is applied.
    pub fn shares_outstanding(&self) -> i64 {
        self.shares_outstanding
    }

    /// Agents with a non-zero fill.
    pub fn trades(&self) -> usize {
        self.planned.iter().filter(|p| p.fill.filled != 0).count()
    }

    pub fn forced_liquidations(&self) -> usize {
        self.planned
            .iter()
            .filter(|p| p.fill.is_forced_exit() && p.fill.filled != 0)
            .count()
    }
}

// =============================================================================
// Ledger
// =============================================================================

/// Counterparty accounting and risk enforcement for the whole roster.
#[derive(Debug, Clone)]
pub struct Ledger {
    mode: ExecutionMode,
    provider_position: i64,
    provider_cash: Cash,
    total_shares_issued: i64,
}

impl Ledger {
    /// Create a ledger for `agents`. The provider inventory is ignored in
    /// [`ExecutionMode::Rationed`], where no provider exists.
    pub fn new(
        mode: ExecutionMode,
        agents: &[Box<dyn Agent>],
        provider_inventory: i64,
    ) -> Result<Self> {
        let provider_position = match mode {
            ExecutionMode::LiquidityProvider => provider_inventory,
            ExecutionMode::Rationed => 0,
        };
        let agent_shares = sum_positions(agents)?;
        let total_shares_issued = agent_shares
            .checked_add(provider_position)
            .ok_or(SimCoreError::Overflow("counting issued shares"))?;

        Ok(Self {
            mode,
            provider_position,
            provider_cash: Cash::ZERO,
            total_shares_issued,
        })
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn provider_position(&self) -> i64 {
        self.provider_position
    }

    pub fn provider_cash(&self) -> Cash {
        self.provider_cash
    }

    pub fn total_shares_issued(&self) -> i64 {
        self.total_shares_issued
    }

    /// Shares held by agents plus the provider. Equals
    /// [`total_shares_issued`](Self::total_shares_issued) after every step.
    pub fn shares_outstanding(&self, agents: &[Box<dyn Agent>]) -> Result<i64> {
        sum_positions(agents)?
            .checked_add(self.provider_position)
            .ok_or(SimCoreError::Overflow("counting outstanding shares"))
    }

    /// Compute the fills for one step at `price`.
    ///
    /// `intents[i]` belongs to `agents[i]`.
    pub fn plan(
        &self,
        agents: &[Box<dyn Agent>],
        intents: &[Option<Order>],
        price: Price,
    ) -> Result<ExecutionPlan> {
        if !price.is_positive() {
            return Err(SimCoreError::NonFinitePrice(price.to_float()));
        }

        let mut planned = Vec::new();
        for (index, agent) in agents.iter().enumerate() {
            let intent = intents.get(index).copied().flatten();
            if let Some(fill) = clip_intent(agent.as_ref(), intent, price)? {
                planned.push(PlannedFill {
                    index,
                    fill,
                    value: Cash::ZERO,
                });
            }
        }

        if self.mode == ExecutionMode::Rationed {
            ration(&mut planned)?;
        }

        let mut net: i64 = 0;
        let mut volume: u64 = 0;
        let mut agent_cash = Cash::ZERO;
        for entry in &mut planned {
            entry.value = entry
                .fill
                .value()
                .ok_or(SimCoreError::Overflow("valuing fill"))?;
            net = net
                .checked_add(entry.fill.filled)
                .ok_or(SimCoreError::Overflow("netting fills"))?;
            volume = volume
                .checked_add(entry.fill.filled.unsigned_abs())
                .ok_or(SimCoreError::Overflow("summing volume"))?;
            agent_cash = agent_cash
                .checked_add(entry.value)
                .ok_or(SimCoreError::Overflow("summing fill value"))?;

            // Execution itself cannot fail once both account updates fit.
            let agent = &agents[entry.index];
            agent
                .position()
                .checked_add(entry.fill.filled)
                .ok_or(SimCoreError::Overflow("updating agent position"))?;
            agent
                .cash()
                .checked_sub(entry.value)
                .ok_or(SimCoreError::Overflow("updating agent cash"))?;

            if let Some(reason) = entry.fill.clip {
                debug!(
                    agent = %entry.fill.agent_id,
                    requested = entry.fill.requested,
                    filled = entry.fill.filled,
                    %reason,
                    "Intent clipped"
                );
            }
        }

        let provider_shares = net
            .checked_neg()
            .ok_or(SimCoreError::Overflow("netting provider flow"))?;
        if self.mode == ExecutionMode::Rationed && provider_shares != 0 {
            return Err(SimCoreError::Overflow("rationing left unbalanced flow"));
        }
        let shares_outstanding = sum_positions(agents)?
            .checked_add(net)
            .and_then(|held| held.checked_add(self.provider_position))
            .and_then(|held| held.checked_add(provider_shares))
            .ok_or(SimCoreError::Overflow("counting outstanding shares"))?;

        Ok(ExecutionPlan {
            price,
            planned,
            provider_shares,
            provider_cash: agent_cash,
            volume,
            shares_outstanding,
        })
    }

    /// Apply a plan computed by [`plan`](Self::plan) against the same roster.
    pub fn apply(&mut self, agents: &mut [Box<dyn Agent>], plan: &ExecutionPlan) -> Result<()> {
        let provider_position = self
            .provider_position
            .checked_add(plan.provider_shares)
            .ok_or(SimCoreError::Overflow("updating provider position"))?;
        let provider_cash = self
            .provider_cash
            .checked_add(plan.provider_cash)
            .ok_or(SimCoreError::Overflow("updating provider cash"))?;

        for entry in &plan.planned {
            let Some(agent) = agents.get_mut(entry.index) else {
                continue;
            };
            agent
                .state_mut()
                .apply_fill(entry.fill.filled, plan.price, entry.value);
            agent.on_fill(&entry.fill);
        }

        self.provider_position = provider_position;
        self.provider_cash = provider_cash;
        Ok(())
    }
}

fn sum_positions(agents: &[Box<dyn Agent>]) -> Result<i64> {
    agents.iter().try_fold(0i64, |acc, agent| {
        acc.checked_add(agent.position())
            .ok_or(SimCoreError::Overflow("summing positions"))
    })
}

// =============================================================================
// Risk Clipping
// =============================================================================

/// Exit override and clips 2-4 for one agent. `None` when there is nothing to execute.
fn clip_intent(agent: &dyn Agent, intent: Option<Order>, price: Price) -> Result<Option<Fill>> {
    let state = agent.state();
    let limits = state.risk_limits();
    let position = state.position();
    let requested = intent.map(|order| order.signed_quantity()).unwrap_or(0);

    let mut fill = Fill {
        agent_id: agent.id(),
        requested,
        filled: requested,
        price,
        clip: None,
    };

    if let Some(change) = state.unrealized_return(price) {
        let exit = if change <= -limits.stop_loss_fraction {
            Some(RiskViolation::StopLoss)
        } else if change >= limits.take_profit_fraction {
            Some(RiskViolation::TakeProfit)
        } else {
            None
        };
        if let Some(reason) = exit {
            // Liquidations only reduce exposure: position limits and limit
            // prices do not apply, but covering a short still needs cash.
            let mut filled = position
                .checked_neg()
                .ok_or(SimCoreError::Overflow("liquidating position"))?;
            if filled > 0 {
                filled = filled.min(as_shares(price.affordable_shares(buying_power(state)?)));
            }
            fill.filled = filled;
            fill.clip = Some(reason);
            return Ok(Some(fill));
        }
    }

    let Some(order) = intent else {
        return Ok(None);
    };

    if !order.accepts_price(price) {
        fill.filled = 0;
        fill.clip = Some(RiskViolation::LimitPriceNotMet);
        return Ok(Some(fill));
    }

    match order.side {
        OrderSide::Buy => {
            let headroom = as_shares(limits.buy_headroom(position));
            if fill.filled > headroom {
                fill.filled = headroom;
                fill.clip = Some(RiskViolation::MaxPosition);
            }

            let affordable = as_shares(price.affordable_shares(buying_power(state)?));
            if fill.filled > affordable {
                fill.filled = affordable;
                fill.clip = Some(RiskViolation::InsufficientCash);
            }
        }
        OrderSide::Sell => {
            let reason = if limits.allow_short {
                RiskViolation::MaxPosition
            } else {
                RiskViolation::ShortSellingDisabled
            };
            let capacity = as_shares(limits.sell_capacity(position));
            if -fill.filled > capacity {
                fill.filled = -capacity;
                fill.clip = Some(reason);
            }
        }
    }

    Ok(Some(fill))
}

/// Cash plus overdraft tolerance.
fn buying_power(state: &AgentState) -> Result<Cash> {
    state
        .cash()
        .checked_add(state.risk_limits().overdraft_tolerance)
        .ok_or(SimCoreError::Overflow("computing buying power"))
}

fn as_shares(shares: u64) -> i64 {
    i64::try_from(shares).unwrap_or(i64::MAX)
}

// =============================================================================
// Rationing
// =============================================================================

/// Scale the heavier side down so executed buys equal executed sells.
///
/// Each fill on the heavy side gets `floor(q * light / heavy)` shares; the
/// remainder is handed out one share at a time in roster order.
fn ration(planned: &mut [PlannedFill]) -> Result<()> {
    let mut buys: i128 = 0;
    let mut sells: i128 = 0;
    for entry in planned.iter() {
        let filled = i128::from(entry.fill.filled);
        if filled > 0 {
            buys += filled;
        } else {
            sells -= filled;
        }
    }
    if buys == sells {
        return Ok(());
    }

    let (sign, heavy, light) = if buys > sells {
        (1i128, buys, sells)
    } else {
        (-1i128, sells, buys)
    };

    // (entry, scaled size) for the heavy side. Every scaled size is strictly
    // below its unscaled size, so each entry can take one remainder share.
    let mut scaled: Vec<(usize, i128)> = planned
        .iter()
        .enumerate()
        .filter_map(|(i, entry)| {
            let size = i128::from(entry.fill.filled) * sign;
            (size > 0).then(|| (i, size * light / heavy))
        })
        .collect();

    let allotted: i128 = scaled.iter().map(|(_, size)| size).sum();
    let mut remainder = light - allotted;
    for (_, size) in scaled.iter_mut() {
        if remainder == 0 {
            break;
        }
        *size += 1;
        remainder -= 1;
    }

    for (i, size) in scaled {
        let filled =
            i64::try_from(size * sign).map_err(|_| SimCoreError::Overflow("rationing fill"))?;
        let entry = &mut planned[i];
        if filled != entry.fill.filled && entry.fill.clip.is_none() {
            entry.fill.clip = Some(RiskViolation::Rationed);
        }
        entry.fill.filled = filled;
    }
    Ok(())
}
