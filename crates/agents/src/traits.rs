//! The `Agent` trait.

use types::{AgentId, AgentKind, Cash, Fill, MarketSnapshot, Order};

use crate::error::AgentError;
use crate::state::AgentState;

/// The core trait that all trading agents implement.
///
/// The engine treats agents polymorphically: it only calls these methods and
/// never inspects the concrete strategy.
///
/// # Example
/// ```
/// use agents::{Agent, AgentError, AgentState};
/// use types::{AgentId, AgentKind, MarketSnapshot, Order};
///
/// struct Idle {
///     id: AgentId,
///     state: AgentState,
/// }
///
/// impl Agent for Idle {
///     fn id(&self) -> AgentId { self.id }
///     fn kind(&self) -> AgentKind { AgentKind::NoiseTrader }
///     fn decide(&mut self, _: &MarketSnapshot) -> Result<Option<Order>, AgentError> {
///         Ok(None)
///     }
///     fn state(&self) -> &AgentState { &self.state }
///     fn state_mut(&mut self) -> &mut AgentState { &mut self.state }
/// }
/// ```
pub trait Agent: Send {
    /// Unique identifier, assigned at creation.
    fn id(&self) -> AgentId;

    /// Strategy family, fixed at creation.
    fn kind(&self) -> AgentKind;

    /// Produce at most one order intent from the snapshot.
    ///
    /// May update the agent's private memory (e.g. a price window) but must not
    /// depend on any other agent's decision this step.
    fn decide(&mut self, snapshot: &MarketSnapshot) -> Result<Option<Order>, AgentError>;

    /// Called after the ledger has applied a fill to this agent's state.
    fn on_fill(&mut self, _fill: &Fill) {
        // Default: no-op
    }

    /// Human-readable name for logging.
    fn name(&self) -> &str {
        "Agent"
    }

    /// Ledger account.
    fn state(&self) -> &AgentState;

    /// Mutable ledger account. Only the engine's execution phase writes through this.
    fn state_mut(&mut self) -> &mut AgentState;

    fn position(&self) -> i64 {
        self.state().position()
    }

    fn cash(&self) -> Cash {
        self.state().cash()
    }
}
