//! Error types for configuring and running a simulation.

use agents::AgentError;
use sim_core::SimCoreError;
use thiserror::Error;
use types::{AgentId, Tick};

use crate::runner::SimulationState;

/// Invalid or out-of-range configuration. Raised at construction; the run never starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("roster is empty: at least one agent is required")]
    EmptyRoster,

    #[error("duplicate agent id {0}")]
    DuplicateAgent(AgentId),

    #[error("{0} is reserved for the liquidity provider")]
    ReservedAgentId(AgentId),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by the simulation engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Non-finite or out-of-bound market state. Fatal; history up to the previous step is kept.
    #[error("invalid market state at step {step}: {source}")]
    InvalidState { step: Tick, source: SimCoreError },

    /// A decision function failed under the strict decision-error policy.
    #[error("{agent} failed to decide at step {step}: {source}")]
    Decision {
        step: Tick,
        agent: AgentId,
        source: AgentError,
    },

    #[error("share conservation violated at step {step}: expected {expected}, found {actual}")]
    ConservationViolated { step: Tick, expected: i64, actual: i64 },

    #[error("simulation is {0} and cannot advance")]
    NotRunnable(SimulationState),
}

/// Result type for simulation operations.
pub type Result<T> = std::result::Result<T, SimulationError>;
