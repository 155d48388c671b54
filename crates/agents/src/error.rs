//! Errors a decision function can report.

use thiserror::Error;

/// A strategy could not produce a meaningful intent this step.
///
/// The engine treats this as "no order" for the agent unless it runs with a
/// strict decision-error policy.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AgentError {
    #[error("{strategy} computed a non-finite {signal}: {value}")]
    NonFiniteSignal {
        strategy: &'static str,
        signal: &'static str,
        value: f64,
    },
}

impl AgentError {
    pub(crate) fn non_finite(strategy: &'static str, signal: &'static str, value: f64) -> Self {
        Self::NonFiniteSignal {
            strategy,
            signal,
            value,
        }
    }
}

/// Return `value` if it is finite, otherwise a [`AgentError::NonFiniteSignal`].
pub(crate) fn ensure_finite(
    strategy: &'static str,
    signal: &'static str,
    value: f64,
) -> Result<f64, AgentError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AgentError::non_finite(strategy, signal, value))
    }
}
