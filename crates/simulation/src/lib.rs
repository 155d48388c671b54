//! Simulation crate: the step loop of the market simulation.
//!
//! This crate provides:
//! - [`SimulationConfig`] with validation
//! - The [`Ledger`] that clips intents against risk limits and executes them
//! - The [`Simulation`] engine and its lifecycle
//! - Hook-based observation, including the built-in [`MetricsHook`]
//! - [`RunStatistics`] computed from a finished run
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              Simulation::step()              │
//! │                                              │
//! │  1. Snapshot market state                    │
//! │  2. Hook: on_step_start                      │
//! │  3. agent.decide() for every agent           │  parallel phase
//! │  4. Aggregate intents into an imbalance      │  ─────────────
//! │  5. Hook: on_orders_collected                │  serialized phase
//! │  6. Fundamental value + price impact         │
//! │  7. Ledger: exits, clips, conservation check │
//! │  8. Execute, commit, history record          │
//! │  9. Hook: on_step_end                        │
//! │                                              │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use simulation::{RunStatistics, Simulation, SimulationConfig};
//!
//! let config = SimulationConfig::default().with_steps(50).with_agents(10, 10, 4);
//! let mut sim = Simulation::new(config).unwrap();
//! let result = sim.run().unwrap();
//!
//! assert!(result.is_completed());
//! assert_eq!(result.history.len(), 50);
//! let stats = RunStatistics::from_result(&result);
//! assert!(stats.price.min > 0.0);
//! ```
//!
//! # Parallel Execution
//!
//! With the `parallel` feature and `parallel_decisions` enabled, decisions are
//! evaluated with rayon. Every agent owns its random stream, so the history is
//! identical to a sequential run.

mod agent_factory;
pub mod config;
mod error;
mod hooks;
mod ledger;
mod metrics;
mod runner;
pub mod stats;

pub use agent_factory::{MARKET_STREAM, build_roster, derive_seed};
pub use config::{DecisionErrorPolicy, ExecutionMode, SimulationConfig};
pub use error::{ConfigError, Result, SimulationError};
pub use hooks::{HookRunner, SimulationHook};
pub use ledger::{ExecutionPlan, Ledger};
pub use metrics::{MetricsHook, MetricsSnapshot};
pub use runner::{
    ProviderSummary, Simulation, SimulationResult, SimulationState, StepReport, StopHandle,
};
pub use stats::RunStatistics;
