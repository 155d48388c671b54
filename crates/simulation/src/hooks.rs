//! Simulation hooks for observing lifecycle events.
//!
//! Hooks are **observers**: they receive read-only views of each step and
//! cannot modify simulation state. Use interior mutability (atomics,
//! `parking_lot::Mutex`) for hook-owned state.
//!
//! # Example
//!
//! ```
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use simulation::{SimulationHook, StepReport};
//!
//! struct VolumeCounter {
//!     shares: AtomicU64,
//! }
//!
//! impl SimulationHook for VolumeCounter {
//!     fn name(&self) -> &str { "VolumeCounter" }
//!
//!     fn on_step_end(&self, report: &StepReport) {
//!         self.shares.fetch_add(report.record.volume, Ordering::Relaxed);
//!     }
//! }
//! ```

use std::sync::Arc;

use sim_core::AggregatedFlow;
use types::MarketSnapshot;

use crate::runner::{SimulationResult, StepReport};

// ─────────────────────────────────────────────────────────────────────────────
// SimulationHook Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Trait for simulation observers.
///
/// # Lifecycle
///
/// ```text
/// Simulation::step()
///   on_step_start()        before agents decide
///   on_orders_collected()  after aggregation, before price formation
///   on_step_end()          after execution, with the step's record and fills
///
/// after the last step, a fatal error, or an abort
///   on_simulation_end()
/// ```
pub trait SimulationHook: Send + Sync {
    /// Human-readable name for logging and debugging.
    fn name(&self) -> &str;

    /// Called with the snapshot agents are about to decide on.
    #[allow(unused_variables)]
    fn on_step_start(&self, snapshot: &MarketSnapshot) {}

    /// Called with the step's aggregated intents.
    #[allow(unused_variables)]
    fn on_orders_collected(&self, flow: &AggregatedFlow) {}

    /// Called once the step has been committed.
    #[allow(unused_variables)]
    fn on_step_end(&self, report: &StepReport) {}

    /// Called once when the run reaches a terminal state.
    #[allow(unused_variables)]
    fn on_simulation_end(&self, result: &SimulationResult) {}
}

// ─────────────────────────────────────────────────────────────────────────────
// HookRunner
// ─────────────────────────────────────────────────────────────────────────────

/// Manages hook registration and sequential invocation.
///
/// Hooks are called in registration order.
#[derive(Default)]
pub struct HookRunner {
    hooks: Vec<Arc<dyn SimulationHook>>,
}

impl HookRunner {
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Register a hook. Hooks are called in registration order.
    pub fn add(&mut self, hook: Arc<dyn SimulationHook>) {
        self.hooks.push(hook);
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Get hook names for debugging.
    pub fn hook_names(&self) -> Vec<&str> {
        self.hooks.iter().map(|h| h.name()).collect()
    }

    pub fn on_step_start(&self, snapshot: &MarketSnapshot) {
        for hook in &self.hooks {
            hook.on_step_start(snapshot);
        }
    }

    pub fn on_orders_collected(&self, flow: &AggregatedFlow) {
        for hook in &self.hooks {
            hook.on_orders_collected(flow);
        }
    }

    pub fn on_step_end(&self, report: &StepReport) {
        for hook in &self.hooks {
            hook.on_step_end(report);
        }
    }

    pub fn on_simulation_end(&self, result: &SimulationResult) {
        for hook in &self.hooks {
            hook.on_simulation_end(result);
        }
    }
}

impl std::fmt::Debug for HookRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRunner")
            .field("hooks", &self.hook_names())
            .finish()
    }
}
