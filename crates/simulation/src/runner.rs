//! Simulation runner implementing the step loop.
//!
//! Each step runs a fixed pipeline exactly once:
//! 1. Snapshot the market
//! 2. Collect one intent per agent (optionally in parallel)
//! 3. Aggregate intents into a signed imbalance
//! 4. Evolve the fundamental value and apply price impact
//! 5. Clip intents against risk limits at the new price
//! 6. Check share conservation on the planned fills
//! 7. Execute, commit the market update and append a history record
//!
//! A step is atomic. Everything up to execution is computed without writing
//! state, so a failure leaves the history ending at the last completed step.
//!
//! # Lifecycle
//!
//! `Initialized -> Running -> Completed`, with `Failed` and `Aborted` as the
//! other terminal states. A terminal simulation cannot be resumed; build a new
//! one to re-run.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use agents::{Agent, AgentError};
use serde::{Deserialize, Serialize};
use sim_core::{AggregatedFlow, Market, SimCoreError, aggregate};
use tracing::{debug, error, info, warn};
use types::{
    AgentSummary, Cash, Fill, KindTotals, LIQUIDITY_PROVIDER_ID, Order, Price, StepRecord, Tick,
};

use crate::agent_factory::{MARKET_STREAM, build_roster, derive_seed};
use crate::config::{DecisionErrorPolicy, SimulationConfig};
use crate::error::{ConfigError, Result, SimulationError};
use crate::hooks::{HookRunner, SimulationHook};
use crate::ledger::{ExecutionPlan, Ledger};

// =============================================================================
// Lifecycle
// =============================================================================

/// Where a simulation is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SimulationState {
    Initialized,
    Running,
    Completed,
    /// Stopped by a fatal error; history up to the last completed step is kept.
    Failed,
    /// Stopped between steps by a [`StopHandle`].
    Aborted,
}

impl SimulationState {
    /// Whether no further steps can run.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Aborted)
    }
}

impl fmt::Display for SimulationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initialized => write!(f, "initialized"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

/// Cloneable handle that asks a running simulation to stop between steps.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

// =============================================================================
// Outputs
// =============================================================================

/// Everything that happened in one step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// The history entry appended for this step.
    pub record: StepRecord,
    /// Executed fills in roster order.
    pub fills: Vec<Fill>,
    /// Aggregated intents that moved the price.
    pub flow: AggregatedFlow,
}

/// Final state of the liquidity-provider account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProviderSummary {
    pub position: i64,
    pub cash: Cash,
}

/// Public result of a run: the history sequence plus the final roster.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub status: SimulationState,
    /// Failure reason when `status` is [`SimulationState::Failed`].
    pub error: Option<SimulationError>,
    pub history: Vec<StepRecord>,
    pub agents: Vec<AgentSummary>,
    pub liquidity_provider: ProviderSummary,
    pub total_shares_issued: i64,
    pub initial_price: Price,
    pub initial_fundamental_value: Price,
}

impl SimulationResult {
    pub fn is_completed(&self) -> bool {
        self.status == SimulationState::Completed
    }

    /// Price after the last completed step.
    pub fn final_price(&self) -> Price {
        self.history
            .last()
            .map(|r| r.price)
            .unwrap_or(self.initial_price)
    }

    /// Price series including the initial price.
    pub fn prices(&self) -> Vec<f64> {
        std::iter::once(self.initial_price.to_float())
            .chain(self.history.iter().map(|r| r.price.to_float()))
            .collect()
    }
}

// =============================================================================
// Simulation
// =============================================================================

/// The simulation engine.
///
/// Owns the market, the ledger and the roster. Market and ledger state is
/// written only in the serialized phase of a step; each agent's private
/// memory is touched only by its own `decide`.
pub struct Simulation {
    config: SimulationConfig,
    market: Market,
    agents: Vec<Box<dyn Agent>>,
    ledger: Ledger,
    state: SimulationState,
    history: Vec<StepRecord>,
    hooks: HookRunner,
    stop: StopHandle,
    error: Option<SimulationError>,
}

impl Simulation {
    /// Validate `config` and build the roster it describes.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let agents = build_roster(&config);
        Self::assemble(config, agents)
    }

    /// Validate `config` and run it with a caller-supplied roster.
    ///
    /// The roster counts in `config` are ignored. Agent ids must be unique
    /// and must not use the liquidity provider's id.
    pub fn with_roster(config: SimulationConfig, agents: Vec<Box<dyn Agent>>) -> Result<Self> {
        config.validate_parameters()?;
        if agents.is_empty() {
            return Err(ConfigError::EmptyRoster.into());
        }

        let mut seen = HashSet::with_capacity(agents.len());
        for agent in &agents {
            let id = agent.id();
            if id == LIQUIDITY_PROVIDER_ID {
                return Err(ConfigError::ReservedAgentId(id).into());
            }
            if !seen.insert(id) {
                return Err(ConfigError::DuplicateAgent(id).into());
            }
        }

        Self::assemble(config, agents)
    }

    fn assemble(config: SimulationConfig, agents: Vec<Box<dyn Agent>>) -> Result<Self> {
        let market = Market::new(
            &config.market,
            config.initial_price(),
            config.initial_fundamental(),
            config.price_volatility,
            derive_seed(config.seed, MARKET_STREAM),
        );
        let ledger = Ledger::new(config.execution, &agents, config.liquidity_provider_inventory)
            .map_err(invalid_state(0))?;

        debug!(
            agents = agents.len(),
            steps = config.simulation_steps,
            seed = config.seed,
            execution = ?config.execution,
            parallel = config.parallel_decisions && parallel::is_parallel_enabled(),
            "Simulation initialized"
        );

        Ok(Self {
            config,
            market,
            agents,
            ledger,
            state: SimulationState::Initialized,
            history: Vec::new(),
            hooks: HookRunner::new(),
            stop: StopHandle::new(),
            error: None,
        })
    }

    /// Register an observer. Hooks are called in registration order.
    pub fn add_hook(&mut self, hook: Arc<dyn SimulationHook>) {
        self.hooks.add(hook);
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// Handle for stopping [`run`](Self::run) from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn market(&self) -> &Market {
        &self.market
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn agents(&self) -> &[Box<dyn Agent>] {
        &self.agents
    }

    /// Completed steps, oldest first.
    pub fn history(&self) -> &[StepRecord] {
        &self.history
    }

    /// Failure reason once the run is [`SimulationState::Failed`].
    pub fn error(&self) -> Option<&SimulationError> {
        self.error.as_ref()
    }

    /// Final ledger state of every agent, marked at the current price.
    pub fn agent_summaries(&self) -> Vec<AgentSummary> {
        let price = self.market.price();
        self.agents
            .iter()
            .map(|agent| {
                let state = agent.state();
                AgentSummary {
                    id: agent.id(),
                    kind: agent.kind(),
                    cash: state.cash(),
                    position: state.position(),
                    entry_price: state.entry_price(),
                    realized_pnl: state.realized_pnl(),
                    wealth: state.wealth(price),
                }
            })
            .collect()
    }

    /// Snapshot the run's outputs in its current state.
    pub fn result(&self) -> SimulationResult {
        SimulationResult {
            status: self.state,
            error: self.error.clone(),
            history: self.history.clone(),
            agents: self.agent_summaries(),
            liquidity_provider: ProviderSummary {
                position: self.ledger.provider_position(),
                cash: self.ledger.provider_cash(),
            },
            total_shares_issued: self.ledger.total_shares_issued(),
            initial_price: self.config.initial_price(),
            initial_fundamental_value: self.config.initial_fundamental(),
        }
    }

    /// Run every remaining step.
    ///
    /// Stops early on a [`StopHandle`] request (`Aborted`) or a fatal error
    /// (`Failed`); both still return the accumulated result. Errors only when
    /// the simulation was already terminal.
    pub fn run(&mut self) -> Result<SimulationResult> {
        if self.state.is_terminal() {
            return Err(SimulationError::NotRunnable(self.state));
        }

        info!(
            steps = self.config.simulation_steps,
            agents = self.agents.len(),
            seed = self.config.seed,
            "Simulation started"
        );

        while !self.state.is_terminal() {
            if self.stop.is_stopped() {
                warn!(step = self.market.step(), "Stop requested, aborting run");
                self.finish(SimulationState::Aborted);
                break;
            }
            if self.step().is_err() {
                break;
            }
        }

        Ok(self.result())
    }

    /// Advance exactly one step.
    pub fn step(&mut self) -> Result<StepReport> {
        if self.state.is_terminal() {
            return Err(SimulationError::NotRunnable(self.state));
        }
        self.state = SimulationState::Running;

        match self.execute_step() {
            Ok(report) => {
                if self.market.step() >= self.config.simulation_steps {
                    info!(
                        steps = self.market.step(),
                        final_price = %self.market.price(),
                        fundamental = %self.market.fundamental_value(),
                        "Simulation completed"
                    );
                    self.finish(SimulationState::Completed);
                }
                Ok(report)
            }
            Err(err) => {
                error!(step = self.market.step() + 1, error = %err, "Simulation failed");
                self.error = Some(err.clone());
                self.finish(SimulationState::Failed);
                Err(err)
            }
        }
    }

    fn finish(&mut self, status: SimulationState) {
        self.state = status;
        let result = self.result();
        self.hooks.on_simulation_end(&result);
    }

    fn execute_step(&mut self) -> Result<StepReport> {
        let snapshot = self.market.snapshot();
        let step = snapshot.step;
        self.hooks.on_step_start(&snapshot);

        // Parallel phase: each agent reads the snapshot and writes only its own memory.
        let decisions = parallel::map_slice_mut(
            &mut self.agents,
            |agent| agent.decide(&snapshot),
            !self.config.parallel_decisions,
        );
        let intents = self.collect_intents(step, decisions)?;

        // Serialized phase.
        let flow = aggregate(intents.iter().flatten()).map_err(invalid_state(step))?;
        self.hooks.on_orders_collected(&flow);

        let update = self
            .market
            .stage(flow.imbalance_f64())
            .map_err(invalid_state(step))?;
        let plan = self
            .ledger
            .plan(&self.agents, &intents, update.price)
            .map_err(invalid_state(step))?;

        self.check_conservation(step, &plan)?;

        self.ledger
            .apply(&mut self.agents, &plan)
            .map_err(invalid_state(step))?;
        self.market.commit(update, flow.imbalance, plan.volume());

        let record = self.record(step, &flow, &plan);
        debug!(
            step,
            price = %record.price,
            fundamental = %record.fundamental_value,
            imbalance = record.imbalance,
            volume = record.volume,
            trades = record.trades,
            forced = record.forced_liquidations,
            "Step complete"
        );

        let report = StepReport {
            record: record.clone(),
            fills: plan.fills(),
            flow,
        };
        self.history.push(record);
        self.hooks.on_step_end(&report);
        Ok(report)
    }

    fn collect_intents(
        &self,
        step: Tick,
        decisions: Vec<std::result::Result<Option<Order>, AgentError>>,
    ) -> Result<Vec<Option<Order>>> {
        let mut intents = Vec::with_capacity(decisions.len());
        for (agent, decision) in self.agents.iter().zip(decisions) {
            let intent = match decision {
                Ok(order) => order.filter(|o| !o.quantity.is_zero()),
                Err(source) => match self.config.decision_errors {
                    DecisionErrorPolicy::Skip => {
                        warn!(
                            step,
                            agent = %agent.id(),
                            strategy = agent.name(),
                            error = %source,
                            "Decision failed, treating as no order"
                        );
                        None
                    }
                    DecisionErrorPolicy::Strict => {
                        return Err(SimulationError::Decision {
                            step,
                            agent: agent.id(),
                            source,
                        });
                    }
                },
            };
            intents.push(intent);
        }
        Ok(intents)
    }

    /// Shares outstanding after `plan` must equal the shares issued.
    fn check_conservation(&self, step: Tick, plan: &ExecutionPlan) -> Result<()> {
        let actual = plan.shares_outstanding();
        let expected = self.ledger.total_shares_issued();
        if actual != expected {
            return Err(SimulationError::ConservationViolated {
                step,
                expected,
                actual,
            });
        }
        Ok(())
    }

    fn record(&self, step: Tick, flow: &AggregatedFlow, plan: &ExecutionPlan) -> StepRecord {
        let price = self.market.price();
        let mut record = StepRecord {
            step,
            price,
            fundamental_value: self.market.fundamental_value(),
            volume: plan.volume(),
            imbalance: flow.imbalance,
            trades: plan.trades(),
            forced_liquidations: plan.forced_liquidations(),
            liquidity_provider_position: self.ledger.provider_position(),
            fundamentalists: KindTotals::default(),
            chartists: KindTotals::default(),
            noise_traders: KindTotals::default(),
        };
        for agent in &self.agents {
            record
                .totals_mut(agent.kind())
                .add(agent.position(), agent.cash(), price);
        }
        record
    }
}

fn invalid_state(step: Tick) -> impl Fn(SimCoreError) -> SimulationError {
    move |source| SimulationError::InvalidState { step, source }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SimulationConfig {
        SimulationConfig::default()
            .with_steps(5)
            .with_agents(3, 3, 3)
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut sim = Simulation::new(small_config()).unwrap();
        assert_eq!(sim.state(), SimulationState::Initialized);

        let report = sim.step().unwrap();
        assert_eq!(report.record.step, 1);
        assert_eq!(sim.state(), SimulationState::Running);
        assert_eq!(sim.history().len(), 1);

        for _ in 0..4 {
            sim.step().unwrap();
        }
        assert_eq!(sim.state(), SimulationState::Completed);
        assert_eq!(sim.history().len(), 5);
    }

    #[test]
    fn test_completed_run_cannot_step_or_run() {
        let mut sim = Simulation::new(small_config()).unwrap();
        let result = sim.run().unwrap();
        assert!(result.is_completed());

        assert_eq!(
            sim.step(),
            Err(SimulationError::NotRunnable(SimulationState::Completed))
        );
        assert!(matches!(
            sim.run(),
            Err(SimulationError::NotRunnable(SimulationState::Completed))
        ));
        assert_eq!(sim.history().len(), 5);
    }

    #[test]
    fn test_invalid_config_never_constructs() {
        let config = small_config().with_steps(0);
        assert!(matches!(
            Simulation::new(config),
            Err(SimulationError::Configuration(_))
        ));
    }

    #[test]
    fn test_custom_roster_ids_are_checked() {
        let config = small_config().with_agents(1, 0, 0);
        let mut duplicate = build_roster(&config);
        duplicate.extend(build_roster(&config));
        assert!(matches!(
            Simulation::with_roster(small_config(), duplicate),
            Err(SimulationError::Configuration(ConfigError::DuplicateAgent(_)))
        ));

        assert!(matches!(
            Simulation::with_roster(small_config(), Vec::new()),
            Err(SimulationError::Configuration(ConfigError::EmptyRoster))
        ));
    }

    #[test]
    fn test_stop_before_run_aborts_immediately() {
        let mut sim = Simulation::new(small_config()).unwrap();
        sim.stop_handle().stop();
        let result = sim.run().unwrap();
        assert_eq!(result.status, SimulationState::Aborted);
        assert!(result.history.is_empty());
        assert_eq!(result.final_price(), result.initial_price);
    }

    #[test]
    fn test_result_prices_start_at_initial() {
        let mut sim = Simulation::new(small_config()).unwrap();
        let result = sim.run().unwrap();
        let prices = result.prices();
        assert_eq!(prices.len(), 6);
        assert!((prices[0] - 100.0).abs() < 1e-12);
        assert_eq!(result.agents.len(), 9);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SimulationState::Completed.to_string(), "completed");
        assert!(SimulationState::Aborted.is_terminal());
        assert!(!SimulationState::Running.is_terminal());
    }
}
