//! Integration tests for properties that must hold on every step of a run.
//!
//! Each test drives a full simulation step by step and checks share
//! conservation, price positivity, the wealth identity, position limits and
//! determinism against the default parameter set.

use std::collections::HashMap;

use simulation::{ExecutionMode, Simulation, SimulationConfig, SimulationState};
use types::{AgentId, Cash, Fill};

fn config(steps: u64) -> SimulationConfig {
    SimulationConfig::default().with_steps(steps)
}

/// Cash and position of every agent, keyed by id.
fn ledger_view(sim: &Simulation) -> HashMap<AgentId, (Cash, i64)> {
    sim.agents()
        .iter()
        .map(|a| (a.id(), (a.cash(), a.position())))
        .collect()
}

fn run_checked(config: SimulationConfig) -> Simulation {
    let max_position = config.risk.max_position;
    let cash_floor = Cash::ZERO - config.risk.overdraft_tolerance;
    let mut sim = Simulation::new(config).unwrap();

    while sim.state() != SimulationState::Completed {
        let before = ledger_view(&sim);
        let report = sim.step().unwrap();
        let after = ledger_view(&sim);
        let fills: HashMap<AgentId, Fill> = report.fills.iter().map(|f| (f.agent_id, *f)).collect();

        // Share conservation.
        let held: i64 = after.values().map(|(_, position)| position).sum();
        assert_eq!(
            held + sim.ledger().provider_position(),
            sim.ledger().total_shares_issued(),
            "step {}",
            report.record.step
        );

        // Price positivity.
        assert!(report.record.price.is_positive());

        for (id, (cash_after, position_after)) in &after {
            let (cash_before, position_before) = before[id];
            let filled = fills.get(id).map(|f| f.filled).unwrap_or(0);

            // Wealth identity: cash moves by exactly -filled * price.
            let expected = report.record.price.checked_notional(filled).unwrap();
            assert_eq!(cash_before - *cash_after, expected, "{id} step {}", report.record.step);
            assert_eq!(position_after - position_before, filled);

            // Risk clipping.
            assert!(position_after.unsigned_abs() <= max_position);
            assert!(*cash_after >= cash_floor, "{id} overdrawn: {cash_after}");
        }

        let volume: u64 = report.fills.iter().map(|f| f.filled.unsigned_abs()).sum();
        assert_eq!(volume, report.record.volume);
    }

    sim
}

#[test]
fn test_default_run_holds_invariants() {
    let sim = run_checked(config(300));
    assert_eq!(sim.history().len(), 300);
    assert!(sim.history().iter().any(|r| r.volume > 0));
}

#[test]
fn test_rationed_run_holds_invariants_without_provider() {
    let sim = run_checked(config(200).with_execution(ExecutionMode::Rationed));

    assert_eq!(sim.ledger().provider_position(), 0);
    assert_eq!(sim.ledger().provider_cash(), Cash::ZERO);
    let held: i64 = sim.agents().iter().map(|a| a.position()).sum();
    assert_eq!(held, sim.ledger().total_shares_issued());
    assert!(sim.history().iter().all(|r| r.liquidity_provider_position == 0));
}

#[test]
fn test_invariants_with_short_selling_and_overdraft() {
    let risk = types::RiskLimits::new(80, 0.15, 0.25)
        .with_short_selling(true)
        .with_overdraft(Cash::from_float(500.0));
    run_checked(config(200).with_risk(risk).with_agents(20, 20, 20));
}

#[test]
fn test_invariants_with_unbounded_short_limits() {
    let risk = types::RiskLimits::new(u64::MAX, 0.1, 0.2).with_short_selling(true);
    let sim = run_checked(config(200).with_risk(risk));
    assert_eq!(sim.state(), SimulationState::Completed);
}

#[test]
fn test_same_seed_gives_identical_history() {
    let first = Simulation::new(config(200)).unwrap().run().unwrap();
    let second = Simulation::new(config(200)).unwrap().run().unwrap();

    assert_eq!(
        serde_json::to_string(&first.history).unwrap(),
        serde_json::to_string(&second.history).unwrap()
    );
    assert_eq!(first.agents, second.agents);
}

#[test]
fn test_different_seed_gives_different_history() {
    let first = Simulation::new(config(200)).unwrap().run().unwrap();
    let second = Simulation::new(config(200).with_seed(7)).unwrap().run().unwrap();
    assert_ne!(first.history, second.history);
}

#[test]
fn test_parallel_decisions_match_sequential() {
    // Test builds enable rayon, so this compares the two execution paths.
    assert!(parallel::is_parallel_enabled());

    let sequential = Simulation::new(config(150)).unwrap().run().unwrap();
    let parallel = Simulation::new(config(150).with_parallel_decisions(true))
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(sequential.history, parallel.history);
    assert_eq!(sequential.agents, parallel.agents);
}

#[test]
fn test_kind_totals_cover_roster() {
    let result = Simulation::new(config(20).with_agents(5, 4, 3))
        .unwrap()
        .run()
        .unwrap();

    for record in &result.history {
        assert_eq!(record.fundamentalists.agents, 5);
        assert_eq!(record.chartists.agents, 4);
        assert_eq!(record.noise_traders.agents, 3);
        assert_eq!(
            record.agent_position() + record.liquidity_provider_position,
            result.total_shares_issued
        );
    }

    let last = result.history.last().unwrap();
    let wealth: Cash = result.agents.iter().map(|a| a.wealth).sum();
    assert_eq!(
        wealth,
        last.fundamentalists.wealth + last.chartists.wealth + last.noise_traders.wealth
    );
}
