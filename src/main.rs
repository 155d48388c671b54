//! Market ABM - Main binary
//!
//! Runs a headless simulation with the default parameter set and logs the
//! run summary. Set `RUST_LOG=debug` to see per-step records and risk clips.

use simulation::{MetricsHook, RunStatistics, Simulation, SimulationConfig};
use std::sync::Arc;
use tracing::{info, warn};
use types::AgentKind;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = SimulationConfig::default();
    info!(
        steps = config.simulation_steps,
        agents = config.roster_size(),
        seed = config.seed,
        "Starting market simulation"
    );

    let mut sim = Simulation::new(config)?;
    let metrics = Arc::new(MetricsHook::new());
    sim.add_hook(metrics.clone());

    let result = sim.run()?;
    if let Some(ref err) = result.error {
        warn!(status = %result.status, error = %err, "Run ended early");
    }

    let stats = RunStatistics::from_result(&result);
    let snapshot = metrics.snapshot();

    info!(
        status = %result.status,
        steps = stats.steps,
        final_price = stats.price.last,
        min_price = stats.price.min,
        max_price = stats.price.max,
        max_drawdown = stats.price.max_drawdown,
        "Price summary"
    );
    info!(
        mean = ?stats.returns.mean,
        std = ?stats.returns.std,
        sharpe = ?stats.returns.sharpe_ratio,
        autocorrelation = ?stats.returns.autocorrelation,
        abs_autocorrelation = ?stats.returns.abs_autocorrelation,
        hurst = ?stats.returns.hurst_exponent,
        "Return summary"
    );
    info!(
        mean = stats.mispricing.mean,
        mean_abs = stats.mispricing.mean_abs,
        max_abs = stats.mispricing.max_abs,
        "Mispricing summary"
    );
    info!(
        total_volume = stats.volume.total,
        total_orders = snapshot.total_orders,
        clipped_fills = snapshot.clipped_fills,
        forced_liquidations = snapshot.forced_liquidations,
        provider_position = result.liquidity_provider.position,
        "Trading summary"
    );

    for kind in AgentKind::ALL {
        if let Some(perf) = stats.performance.iter().find(|p| p.kind == kind)
            && perf.agents > 0
        {
            info!(
                kind = %kind,
                agents = perf.agents,
                avg_wealth = perf.last_avg_wealth,
                wealth_return = ?perf.wealth_return,
                "Agent performance"
            );
        }
    }
    if let Some(relative) = stats.fundamentalist_vs_chartist {
        info!(relative, "Fundamentalist vs chartist wealth");
    }

    Ok(())
}
