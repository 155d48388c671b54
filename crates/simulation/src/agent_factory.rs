//! Agent Factory: builds the roster from configuration.
//!
//! IDs start at 1 (0 belongs to the liquidity provider) and are assigned in
//! roster order: fundamentalists, then chartists, then noise traders. Every
//! agent starts with the same cash and position, bought at the initial price.

use agents::{Agent, AgentState, Chartist, Fundamentalist, NoiseTrader};
use types::AgentId;

use crate::config::SimulationConfig;

/// Random stream reserved for the fundamental-value process.
pub const MARKET_STREAM: u64 = 0;

/// Derive an independent seed for `stream` from the master seed (splitmix64).
pub fn derive_seed(seed: u64, stream: u64) -> u64 {
    let mut z = seed.wrapping_add(stream.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Build every agent the configuration asks for.
pub fn build_roster(config: &SimulationConfig) -> Vec<Box<dyn Agent>> {
    let mut agents: Vec<Box<dyn Agent>> = Vec::with_capacity(config.roster_size());
    let mut next_id = 1u64;

    let mut allocate = || {
        let id = AgentId(next_id);
        next_id += 1;
        id
    };
    let state = || {
        AgentState::new(
            config.initial_cash(),
            config.initial_position,
            config.initial_price(),
            config.risk,
        )
    };

    for _ in 0..config.num_fundamentalists {
        let id = allocate();
        agents.push(Box::new(Fundamentalist::new(
            id,
            config.fundamentalist.clone(),
            state(),
            derive_seed(config.seed, id.0),
        )));
    }

    for _ in 0..config.num_chartists {
        let id = allocate();
        agents.push(Box::new(Chartist::new(id, config.chartist.clone(), state())));
    }

    for _ in 0..config.num_noise_traders {
        let id = allocate();
        agents.push(Box::new(NoiseTrader::new(
            id,
            config.noise.clone(),
            state(),
            derive_seed(config.seed, id.0),
        )));
    }

    agents
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{AgentKind, Cash};

    #[test]
    fn test_roster_order_and_ids() {
        let config = SimulationConfig::default().with_agents(2, 3, 1);
        let roster = build_roster(&config);

        let kinds: Vec<_> = roster.iter().map(|a| a.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                AgentKind::Fundamentalist,
                AgentKind::Fundamentalist,
                AgentKind::Chartist,
                AgentKind::Chartist,
                AgentKind::Chartist,
                AgentKind::NoiseTrader,
            ]
        );
        let ids: Vec<_> = roster.iter().map(|a| a.id().0).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_initial_ledger() {
        let config = SimulationConfig::default()
            .with_agents(1, 1, 1)
            .with_initial_holdings(5_000.0, 12);
        for agent in build_roster(&config) {
            assert_eq!(agent.cash(), Cash::from_float(5_000.0));
            assert_eq!(agent.position(), 12);
            assert_eq!(agent.state().entry_price(), config.initial_price());
        }
    }

    #[test]
    fn test_derive_seed_separates_streams() {
        let a = derive_seed(42, MARKET_STREAM);
        let b = derive_seed(42, 1);
        let c = derive_seed(43, MARKET_STREAM);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, derive_seed(42, MARKET_STREAM));
    }
}
