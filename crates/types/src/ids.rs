//! Identifier types for the market simulation.

use derive_more::{Add, From, Into};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Constants
// =============================================================================

/// Price scale factor: 10,000 means 4 decimal places.
/// - `10000` = $1.00
/// - `1` = $0.0001 (smallest price increment)
pub const PRICE_SCALE: i64 = 10_000;

/// Sentinel AgentId for the market liquidity provider.
///
/// Strategy agents are numbered from 1, so this id never collides with a
/// roster member.
pub const LIQUIDITY_PROVIDER_ID: AgentId = AgentId(0);

// =============================================================================
// Core ID Types
// =============================================================================

/// Unique identifier for a trading agent.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Default,
    Add,
    From,
    Into,
)]
pub struct AgentId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Agent#{}", self.0)
    }
}

/// Simulation step (discrete time index, starting at 0 for the initial state).
pub type Tick = u64;

// =============================================================================
// Agent Kind
// =============================================================================

/// Strategy family an agent belongs to. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    Fundamentalist,
    Chartist,
    NoiseTrader,
}

impl AgentKind {
    /// All kinds, in roster order.
    pub const ALL: [AgentKind; 3] = [
        AgentKind::Fundamentalist,
        AgentKind::Chartist,
        AgentKind::NoiseTrader,
    ];
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentKind::Fundamentalist => write!(f, "Fundamentalist"),
            AgentKind::Chartist => write!(f, "Chartist"),
            AgentKind::NoiseTrader => write!(f, "NoiseTrader"),
        }
    }
}
