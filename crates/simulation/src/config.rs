//! Simulation configuration.
//!
//! [`SimulationConfig`] is an explicit, immutable value threaded into the
//! engine at construction. Defaults reproduce the reference parameter set
//! (1000 steps, 90/90/20 agents, price 100, seed 42).

use agents::{ChartistConfig, FundamentalistConfig, NoiseTraderConfig};
use serde::{Deserialize, Serialize};
use sim_core::MarketConfig;
use types::{Cash, Price, RiskLimits};

use crate::error::ConfigError;

// =============================================================================
// Policies
// =============================================================================

/// Who takes the other side of the agents' net executed flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExecutionMode {
    /// A liquidity-provider account absorbs the net flow at the step's price.
    #[default]
    LiquidityProvider,
    /// The heavier side is scaled down pro-rata so agent buys equal agent sells.
    Rationed,
}

/// What to do when an agent's decision function returns an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DecisionErrorPolicy {
    /// Log the error and treat it as "no order" for that agent this step.
    #[default]
    Skip,
    /// Fail the run.
    Strict,
}

// =============================================================================
// SimulationConfig
// =============================================================================

/// Configuration for the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of pipeline iterations.
    pub simulation_steps: u64,
    pub initial_price: f64,
    pub initial_fundamental_value: f64,
    /// Per-step relative volatility of the fundamental value.
    pub price_volatility: f64,
    /// Price-impact and bound parameters.
    pub market: MarketConfig,

    pub num_fundamentalists: usize,
    pub num_chartists: usize,
    pub num_noise_traders: usize,

    /// Starting cash of every agent.
    pub initial_wealth: f64,
    /// Starting shares of every agent, bought at `initial_price`.
    pub initial_position: i64,

    pub fundamentalist: FundamentalistConfig,
    pub chartist: ChartistConfig,
    pub noise: NoiseTraderConfig,

    /// Limits applied to every agent.
    pub risk: RiskLimits,

    pub execution: ExecutionMode,
    /// Starting share inventory of the liquidity provider.
    pub liquidity_provider_inventory: i64,

    /// Master seed for every random stream in the run.
    pub seed: u64,
    /// Evaluate decisions concurrently (effective with the `parallel` feature).
    pub parallel_decisions: bool,
    pub decision_errors: DecisionErrorPolicy,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            simulation_steps: 1_000,
            initial_price: 100.0,
            initial_fundamental_value: 100.0,
            price_volatility: 0.01,
            market: MarketConfig::default(),
            num_fundamentalists: 90,
            num_chartists: 90,
            num_noise_traders: 20,
            initial_wealth: 10_000.0,
            initial_position: 30,
            fundamentalist: FundamentalistConfig::default(),
            chartist: ChartistConfig::default(),
            noise: NoiseTraderConfig::default(),
            risk: RiskLimits::default(),
            execution: ExecutionMode::default(),
            liquidity_provider_inventory: 0,
            seed: 42,
            parallel_decisions: false,
            decision_errors: DecisionErrorPolicy::default(),
        }
    }
}

impl SimulationConfig {
    pub fn initial_price(&self) -> Price {
        Price::from_float(self.initial_price)
    }

    pub fn initial_fundamental(&self) -> Price {
        Price::from_float(self.initial_fundamental_value)
    }

    pub fn initial_cash(&self) -> Cash {
        Cash::from_float(self.initial_wealth)
    }

    /// Total number of strategy agents.
    pub fn roster_size(&self) -> usize {
        self.num_fundamentalists + self.num_chartists + self.num_noise_traders
    }

    pub fn with_steps(mut self, steps: u64) -> Self {
        self.simulation_steps = steps;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_initial_price(mut self, price: f64) -> Self {
        self.initial_price = price;
        self
    }

    pub fn with_initial_fundamental_value(mut self, value: f64) -> Self {
        self.initial_fundamental_value = value;
        self
    }

    pub fn with_price_volatility(mut self, volatility: f64) -> Self {
        self.price_volatility = volatility;
        self
    }

    pub fn with_market(mut self, market: MarketConfig) -> Self {
        self.market = market;
        self
    }

    /// Set roster composition.
    pub fn with_agents(mut self, fundamentalists: usize, chartists: usize, noise: usize) -> Self {
        self.num_fundamentalists = fundamentalists;
        self.num_chartists = chartists;
        self.num_noise_traders = noise;
        self
    }

    pub fn with_initial_holdings(mut self, wealth: f64, position: i64) -> Self {
        self.initial_wealth = wealth;
        self.initial_position = position;
        self
    }

    pub fn with_fundamentalist(mut self, config: FundamentalistConfig) -> Self {
        self.fundamentalist = config;
        self
    }

    pub fn with_chartist(mut self, config: ChartistConfig) -> Self {
        self.chartist = config;
        self
    }

    pub fn with_noise(mut self, config: NoiseTraderConfig) -> Self {
        self.noise = config;
        self
    }

    pub fn with_risk(mut self, risk: RiskLimits) -> Self {
        self.risk = risk;
        self
    }

    pub fn with_execution(mut self, mode: ExecutionMode) -> Self {
        self.execution = mode;
        self
    }

    pub fn with_liquidity_provider_inventory(mut self, shares: i64) -> Self {
        self.liquidity_provider_inventory = shares;
        self
    }

    pub fn with_parallel_decisions(mut self, parallel: bool) -> Self {
        self.parallel_decisions = parallel;
        self
    }

    pub fn with_decision_errors(mut self, policy: DecisionErrorPolicy) -> Self {
        self.decision_errors = policy;
        self
    }

    /// Check every parameter. Roster counts are checked separately by
    /// [`validate`](Self::validate) so custom rosters can reuse the rest.
    pub fn validate_parameters(&self) -> Result<(), ConfigError> {
        if self.simulation_steps == 0 {
            return Err(ConfigError::invalid("simulation_steps", "must be at least 1"));
        }

        let market = &self.market;
        positive("market.price_floor", market.price_floor)?;
        positive("market.price_ceiling", market.price_ceiling)?;
        if market.price_floor >= market.price_ceiling {
            return Err(ConfigError::invalid(
                "market.price_floor",
                format!(
                    "floor {} must be below ceiling {}",
                    market.price_floor, market.price_ceiling
                ),
            ));
        }
        non_negative("market.impact_coefficient", market.impact_coefficient)?;
        positive("market.liquidity_scale", market.liquidity_scale)?;
        positive("market.fundamental_floor", market.fundamental_floor)?;
        positive("market.shock_bound", market.shock_bound)?;

        positive("initial_price", self.initial_price)?;
        if self.initial_price < market.price_floor || self.initial_price > market.price_ceiling {
            return Err(ConfigError::invalid(
                "initial_price",
                format!(
                    "{} lies outside [{}, {}]",
                    self.initial_price, market.price_floor, market.price_ceiling
                ),
            ));
        }
        positive("initial_fundamental_value", self.initial_fundamental_value)?;
        non_negative("price_volatility", self.price_volatility)?;

        non_negative("initial_wealth", self.initial_wealth)?;
        let max_position = self.risk.max_position_signed();
        if self.initial_position.unsigned_abs() > self.risk.max_position {
            return Err(ConfigError::invalid(
                "initial_position",
                format!("|{}| exceeds max_position {max_position}", self.initial_position),
            ));
        }
        if self.initial_position < 0 && !self.risk.allow_short {
            return Err(ConfigError::invalid(
                "initial_position",
                "negative holdings require short selling",
            ));
        }
        positive("risk.stop_loss_fraction", self.risk.stop_loss_fraction)?;
        positive("risk.take_profit_fraction", self.risk.take_profit_fraction)?;
        if self.risk.overdraft_tolerance.is_negative() {
            return Err(ConfigError::invalid("risk.overdraft_tolerance", "must be >= 0"));
        }

        let f = &self.fundamentalist;
        unit_interval("fundamentalist.confidence", f.confidence)?;
        non_negative("fundamentalist.reaction_speed", f.reaction_speed)?;
        non_negative("fundamentalist.hold_band", f.hold_band)?;
        positive("fundamentalist.liquidation_gap", f.liquidation_gap)?;
        non_negative("fundamentalist.valuation_noise", f.valuation_noise)?;
        unit_interval("fundamentalist.cash_fraction", f.cash_fraction)?;

        let c = &self.chartist;
        if c.memory < 2 {
            return Err(ConfigError::invalid("chartist.memory", "must be at least 2"));
        }
        non_negative("chartist.sensitivity", c.sensitivity)?;
        unit_interval("chartist.confidence", c.confidence)?;
        non_negative("chartist.signal_threshold", c.signal_threshold)?;
        non_negative("chartist.position_scale", c.position_scale)?;
        unit_interval("chartist.cash_fraction", c.cash_fraction)?;

        let n = &self.noise;
        unit_interval("noise.trade_probability", n.trade_probability)?;
        unit_interval("noise.price_range", n.price_range)?;

        Ok(())
    }

    /// Check every parameter and require a non-empty roster.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_parameters()?;
        if self.roster_size() == 0 {
            return Err(ConfigError::EmptyRoster);
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("{value} must be finite and > 0")))
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("{value} must be finite and >= 0")))
    }
}

fn unit_interval(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("{value} must lie in [0, 1]")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.roster_size(), 200);
        assert_eq!(config.initial_price(), Price::from_float(100.0));
    }

    #[test]
    fn test_zero_steps_rejected() {
        let err = SimulationConfig::default().with_steps(0).validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "simulation_steps", .. }));
    }

    #[test]
    fn test_empty_roster_rejected() {
        let config = SimulationConfig::default().with_agents(0, 0, 0);
        assert_eq!(config.validate(), Err(ConfigError::EmptyRoster));
        assert!(config.validate_parameters().is_ok());
    }

    #[test]
    fn test_out_of_range_parameters_rejected() {
        let mut config = SimulationConfig::default();
        config.noise.trade_probability = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "noise.trade_probability", .. })
        ));

        let config = SimulationConfig::default().with_initial_price(f64::NAN);
        assert!(config.validate().is_err());

        let config = SimulationConfig::default().with_price_volatility(-0.1);
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.chartist.memory = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_initial_position_must_fit_limits() {
        let config = SimulationConfig::default().with_initial_holdings(10_000.0, 200);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "initial_position", .. })
        ));

        let config = SimulationConfig::default().with_initial_holdings(10_000.0, -5);
        assert!(config.validate().is_err());

        let config = SimulationConfig::default()
            .with_initial_holdings(10_000.0, -5)
            .with_risk(RiskLimits::default().with_short_selling(true));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_price_bounds_must_bracket_initial_price() {
        let config = SimulationConfig::default()
            .with_market(MarketConfig::default().with_price_bounds(150.0, 200.0));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "initial_price", .. })
        ));

        let config = SimulationConfig::default()
            .with_market(MarketConfig::default().with_price_bounds(10.0, 5.0));
        assert!(config.validate().is_err());
    }
}
