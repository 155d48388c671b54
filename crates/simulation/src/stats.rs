//! Summary statistics of a finished run.
//!
//! Pure functions of a [`SimulationResult`]; nothing here performs I/O.
//! Price series include the initial price ahead of the first record.

use quant::{risk, stats};
use serde::{Deserialize, Serialize};
use types::AgentKind;

use crate::runner::SimulationResult;

/// Trading periods per year used to annualise the Sharpe ratio.
pub const PERIODS_PER_YEAR: f64 = 252.0;

/// Largest lag used by the Hurst estimate.
pub const HURST_MAX_LAG: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceStatistics {
    pub mean: f64,
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
    pub last: f64,
    /// Largest peak-to-trough decline as a fraction of the peak.
    pub max_drawdown: f64,
}

/// Statistics of per-step log returns. Every field is `None` when the series
/// is too short or constant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnStatistics {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub skewness: Option<f64>,
    pub excess_kurtosis: Option<f64>,
    /// Annualised with [`PERIODS_PER_YEAR`].
    pub sharpe_ratio: Option<f64>,
    /// Lag-1 autocorrelation of returns.
    pub autocorrelation: Option<f64>,
    /// Lag-1 autocorrelation of absolute returns (volatility clustering).
    pub abs_autocorrelation: Option<f64>,
    /// Estimated on log prices; 0.5 for a random walk.
    pub hurst_exponent: Option<f64>,
}

/// `price - fundamental_value` over the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MispricingStatistics {
    pub mean: f64,
    pub mean_abs: f64,
    pub max_abs: f64,
    pub last: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeStatistics {
    pub total: u64,
    pub mean: f64,
    pub max: u64,
}

/// Average wealth of one agent kind between the first and last record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindPerformance {
    pub kind: AgentKind,
    pub agents: usize,
    pub first_avg_wealth: f64,
    pub last_avg_wealth: f64,
    /// `last / first - 1`; `None` when the kind is absent or started with no wealth.
    pub wealth_return: Option<f64>,
}

/// Everything computed from a run's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub steps: usize,
    pub price: PriceStatistics,
    pub returns: ReturnStatistics,
    pub mispricing: MispricingStatistics,
    pub volume: VolumeStatistics,
    /// One entry per agent kind, in [`AgentKind::ALL`] order.
    pub performance: Vec<KindPerformance>,
    /// Final fundamentalist average wealth relative to chartists, minus one.
    pub fundamentalist_vs_chartist: Option<f64>,
}

impl RunStatistics {
    pub fn from_result(result: &SimulationResult) -> Self {
        let prices = result.prices();
        let fundamentals: Vec<f64> = std::iter::once(result.initial_fundamental_value.to_float())
            .chain(result.history.iter().map(|r| r.fundamental_value.to_float()))
            .collect();

        let performance: Vec<KindPerformance> = AgentKind::ALL
            .iter()
            .map(|&kind| kind_performance(result, kind))
            .collect();

        let fundamentalist_vs_chartist = match (
            performance.iter().find(|p| p.kind == AgentKind::Fundamentalist),
            performance.iter().find(|p| p.kind == AgentKind::Chartist),
        ) {
            (Some(f), Some(c)) if f.agents > 0 && c.agents > 0 && c.last_avg_wealth != 0.0 => {
                Some(f.last_avg_wealth / c.last_avg_wealth - 1.0)
            }
            _ => None,
        };

        Self {
            steps: result.history.len(),
            price: price_statistics(&prices),
            returns: return_statistics(&prices),
            mispricing: mispricing_statistics(&prices, &fundamentals),
            volume: volume_statistics(result),
            performance,
            fundamentalist_vs_chartist,
        }
    }
}

fn price_statistics(prices: &[f64]) -> PriceStatistics {
    PriceStatistics {
        mean: stats::mean(prices).unwrap_or(0.0),
        std: stats::std_dev(prices),
        min: prices.iter().copied().fold(f64::INFINITY, f64::min),
        max: prices.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        last: prices.last().copied().unwrap_or(0.0),
        max_drawdown: risk::max_drawdown(prices),
    }
}

fn return_statistics(prices: &[f64]) -> ReturnStatistics {
    let returns = stats::log_returns(prices);
    let abs_returns: Vec<f64> = returns.iter().map(|r| r.abs()).collect();
    let log_prices: Vec<f64> = prices.iter().map(|p| p.ln()).collect();

    ReturnStatistics {
        count: returns.len(),
        mean: stats::mean(&returns),
        std: stats::std_dev(&returns),
        skewness: stats::skewness(&returns),
        excess_kurtosis: stats::excess_kurtosis(&returns),
        sharpe_ratio: risk::sharpe_ratio(&returns, PERIODS_PER_YEAR),
        autocorrelation: stats::autocorrelation(&returns, 1),
        abs_autocorrelation: stats::autocorrelation(&abs_returns, 1),
        hurst_exponent: stats::hurst_exponent(&log_prices, HURST_MAX_LAG),
    }
}

fn mispricing_statistics(prices: &[f64], fundamentals: &[f64]) -> MispricingStatistics {
    let gaps: Vec<f64> = prices
        .iter()
        .zip(fundamentals)
        .map(|(p, f)| p - f)
        .collect();
    let abs_gaps: Vec<f64> = gaps.iter().map(|g| g.abs()).collect();

    MispricingStatistics {
        mean: stats::mean(&gaps).unwrap_or(0.0),
        mean_abs: stats::mean(&abs_gaps).unwrap_or(0.0),
        max_abs: abs_gaps.iter().copied().fold(0.0, f64::max),
        last: gaps.last().copied().unwrap_or(0.0),
    }
}

fn volume_statistics(result: &SimulationResult) -> VolumeStatistics {
    let total: u64 = result.history.iter().map(|r| r.volume).sum();
    let mean = if result.history.is_empty() {
        0.0
    } else {
        total as f64 / result.history.len() as f64
    };
    VolumeStatistics {
        total,
        mean,
        max: result.history.iter().map(|r| r.volume).max().unwrap_or(0),
    }
}

fn kind_performance(result: &SimulationResult, kind: AgentKind) -> KindPerformance {
    let first = result.history.first().map(|r| *r.totals(kind));
    let last = result.history.last().map(|r| *r.totals(kind));
    let (first, last) = (first.unwrap_or_default(), last.unwrap_or_default());

    let first_avg_wealth = first.average_wealth();
    let last_avg_wealth = last.average_wealth();
    let wealth_return = (first.agents > 0 && first_avg_wealth > 0.0)
        .then(|| last_avg_wealth / first_avg_wealth - 1.0);

    KindPerformance {
        kind,
        agents: last.agents,
        first_avg_wealth,
        last_avg_wealth,
        wealth_return,
    }
}
