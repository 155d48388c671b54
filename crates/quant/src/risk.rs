//! Return-based risk metrics.

use crate::stats;

/// Annualized Sharpe ratio with a zero risk-free rate.
///
/// Uses the population standard deviation of the periodic returns.
///
/// # Arguments
/// * `returns` - Periodic returns
/// * `periods_per_year` - Number of periods in a year (252 for daily)
pub fn sharpe_ratio(returns: &[f64], periods_per_year: f64) -> Option<f64> {
    if returns.len() < 2 {
        return None;
    }

    let mean_return = stats::mean(returns)?;
    let std = stats::std_dev(returns)?;

    if std == 0.0 {
        return None;
    }

    Some(mean_return / std * periods_per_year.sqrt())
}

/// Largest peak-to-trough decline of a series, as a fraction of the peak.
pub fn max_drawdown(series: &[f64]) -> f64 {
    let Some(&first) = series.first() else {
        return 0.0;
    };

    let mut max_dd: f64 = 0.0;
    let mut peak = first;

    for &value in series {
        if value > peak {
            peak = value;
        }
        if peak > 0.0 {
            max_dd = max_dd.max((peak - value) / peak);
        }
    }

    max_dd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sharpe_sign_follows_mean() {
        let up = [0.01, 0.02, 0.015, 0.005];
        let down = [-0.01, -0.02, -0.015, -0.005];
        assert!(sharpe_ratio(&up, 252.0).unwrap() > 0.0);
        assert!(sharpe_ratio(&down, 252.0).unwrap() < 0.0);
        assert_eq!(sharpe_ratio(&[0.01, 0.01], 252.0), None);
    }

    #[test]
    fn test_max_drawdown() {
        let series = [100.0, 120.0, 90.0, 110.0, 60.0, 130.0];
        assert!((max_drawdown(&series) - 0.5).abs() < 1e-12);
        assert_eq!(max_drawdown(&[]), 0.0);
    }
}
