//! Statistical utilities for run analysis.
//!
//! Slice-based helpers used to summarize a finished run's price series.
//! All functions return `None` instead of panicking on degenerate input.

/// Mean of a slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population variance.
pub fn variance(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }

    let mean_val = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - mean_val).powi(2)).sum();
    Some(sum_sq / n as f64)
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    variance(values).map(|v| v.sqrt())
}

/// Sample skewness (biased, population moments). `None` for constant series.
pub fn skewness(values: &[f64]) -> Option<f64> {
    let std = std_dev(values)?;
    if std == 0.0 {
        return None;
    }
    let m = mean(values)?;
    let third = values.iter().map(|v| ((v - m) / std).powi(3)).sum::<f64>();
    Some(third / values.len() as f64)
}

/// Excess kurtosis (biased, population moments). Zero for a normal distribution.
pub fn excess_kurtosis(values: &[f64]) -> Option<f64> {
    let std = std_dev(values)?;
    if std == 0.0 {
        return None;
    }
    let m = mean(values)?;
    let fourth = values.iter().map(|v| ((v - m) / std).powi(4)).sum::<f64>();
    Some(fourth / values.len() as f64 - 3.0)
}

/// Log returns `ln(p[i] / p[i-1])`, skipping non-positive prices.
pub fn log_returns(prices: &[f64]) -> Vec<f64> {
    if prices.len() < 2 {
        return vec![];
    }

    prices
        .windows(2)
        .filter_map(|w| {
            if w[0] > 0.0 && w[1] > 0.0 {
                Some((w[1] / w[0]).ln())
            } else {
                None
            }
        })
        .collect()
}

/// Population covariance between two equal-length series.
pub fn covariance(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let mean_x = mean(x)?;
    let mean_y = mean(y)?;
    let n = x.len();

    let sum: f64 = x
        .iter()
        .zip(y.iter())
        .map(|(xi, yi)| (xi - mean_x) * (yi - mean_y))
        .sum();

    Some(sum / n as f64)
}

/// Pearson correlation coefficient. `None` if either series is constant.
pub fn correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    let cov = covariance(x, y)?;
    let std_x = std_dev(x)?;
    let std_y = std_dev(y)?;

    if std_x == 0.0 || std_y == 0.0 {
        return None;
    }

    Some(cov / (std_x * std_y))
}

/// Correlation of a series with itself shifted by `lag`.
pub fn autocorrelation(values: &[f64], lag: usize) -> Option<f64> {
    if lag == 0 || values.len() <= lag + 1 {
        return None;
    }
    correlation(&values[lag..], &values[..values.len() - lag])
}

/// Least-squares slope of `y` against `x`.
pub fn regression_slope(x: &[f64], y: &[f64]) -> Option<f64> {
    let cov = covariance(x, y)?;
    let var_x = variance(x)?;

    if var_x == 0.0 {
        return None;
    }

    Some(cov / var_x)
}

/// Hurst exponent estimate from the scaling of lagged differences.
///
/// For each lag in `2..max_lag` takes the standard deviation of
/// `series[i + lag] - series[i]` and fits `ln(std)` against `ln(lag)`.
/// Below 0.5 suggests mean reversion, above 0.5 trending. Lags whose
/// differences are all equal are skipped.
pub fn hurst_exponent(series: &[f64], max_lag: usize) -> Option<f64> {
    let (log_lags, log_tau): (Vec<f64>, Vec<f64>) = (2..max_lag)
        .filter(|&lag| lag < series.len())
        .filter_map(|lag| {
            let diffs: Vec<f64> = series[lag..]
                .iter()
                .zip(series.iter())
                .map(|(later, earlier)| later - earlier)
                .collect();
            let tau = std_dev(&diffs)?;
            (tau > 0.0).then(|| ((lag as f64).ln(), tau.ln()))
        })
        .unzip();

    if log_lags.len() < 2 {
        return None;
    }
    regression_slope(&log_lags, &log_tau)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[1.0, 2.0, 3.0, 4.0, 5.0]), Some(3.0));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_std_dev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let std = std_dev(&values).unwrap();
        assert!((std - 2.0).abs() < 0.001);
    }

    #[test]
    fn test_higher_moments() {
        let symmetric = [-2.0, -1.0, 0.0, 1.0, 2.0];
        assert!(skewness(&symmetric).unwrap().abs() < 1e-12);
        // Population kurtosis of this set is 1.7.
        assert!((excess_kurtosis(&symmetric).unwrap() + 1.3).abs() < 1e-12);

        let right_tail = [0.0, 0.0, 0.0, 10.0];
        assert!(skewness(&right_tail).unwrap() > 0.0);
        assert_eq!(skewness(&[3.0; 4]), None);
    }

    #[test]
    fn test_log_returns() {
        let rets = log_returns(&[100.0, 110.0, 0.0, 121.0]);
        assert_eq!(rets.len(), 1);
        assert!((rets[0] - (1.1f64).ln()).abs() < 1e-12);
    }

    #[test]
    fn test_correlation() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 4.0, 6.0, 8.0, 10.0];
        assert!((correlation(&x, &y).unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(correlation(&x, &[1.0; 5]), None);
    }

    #[test]
    fn test_autocorrelation_alternating_series() {
        let values: Vec<f64> = (0..20).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let ac = autocorrelation(&values, 1).unwrap();
        assert!((ac + 1.0).abs() < 1e-12);
        assert_eq!(autocorrelation(&values[..2], 1), None);
    }

    #[test]
    fn test_regression_slope() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [3.0, 5.0, 7.0, 9.0];
        assert!((regression_slope(&x, &y).unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_hurst_of_oscillating_series_is_near_zero() {
        // Odd lags always differ by ±2, even lags are skipped: no scaling with lag.
        let series: Vec<f64> = (0..200).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let h = hurst_exponent(&series, 20).unwrap();
        assert!(h.abs() < 1e-3);
    }

    #[test]
    fn test_hurst_needs_enough_lags() {
        assert_eq!(hurst_exponent(&[1.0, 2.0, 4.0], 20), None);
    }
}
