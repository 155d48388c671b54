//! MetricsHook - built-in hook for aggregating run activity.
//!
//! Counts steps, intents, fills, clips and forced liquidations, and keeps a
//! bounded per-step volume history.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use sim_core::AggregatedFlow;

use crate::hooks::SimulationHook;
use crate::runner::StepReport;

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSnapshot {
    pub total_steps: u64,
    /// Intents that reached aggregation.
    pub total_orders: u64,
    /// Fills with a non-zero executed size.
    pub total_fills: u64,
    /// Fills changed by risk enforcement.
    pub clipped_fills: u64,
    pub forced_liquidations: u64,
    /// Shares executed by agents over the run.
    pub total_volume: u64,
    pub avg_orders_per_step: f64,
    pub avg_volume_per_step: f64,
    pub peak_orders_per_step: u64,
    pub peak_volume_per_step: u64,
}

/// Built-in hook for collecting run metrics.
///
/// Thread-safe via atomics and a mutex for interior mutability.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use simulation::{MetricsHook, Simulation, SimulationConfig};
///
/// let config = SimulationConfig::default().with_steps(5).with_agents(2, 2, 2);
/// let metrics = Arc::new(MetricsHook::new());
/// let mut sim = Simulation::new(config).unwrap();
/// sim.add_hook(metrics.clone());
/// sim.run().unwrap();
///
/// assert_eq!(metrics.snapshot().total_steps, 5);
/// ```
pub struct MetricsHook {
    step_count: AtomicU64,
    order_count: AtomicU64,
    fill_count: AtomicU64,
    clipped_count: AtomicU64,
    forced_count: AtomicU64,
    volume: AtomicU64,
    peak_orders: AtomicU64,
    peak_volume: AtomicU64,
    /// Per-step volume, limited to `max_history` entries.
    volume_history: Mutex<Vec<u64>>,
    max_history: usize,
}

impl MetricsHook {
    pub fn new() -> Self {
        Self::with_max_history(10_000)
    }

    /// Create a metrics hook with a custom history limit.
    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            step_count: AtomicU64::new(0),
            order_count: AtomicU64::new(0),
            fill_count: AtomicU64::new(0),
            clipped_count: AtomicU64::new(0),
            forced_count: AtomicU64::new(0),
            volume: AtomicU64::new(0),
            peak_orders: AtomicU64::new(0),
            peak_volume: AtomicU64::new(0),
            volume_history: Mutex::new(Vec::with_capacity(max_history.min(10_000))),
            max_history,
        }
    }

    /// Get a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let total_steps = self.step_count.load(Ordering::Relaxed);
        let total_orders = self.order_count.load(Ordering::Relaxed);
        let total_volume = self.volume.load(Ordering::Relaxed);

        let per_step = |total: u64| {
            if total_steps > 0 {
                total as f64 / total_steps as f64
            } else {
                0.0
            }
        };

        MetricsSnapshot {
            total_steps,
            total_orders,
            total_fills: self.fill_count.load(Ordering::Relaxed),
            clipped_fills: self.clipped_count.load(Ordering::Relaxed),
            forced_liquidations: self.forced_count.load(Ordering::Relaxed),
            total_volume,
            avg_orders_per_step: per_step(total_orders),
            avg_volume_per_step: per_step(total_volume),
            peak_orders_per_step: self.peak_orders.load(Ordering::Relaxed),
            peak_volume_per_step: self.peak_volume.load(Ordering::Relaxed),
        }
    }

    /// Per-step executed volume, oldest first.
    pub fn volume_history(&self) -> Vec<u64> {
        self.volume_history.lock().clone()
    }

    pub fn reset(&self) {
        for counter in [
            &self.step_count,
            &self.order_count,
            &self.fill_count,
            &self.clipped_count,
            &self.forced_count,
            &self.volume,
            &self.peak_orders,
            &self.peak_volume,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        self.volume_history.lock().clear();
    }

    /// Update peak value atomically (CAS loop).
    fn update_peak(peak: &AtomicU64, value: u64) {
        let mut current = peak.load(Ordering::Relaxed);
        while value > current {
            match peak.compare_exchange_weak(current, value, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
    }
}

impl Default for MetricsHook {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationHook for MetricsHook {
    fn name(&self) -> &str {
        "Metrics"
    }

    fn on_orders_collected(&self, flow: &AggregatedFlow) {
        let count = flow.orders as u64;
        self.order_count.fetch_add(count, Ordering::Relaxed);
        Self::update_peak(&self.peak_orders, count);
    }

    fn on_step_end(&self, report: &StepReport) {
        let fills = report.fills.iter().filter(|f| f.filled != 0).count() as u64;
        let clipped = report.fills.iter().filter(|f| f.is_clipped()).count() as u64;
        let volume = report.record.volume;

        self.step_count.fetch_add(1, Ordering::Relaxed);
        self.fill_count.fetch_add(fills, Ordering::Relaxed);
        self.clipped_count.fetch_add(clipped, Ordering::Relaxed);
        self.forced_count
            .fetch_add(report.record.forced_liquidations as u64, Ordering::Relaxed);
        self.volume.fetch_add(volume, Ordering::Relaxed);
        Self::update_peak(&self.peak_volume, volume);

        let mut history = self.volume_history.lock();
        if history.len() < self.max_history {
            history.push(volume);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::HookRunner;
    use std::sync::Arc;
    use types::{AgentId, Fill, KindTotals, Price, RiskViolation, StepRecord};

    fn report(volume: u64, fills: Vec<Fill>) -> StepReport {
        StepReport {
            record: StepRecord {
                step: 1,
                price: Price::from_float(100.0),
                fundamental_value: Price::from_float(100.0),
                volume,
                imbalance: 0,
                trades: fills.len(),
                forced_liquidations: fills.iter().filter(|f| f.is_forced_exit()).count(),
                liquidity_provider_position: 0,
                fundamentalists: KindTotals::default(),
                chartists: KindTotals::default(),
                noise_traders: KindTotals::default(),
            },
            fills,
            flow: AggregatedFlow::default(),
        }
    }

    fn fill(filled: i64, clip: Option<RiskViolation>) -> Fill {
        Fill {
            agent_id: AgentId(1),
            requested: filled,
            filled,
            price: Price::from_float(100.0),
            clip,
        }
    }

    #[test]
    fn test_metrics_accumulation() {
        let metrics = Arc::new(MetricsHook::new());
        let mut runner = HookRunner::new();
        runner.add(metrics.clone());

        let flow = AggregatedFlow {
            orders: 2,
            ..Default::default()
        };
        for _ in 0..3 {
            runner.on_orders_collected(&flow);
            runner.on_step_end(&report(4, vec![fill(3, None), fill(-1, None)]));
        }

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_steps, 3);
        assert_eq!(snapshot.total_orders, 6);
        assert_eq!(snapshot.total_fills, 6);
        assert_eq!(snapshot.total_volume, 12);
        assert!((snapshot.avg_orders_per_step - 2.0).abs() < 1e-9);
        assert!((snapshot.avg_volume_per_step - 4.0).abs() < 1e-9);
        assert_eq!(metrics.volume_history(), vec![4, 4, 4]);
    }

    #[test]
    fn test_clips_and_peaks() {
        let metrics = MetricsHook::new();
        metrics.on_step_end(&report(2, vec![fill(2, Some(RiskViolation::MaxPosition))]));
        metrics.on_step_end(&report(9, vec![fill(-9, Some(RiskViolation::StopLoss))]));
        metrics.on_step_end(&report(1, vec![fill(1, None)]));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.peak_volume_per_step, 9);
        assert_eq!(snapshot.clipped_fills, 2);
        assert_eq!(snapshot.forced_liquidations, 1);
    }

    #[test]
    fn test_bounded_history_and_reset() {
        let metrics = MetricsHook::with_max_history(2);
        for volume in [1, 2, 3] {
            metrics.on_step_end(&report(volume, Vec::new()));
        }
        assert_eq!(metrics.volume_history(), vec![1, 2]);
        assert_eq!(metrics.snapshot().total_steps, 3);

        metrics.reset();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
        assert!(metrics.volume_history().is_empty());
    }
}
