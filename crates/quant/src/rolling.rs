//! Rolling window data structure for price memory.
//!
//! Provides O(1) push operations and efficient access to the most recent
//! values for moving averages and momentum.

use std::collections::VecDeque;

/// A fixed-size rolling window of values.
///
/// Maintains the most recent `capacity` values, discarding the oldest when a
/// new one is pushed. Keeps a running sum for O(1) means.
///
/// # Example
/// ```
/// use quant::rolling::RollingWindow;
///
/// let mut window = RollingWindow::new(3);
/// window.push(1.0);
/// window.push(2.0);
/// window.push(3.0);
/// assert_eq!(window.mean(), Some(2.0));
///
/// window.push(4.0); // Drops 1.0
/// assert_eq!(window.mean(), Some(3.0));
/// assert_eq!(window.tail_mean(2), Some(3.5));
/// ```
#[derive(Debug, Clone)]
pub struct RollingWindow {
    data: VecDeque<f64>,
    capacity: usize,
    /// Running sum for O(1) mean computation.
    sum: f64,
}

impl RollingWindow {
    /// Create a new rolling window with the given capacity.
    ///
    /// A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            data: VecDeque::with_capacity(capacity),
            capacity,
            sum: 0.0,
        }
    }

    /// Push a value into the window.
    ///
    /// If the window is full, the oldest value is removed and returned.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        let removed = if self.data.len() >= self.capacity {
            let old = self.data.pop_front();
            if let Some(v) = old {
                self.sum -= v;
            }
            old
        } else {
            None
        };

        self.data.push_back(value);
        self.sum += value;
        removed
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.data.len() >= self.capacity
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Mean of values in the window. `None` if empty.
    #[inline]
    pub fn mean(&self) -> Option<f64> {
        if self.is_empty() {
            None
        } else {
            Some(self.sum / self.data.len() as f64)
        }
    }

    /// Mean of the newest `n` values (or all of them if fewer are held).
    pub fn tail_mean(&self, n: usize) -> Option<f64> {
        let n = n.min(self.data.len());
        if n == 0 {
            return None;
        }
        let sum: f64 = self.data.iter().rev().take(n).sum();
        Some(sum / n as f64)
    }

    /// Population variance. `None` with fewer than 2 values.
    pub fn variance(&self) -> Option<f64> {
        if self.data.len() < 2 {
            return None;
        }

        let mean = self.sum / self.data.len() as f64;
        let sum_sq: f64 = self.data.iter().map(|v| (v - mean).powi(2)).sum();
        Some(sum_sq / self.data.len() as f64)
    }

    /// Population standard deviation. `None` with fewer than 2 values.
    pub fn std_dev(&self) -> Option<f64> {
        self.variance().map(|v| v.sqrt())
    }

    /// Most recent value.
    #[inline]
    pub fn last(&self) -> Option<f64> {
        self.data.back().copied()
    }

    /// Value `n` pushes before the newest (`back(0)` is the newest).
    #[inline]
    pub fn back(&self, n: usize) -> Option<f64> {
        let len = self.data.len();
        if n >= len {
            None
        } else {
            self.data.get(len - 1 - n).copied()
        }
    }
}
