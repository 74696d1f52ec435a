//! Fixed-window rolling mean and population standard deviation.
//!
//! O(1) per sample: the evicted value's contribution is subtracted from the
//! running sum and sum of squares before the new value is added.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct RollingStatistic {
    window: usize,
    values: VecDeque<f64>,
    sum: f64,
    sum_sq: f64,
}

impl RollingStatistic {
    pub fn new(window: usize) -> Self {
        assert!(window > 0, "rolling window must be positive");
        RollingStatistic {
            window,
            values: VecDeque::with_capacity(window),
            sum: 0.0,
            sum_sq: 0.0,
        }
    }

    pub fn add(&mut self, x: f64) {
        if self.values.len() == self.window {
            if let Some(old) = self.values.pop_front() {
                self.sum -= old;
                self.sum_sq -= old * old;
            }
        }
        self.values.push_back(x);
        self.sum += x;
        self.sum_sq += x * x;
    }

    /// True once `window` samples have been seen.
    pub fn ready(&self) -> bool {
        self.values.len() == self.window
    }

    pub fn mean(&self) -> f64 {
        let n = self.values.len();
        if n == 0 {
            return 0.0;
        }
        self.sum / n as f64
    }

    /// Population standard deviation. Variance is floored at zero since the
    /// running sums can cancel slightly below it.
    pub fn std(&self) -> f64 {
        let n = self.values.len();
        if n <= 1 {
            return 0.0;
        }
        let mean = self.sum / n as f64;
        let variance = (self.sum_sq / n as f64 - mean * mean).max(0.0);
        variance.sqrt()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn window(&self) -> usize {
        self.window
    }
}
