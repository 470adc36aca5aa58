//! Rolling arithmetic mean over a fixed trailing window.

use statrs::statistics::Statistics;
use std::collections::VecDeque;

/// Simple moving average over the last `window` observations.
pub struct RollingMean {
    /// Window size in periods.
    window: usize,
    /// Observations currently in the window, oldest first.
    values: VecDeque<f64>,
}

impl RollingMean {
    /// Create a new rolling mean.
    pub fn new(window: usize) -> Self {
        Self {
            window,
            values: VecDeque::with_capacity(window),
        }
    }

    /// Add an observation.
    ///
    /// Returns the mean once the window is full.
    pub fn add(&mut self, value: f64) -> Option<f64> {
        if self.values.len() >= self.window {
            self.values.pop_front();
        }
        self.values.push_back(value);
        self.mean()
    }

    /// Mean of the window, or `None` until `window` observations were seen.
    ///
    /// The mean is recomputed from the window rather than kept as a running
    /// sum, so a constant input yields exactly that constant.
    pub fn mean(&self) -> Option<f64> {
        if self.window == 0 || !self.is_ready() {
            return None;
        }
        Some(self.values.iter().mean())
    }

    /// Check if the window is full.
    pub fn is_ready(&self) -> bool {
        self.values.len() >= self.window
    }

    /// Get the number of observations held.
    pub fn count(&self) -> usize {
        self.values.len()
    }

    /// Window size.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Clear all data.
    pub fn clear(&mut self) {
        self.values.clear();
    }
}

/// Rolling mean aligned per input value; `None` where fewer than `window` values exist.
pub fn rolling_mean_series(values: impl IntoIterator<Item = f64>, window: usize) -> Vec<Option<f64>> {
    let mut mean = RollingMean::new(window);
    values.into_iter().map(|v| mean.add(v)).collect()
}
