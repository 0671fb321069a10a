//! Rolling observation window.
//!
//! Maintains a bounded FIFO of the most recent outcomes. The bound itself
//! is mutable: capacity is tuned from the volatility of the buffered
//! series, growing in calm stretches and shrinking in noisy ones.

use std::collections::VecDeque;
use tracing::debug;

use crate::types::Outcome;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Bounds and tuning knobs for the observation window.
#[derive(Debug, Clone)]
pub struct BufferConfig {
    pub min_history: usize,
    pub initial_history: usize,
    pub max_history: usize,
    /// Volatility below this grows the window by one.
    pub vol_low: f64,
    /// Volatility above this shrinks the window by one.
    pub vol_high: f64,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            min_history: 5,
            initial_history: 10,
            max_history: 20,
            vol_low: 0.1,
            vol_high: 0.3,
        }
    }
}

// ---------------------------------------------------------------------------
// Buffer
// ---------------------------------------------------------------------------

/// Bounded, size-adaptive rolling window of recent outcomes.
#[derive(Debug, Clone)]
pub struct ObservationBuffer {
    data: VecDeque<Outcome>,
    capacity: usize,
    config: BufferConfig,
}

impl ObservationBuffer {
    pub fn new(config: BufferConfig) -> Self {
        let capacity = config
            .initial_history
            .clamp(config.min_history, config.max_history);
        Self {
            data: VecDeque::with_capacity(config.max_history),
            capacity,
            config,
        }
    }

    /// Append an outcome, evicting the oldest entries first if the buffer
    /// is at (or, after a capacity shrink, above) capacity.
    pub fn record(&mut self, outcome: Outcome) {
        while self.data.len() >= self.capacity {
            self.data.pop_front();
        }
        self.data.push_back(outcome);
    }

    /// Change the capacity bound, clamped to the configured range.
    /// Takes effect on the next eviction decision; existing entries are
    /// not truncated.
    pub fn set_capacity(&mut self, n: usize) {
        self.capacity = n.clamp(self.config.min_history, self.config.max_history);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether the window holds exactly `capacity` outcomes.
    pub fn is_full(&self) -> bool {
        self.data.len() == self.capacity
    }

    /// Outcomes in arrival order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = Outcome> + '_ {
        self.data.iter().copied()
    }

    /// Standard deviation of successive differences between buffered
    /// outcomes. Returns 0.0 with fewer than 2 entries.
    pub fn volatility(&self) -> f64 {
        if self.data.len() < 2 {
            return 0.0;
        }

        let diffs: Vec<f64> = self
            .data
            .iter()
            .zip(self.data.iter().skip(1))
            .map(|(a, b)| f64::from(*b) - f64::from(*a))
            .collect();

        let mean = diffs.iter().sum::<f64>() / diffs.len() as f64;
        let variance = diffs.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / diffs.len() as f64;
        variance.sqrt()
    }

    /// Tune capacity from the current volatility: grow the window when the
    /// series is calm, shrink it when it is choppy.
    pub fn adjust_capacity(&mut self) {
        let volatility = self.volatility();
        let before = self.capacity;

        if volatility < self.config.vol_low {
            self.set_capacity(self.capacity + 1);
        } else if volatility > self.config.vol_high {
            self.set_capacity(self.capacity.saturating_sub(1));
        }

        if self.capacity != before {
            debug!(
                volatility = format!("{volatility:.3}"),
                from = before,
                to = self.capacity,
                "Window capacity adjusted"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
