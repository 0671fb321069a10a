//! Digit transition-matrix predictor.
//!
//! Accumulates a 10×10 (previous digit → next digit) count matrix for the
//! lifetime of the session (never reset, never windowed) and forecasts the
//! arg-max successor of the last observed digit, mapped into a coarse
//! over/under trade class by fixed digit bands.

use tracing::debug;

use super::Predictor;
use crate::buffer::ObservationBuffer;
use crate::types::{Outcome, Prediction, TradeClass};

const DIGITS: usize = 10;

/// Digit band cut-offs: predicted digit above `over_cutoff` trades
/// `Over(over_cutoff)`, below `under_cutoff` trades `Under(under_cutoff)`,
/// anything inside the band skips the round.
#[derive(Debug, Clone)]
pub struct TransitionConfig {
    pub over_cutoff: u8,
    pub under_cutoff: u8,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            over_cutoff: 5,
            under_cutoff: 4,
        }
    }
}

/// Markov single-step transition predictor.
pub struct TransitionPredictor {
    counts: [[u64; DIGITS]; DIGITS],
    previous: Option<Outcome>,
    config: TransitionConfig,
}

impl TransitionPredictor {
    pub fn new(config: TransitionConfig) -> Self {
        Self {
            counts: [[0; DIGITS]; DIGITS],
            previous: None,
            config,
        }
    }

    /// Arg-max successor of `from`, ties broken by lowest digit.
    /// Returns the digit and its share of the row total, or None when no
    /// transition from `from` has been recorded yet.
    fn best_successor(&self, from: Outcome) -> Option<(Outcome, f64)> {
        let row = &self.counts[from as usize];
        let total: u64 = row.iter().sum();
        if total == 0 {
            return None;
        }

        let mut best = 0usize;
        for (digit, &count) in row.iter().enumerate() {
            // Strict comparison keeps the lowest digit on ties.
            if count > row[best] {
                best = digit;
            }
        }

        Some((best as Outcome, row[best] as f64 / total as f64))
    }
}

impl Predictor for TransitionPredictor {
    fn observe(&mut self, outcome: Outcome) {
        if let Some(prev) = self.previous {
            self.counts[prev as usize][outcome as usize] += 1;
        }
        self.previous = Some(outcome);
    }

    fn predict(&self, _buffer: &ObservationBuffer) -> Option<Prediction> {
        let prev = self.previous?;
        let (predicted, confidence) = self.best_successor(prev)?;

        let class = if predicted > self.config.over_cutoff {
            TradeClass::Over(self.config.over_cutoff)
        } else if predicted < self.config.under_cutoff {
            TradeClass::Under(self.config.under_cutoff)
        } else {
            debug!(predicted, "Predicted digit inside the dead band, skipping");
            return None;
        };

        Some(Prediction { class, confidence })
    }

    fn name(&self) -> &'static str {
        "transition"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
