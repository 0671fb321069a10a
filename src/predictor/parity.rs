//! Parity frequency predictor.
//!
//! Counts even and odd digits over the rolling window and forecasts the
//! majority class, with the class proportion as confidence. Demands a
//! full window before it will speak, and goes quiet on a tie.

use tracing::debug;

use super::Predictor;
use crate::buffer::ObservationBuffer;
use crate::types::{Outcome, Prediction, TradeClass};

/// Frequency-count predictor over parity classes.
#[derive(Debug, Default)]
pub struct ParityPredictor;

impl ParityPredictor {
    pub fn new() -> Self {
        Self
    }
}

impl Predictor for ParityPredictor {
    fn observe(&mut self, _outcome: Outcome) {
        // All state lives in the observation buffer.
    }

    fn predict(&self, buffer: &ObservationBuffer) -> Option<Prediction> {
        // Only a full window counts as enough data.
        if !buffer.is_full() {
            debug!(
                have = buffer.len(),
                need = buffer.capacity(),
                "Window not full, no prediction"
            );
            return None;
        }

        let total = buffer.len();
        let evens = buffer.iter().filter(|d| d % 2 == 0).count();
        let odds = total - evens;

        if evens == odds {
            return None;
        }

        let (class, count) = if evens > odds {
            (TradeClass::Even, evens)
        } else {
            (TradeClass::Odd, odds)
        };

        Some(Prediction {
            class,
            confidence: count as f64 / total as f64,
        })
    }

    fn name(&self) -> &'static str {
        "parity"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
