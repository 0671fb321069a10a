//! Outcome predictors.
//!
//! Defines the `Predictor` trait and provides two interchangeable
//! strategies: a parity frequency counter over the rolling window, and a
//! session-lifetime digit transition matrix.

pub mod parity;
pub mod transition;

use crate::buffer::ObservationBuffer;
use crate::types::{Outcome, Prediction};

/// Abstraction over next-round forecasters.
///
/// `observe` folds every arriving outcome into predictor-owned state
/// (a no-op for stateless variants); `predict` produces a trade class
/// and confidence, or `None` when there is no actionable signal.
/// Insufficient data is a `None`, never an error.
pub trait Predictor: Send {
    /// Fold a newly observed outcome into predictor state.
    fn observe(&mut self, outcome: Outcome);

    /// Forecast the next round from outcomes recorded so far.
    fn predict(&self, buffer: &ObservationBuffer) -> Option<Prediction>;

    /// Variant identifier for logging.
    fn name(&self) -> &'static str;
}
