//! Wagering strategy — confidence gating, stake sizing, and stop rules.

pub mod risk;
pub mod stake;
pub mod thresholds;
