//! Adaptive confidence thresholds.
//!
//! Tunes per-class confidence thresholds from the trailing win/loss
//! record: a favourable stretch raises the bar (trade less, demand more
//! conviction), an unfavourable one lowers it. Predictions whose
//! confidence falls below the current bar are gated out and the round is
//! skipped.

use std::collections::HashMap;
use tracing::debug;

use crate::types::{ClassKind, TradeClass};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Threshold tuning configuration.
#[derive(Debug, Clone)]
pub struct ThresholdConfig {
    pub initial_even: f64,
    pub initial_odd: f64,
    pub initial_over: f64,
    pub initial_under: f64,
    /// Base step scaled by the win/loss ratio.
    pub adaptive_base: f64,
    /// Largest single adjustment regardless of ratio.
    pub max_adjustment: f64,
    pub min_threshold: f64,
    pub max_threshold: f64,
    /// Number of trailing resolved rounds consulted per update.
    pub performance_window: usize,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            initial_even: 0.10,
            initial_odd: 0.10,
            initial_over: 0.10,
            initial_under: 0.10,
            adaptive_base: 0.05,
            max_adjustment: 0.10,
            min_threshold: 0.05,
            max_threshold: 0.30,
            performance_window: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Per-class confidence thresholds, adapted from recent performance.
pub struct ThresholdController {
    config: ThresholdConfig,
    thresholds: HashMap<ClassKind, f64>,
    /// Win/Loss tags for every resolved round, in order. Only the trailing
    /// `performance_window` entries are ever read.
    performance: Vec<bool>,
}

impl ThresholdController {
    pub fn new(config: ThresholdConfig) -> Self {
        let thresholds = HashMap::from([
            (ClassKind::Even, config.initial_even),
            (ClassKind::Odd, config.initial_odd),
            (ClassKind::Over, config.initial_over),
            (ClassKind::Under, config.initial_under),
        ]);
        Self {
            config,
            thresholds,
            performance: Vec::new(),
        }
    }

    /// Append a resolved round (true = win) to the performance history.
    pub fn record_result(&mut self, won: bool) {
        self.performance.push(won);
    }

    /// Current threshold for a class kind.
    pub fn threshold(&self, kind: ClassKind) -> f64 {
        self.thresholds[&kind]
    }

    /// Whether a prediction clears the bar for its class.
    pub fn gate(&self, confidence: f64, class: TradeClass) -> bool {
        confidence >= self.threshold(class.kind())
    }

    /// Re-tune all class thresholds from the trailing performance window.
    /// No-op until the window has filled once.
    pub fn update(&mut self) {
        if self.performance.len() < self.config.performance_window {
            return;
        }

        let window = &self.performance[self.performance.len() - self.config.performance_window..];
        let wins = window.iter().filter(|w| **w).count();
        let losses = window.len() - wins;

        let ratio = if losses > 0 {
            wins as f64 / losses as f64
        } else {
            f64::INFINITY
        };

        let adjustment = (self.config.adaptive_base * ratio).min(self.config.max_adjustment);
        let favourable = ratio > 1.0;

        for kind in ClassKind::ALL {
            let t = self.thresholds.get_mut(kind).expect("all kinds seeded");
            *t = if favourable {
                (*t + adjustment).min(self.config.max_threshold)
            } else {
                (*t - adjustment).max(self.config.min_threshold)
            };
        }

        debug!(
            wins,
            losses,
            ratio = format!("{ratio:.2}"),
            adjustment = format!("{adjustment:.3}"),
            direction = if favourable { "up" } else { "down" },
            "Thresholds adjusted"
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
