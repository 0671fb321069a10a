//! Risk governor.
//!
//! Enforces the global stop conditions: take-profit, stop-loss, round
//! budget, and an externally raised stop flag. Termination is
//! cooperative — the session loop consults the governor once per round
//! boundary and never preempts an in-flight wager.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::types::{SessionTotals, StopReason};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Stop-condition configuration.
#[derive(Debug, Clone)]
pub struct RiskConfig {
    /// Stop once cumulative PnL reaches this (inclusive).
    pub take_profit: Decimal,
    /// Stop once cumulative loss reaches this (inclusive), i.e. PnL ≤ −stop_loss.
    pub stop_loss: Decimal,
    /// Total rounds allowed in the session.
    pub total_rounds: u64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            take_profit: dec!(5000),
            stop_loss: dec!(5000),
            total_rounds: 100,
        }
    }
}

// ---------------------------------------------------------------------------
// Governor
// ---------------------------------------------------------------------------

/// Evaluates stop conditions after every completed round.
pub struct RiskGovernor {
    config: RiskConfig,
    stop_flag: Arc<AtomicBool>,
}

impl RiskGovernor {
    pub fn new(config: RiskConfig) -> Self {
        Self {
            config,
            stop_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle for raising the external stop request (e.g. from a ctrl-c
    /// handler). Polled at round boundaries only.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop_flag)
    }

    /// Whether the session should stop, and why. Returns `None` to keep
    /// trading.
    pub fn check(&self, totals: &SessionTotals) -> Option<StopReason> {
        if self.stop_flag.load(Ordering::Relaxed) {
            return Some(StopReason::StopRequested);
        }
        if totals.pnl >= self.config.take_profit {
            return Some(StopReason::TakeProfit);
        }
        if totals.pnl <= -self.config.stop_loss {
            return Some(StopReason::StopLoss);
        }
        if totals.rounds >= self.config.total_rounds {
            return Some(StopReason::RoundBudgetExhausted);
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
