//! Shared types for the MARTIN engine.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that predictor, strategy,
//! broker, and engine modules can depend on them without circular
//! references.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One observed digit (0–9) from the outcome stream.
pub type Outcome = u8;

// ---------------------------------------------------------------------------
// Trade classes
// ---------------------------------------------------------------------------

/// The class of contract a prediction maps to.
///
/// `Over`/`Under` carry the digit barrier the contract settles against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeClass {
    Even,
    Odd,
    Over(u8),
    Under(u8),
}

impl TradeClass {
    /// Broker contract-type identifier for this class.
    pub fn contract_type(&self) -> &'static str {
        match self {
            TradeClass::Even => "DIGITEVEN",
            TradeClass::Odd => "DIGITODD",
            TradeClass::Over(_) => "DIGITOVER",
            TradeClass::Under(_) => "DIGITUNDER",
        }
    }

    /// Digit barrier, where the contract type requires one.
    pub fn barrier(&self) -> Option<u8> {
        match self {
            TradeClass::Even | TradeClass::Odd => None,
            TradeClass::Over(b) | TradeClass::Under(b) => Some(*b),
        }
    }

    /// The barrier-independent kind, used to key per-class thresholds.
    pub fn kind(&self) -> ClassKind {
        match self {
            TradeClass::Even => ClassKind::Even,
            TradeClass::Odd => ClassKind::Odd,
            TradeClass::Over(_) => ClassKind::Over,
            TradeClass::Under(_) => ClassKind::Under,
        }
    }

    /// Whether a settled digit wins for this class.
    pub fn wins_against(&self, digit: Outcome) -> bool {
        match self {
            TradeClass::Even => digit % 2 == 0,
            TradeClass::Odd => digit % 2 != 0,
            TradeClass::Over(b) => digit > *b,
            TradeClass::Under(b) => digit < *b,
        }
    }
}

impl fmt::Display for TradeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.barrier() {
            Some(b) => write!(f, "{} {b}", self.contract_type()),
            None => write!(f, "{}", self.contract_type()),
        }
    }
}

/// Barrier-independent class identifier for threshold bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassKind {
    Even,
    Odd,
    Over,
    Under,
}

impl ClassKind {
    /// All known kinds (useful for iteration).
    pub const ALL: &'static [ClassKind] = &[
        ClassKind::Even,
        ClassKind::Odd,
        ClassKind::Over,
        ClassKind::Under,
    ];
}

impl fmt::Display for ClassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassKind::Even => write!(f, "even"),
            ClassKind::Odd => write!(f, "odd"),
            ClassKind::Over => write!(f, "over"),
            ClassKind::Under => write!(f, "under"),
        }
    }
}

// ---------------------------------------------------------------------------
// Predictions
// ---------------------------------------------------------------------------

/// A predictor's forecast for the next round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub class: TradeClass,
    /// Self-reported strength of the prediction (0–1).
    pub confidence: f64,
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {:.0}%", self.class, self.confidence * 100.0)
    }
}

// ---------------------------------------------------------------------------
// Round results
// ---------------------------------------------------------------------------

/// Outcome of one predict→wager→settle round.
///
/// `Skipped` covers rounds where no wager was placed (no prediction,
/// confidence below threshold, or a quote/buy failure before money was
/// committed). `Unresolved` covers wagers that were placed but whose
/// settlement could not be retrieved; these are tallied separately so the
/// aggregate statistics do not silently undercount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundResult {
    Won,
    Lost,
    Skipped,
    Unresolved,
}

impl fmt::Display for RoundResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundResult::Won => write!(f, "WON"),
            RoundResult::Lost => write!(f, "LOST"),
            RoundResult::Skipped => write!(f, "SKIPPED"),
            RoundResult::Unresolved => write!(f, "UNRESOLVED"),
        }
    }
}

/// Settlement of a placed wager as reported by the broker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub won: bool,
    /// Realised profit (positive) or loss (negative) for the round.
    pub pnl: Decimal,
}

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// Why the session stopped trading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    TakeProfit,
    StopLoss,
    RoundBudgetExhausted,
    StopRequested,
    /// The outcome subscription ended; it is not restartable.
    FeedClosed,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::TakeProfit => write!(f, "take-profit reached"),
            StopReason::StopLoss => write!(f, "stop-loss reached"),
            StopReason::RoundBudgetExhausted => write!(f, "round budget exhausted"),
            StopReason::StopRequested => write!(f, "stop requested"),
            StopReason::FeedClosed => write!(f, "outcome feed closed"),
        }
    }
}

/// Session-lifetime running totals.
///
/// Created once at session start and owned by the session loop; every
/// mutation happens at a round boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTotals {
    pub initial_balance: Decimal,
    pub pnl: Decimal,
    pub wins: u64,
    pub losses: u64,
    pub skipped: u64,
    pub unresolved: u64,
    pub rounds: u64,
    pub start_time: DateTime<Utc>,
}

impl SessionTotals {
    pub fn new(initial_balance: Decimal) -> Self {
        Self {
            initial_balance,
            pnl: Decimal::ZERO,
            wins: 0,
            losses: 0,
            skipped: 0,
            unresolved: 0,
            rounds: 0,
            start_time: Utc::now(),
        }
    }

    /// Record one completed round and its realised PnL (zero for rounds
    /// with no wager).
    pub fn record(&mut self, result: RoundResult, pnl: Decimal) {
        self.rounds += 1;
        self.pnl += pnl;
        match result {
            RoundResult::Won => self.wins += 1,
            RoundResult::Lost => self.losses += 1,
            RoundResult::Skipped => self.skipped += 1,
            RoundResult::Unresolved => self.unresolved += 1,
        }
    }

    /// Current balance implied by the initial balance and running PnL.
    pub fn balance(&self) -> Decimal {
        self.initial_balance + self.pnl
    }

    /// Rounds that settled as a win or a loss.
    pub fn resolved(&self) -> u64 {
        self.wins + self.losses
    }

    /// Win rate over resolved rounds as a percentage. 0.0 if none resolved.
    pub fn win_rate(&self) -> f64 {
        let resolved = self.resolved();
        if resolved == 0 {
            0.0
        } else {
            (self.wins as f64 / resolved as f64) * 100.0
        }
    }
}

impl fmt::Display for SessionTotals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rounds={} W{}/L{} (skip={} unresolved={}) | win_rate={:.1}% | pnl={} | balance={}",
            self.rounds,
            self.wins,
            self.losses,
            self.skipped,
            self.unresolved,
            self.win_rate(),
            self.pnl,
            self.balance(),
        )
    }
}

// ---------------------------------------------------------------------------
// Session report
// ---------------------------------------------------------------------------

/// Final aggregated statistics emitted when the session settles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub stop_reason: StopReason,
    pub rounds: u64,
    pub wins: u64,
    pub losses: u64,
    pub skipped: u64,
    pub unresolved: u64,
    pub win_rate: f64,
    pub total_pnl: Decimal,
    pub final_balance: Decimal,
    pub started: DateTime<Utc>,
    pub ended: DateTime<Utc>,
}

impl SessionReport {
    pub fn from_totals(totals: &SessionTotals, stop_reason: StopReason) -> Self {
        Self {
            stop_reason,
            rounds: totals.rounds,
            wins: totals.wins,
            losses: totals.losses,
            skipped: totals.skipped,
            unresolved: totals.unresolved,
            win_rate: totals.win_rate(),
            total_pnl: totals.pnl,
            final_balance: totals.balance(),
            started: totals.start_time,
            ended: Utc::now(),
        }
    }
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | rounds={} W{}/L{} skip={} unresolved={} | win_rate={:.1}% | pnl={} | balance={}",
            self.stop_reason,
            self.rounds,
            self.wins,
            self.losses,
            self.skipped,
            self.unresolved,
            self.win_rate,
            self.total_pnl,
            self.final_balance,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
