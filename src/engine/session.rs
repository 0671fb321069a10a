//! Session loop.
//!
//! Drives the `AwaitingAuthorization → AwaitingInitialBalance → Trading →
//! Settling` state machine: one round at a time, strictly sequential,
//! because stake sizing and thresholds depend on the previous round's
//! outcome. The broker connection is released on every exit path.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::broker::{BrokerConnection, ProposalRequest};
use crate::buffer::ObservationBuffer;
use crate::predictor::Predictor;
use crate::strategy::risk::RiskGovernor;
use crate::strategy::stake::StakeController;
use crate::strategy::thresholds::ThresholdController;
use crate::types::{RoundResult, SessionReport, SessionTotals, StopReason};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Session loop configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub symbol: String,
    /// Pause between rounds.
    pub round_delay: Duration,
    /// Upper bound on one settlement wait; elapsing leaves the round
    /// unresolved rather than blocking the session.
    pub settlement_timeout: Duration,
    pub contract_duration_ticks: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            symbol: "R_100".to_string(),
            round_delay: Duration::from_secs(1),
            settlement_timeout: Duration::from_secs(30),
            contract_duration_ticks: 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    AwaitingAuthorization,
    AwaitingInitialBalance,
    Trading,
    Settling,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::AwaitingAuthorization => write!(f, "awaiting-authorization"),
            SessionPhase::AwaitingInitialBalance => write!(f, "awaiting-initial-balance"),
            SessionPhase::Trading => write!(f, "trading"),
            SessionPhase::Settling => write!(f, "settling"),
        }
    }
}

// ---------------------------------------------------------------------------
// Session loop
// ---------------------------------------------------------------------------

/// Owns all mutable session state and the broker connection for exactly
/// one session.
pub struct SessionLoop<B: BrokerConnection> {
    broker: B,
    config: SessionConfig,
    buffer: ObservationBuffer,
    predictor: Box<dyn Predictor>,
    thresholds: ThresholdController,
    stake: StakeController,
    governor: RiskGovernor,
    phase: SessionPhase,
}

impl<B: BrokerConnection> SessionLoop<B> {
    pub fn new(
        broker: B,
        config: SessionConfig,
        buffer: ObservationBuffer,
        predictor: Box<dyn Predictor>,
        thresholds: ThresholdController,
        stake: StakeController,
        governor: RiskGovernor,
    ) -> Self {
        Self {
            broker,
            config,
            buffer,
            predictor,
            thresholds,
            stake,
            governor,
            phase: SessionPhase::AwaitingAuthorization,
        }
    }

    /// Handle for requesting a cooperative stop from outside the loop.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.governor.stop_handle()
    }

    /// Run the session to completion. The connection is closed on every
    /// exit path, including fatal startup failures.
    pub async fn run(mut self, token: &str) -> Result<SessionReport> {
        let result = self.trade(token).await;
        self.broker.close().await;
        result
    }

    async fn trade(&mut self, token: &str) -> Result<SessionReport> {
        info!(phase = %self.phase, "Session starting");
        self.broker
            .authorize(token)
            .await
            .context("session aborted before trading")?;

        self.phase = SessionPhase::AwaitingInitialBalance;
        let initial_balance = self
            .broker
            .balance()
            .await
            .context("session aborted before trading")?;

        let mut outcomes = self
            .broker
            .subscribe_outcomes(&self.config.symbol, self.buffer.capacity())
            .await
            .context("session aborted before trading")?;

        self.phase = SessionPhase::Trading;
        let mut totals = SessionTotals::new(initial_balance);
        info!(
            phase = %self.phase,
            balance = %initial_balance,
            predictor = self.predictor.name(),
            symbol = %self.config.symbol,
            "Entering trading loop"
        );

        let stop_reason = loop {
            // Stop conditions are evaluated at round boundaries only; an
            // in-flight wager is never preempted.
            if let Some(reason) = self.governor.check(&totals) {
                break reason;
            }

            let Some(outcome) = outcomes.recv().await else {
                break StopReason::FeedClosed;
            };

            let round = totals.rounds + 1;
            self.buffer.record(outcome);
            self.predictor.observe(outcome);
            self.thresholds.update();
            self.buffer.adjust_capacity();

            let (result, pnl) = self.run_round(round).await;
            totals.record(result, pnl);
            info!(round, result = %result, pnl = %pnl, balance = %totals.balance(), "Round complete");

            tokio::time::sleep(self.config.round_delay).await;
        };

        self.phase = SessionPhase::Settling;
        let report = SessionReport::from_totals(&totals, stop_reason);
        info!(phase = %self.phase, report = %report, "Session settled");
        Ok(report)
    }

    /// One predict→gate→wager→settle pass. Never fails the session:
    /// broker errors before money is committed abandon the round as
    /// `Skipped`; a placed wager whose settlement cannot be retrieved is
    /// `Unresolved` and mutates neither stake nor performance history.
    async fn run_round(&mut self, round: u64) -> (RoundResult, Decimal) {
        let prediction = match self.predictor.predict(&self.buffer) {
            Some(p) => p,
            None => {
                info!(round, "No prediction, skipping round");
                return (RoundResult::Skipped, Decimal::ZERO);
            }
        };

        if !self.thresholds.gate(prediction.confidence, prediction.class) {
            info!(
                round,
                prediction = %prediction,
                threshold = self.thresholds.threshold(prediction.class.kind()),
                "Confidence below threshold, skipping round"
            );
            return (RoundResult::Skipped, Decimal::ZERO);
        }

        let stake = self.stake.stake();
        let proposal = ProposalRequest::new(
            prediction.class,
            stake,
            &self.config.symbol,
            self.config.contract_duration_ticks,
        );

        let proposal_id = match self.broker.quote_wager(&proposal).await {
            Ok(id) => id,
            Err(e) => {
                warn!(round, error = %e, "Quote failed, abandoning round");
                return (RoundResult::Skipped, Decimal::ZERO);
            }
        };

        let wager_id = match self.broker.place_wager(&proposal_id, stake).await {
            Ok(id) => id,
            Err(e) => {
                warn!(round, error = %e, "Buy failed, abandoning round");
                return (RoundResult::Skipped, Decimal::ZERO);
            }
        };

        info!(
            round,
            class = %prediction.class,
            confidence = format!("{:.2}", prediction.confidence),
            stake = %stake,
            "Wager placed"
        );

        let settlement = match tokio::time::timeout(
            self.config.settlement_timeout,
            self.broker.fetch_settlement(&wager_id),
        )
        .await
        {
            Ok(Ok(s)) => s,
            Ok(Err(e)) => {
                warn!(round, error = %e, "Settlement fetch failed, round unresolved");
                return (RoundResult::Unresolved, Decimal::ZERO);
            }
            Err(_) => {
                warn!(round, "Settlement wait timed out, round unresolved");
                return (RoundResult::Unresolved, Decimal::ZERO);
            }
        };

        self.thresholds.record_result(settlement.won);
        self.stake.on_result(settlement.won);

        let result = if settlement.won {
            RoundResult::Won
        } else {
            RoundResult::Lost
        };
        (result, settlement.pnl)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
