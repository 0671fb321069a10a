//! Simulated brokerage connection.
//!
//! An in-memory `BrokerConnection` backed by a seedable RNG: digits are
//! drawn uniformly from 0–9, wagers settle against a fresh draw, and the
//! balance is tracked locally. Useful for paper sessions and for running
//! the full engine without a live account.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use super::{BrokerConnection, BrokerError, BrokerResult, ProposalRequest};
use crate::types::{Outcome, Settlement, TradeClass};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Simulator tuning.
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub initial_balance: Decimal,
    /// Gross payout per unit staked for parity contracts.
    pub payout_parity: Decimal,
    /// Gross payout per unit staked for barrier (over/under) contracts.
    pub payout_digit: Decimal,
    /// Milliseconds between generated ticks.
    pub tick_interval_ms: u64,
    /// Fixed seed for deterministic runs; None draws from entropy.
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            initial_balance: dec!(10000),
            payout_parity: dec!(1.9),
            payout_digit: dec!(1.43),
            tick_interval_ms: 1000,
            seed: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

struct PendingWager {
    class: TradeClass,
    stake: Decimal,
}

/// In-memory broker with RNG-driven outcomes and settlements.
pub struct SimulatedBroker {
    config: SimConfig,
    authorized: Arc<Mutex<bool>>,
    balance: Arc<Mutex<Decimal>>,
    rng: Arc<Mutex<StdRng>>,
    proposals: Arc<Mutex<HashMap<String, ProposalRequest>>>,
    wagers: Arc<Mutex<HashMap<String, PendingWager>>>,
}

impl SimulatedBroker {
    pub fn new(config: SimConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let balance = config.initial_balance;
        Self {
            config,
            authorized: Arc::new(Mutex::new(false)),
            balance: Arc::new(Mutex::new(balance)),
            rng: Arc::new(Mutex::new(rng)),
            proposals: Arc::new(Mutex::new(HashMap::new())),
            wagers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn require_auth(&self) -> BrokerResult<()> {
        if *self.authorized.lock().unwrap() {
            Ok(())
        } else {
            Err(BrokerError::Api("session is not authorized".to_string()))
        }
    }

    fn payout_for(&self, class: TradeClass) -> Decimal {
        match class {
            TradeClass::Even | TradeClass::Odd => self.config.payout_parity,
            TradeClass::Over(_) | TradeClass::Under(_) => self.config.payout_digit,
        }
    }

    fn draw_digit(&self) -> Outcome {
        self.rng.lock().unwrap().gen_range(0..10) as Outcome
    }
}

#[async_trait::async_trait]
impl BrokerConnection for SimulatedBroker {
    async fn authorize(&self, token: &str) -> BrokerResult<()> {
        if token.trim().is_empty() {
            return Err(BrokerError::Auth("empty API token".to_string()));
        }
        *self.authorized.lock().unwrap() = true;
        info!("Simulated session authorized");
        Ok(())
    }

    async fn balance(&self) -> BrokerResult<Decimal> {
        self.require_auth()?;
        Ok(*self.balance.lock().unwrap())
    }

    async fn subscribe_outcomes(
        &self,
        symbol: &str,
        history: usize,
    ) -> BrokerResult<mpsc::Receiver<Outcome>> {
        self.require_auth()?;

        let (tx, rx) = mpsc::channel(32);
        let interval = std::time::Duration::from_millis(self.config.tick_interval_ms);
        // The feed task gets its own RNG stream so tick generation and
        // settlement draws do not interleave.
        let mut feed_rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        };

        info!(symbol, history, "Simulated outcome feed starting");
        tokio::spawn(async move {
            for _ in 0..history {
                let digit = feed_rng.gen_range(0..10) as Outcome;
                if tx.send(digit).await.is_err() {
                    return;
                }
            }
            loop {
                tokio::time::sleep(interval).await;
                let digit = feed_rng.gen_range(0..10) as Outcome;
                if tx.send(digit).await.is_err() {
                    return;
                }
            }
        });

        Ok(rx)
    }

    async fn quote_wager(&self, proposal: &ProposalRequest) -> BrokerResult<String> {
        self.require_auth()?;

        let id = format!("sim-prop-{}", Uuid::new_v4());
        debug!(
            proposal_id = %id,
            payload = %serde_json::to_string(proposal).unwrap_or_default(),
            "Proposal quoted"
        );
        self.proposals
            .lock()
            .unwrap()
            .insert(id.clone(), proposal.clone());
        Ok(id)
    }

    async fn place_wager(&self, proposal_id: &str, stake: Decimal) -> BrokerResult<String> {
        self.require_auth()?;

        let proposal = self
            .proposals
            .lock()
            .unwrap()
            .remove(proposal_id)
            .ok_or_else(|| BrokerError::Api(format!("unknown proposal: {proposal_id}")))?;

        {
            let balance = self.balance.lock().unwrap();
            if *balance < stake {
                return Err(BrokerError::Api(format!(
                    "insufficient balance: need {stake}, have {balance}"
                )));
            }
        }

        let class = match (proposal.contract_type, proposal.barrier) {
            ("DIGITEVEN", _) => TradeClass::Even,
            ("DIGITODD", _) => TradeClass::Odd,
            ("DIGITOVER", Some(b)) => TradeClass::Over(b),
            ("DIGITUNDER", Some(b)) => TradeClass::Under(b),
            (other, _) => {
                return Err(BrokerError::Api(format!("unknown contract type: {other}")))
            }
        };

        let id = format!("sim-wager-{}", Uuid::new_v4());
        self.wagers
            .lock()
            .unwrap()
            .insert(id.clone(), PendingWager { class, stake });
        debug!(wager_id = %id, stake = %stake, "Wager placed");
        Ok(id)
    }

    async fn fetch_settlement(&self, wager_id: &str) -> BrokerResult<Settlement> {
        self.require_auth()?;

        let wager = self
            .wagers
            .lock()
            .unwrap()
            .remove(wager_id)
            .ok_or_else(|| BrokerError::Api(format!("unknown wager: {wager_id}")))?;

        let digit = self.draw_digit();
        let won = wager.class.wins_against(digit);
        let pnl = if won {
            wager.stake * (self.payout_for(wager.class) - Decimal::ONE)
        } else {
            -wager.stake
        };

        *self.balance.lock().unwrap() += pnl;
        debug!(wager_id, digit, won, pnl = %pnl, "Wager settled");
        Ok(Settlement { won, pnl })
    }

    async fn close(&self) {
        *self.authorized.lock().unwrap() = false;
        info!("Simulated session closed");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
