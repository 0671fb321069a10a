//! Scripted broker for integration testing.
//!
//! Provides a deterministic `BrokerConnection` implementation that
//! replays a fixed outcome sequence, settles wagers against scripted
//! digits, and tracks the stake of every wager placed — all in-memory
//! with no randomness.

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use uuid::Uuid;

use martin::broker::{BrokerConnection, BrokerError, BrokerResult, ProposalRequest};
use martin::types::{Outcome, Settlement, TradeClass};

/// A scripted brokerage connection for deterministic testing.
///
/// The outcome feed replays `outcomes` once and then closes. Each
/// settlement pops the next entry from `settlements`: `Some(digit)`
/// settles the wager against that digit, `None` fails the settlement
/// call. All handles are `Arc`-shared so a clone kept by the test can
/// inspect state after the session consumes the original.
#[derive(Clone)]
pub struct ScriptedBroker {
    outcomes: Arc<Mutex<Vec<Outcome>>>,
    settlements: Arc<Mutex<VecDeque<Option<Outcome>>>>,
    balance: Arc<Mutex<Decimal>>,
    payout_parity: Decimal,
    payout_digit: Decimal,
    proposals: Arc<Mutex<HashMap<String, TradeClass>>>,
    wagers: Arc<Mutex<HashMap<String, (TradeClass, Decimal)>>>,
    placed_stakes: Arc<Mutex<Vec<Decimal>>>,
    /// Number of upcoming quote calls to fail.
    fail_quotes: Arc<Mutex<u32>>,
    closed: Arc<Mutex<bool>>,
}

impl ScriptedBroker {
    pub fn new(outcomes: Vec<Outcome>, settlements: Vec<Option<Outcome>>) -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(outcomes)),
            settlements: Arc::new(Mutex::new(settlements.into_iter().collect())),
            balance: Arc::new(Mutex::new(dec!(10000))),
            payout_parity: dec!(1.9),
            payout_digit: dec!(1.43),
            proposals: Arc::new(Mutex::new(HashMap::new())),
            wagers: Arc::new(Mutex::new(HashMap::new())),
            placed_stakes: Arc::new(Mutex::new(Vec::new())),
            fail_quotes: Arc::new(Mutex::new(0)),
            closed: Arc::new(Mutex::new(false)),
        }
    }

    /// Fail the next `n` quote calls with an API error.
    pub fn fail_next_quotes(&self, n: u32) {
        *self.fail_quotes.lock().unwrap() = n;
    }

    /// Stakes of every wager placed, in order.
    pub fn placed_stakes(&self) -> Vec<Decimal> {
        self.placed_stakes.lock().unwrap().clone()
    }

    pub fn final_balance(&self) -> Decimal {
        *self.balance.lock().unwrap()
    }

    pub fn was_closed(&self) -> bool {
        *self.closed.lock().unwrap()
    }

    fn payout_for(&self, class: TradeClass) -> Decimal {
        match class {
            TradeClass::Even | TradeClass::Odd => self.payout_parity,
            TradeClass::Over(_) | TradeClass::Under(_) => self.payout_digit,
        }
    }
}

#[async_trait]
impl BrokerConnection for ScriptedBroker {
    async fn authorize(&self, token: &str) -> BrokerResult<()> {
        if token.is_empty() || token == "bad" {
            return Err(BrokerError::Auth("token rejected".to_string()));
        }
        Ok(())
    }

    async fn balance(&self) -> BrokerResult<Decimal> {
        Ok(*self.balance.lock().unwrap())
    }

    async fn subscribe_outcomes(
        &self,
        _symbol: &str,
        _history: usize,
    ) -> BrokerResult<mpsc::Receiver<Outcome>> {
        let outcomes = std::mem::take(&mut *self.outcomes.lock().unwrap());
        let (tx, rx) = mpsc::channel(outcomes.len().max(1));
        tokio::spawn(async move {
            for digit in outcomes {
                if tx.send(digit).await.is_err() {
                    return;
                }
            }
            // Sender drops here; the feed closes after the script is spent.
        });
        Ok(rx)
    }

    async fn quote_wager(&self, proposal: &ProposalRequest) -> BrokerResult<String> {
        {
            let mut remaining = self.fail_quotes.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(BrokerError::Api("scripted quote failure".to_string()));
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

        let id = format!("scripted-prop-{}", Uuid::new_v4());
        self.proposals.lock().unwrap().insert(id.clone(), class);
        Ok(id)
    }

    async fn place_wager(&self, proposal_id: &str, stake: Decimal) -> BrokerResult<String> {
        let class = self
            .proposals
            .lock()
            .unwrap()
            .remove(proposal_id)
            .ok_or_else(|| BrokerError::Api(format!("unknown proposal: {proposal_id}")))?;

        let id = format!("scripted-wager-{}", Uuid::new_v4());
        self.wagers.lock().unwrap().insert(id.clone(), (class, stake));
        self.placed_stakes.lock().unwrap().push(stake);
        Ok(id)
    }

    async fn fetch_settlement(&self, wager_id: &str) -> BrokerResult<Settlement> {
        let (class, stake) = self
            .wagers
            .lock()
            .unwrap()
            .remove(wager_id)
            .ok_or_else(|| BrokerError::Api(format!("unknown wager: {wager_id}")))?;

        let digit = self
            .settlements
            .lock()
            .unwrap()
            .pop_front()
            .flatten()
            .ok_or_else(|| BrokerError::Api("scripted settlement failure".to_string()))?;

        let won = class.wins_against(digit);
        let pnl = if won {
            stake * (self.payout_for(class) - Decimal::ONE)
        } else {
            -stake
        };
        *self.balance.lock().unwrap() += pnl;
        Ok(Settlement { won, pnl })
    }

    async fn close(&self) {
        *self.closed.lock().unwrap() = true;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_feed_replays_then_closes() {
        let broker = ScriptedBroker::new(vec![1, 2, 3], vec![]);
        let mut rx = broker.subscribe_outcomes("R_100", 3).await.unwrap();
        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.recv().await, Some(2));
        assert_eq!(rx.recv().await, Some(3));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_scripted_settlement_digits() {
        let broker = ScriptedBroker::new(vec![], vec![Some(4), Some(7)]);
        broker.authorize("token").await.unwrap();

        let proposal = ProposalRequest::new(TradeClass::Even, dec!(100), "R_100", 1);
        let pid = broker.quote_wager(&proposal).await.unwrap();
        let wid = broker.place_wager(&pid, dec!(100)).await.unwrap();
        let s = broker.fetch_settlement(&wid).await.unwrap();
        assert!(s.won); // 4 is even
        assert_eq!(s.pnl, dec!(90));

        let pid = broker.quote_wager(&proposal).await.unwrap();
        let wid = broker.place_wager(&pid, dec!(100)).await.unwrap();
        let s = broker.fetch_settlement(&wid).await.unwrap();
        assert!(!s.won); // 7 is odd
        assert_eq!(s.pnl, dec!(-100));

        assert_eq!(broker.final_balance(), dec!(9990));
        assert_eq!(broker.placed_stakes(), vec![dec!(100), dec!(100)]);
    }

    #[tokio::test]
    async fn test_scripted_settlement_failure() {
        let broker = ScriptedBroker::new(vec![], vec![None]);
        let proposal = ProposalRequest::new(TradeClass::Odd, dec!(50), "R_100", 1);
        let pid = broker.quote_wager(&proposal).await.unwrap();
        let wid = broker.place_wager(&pid, dec!(50)).await.unwrap();
        assert!(broker.fetch_settlement(&wid).await.is_err());
    }

    #[tokio::test]
    async fn test_forced_quote_failures_are_counted() {
        let broker = ScriptedBroker::new(vec![], vec![]);
        broker.fail_next_quotes(2);

        let proposal = ProposalRequest::new(TradeClass::Even, dec!(10), "R_100", 1);
        assert!(broker.quote_wager(&proposal).await.is_err());
        assert!(broker.quote_wager(&proposal).await.is_err());
        assert!(broker.quote_wager(&proposal).await.is_ok());
    }
}
