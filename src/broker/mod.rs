//! Brokerage connection.
//!
//! Defines the `BrokerConnection` trait — the narrow seam the engine
//! trades through — and a simulated implementation. The wire protocol
//! itself belongs to whichever client sits behind the trait; the engine
//! only sees typed calls and a channel of outcomes.

pub mod sim;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::types::{Outcome, Settlement, TradeClass};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Broker failure taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    /// Fatal: the session never enters trading.
    #[error("authorization failed: {0}")]
    Auth(String),

    /// Round-scoped: the affected round is abandoned or left unresolved
    /// and the session continues.
    #[error("api call failed: {0}")]
    Api(String),
}

pub type BrokerResult<T> = Result<T, BrokerError>;

// ---------------------------------------------------------------------------
// Proposal payload
// ---------------------------------------------------------------------------

/// Wire-shaped quote request for one wager. A real connection serializes
/// this into its proposal message; the simulator logs it.
#[derive(Debug, Clone, Serialize)]
pub struct ProposalRequest {
    pub contract_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barrier: Option<u8>,
    pub amount: Decimal,
    pub basis: &'static str,
    pub currency: &'static str,
    pub duration: u32,
    pub duration_unit: &'static str,
    pub symbol: String,
}

impl ProposalRequest {
    pub fn new(class: TradeClass, stake: Decimal, symbol: &str, duration_ticks: u32) -> Self {
        Self {
            contract_type: class.contract_type(),
            barrier: class.barrier(),
            amount: stake,
            basis: "stake",
            currency: "USD",
            duration: duration_ticks,
            duration_unit: "t",
            symbol: symbol.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Connection trait
// ---------------------------------------------------------------------------

/// Abstraction over the brokerage session.
///
/// One instance represents one authenticated connection; the background
/// outcome feed and the trading loop are the only users and must not
/// overlap requests on it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BrokerConnection: Send + Sync {
    /// Authenticate the session. Failure is fatal to the session.
    async fn authorize(&self, token: &str) -> BrokerResult<()>;

    /// Current account balance.
    async fn balance(&self) -> BrokerResult<Decimal>;

    /// Subscribe to the outcome stream for a symbol. The feed is infinite
    /// and not restartable; `history` outcomes are delivered up front to
    /// warm the observation window.
    async fn subscribe_outcomes(
        &self,
        symbol: &str,
        history: usize,
    ) -> BrokerResult<mpsc::Receiver<Outcome>>;

    /// Request a quote for a wager. Returns a proposal id.
    async fn quote_wager(&self, proposal: &ProposalRequest) -> BrokerResult<String>;

    /// Buy a quoted proposal. Returns a wager id.
    async fn place_wager(&self, proposal_id: &str, stake: Decimal) -> BrokerResult<String>;

    /// Retrieve the settlement of a placed wager.
    async fn fetch_settlement(&self, wager_id: &str) -> BrokerResult<Settlement>;

    /// Release the connection. Called on every session exit path.
    async fn close(&self);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
