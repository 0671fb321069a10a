//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed sections.
//! The API token is referenced by env-var name in the config and
//! resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;
use std::time::Duration;

use crate::broker::sim::SimConfig;
use crate::buffer::BufferConfig;
use crate::engine::session::SessionConfig;
use crate::strategy::risk::RiskConfig;
use crate::strategy::stake::StakeConfig;
use crate::strategy::thresholds::ThresholdConfig;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub session: SessionSection,
    pub stake: StakeSection,
    pub risk: RiskSection,
    pub history: HistorySection,
    pub thresholds: ThresholdSection,
    pub broker: BrokerSection,
}

/// Which predictor variant drives the session.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PredictorKind {
    Parity,
    Transition,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionSection {
    pub symbol: String,
    pub total_rounds: u64,
    pub round_delay_ms: u64,
    pub settlement_timeout_secs: u64,
    pub contract_duration_ticks: u32,
    pub predictor: PredictorKind,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StakeSection {
    pub base: Decimal,
    pub max: Decimal,
    pub multiplier: Decimal,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RiskSection {
    pub take_profit: Decimal,
    pub stop_loss: Decimal,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HistorySection {
    pub min: usize,
    pub initial: usize,
    pub max: usize,
    pub vol_low: f64,
    pub vol_high: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ThresholdSection {
    pub initial_even: f64,
    pub initial_odd: f64,
    pub initial_over: f64,
    pub initial_under: f64,
    pub adaptive_base: f64,
    pub max_adjustment: f64,
    pub min: f64,
    pub max: f64,
    pub performance_window: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BrokerSection {
    /// Name of the env var holding the API token (never the token itself).
    pub api_token_env: String,
    pub initial_balance: Decimal,
    pub payout_parity: Decimal,
    pub payout_digit: Decimal,
    pub tick_interval_ms: u64,
    /// Fixed RNG seed for deterministic simulated sessions.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Resolve the API token from the configured environment variable.
    pub fn api_token(&self) -> Result<SecretString> {
        let token = std::env::var(&self.broker.api_token_env)
            .with_context(|| format!("Environment variable not set: {}", self.broker.api_token_env))?;
        Ok(SecretString::new(token))
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            symbol: self.session.symbol.clone(),
            round_delay: Duration::from_millis(self.session.round_delay_ms),
            settlement_timeout: Duration::from_secs(self.session.settlement_timeout_secs),
            contract_duration_ticks: self.session.contract_duration_ticks,
        }
    }

    pub fn buffer_config(&self) -> BufferConfig {
        BufferConfig {
            min_history: self.history.min,
            initial_history: self.history.initial,
            max_history: self.history.max,
            vol_low: self.history.vol_low,
            vol_high: self.history.vol_high,
        }
    }

    pub fn stake_config(&self) -> StakeConfig {
        StakeConfig {
            base: self.stake.base,
            max: self.stake.max,
            multiplier: self.stake.multiplier,
        }
    }

    pub fn risk_config(&self) -> RiskConfig {
        RiskConfig {
            take_profit: self.risk.take_profit,
            stop_loss: self.risk.stop_loss,
            total_rounds: self.session.total_rounds,
        }
    }

    pub fn threshold_config(&self) -> ThresholdConfig {
        ThresholdConfig {
            initial_even: self.thresholds.initial_even,
            initial_odd: self.thresholds.initial_odd,
            initial_over: self.thresholds.initial_over,
            initial_under: self.thresholds.initial_under,
            adaptive_base: self.thresholds.adaptive_base,
            max_adjustment: self.thresholds.max_adjustment,
            min_threshold: self.thresholds.min,
            max_threshold: self.thresholds.max,
            performance_window: self.thresholds.performance_window,
        }
    }

    pub fn sim_config(&self) -> SimConfig {
        SimConfig {
            initial_balance: self.broker.initial_balance,
            payout_parity: self.broker.payout_parity,
            payout_digit: self.broker.payout_digit,
            tick_interval_ms: self.broker.tick_interval_ms,
            seed: self.broker.seed,
        }
    }
}
