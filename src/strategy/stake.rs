//! Martingale stake sizing.
//!
//! The stake resets to the base amount on a win and is scaled by a fixed
//! multiplier on a loss, capped at a configured maximum. The progression
//! carries the full downside risk of the session, so the cap is the one
//! bound that must hold unconditionally.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Stake progression configuration.
#[derive(Debug, Clone)]
pub struct StakeConfig {
    /// Stake for the first round and after every win.
    pub base: Decimal,
    /// Hard ceiling on any single stake.
    pub max: Decimal,
    /// Loss multiplier (1.5 and 2.0 both appear in practice).
    pub multiplier: Decimal,
}

impl Default for StakeConfig {
    fn default() -> Self {
        Self {
            base: dec!(100),
            max: dec!(10000),
            multiplier: dec!(2),
        }
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Bounded martingale progression keyed on win/loss outcome.
pub struct StakeController {
    config: StakeConfig,
    stake: Decimal,
}

impl StakeController {
    pub fn new(config: StakeConfig) -> Self {
        let stake = config.base;
        Self { config, stake }
    }

    /// Stake for the current round.
    pub fn stake(&self) -> Decimal {
        self.stake
    }

    /// Advance the progression after a resolved round.
    pub fn on_result(&mut self, won: bool) {
        let before = self.stake;
        self.stake = if won {
            self.config.base
        } else {
            (self.stake * self.config.multiplier).min(self.config.max)
        };
        debug!(won, from = %before, to = %self.stake, "Stake advanced");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
