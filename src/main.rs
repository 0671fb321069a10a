//! MARTIN — Adaptive Sequential Wagering Engine
//!
//! Entry point. Loads configuration, initialises structured logging,
//! wires the predictor, stake, threshold, and risk components into a
//! session loop over a simulated brokerage connection, and runs one
//! session with graceful shutdown.

use anyhow::Result;
use secrecy::ExposeSecret;
use std::sync::atomic::Ordering;
use tracing::{info, warn};

use martin::broker::sim::SimulatedBroker;
use martin::buffer::ObservationBuffer;
use martin::config::{AppConfig, PredictorKind};
use martin::engine::session::SessionLoop;
use martin::predictor::parity::ParityPredictor;
use martin::predictor::transition::{TransitionConfig, TransitionPredictor};
use martin::predictor::Predictor;
use martin::strategy::risk::RiskGovernor;
use martin::strategy::stake::StakeController;
use martin::strategy::thresholds::ThresholdController;

const BANNER: &str = r#"
 __  __    _    ____ _____ ___ _   _
|  \/  |  / \  |  _ \_   _|_ _| \ | |
| |\/| | / _ \ | |_) || |  | ||  \| |
| |  | |/ ___ \|  _ < | |  | || |\  |
|_|  |_/_/   \_\_| \_\|_| |___|_| \_|

  Adaptive Sequential Wagering Engine
  v0.1.0 — Simulated Session
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML
    let cfg = AppConfig::load("config.toml")?;

    // Initialise structured logging
    init_logging();

    // Print startup banner
    println!("{BANNER}");
    info!(
        symbol = %cfg.session.symbol,
        predictor = ?cfg.session.predictor,
        total_rounds = cfg.session.total_rounds,
        base_stake = %cfg.stake.base,
        "MARTIN starting up"
    );

    // The simulator accepts any non-empty token, so a missing env var
    // falls back to a placeholder rather than aborting the paper session.
    let token = match cfg.api_token() {
        Ok(t) => t,
        Err(e) => {
            warn!(error = %e, "API token not resolved, using simulator placeholder");
            secrecy::SecretString::new("sim-session".to_string())
        }
    };

    // -- Initialise components -------------------------------------------

    let broker = SimulatedBroker::new(cfg.sim_config());

    let predictor: Box<dyn Predictor> = match cfg.session.predictor {
        PredictorKind::Parity => Box::new(ParityPredictor::new()),
        PredictorKind::Transition => {
            Box::new(TransitionPredictor::new(TransitionConfig::default()))
        }
    };

    let session = SessionLoop::new(
        broker,
        cfg.session_config(),
        ObservationBuffer::new(cfg.buffer_config()),
        predictor,
        ThresholdController::new(cfg.threshold_config()),
        StakeController::new(cfg.stake_config()),
        RiskGovernor::new(cfg.risk_config()),
    );

    // -- Run the session -------------------------------------------------

    let stop = session.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received, stopping at next round boundary");
            stop.store(true, Ordering::SeqCst);
        }
    });

    info!("Entering session. Press Ctrl+C to stop.");
    let report = session.run(token.expose_secret()).await?;

    info!(
        stop_reason = %report.stop_reason,
        rounds = report.rounds,
        wins = report.wins,
        losses = report.losses,
        skipped = report.skipped,
        unresolved = report.unresolved,
        pnl = %report.total_pnl,
        final_balance = %report.final_balance,
        win_rate = format!("{:.1}%", report.win_rate),
        "MARTIN shut down cleanly."
    );

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("martin=info"));

    let json_logging = std::env::var("MARTIN_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
