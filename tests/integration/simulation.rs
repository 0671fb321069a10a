//! End-to-end session tests.
//!
//! Runs the full engine — buffer, predictor, thresholds, stake
//! controller, risk governor, session loop — against a scripted broker
//! and checks stake progression, stop conditions, and round accounting.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use martin::buffer::{BufferConfig, ObservationBuffer};
use martin::engine::session::{SessionConfig, SessionLoop};
use martin::predictor::parity::ParityPredictor;
use martin::strategy::risk::{RiskConfig, RiskGovernor};
use martin::strategy::stake::{StakeConfig, StakeController};
use martin::strategy::thresholds::{ThresholdConfig, ThresholdController};
use martin::types::StopReason;

use crate::scripted_broker::ScriptedBroker;

/// A session over a fixed three-digit observation window with no
/// inter-round delay. The parity predictor needs a full window, so the
/// first two rounds of every script are warm-up skips.
fn session(
    broker: ScriptedBroker,
    stake: StakeConfig,
    risk: RiskConfig,
) -> SessionLoop<ScriptedBroker> {
    let buffer = ObservationBuffer::new(BufferConfig {
        min_history: 3,
        initial_history: 3,
        max_history: 3,
        ..Default::default()
    });
    SessionLoop::new(
        broker,
        SessionConfig {
            round_delay: std::time::Duration::from_millis(0),
            ..Default::default()
        },
        buffer,
        Box::new(ParityPredictor::new()),
        ThresholdController::new(ThresholdConfig::default()),
        StakeController::new(stake),
        RiskGovernor::new(risk),
    )
}

fn capped_stake() -> StakeConfig {
    StakeConfig {
        base: dec!(100),
        max: dec!(800),
        multiplier: dec!(2),
    }
}

#[tokio::test]
async fn test_martingale_progression_caps_and_resets() {
    // Seven odd digits: two warm-up rounds, then five wagers on Odd.
    // Four even settlement digits lose, the fifth (odd) wins.
    let broker = ScriptedBroker::new(
        vec![1, 3, 5, 7, 9, 1, 3],
        vec![Some(0), Some(2), Some(4), Some(6), Some(1)],
    );
    let handle = broker.clone();

    let report = session(broker, capped_stake(), RiskConfig::default())
        .run("token")
        .await
        .unwrap();

    // 100 → 200 → 400 → 800, then held at the cap instead of 1600.
    assert_eq!(
        handle.placed_stakes(),
        vec![dec!(100), dec!(200), dec!(400), dec!(800), dec!(800)]
    );
    assert_eq!(report.stop_reason, StopReason::FeedClosed);
    assert_eq!(report.rounds, 7);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.losses, 4);
    assert_eq!(report.wins, 1);
    // Losses total 1500; the capped win returns 800 × 0.9.
    assert_eq!(report.total_pnl, dec!(-780));
    assert_eq!(report.final_balance, dec!(9220));
    assert_eq!(handle.final_balance(), dec!(9220));
    assert!(handle.was_closed());
}

#[tokio::test]
async fn test_take_profit_stops_at_exact_boundary() {
    // One win of 100 at 1.9 payout yields exactly the take-profit target.
    let broker = ScriptedBroker::new(vec![1, 3, 5, 7, 9], vec![Some(9)]);

    let report = session(
        broker,
        capped_stake(),
        RiskConfig {
            take_profit: dec!(90),
            ..Default::default()
        },
    )
    .run("token")
    .await
    .unwrap();

    assert_eq!(report.stop_reason, StopReason::TakeProfit);
    assert_eq!(report.rounds, 3);
    assert_eq!(report.wins, 1);
    assert_eq!(report.total_pnl, dec!(90));
    assert_eq!(report.final_balance, dec!(10090));
}

#[tokio::test]
async fn test_stop_loss_stops_at_exact_boundary() {
    let broker = ScriptedBroker::new(vec![1, 3, 5, 7, 9], vec![Some(0)]);

    let report = session(
        broker,
        capped_stake(),
        RiskConfig {
            stop_loss: dec!(100),
            ..Default::default()
        },
    )
    .run("token")
    .await
    .unwrap();

    assert_eq!(report.stop_reason, StopReason::StopLoss);
    assert_eq!(report.rounds, 3);
    assert_eq!(report.losses, 1);
    assert_eq!(report.total_pnl, dec!(-100));
}

#[tokio::test]
async fn test_round_budget_counts_every_round() {
    // Skipped warm-up rounds consume budget too: 2 skips + 2 wagers = 4.
    let broker = ScriptedBroker::new(
        vec![1, 3, 5, 7, 9, 1, 3, 5, 7, 9],
        vec![Some(0), Some(2)],
    );

    let report = session(
        broker,
        capped_stake(),
        RiskConfig {
            total_rounds: 4,
            ..Default::default()
        },
    )
    .run("token")
    .await
    .unwrap();

    assert_eq!(report.stop_reason, StopReason::RoundBudgetExhausted);
    assert_eq!(report.rounds, 4);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.losses, 2);
}

#[tokio::test]
async fn test_unresolved_round_leaves_stake_untouched() {
    // First settlement call fails; the round is unresolved and the next
    // wager goes out at the base stake, not doubled.
    let broker = ScriptedBroker::new(vec![1, 3, 5, 7], vec![None, Some(0)]);
    let handle = broker.clone();

    let report = session(broker, capped_stake(), RiskConfig::default())
        .run("token")
        .await
        .unwrap();

    assert_eq!(handle.placed_stakes(), vec![dec!(100), dec!(100)]);
    assert_eq!(report.unresolved, 1);
    assert_eq!(report.losses, 1);
    assert_eq!(report.total_pnl, dec!(-100));
}

#[tokio::test]
async fn test_quote_failure_abandons_round_as_skipped() {
    let broker = ScriptedBroker::new(vec![1, 3, 5, 7], vec![Some(0)]);
    broker.fail_next_quotes(1);
    let handle = broker.clone();

    let report = session(broker, capped_stake(), RiskConfig::default())
        .run("token")
        .await
        .unwrap();

    // Two warm-up skips plus the failed quote.
    assert_eq!(report.skipped, 3);
    assert_eq!(report.losses, 1);
    assert_eq!(handle.placed_stakes(), vec![dec!(100)]);
}

#[tokio::test]
async fn test_stop_request_honoured_before_first_round() {
    let broker = ScriptedBroker::new(vec![1, 3, 5], vec![]);
    let handle = broker.clone();

    let sess = session(broker, capped_stake(), RiskConfig::default());
    sess.stop_handle()
        .store(true, std::sync::atomic::Ordering::SeqCst);

    let report = sess.run("token").await.unwrap();
    assert_eq!(report.stop_reason, StopReason::StopRequested);
    assert_eq!(report.rounds, 0);
    assert!(handle.was_closed());
}

#[tokio::test]
async fn test_rejected_token_aborts_before_trading() {
    let broker = ScriptedBroker::new(vec![1, 3, 5], vec![]);
    let handle = broker.clone();

    let result = session(broker, capped_stake(), RiskConfig::default())
        .run("bad")
        .await;

    assert!(result.is_err());
    // The connection is still released on the failure path.
    assert!(handle.was_closed());
    assert_eq!(handle.placed_stakes(), Vec::<Decimal>::new());
}
