//! End-to-end session flow: verified deposit, deployment, deterministic
//! resolution, banner lapse, and rejected uploads.

use copysim_catalog::StaticStrategyCatalog;
use copysim_core::{AccountStore, AppConfig, Strategy, StrategySource, TradeOutcome};
use copysim_engine::{Clock, ManualClock, SeededRandom};
use copysim_receipt::{ReceiptClassifier, StubRecognizer};
use copysim_session::{SessionEvent, SessionRegistry};
use copysim_store::InMemoryAccountStore;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

const HEX_HASH: &str = "0x4a5b6c7d8e9f0a1b2c3d4e5f6a7b8c9d0e1f2a3b4c5d6e7f8a9b0c1d2e3f4a5b";

fn turbo_strategy() -> Strategy {
    Strategy {
        id: "turbo".to_string(),
        name: "Turbo".to_string(),
        duration_ms: 1000,
        min_return_pct: dec!(20),
        max_return_pct: dec!(25),
        min_investment: dec!(100),
        is_active: true,
    }
}

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.simulation.win_probability = 1.0;
    config.simulation.tick_interval_ms = 10;
    config.session.starting_balance = dec!(1000);
    config
}

fn registry_with(
    store: Arc<InMemoryAccountStore>,
    recognized_text: &str,
) -> SessionRegistry {
    let catalog: Arc<dyn StrategySource> =
        Arc::new(StaticStrategyCatalog::new(vec![turbo_strategy()]).unwrap());
    let classifier = Arc::new(ReceiptClassifier::new(Arc::new(StubRecognizer::new(
        recognized_text,
    ))));
    SessionRegistry::new(store, catalog, classifier, test_config())
}

async fn wait_for<F>(
    events: &mut broadcast::Receiver<SessionEvent>,
    mut matches: F,
) -> SessionEvent
where
    F: FnMut(&SessionEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(30), async {
        loop {
            match events.recv().await {
                Ok(event) if matches(&event) => return event,
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => panic!("event stream closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for session event")
}

#[tokio::test(start_paused = true)]
async fn deposit_then_trade_flow_settles_the_ledger() {
    let store = Arc::new(InMemoryAccountStore::new());
    let receipt_text = format!("Payment Successful! Hash: {HEX_HASH} Amount: $500.00");
    let registry = registry_with(Arc::clone(&store), &receipt_text);

    let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
    let handle = registry
        .spawn_session_with(
            "demo-test",
            Arc::clone(&clock) as Arc<dyn Clock>,
            Box::new(SeededRandom::new(42)),
        )
        .await
        .unwrap();
    let mut events = handle.subscribe_events();

    // A verified screenshot credits exactly the detected amount and flips
    // the deposit gate.
    handle
        .submit_receipt(b"screenshot bytes".to_vec(), "image/png")
        .await
        .unwrap();
    let event = wait_for(&mut events, |e| {
        matches!(e, SessionEvent::DepositVerified { .. })
    })
    .await;
    if let SessionEvent::DepositVerified { amount, .. } = event {
        assert_eq!(amount, dec!(500));
    }

    let account = store.get("demo-test").await.unwrap().unwrap();
    assert_eq!(account.balance, dec!(1500));
    assert!(account.has_deposited);

    // Deployment locks the principal.
    let position_id = handle.open_position("turbo", dec!(500)).await.unwrap();
    let status = handle.status().await.unwrap();
    assert_eq!(status.account.balance, dec!(1000));
    assert_eq!(status.account.total_invested, dec!(500));
    assert_eq!(status.open_positions.len(), 1);
    assert_eq!(status.open_positions[0].position_id, position_id);

    // Past the strategy duration the next tick settles the position.
    clock.advance_ms(1100);
    let event = wait_for(&mut events, |e| {
        matches!(e, SessionEvent::TradeResolved(_))
    })
    .await;
    let SessionEvent::TradeResolved(result) = event else {
        unreachable!()
    };
    assert_eq!(result.outcome, TradeOutcome::Win);
    assert!(result.profit >= dec!(100) && result.profit <= dec!(125));

    let account = store.get("demo-test").await.unwrap().unwrap();
    assert_eq!(account.balance, dec!(1500) + result.profit);
    assert_eq!(account.total_invested, dec!(0));
    assert_eq!(account.wins, 1);
    assert_eq!(account.losses, 0);

    // The result banner is transient: visible now, gone after it lapses.
    assert!(handle.status().await.unwrap().last_result.is_some());
    clock.advance_ms(6000);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(handle.status().await.unwrap().last_result.is_none());
    let account = store.get("demo-test").await.unwrap().unwrap();
    assert_eq!(account.wins + account.losses, 1);

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn rejected_screenshot_never_credits() {
    let store = Arc::new(InMemoryAccountStore::new());
    // Amount-shaped substrings everywhere, but no success keyword.
    let registry = registry_with(
        Arc::clone(&store),
        "Transfer pending review $9,999.00 hash attached",
    );

    let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
    let handle = registry
        .spawn_session_with(
            "demo-test",
            Arc::clone(&clock) as Arc<dyn Clock>,
            Box::new(SeededRandom::new(1)),
        )
        .await
        .unwrap();
    let mut events = handle.subscribe_events();

    handle
        .submit_receipt(b"screenshot bytes".to_vec(), "image/png")
        .await
        .unwrap();
    let event = wait_for(&mut events, |e| {
        matches!(e, SessionEvent::DepositRejected { .. })
    })
    .await;
    if let SessionEvent::DepositRejected { summary, .. } = event {
        assert!(summary.starts_with("Rejected:"));
    }

    let account = store.get("demo-test").await.unwrap().unwrap();
    assert_eq!(account.balance, dec!(1000));
    assert!(!account.has_deposited);

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn insufficient_funds_surfaces_to_the_caller() {
    let store = Arc::new(InMemoryAccountStore::new());
    let registry = registry_with(Arc::clone(&store), "");

    let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
    let handle = registry
        .spawn_session_with(
            "demo-test",
            Arc::clone(&clock) as Arc<dyn Clock>,
            Box::new(SeededRandom::new(1)),
        )
        .await
        .unwrap();

    // Starting balance is 1000; asking for 5000 must fail without touching
    // the ledger.
    let err = handle
        .open_position("turbo", dec!(5000))
        .await
        .unwrap_err();
    let trade_err = err
        .downcast_ref::<copysim_core::TradeError>()
        .expect("typed trade error");
    assert!(trade_err.needs_deposit());

    let account = store.get("demo-test").await.unwrap().unwrap();
    assert_eq!(account.balance, dec!(1000));
    assert_eq!(account.total_invested, dec!(0));

    handle.shutdown().await.unwrap();
}
