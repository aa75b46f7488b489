//! End-to-end tests for the wagering engine.
//!
//! Every test runs against the in-memory store, so no external services are
//! needed. Run with: cargo test --test integration

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use frenbet::error::{ValidationError, WagerError};
use frenbet::feed::{ReconciliationFeed, RetryPolicy};
use frenbet::limits::{BetLimits, MAX_WAGER_AMOUNT};
use frenbet::payout::Odds;
use frenbet::session::{BetPercentages, OptionSide, Session, SessionDraft};
use frenbet::store::{ChangeFeed, ChangeKind, MemoryStore, MemoryStoreConfig};
use frenbet::AppCoordinator;

fn coordinator(store: &Arc<MemoryStore>) -> Arc<AppCoordinator> {
    Arc::new(AppCoordinator::new(
        Arc::clone(store),
        BetPercentages::default(),
    ))
}

async fn scenario_session(coord: &AppCoordinator) -> Session {
    coord
        .create_session(SessionDraft::new("Who wins?", "A", "B", "alice").with_percentages(50, 200))
        .await
        .unwrap()
}

/// Alice backs A with 100, then Bob backs B with 60.
async fn scenario_two(coord: &AppCoordinator) -> Session {
    let session = scenario_session(coord).await;
    coord
        .place_wager(session.id, "alice", OptionSide::First, dec!(100))
        .await
        .unwrap();
    coord
        .place_wager(session.id, "bob", OptionSide::Second, dec!(60))
        .await
        .unwrap();
    session
}

#[tokio::test]
async fn first_wager_sets_limits_but_not_odds() {
    let store = Arc::new(MemoryStore::new());
    let coord = coordinator(&store);
    let session = scenario_session(&coord).await;

    let view = coord.derived_view(session.id).await.unwrap();
    assert_eq!(view.limits, BetLimits::UNBOUNDED);

    coord
        .place_wager(session.id, "alice", OptionSide::First, dec!(100))
        .await
        .unwrap();

    let view = coord.derived_view(session.id).await.unwrap();
    assert_eq!(view.limits.min, dec!(50));
    assert_eq!(view.limits.max, Some(dec!(200)));
    assert_eq!(view.odds(OptionSide::First), Odds::Undefined);
    assert_eq!(view.odds(OptionSide::Second), Odds::Undefined);
}

#[tokio::test]
async fn opposing_wager_defines_odds_and_estimates() {
    let store = Arc::new(MemoryStore::new());
    let coord = coordinator(&store);
    let session = scenario_two(&coord).await;

    let view = coord.derived_view(session.id).await.unwrap();
    assert_eq!(view.odds(OptionSide::First).to_string(), "0.60x");
    assert_eq!(view.odds(OptionSide::Second).to_string(), "1.67x");
    assert_eq!(view.potential_win(OptionSide::First, dec!(10)), dec!(5.45));
}

#[tokio::test]
async fn current_winnings_per_player() {
    let store = Arc::new(MemoryStore::new());
    let coord = coordinator(&store);
    let session = scenario_two(&coord).await;

    let view = coord.derived_view(session.id).await.unwrap();
    assert_eq!(view.current_winnings("alice"), dec!(60.00));
    assert_eq!(view.current_winnings("bob"), dec!(100.00));
    assert_eq!(view.current_winnings("nobody"), Decimal::ZERO);
}

#[tokio::test]
async fn below_minimum_wager_leaves_ledger_unchanged() {
    let store = Arc::new(MemoryStore::new());
    let coord = coordinator(&store);
    let session = scenario_two(&coord).await;
    let before = coord.derived_view(session.id).await.unwrap();

    let result = coord
        .place_wager(session.id, "carol", OptionSide::First, dec!(10))
        .await;
    assert_eq!(
        result.unwrap_err(),
        WagerError::Validation(ValidationError::BelowMinimum { min: dec!(50) })
    );

    let after = coord.derived_view(session.id).await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn concurrent_wagers_are_all_recorded() {
    let store = Arc::new(MemoryStore::new());
    let coord = coordinator(&store);
    let session = scenario_two(&coord).await;

    let id = session.id;
    let players: Vec<String> = (0..16).map(|i| format!("player{}", i)).collect();
    let results = join_all(players.iter().enumerate().map(|(i, player)| {
        let coord = Arc::clone(&coord);
        let side = if i % 2 == 0 { OptionSide::First } else { OptionSide::Second };
        async move { coord.place_wager(id, player, side, dec!(75)).await }
    }))
    .await;
    assert!(results.iter().all(|r| r.is_ok()));

    let view = coord.derived_view(session.id).await.unwrap();
    assert_eq!(view.wager_count, 18);
    assert_eq!(view.options[0].total_amount, dec!(100) + dec!(75) * dec!(8));
    assert_eq!(view.options[1].total_amount, dec!(60) + dec!(75) * dec!(8));
    assert_eq!(
        view.total_pool,
        view.options[0].total_amount + view.options[1].total_amount
    );
    // Baseline is still the first wager
    assert_eq!(view.first_wager_amount, Some(dec!(100)));
}

#[tokio::test]
async fn concurrent_first_wagers_pick_one_baseline() {
    // Latency makes both validations read the empty ledger before either append
    let store = Arc::new(MemoryStore::with_config(MemoryStoreConfig {
        latency_ms: 5,
        ..Default::default()
    }));
    let coord = coordinator(&store);
    let session = scenario_session(&coord).await;

    let (a, b) = tokio::join!(
        coord.place_wager(session.id, "alice", OptionSide::First, dec!(100)),
        coord.place_wager(session.id, "bob", OptionSide::Second, dec!(80)),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    let first = if a.sequence < b.sequence { &a } else { &b };
    let view = coord.derived_view(session.id).await.unwrap();
    assert_eq!(view.first_wager_amount, Some(first.amount));
    assert_eq!(view.total_pool, dec!(180));
}

/// Bob places the first wager while, `delay_ms` later, alice changes the
/// percentages. Returns the update outcome, the change kinds in store order,
/// and the limits once both calls settled.
async fn race_first_wager_with_update(
    delay_ms: u64,
) -> (Result<Session, WagerError>, Vec<ChangeKind>, BetLimits) {
    let store = Arc::new(MemoryStore::with_config(MemoryStoreConfig {
        latency_ms: 20,
        ..Default::default()
    }));
    let coord = coordinator(&store);
    let session = scenario_session(&coord).await;
    let mut events = store.subscribe();

    let id = session.id;
    let wager = tokio::spawn({
        let coord = Arc::clone(&coord);
        async move { coord.place_wager(id, "bob", OptionSide::Second, dec!(100)).await }
    });
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    let update = coord
        .update_percentages(id, "alice", Some(1), Some(10000))
        .await;
    wager.await.unwrap().unwrap();

    let mut kinds = Vec::new();
    while let Ok(event) = events.try_recv() {
        kinds.push(event.kind);
    }
    let limits = coord.derived_view(id).await.unwrap().limits;
    (update, kinds, limits)
}

#[tokio::test]
async fn limit_update_after_first_wager_landed_is_locked() {
    // The wager is appended at ~60ms; the update checks the ledger at ~80ms
    let (update, kinds, limits) = race_first_wager_with_update(40).await;

    assert_eq!(
        update.unwrap_err(),
        WagerError::Validation(ValidationError::LimitsLocked)
    );
    assert_eq!(kinds, vec![ChangeKind::WagerInserted]);
    assert_eq!(limits.min, dec!(50));
    assert_eq!(limits.max, Some(dec!(200)));
}

#[tokio::test]
async fn limit_update_racing_first_wager_never_rewrites_its_limits() {
    let (update, kinds, limits) = race_first_wager_with_update(10).await;

    match update {
        // Accepted only if it was stored before the wager
        Ok(session) => {
            assert_eq!(kinds, vec![ChangeKind::SessionUpdated, ChangeKind::WagerInserted]);
            assert_eq!(session.percentages, BetPercentages { min: 1, max: 10000 });
            assert_eq!(limits.min, dec!(1));
            assert_eq!(limits.max, Some(dec!(10000)));
        }
        Err(err) => {
            assert_eq!(err, WagerError::Validation(ValidationError::LimitsLocked));
            assert_eq!(kinds, vec![ChangeKind::WagerInserted]);
            assert_eq!(limits.max, Some(dec!(200)));
        }
    }
}

#[tokio::test]
async fn oversized_first_wager_is_classified_not_fatal() {
    let store = Arc::new(MemoryStore::new());
    let coord = coordinator(&store);
    let session = scenario_session(&coord).await;
    let mut rx = coord.watch(session.id).await.unwrap();

    let err = coord
        .place_wager(session.id, "alice", OptionSide::First, dec!(1000000000000000000000000000))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        WagerError::Validation(ValidationError::AmountTooLarge { max: MAX_WAGER_AMOUNT })
    );
    assert_eq!(err.kind(), "validation");

    coord
        .place_wager(session.id, "alice", OptionSide::First, MAX_WAGER_AMOUNT)
        .await
        .unwrap();
    coord
        .place_wager(session.id, "bob", OptionSide::Second, MAX_WAGER_AMOUNT)
        .await
        .unwrap();

    let view = rx.borrow_and_update().clone();
    assert_eq!(view.wager_count, 2);
    assert_eq!(view.limits.max, Some(MAX_WAGER_AMOUNT * dec!(2)));
    assert_eq!(view.odds(OptionSide::First).to_string(), "1.00x");
    assert_eq!(view.current_winnings("alice"), MAX_WAGER_AMOUNT);
}

#[tokio::test]
async fn derived_view_is_stable_without_appends() {
    let store = Arc::new(MemoryStore::new());
    let coord = coordinator(&store);
    let session = scenario_two(&coord).await;

    let first = coord.derived_view(session.id).await.unwrap();
    let second = coord.derived_view(session.id).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn observers_in_another_process_converge_through_the_feed() {
    let store = Arc::new(MemoryStore::new());
    let writer = coordinator(&store);
    let reader = coordinator(&store);
    let session = scenario_session(&writer).await;

    let mut rx = reader.watch(session.id).await.unwrap();
    let feed = ReconciliationFeed::new(Arc::clone(&reader), store.subscribe(), RetryPolicy::default())
        .spawn();

    writer
        .place_wager(session.id, "alice", OptionSide::First, dec!(100))
        .await
        .unwrap();
    writer
        .place_wager(session.id, "bob", OptionSide::Second, dec!(60))
        .await
        .unwrap();

    let converged = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if rx.borrow_and_update().wager_count == 2 {
                break;
            }
            rx.changed().await.unwrap();
        }
    })
    .await;
    assert!(converged.is_ok(), "reader never saw both wagers");

    let view = rx.borrow().clone();
    assert_eq!(view.odds(OptionSide::Second).to_string(), "1.67x");
    assert_eq!(*view, reader.derived_view(session.id).await.unwrap());

    feed.abort();
}

#[tokio::test]
async fn store_outage_fails_fast_and_recovers() {
    let store = Arc::new(MemoryStore::new());
    let coord = coordinator(&store);
    let session = scenario_session(&coord).await;

    store.set_fail_reads(true);
    let err = coord.derived_view(session.id).await.unwrap_err();
    assert!(err.is_retryable());
    let err = coord
        .place_wager(session.id, "alice", OptionSide::First, dec!(100))
        .await
        .unwrap_err();
    assert!(matches!(err, WagerError::TransientStore(_)));

    store.set_fail_reads(false);
    coord
        .place_wager(session.id, "alice", OptionSide::First, dec!(100))
        .await
        .unwrap();
    assert_eq!(coord.derived_view(session.id).await.unwrap().wager_count, 1);
}
