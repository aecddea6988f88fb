mod common;

use common::{OTHER_PRODUCT, PRODUCT, create_test_tracker, create_test_tracker_with, date};
use mention_tracker::domain::entities::{Counter, CounterKind, CounterThresholds};
use mention_tracker::domain::frequency::Frequency;
use mention_tracker::domain::payload::Payload;
use mention_tracker::domain::record::Kind;
use mention_tracker::infrastructure::Tier;

#[tokio::test]
async fn test_ingest_then_consolidate_persists_significant_counters() {
    let tracker = create_test_tracker();
    let state = &tracker.state;
    let day = date(2024, 3, 12);

    let body = Payload::serialize(&[
        Payload::new(PRODUCT, "u1"),
        Payload::new(PRODUCT, "u2"),
        Payload::new(OTHER_PRODUCT, "u1"),
    ])
    .unwrap();
    let report = state.ingest.ingest(&body, day).await.unwrap();
    assert_eq!(report.counted, 3);

    // PRODUCT reached the product threshold (2) in all three frequencies.
    let pending = state.counters.registry().get().await.unwrap();
    assert_eq!(pending.len(), 3);

    let consolidated = state.counters.consolidate(100).await.unwrap();
    assert_eq!(consolidated.flushed, 3);
    assert_eq!(tracker.records.count(Kind::ProductCounter).await, 3);
    assert_eq!(tracker.records.count(Kind::UserCounter).await, 0);
    assert!(state.counters.registry().get().await.unwrap().is_empty());

    let key = Counter::key_for(CounterKind::Product, PRODUCT, Frequency::Weekly, day).unwrap();
    let weekly: Counter = state.storage.get(&key, Tier::Durable).await.unwrap().unwrap();
    assert_eq!(weekly.count, 2);
    assert_eq!(weekly.key.week(), Some(11));
    assert_eq!(
        weekly.store.map(|s| s.root().to_string()).as_deref(),
        Some("http://www.amazon.com")
    );
}

#[tokio::test]
async fn test_counts_accumulate_across_batches() {
    let tracker = create_test_tracker_with(CounterThresholds { product: 1, user: 1 });
    let state = &tracker.state;
    let day = date(2024, 1, 31);

    for _ in 0..3 {
        state
            .ingest
            .process(&[Payload::new(PRODUCT, "u1")], day)
            .await
            .unwrap();
    }
    state.counters.consolidate(10).await.unwrap();

    for frequency in Frequency::ALL {
        let counter = state
            .counters
            .get(CounterKind::User, "u1", frequency, day)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(counter.count, 3, "{} count", frequency);
    }
    assert_eq!(tracker.records.count(Kind::UserCounter).await, 3);
}

#[tokio::test]
async fn test_days_in_same_week_share_weekly_counter() {
    let tracker = create_test_tracker();
    let counters = &tracker.state.counters;

    // Monday and Sunday of ISO week 2025-W01, across the calendar year boundary.
    counters
        .increment(CounterKind::User, "u1", date(2024, 12, 30), 1)
        .await
        .unwrap();
    counters
        .increment(CounterKind::User, "u1", date(2025, 1, 5), 1)
        .await
        .unwrap();

    let weekly = counters
        .get(CounterKind::User, "u1", Frequency::Weekly, date(2025, 1, 1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(weekly.count, 2);
    assert_eq!(weekly.key_name(), "u1|weekly|2025|1");

    let december = counters
        .get(CounterKind::User, "u1", Frequency::Monthly, date(2024, 12, 1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(december.count, 1);
}

#[tokio::test]
async fn test_operation_flags_track_last_consolidation() {
    let tracker = create_test_tracker();
    let counters = &tracker.state.counters;
    assert!(counters.operation_flags().await.unwrap().last_consolidation.is_none());

    counters
        .increment(CounterKind::Product, PRODUCT, date(2024, 6, 1), 2)
        .await
        .unwrap();
    counters.consolidate(2).await.unwrap();

    let flags = counters.operation_flags().await.unwrap();
    assert!(flags.last_consolidation.is_some());
    assert_eq!(flags.last_flushed, 3);
}
