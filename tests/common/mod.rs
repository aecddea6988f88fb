#![allow(dead_code)]

use chrono::NaiveDate;
use mention_tracker::domain::entities::CounterThresholds;
use mention_tracker::infrastructure::TieredStorage;
use mention_tracker::infrastructure::cache::MemoryCache;
use mention_tracker::infrastructure::persistence::MemoryRecordRepository;
use mention_tracker::state::AppState;
use std::sync::Arc;

pub const PRODUCT: &str = "http://www.amazon.com/dp/B00ABCDEFG";
pub const OTHER_PRODUCT: &str = "http://www.amazon.co.uk/dp/B00ZZZZZZZ";

pub struct TestTracker {
    pub state: AppState,
    pub cache: Arc<MemoryCache>,
    pub records: Arc<MemoryRecordRepository>,
}

pub fn create_test_tracker() -> TestTracker {
    create_test_tracker_with(CounterThresholds::default())
}

pub fn create_test_tracker_with(thresholds: CounterThresholds) -> TestTracker {
    let cache = Arc::new(MemoryCache::new(3600));
    let records = Arc::new(MemoryRecordRepository::new());
    let storage = Arc::new(TieredStorage::new(cache.clone(), records.clone()));

    TestTracker {
        state: AppState::new(storage, thresholds),
        cache,
        records,
    }
}

/// A second process sharing the durable tier but with its own volatile tier.
pub fn create_peer(tracker: &TestTracker) -> AppState {
    let storage = Arc::new(TieredStorage::new(
        Arc::new(MemoryCache::new(3600)),
        tracker.records.clone(),
    ));
    AppState::new(storage, tracker.state.counters.thresholds())
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}
