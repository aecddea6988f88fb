//! Mention counters for products and users.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::entities::store::StoreKey;
use crate::domain::frequency::{Frequency, FrequencyKey};
use crate::domain::record::{Kind, Record, RecordKey};
use crate::error::AppError;

/// Default minimum product count before a counter is written to the durable tier.
pub const PRODUCT_COUNTER_MIN_COUNT: u64 = 2;

/// Default minimum user count before a counter is written to the durable tier.
pub const USER_COUNTER_MIN_COUNT: u64 = 5;

/// What a counter counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterKind {
    /// Mentions of a product, keyed by its canonical product URL.
    Product,
    /// Mentions posted by a user. Used to spot spam and promotion accounts.
    User,
}

impl CounterKind {
    pub fn record_kind(&self) -> Kind {
        match self {
            CounterKind::Product => Kind::ProductCounter,
            CounterKind::User => Kind::UserCounter,
        }
    }
}

/// Per-kind significance thresholds for durable writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterThresholds {
    pub product: u64,
    pub user: u64,
}

impl CounterThresholds {
    pub fn for_kind(&self, kind: CounterKind) -> u64 {
        match kind {
            CounterKind::Product => self.product,
            CounterKind::User => self.user,
        }
    }
}

impl Default for CounterThresholds {
    fn default() -> Self {
        Self {
            product: PRODUCT_COUNTER_MIN_COUNT,
            user: USER_COUNTER_MIN_COUNT,
        }
    }
}

/// Mention count of one entity within one frequency bucket.
///
/// Counts only grow between consolidations. `is_banned` is refreshed by
/// moderation and keeps spam out of rendered views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    pub kind: CounterKind,
    pub key: FrequencyKey,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub is_banned: bool,
    /// Set for product counters only.
    #[serde(default)]
    pub store: Option<StoreKey>,
}

impl Counter {
    /// Creates an empty counter for the bucket of `date`.
    ///
    /// Product counters resolve their store from the root, which must be a
    /// product URL of a supported store.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Key`] for roots containing the key delimiter and
    /// [`AppError::Store`] for product roots outside the supported stores.
    pub fn new(
        kind: CounterKind,
        root: &str,
        frequency: Frequency,
        date: NaiveDate,
    ) -> Result<Self, AppError> {
        let key = FrequencyKey::new(root, frequency, date)?;
        let store = match kind {
            CounterKind::Product => Some(StoreKey::from_product_url(root)?),
            CounterKind::User => None,
        };

        Ok(Self {
            kind,
            key,
            count: 0,
            is_banned: false,
            store,
        })
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.count = count;
        self
    }

    /// Record key of the counter for `root` at `frequency` and `date`.
    pub fn key_for(
        kind: CounterKind,
        root: &str,
        frequency: Frequency,
        date: NaiveDate,
    ) -> Result<RecordKey, AppError> {
        let key = FrequencyKey::new(root, frequency, date)?;
        Ok(RecordKey::from_path(kind.record_kind(), key.key_name()))
    }

    pub fn key_name(&self) -> String {
        self.key.key_name()
    }
}

impl Record for Counter {
    fn record_key(&self) -> RecordKey {
        RecordKey::from_path(self.kind.record_kind(), self.key.key_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRODUCT: &str = "http://www.amazon.com/dp/B00ABCDEFG";

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 17).unwrap()
    }

    #[test]
    fn test_product_counter_has_store() {
        let counter = Counter::new(CounterKind::Product, PRODUCT, Frequency::Monthly, date()).unwrap();

        assert_eq!(counter.count, 0);
        assert!(!counter.is_banned);
        assert_eq!(counter.store.unwrap().root(), "http://www.amazon.com");
        assert_eq!(counter.key.month(), Some(5));
        assert_eq!(counter.key.year(), Some(2024));
    }

    #[test]
    fn test_user_counter_has_no_store() {
        let counter = Counter::new(CounterKind::User, "12345", Frequency::Daily, date()).unwrap();

        assert!(counter.store.is_none());
        assert_eq!(counter.key.day(), Some(date()));
        assert_eq!(counter.record_key().cache_key(), "UserCounter:12345|daily|2024-05-17");
    }

    #[test]
    fn test_product_counter_rejects_unknown_store() {
        let result = Counter::new(
            CounterKind::Product,
            "http://shop.example.com/dp/B00ABCDEFG",
            Frequency::Daily,
            date(),
        );
        assert!(matches!(result, Err(AppError::Store(_))));
    }

    #[test]
    fn test_thresholds_per_kind() {
        let thresholds = CounterThresholds { product: 3, user: 9 };
        assert_eq!(thresholds.for_kind(CounterKind::Product), 3);
        assert_eq!(thresholds.for_kind(CounterKind::User), 9);
    }

    #[test]
    fn test_serde_round_trip_keeps_bucket() {
        let counter = Counter::new(CounterKind::User, "u1", Frequency::Weekly, date())
            .unwrap()
            .with_count(7);
        let json = serde_json::to_string(&counter).unwrap();
        let back: Counter = serde_json::from_str(&json).unwrap();
        assert_eq!(back, counter);
    }
}
