//! Two-tier record storage.
//!
//! Every operation takes an explicit [`Tier`]. Reads on [`Tier::Both`] try
//! the volatile tier first and fall back to the durable tier, warming the
//! volatile tier on a durable hit. Writes on [`Tier::Both`] go to both.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::record::{Kind, Record, RecordKey};
use crate::domain::repositories::{RecordRepository, RecordRow};
use crate::error::StorageError;
use crate::infrastructure::cache::CacheService;

/// Storage tier selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Volatile,
    Durable,
    Both,
}

impl Tier {
    pub fn includes_volatile(self) -> bool {
        matches!(self, Tier::Volatile | Tier::Both)
    }

    pub fn includes_durable(self) -> bool {
        matches!(self, Tier::Durable | Tier::Both)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tier::Volatile => "volatile",
            Tier::Durable => "durable",
            Tier::Both => "both",
        })
    }
}

fn encode<T: Serialize>(key: &str, value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(|source| StorageError::Serialization {
        key: key.to_string(),
        source,
    })
}

fn decode<T: DeserializeOwned>(key: &str, body: &str) -> Result<T, StorageError> {
    serde_json::from_str(body).map_err(|source| StorageError::Serialization {
        key: key.to_string(),
        source,
    })
}

/// The storage abstraction consumed by the tracker's services.
pub struct TieredStorage {
    cache: Arc<dyn CacheService>,
    records: Arc<dyn RecordRepository>,
}

impl TieredStorage {
    pub fn new(cache: Arc<dyn CacheService>, records: Arc<dyn RecordRepository>) -> Self {
        Self { cache, records }
    }

    /// Loads the raw JSON body of a record.
    pub async fn get_raw(&self, key: &RecordKey, tier: Tier) -> Result<Option<String>, StorageError> {
        if tier.includes_volatile()
            && let Some(body) = self.cache.get(&key.cache_key()).await?
        {
            return Ok(Some(body));
        }

        if tier.includes_durable()
            && let Some(body) = self.records.get(key).await?
        {
            if tier == Tier::Both {
                self.cache.set(&key.cache_key(), &body, None).await?;
            }
            return Ok(Some(body));
        }

        Ok(None)
    }

    /// Loads and decodes a record.
    pub async fn get<T: Record>(&self, key: &RecordKey, tier: Tier) -> Result<Option<T>, StorageError> {
        match self.get_raw(key, tier).await? {
            Some(body) => Ok(Some(decode(&key.cache_key(), &body)?)),
            None => Ok(None),
        }
    }

    /// Writes a single record.
    pub async fn set<T: Record>(&self, record: &T, tier: Tier) -> Result<(), StorageError> {
        let failed = self.put(std::slice::from_ref(record), tier).await?;
        match failed.into_iter().next() {
            Some(key) => Err(StorageError::DurableWrite(key.cache_key())),
            None => Ok(()),
        }
    }

    /// Writes a batch of records.
    ///
    /// The volatile write is a single pipelined call. Durable writes are not
    /// atomic across the batch; the keys whose durable write failed are
    /// returned for retry.
    pub async fn put<T: Record>(&self, records: &[T], tier: Tier) -> Result<Vec<RecordKey>, StorageError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            let key = record.record_key();
            let body = encode(&key.cache_key(), record)?;
            rows.push(RecordRow {
                key,
                body,
                add_date: record.add_date(),
            });
        }

        if tier.includes_volatile() {
            let entries: Vec<(String, String)> = rows
                .iter()
                .map(|row| (row.key.cache_key(), row.body.clone()))
                .collect();
            self.cache.set_many(&entries, None).await?;
            debug!(count = entries.len(), "records written to volatile tier");
        }

        if tier.includes_durable() {
            return self.write_durable(rows).await;
        }

        Ok(Vec::new())
    }

    /// Writes already-serialized rows to the durable tier.
    ///
    /// Returns the keys whose write failed.
    pub async fn write_durable(&self, rows: Vec<RecordRow>) -> Result<Vec<RecordKey>, StorageError> {
        let total = rows.len();
        let failed = self.records.upsert_many(rows).await?;
        if !failed.is_empty() {
            warn!(failed = failed.len(), total, "partial durable batch failure");
        }
        Ok(failed)
    }

    /// Returns the stored record, creating it from `record` if absent.
    ///
    /// On tiers that include the durable tier, creation uses an atomic
    /// insert-if-absent; a concurrent creator's record wins and is returned.
    pub async fn get_or_insert<T: Record>(&self, record: T, tier: Tier) -> Result<T, StorageError> {
        let key = record.record_key();
        if let Some(existing) = self.get::<T>(&key, tier).await? {
            return Ok(existing);
        }

        let stored = if tier.includes_durable() {
            let body = encode(&key.cache_key(), &record)?;
            let row = RecordRow {
                key: key.clone(),
                body,
                add_date: record.add_date(),
            };

            if self.records.insert_if_absent(row).await? {
                record
            } else {
                debug!(key = %key, "lost insert race, adopting stored record");
                self.get::<T>(&key, Tier::Durable).await?.unwrap_or(record)
            }
        } else {
            record
        };

        if tier.includes_volatile() {
            let body = encode(&key.cache_key(), &stored)?;
            self.cache.set(&key.cache_key(), &body, None).await?;
        }

        Ok(stored)
    }

    /// Names of the most recently added durable records of `kind`.
    pub async fn recent_names(&self, kind: Kind, limit: i64) -> Result<Vec<String>, StorageError> {
        self.records.recent_names(kind, limit).await
    }

    /// Reads a named value from the volatile tier.
    pub async fn get_value<V: DeserializeOwned>(&self, name: &str) -> Result<Option<V>, StorageError> {
        match self.cache.get(name).await? {
            Some(body) => Ok(Some(decode(name, &body)?)),
            None => Ok(None),
        }
    }

    /// Writes a named value to the volatile tier.
    pub async fn set_value<V: Serialize + Sync>(&self, name: &str, value: &V) -> Result<(), StorageError> {
        let body = encode(name, value)?;
        self.cache.set(name, &body, None).await?;
        Ok(())
    }

    /// Reports `(volatile, durable)` backend health.
    pub async fn health_check(&self) -> (bool, bool) {
        (self.cache.health_check().await, self.records.health_check().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Banlist, Product};
    use crate::domain::repositories::MockRecordRepository;
    use crate::infrastructure::cache::{MemoryCache, MockCacheService};
    use crate::infrastructure::persistence::MemoryRecordRepository;
    use chrono::NaiveDate;

    fn product(name: &str) -> Product {
        Product::new(name, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
    }

    fn storage() -> (TieredStorage, Arc<MemoryCache>, Arc<MemoryRecordRepository>) {
        let cache = Arc::new(MemoryCache::new(60));
        let records = Arc::new(MemoryRecordRepository::new());
        (TieredStorage::new(cache.clone(), records.clone()), cache, records)
    }

    #[tokio::test]
    async fn test_volatile_write_skips_durable() {
        let mut records = MockRecordRepository::new();
        records.expect_upsert_many().times(0);
        let storage = TieredStorage::new(Arc::new(MemoryCache::new(60)), Arc::new(records));

        storage.put(&[product("p1")], Tier::Volatile).await.unwrap();

        let key = product("p1").record_key();
        let loaded: Option<Product> = storage.get(&key, Tier::Volatile).await.unwrap();
        assert_eq!(loaded, Some(product("p1")));
    }

    #[tokio::test]
    async fn test_durable_write_skips_volatile() {
        let mut cache = MockCacheService::new();
        cache.expect_set_many().times(0);
        cache.expect_get().times(0);
        let storage = TieredStorage::new(Arc::new(cache), Arc::new(MemoryRecordRepository::new()));

        storage.put(&[product("p1")], Tier::Durable).await.unwrap();

        let key = product("p1").record_key();
        let loaded: Option<Product> = storage.get(&key, Tier::Durable).await.unwrap();
        assert_eq!(loaded, Some(product("p1")));
    }

    #[tokio::test]
    async fn test_both_read_warms_volatile() {
        let (storage, cache, _) = storage();
        storage.put(&[product("p1")], Tier::Durable).await.unwrap();
        let key = product("p1").record_key();
        assert!(cache.get(&key.cache_key()).await.unwrap().is_none());

        let loaded: Option<Product> = storage.get(&key, Tier::Both).await.unwrap();

        assert_eq!(loaded, Some(product("p1")));
        assert!(cache.get(&key.cache_key()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_get_or_insert_adopts_existing_durable_record() {
        let (storage, _, records) = storage();
        let winner = Banlist::new(vec!["p".to_string()], vec![]);
        storage.put(&[winner.clone()], Tier::Durable).await.unwrap();

        let stored = storage
            .get_or_insert(Banlist::default(), Tier::Both)
            .await
            .unwrap();

        assert_eq!(stored, winner);
        assert_eq!(records.count(Kind::Banlist).await, 1);
    }

    #[tokio::test]
    async fn test_named_values() {
        let (storage, _, _) = storage();
        assert!(storage.get_value::<Vec<String>>("counter_keys").await.unwrap().is_none());

        storage
            .set_value("counter_keys", &vec!["a".to_string()])
            .await
            .unwrap();

        assert_eq!(
            storage.get_value::<Vec<String>>("counter_keys").await.unwrap(),
            Some(vec!["a".to_string()])
        );
    }

    #[test]
    fn test_tier_membership() {
        assert!(Tier::Both.includes_volatile() && Tier::Both.includes_durable());
        assert!(Tier::Volatile.includes_volatile() && !Tier::Volatile.includes_durable());
        assert!(!Tier::Durable.includes_volatile() && Tier::Durable.includes_durable());
    }
}
