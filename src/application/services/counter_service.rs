//! Threshold-gated mention counters.

use chrono::{NaiveDate, Utc};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, error, info, warn};

use crate::domain::entities::{Counter, CounterKind, CounterThresholds, OperationFlags};
use crate::domain::frequency::Frequency;
use crate::domain::record::{Record, RecordKey};
use crate::domain::repositories::RecordRow;
use crate::error::{AppError, StorageError};
use crate::infrastructure::{Tier, TieredStorage};

use super::counter_registry::CounterRegistry;

/// Attempts per entry when a durable write fails during consolidation.
const MAX_WRITE_ATTEMPTS: usize = 3;

/// Lock stripes serializing increments of the same entity.
const INCREMENT_STRIPES: usize = 64;

/// Outcome of one consolidation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsolidationReport {
    /// Entries written to the durable tier.
    pub flushed: usize,
    /// Registered entries no longer present in the volatile tier.
    pub evicted: usize,
    /// Entries that still failed after retries; they are registered again.
    pub failed: usize,
}

/// Service owning counter updates and their promotion to the durable tier.
///
/// Every update lands in the volatile tier. Counters whose count reaches the
/// threshold of their kind are registered in the [`CounterRegistry`] and
/// written to the durable tier by [`CounterService::consolidate`]. Counters
/// below the threshold expire with the volatile tier's TTL.
pub struct CounterService {
    storage: Arc<TieredStorage>,
    registry: Arc<CounterRegistry>,
    thresholds: CounterThresholds,
    increment_locks: Vec<Mutex<()>>,
}

impl CounterService {
    pub fn new(
        storage: Arc<TieredStorage>,
        registry: Arc<CounterRegistry>,
        thresholds: CounterThresholds,
    ) -> Self {
        Self {
            storage,
            registry,
            thresholds,
            increment_locks: (0..INCREMENT_STRIPES).map(|_| Mutex::new(())).collect(),
        }
    }

    pub fn thresholds(&self) -> CounterThresholds {
        self.thresholds
    }

    pub fn registry(&self) -> &Arc<CounterRegistry> {
        &self.registry
    }

    fn increment_lock(&self, kind: CounterKind, root: &str) -> &Mutex<()> {
        let mut hasher = DefaultHasher::new();
        kind.hash(&mut hasher);
        root.hash(&mut hasher);
        &self.increment_locks[hasher.finish() as usize % self.increment_locks.len()]
    }

    /// Writes counters to the volatile tier and registers the significant ones.
    ///
    /// Returns the cache keys registered for consolidation.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`] if the volatile write or the registry
    /// update fails.
    pub async fn filtered_update(&self, counters: &[Counter]) -> Result<Vec<String>, AppError> {
        let promoted: Vec<String> = counters
            .iter()
            .filter(|c| c.count >= self.thresholds.for_kind(c.kind))
            .map(|c| c.record_key().cache_key())
            .collect();

        self.storage.put(counters, Tier::Volatile).await?;

        if !promoted.is_empty() {
            self.registry.update(&promoted).await?;
            metrics::counter!("counter_promotions_total").increment(promoted.len() as u64);
        }

        debug!(
            written = counters.len(),
            promoted = promoted.len(),
            "counters updated"
        );
        Ok(promoted)
    }

    /// Loads a counter, preferring the volatile tier.
    pub async fn get(
        &self,
        kind: CounterKind,
        root: &str,
        frequency: Frequency,
        date: NaiveDate,
    ) -> Result<Option<Counter>, AppError> {
        let key = Counter::key_for(kind, root, frequency, date)?;
        Ok(self.storage.get::<Counter>(&key, Tier::Both).await?)
    }

    /// Adds `delta` mentions of `root` on `date` to its daily, weekly and
    /// monthly counters.
    ///
    /// Concurrent increments of the same entity within this process are
    /// serialized, so none of them is lost. Returns the updated counters.
    pub async fn increment(
        &self,
        kind: CounterKind,
        root: &str,
        date: NaiveDate,
        delta: u64,
    ) -> Result<Vec<Counter>, AppError> {
        let _guard = self.increment_lock(kind, root).lock().await;
        let mut counters = Vec::with_capacity(Frequency::ALL.len());

        for frequency in Frequency::ALL {
            let mut counter = match self.get(kind, root, frequency, date).await? {
                Some(counter) => counter,
                None => Counter::new(kind, root, frequency, date)?,
            };
            counter.count += delta;
            counters.push(counter);
        }

        self.filtered_update(&counters).await?;
        Ok(counters)
    }

    /// Flushes registered counters from the volatile to the durable tier.
    ///
    /// The registry is drained before any counter is read, so a counter
    /// updated while the pass runs is registered again and picked up by the
    /// next pass. Entries are written in batches of `batch_size`. When a
    /// batch partly fails, each failed entry is retried on its own with
    /// exponential backoff; entries that keep failing are registered again.
    pub async fn consolidate(&self, batch_size: usize) -> Result<ConsolidationReport, AppError> {
        let pending = self.registry.drain().await?;
        let mut report = ConsolidationReport::default();
        if pending.is_empty() {
            return Ok(report);
        }

        let retained = match self.flush(&pending, batch_size, &mut report).await {
            Ok(retained) => retained,
            Err(e) => {
                self.registry.update(&pending).await?;
                return Err(e);
            }
        };
        self.registry.update(&retained).await?;
        self.record_consolidation(report.flushed as u64).await?;

        metrics::counter!("consolidation_flushed_total").increment(report.flushed as u64);
        metrics::counter!("consolidation_failed_total").increment(report.failed as u64);
        info!(
            flushed = report.flushed,
            evicted = report.evicted,
            failed = report.failed,
            "consolidation finished"
        );

        Ok(report)
    }

    /// Writes `pending` to the durable tier. Returns the keys that failed.
    async fn flush(
        &self,
        pending: &[String],
        batch_size: usize,
        report: &mut ConsolidationReport,
    ) -> Result<Vec<String>, AppError> {
        let mut retained = Vec::new();

        for chunk in pending.chunks(batch_size.max(1)) {
            let mut rows = Vec::with_capacity(chunk.len());

            for cache_key in chunk {
                let Some(key) = RecordKey::parse_cache_key(cache_key) else {
                    warn!(key = %cache_key, "dropping unparsable counter key");
                    continue;
                };

                match self.storage.get_raw(&key, Tier::Volatile).await? {
                    Some(body) => rows.push(RecordRow {
                        key,
                        body,
                        add_date: None,
                    }),
                    None => {
                        debug!(key = %cache_key, "counter evicted before consolidation");
                        report.evicted += 1;
                    }
                }
            }

            if rows.is_empty() {
                continue;
            }

            let failed = match self.storage.write_durable(rows.clone()).await {
                Ok(failed) => failed,
                Err(e) => {
                    warn!(error = %e, entries = rows.len(), "durable batch write failed");
                    rows.iter().map(|row| row.key.clone()).collect()
                }
            };

            for row in rows {
                if failed.contains(&row.key) && !self.retry_write(&row).await {
                    report.failed += 1;
                    retained.push(row.key.cache_key());
                    continue;
                }
                report.flushed += 1;
            }
        }

        Ok(retained)
    }

    async fn retry_write(&self, row: &RecordRow) -> bool {
        let strategy = ExponentialBackoff::from_millis(50)
            .max_delay(Duration::from_secs(2))
            .map(jitter)
            .take(MAX_WRITE_ATTEMPTS - 1);

        let storage = &self.storage;
        let result = Retry::start(strategy, move || async move {
            let failed = storage.write_durable(vec![row.clone()]).await?;
            if failed.is_empty() {
                Ok(())
            } else {
                Err(StorageError::DurableWrite(row.key.cache_key()))
            }
        })
        .await;

        match result {
            Ok(()) => true,
            Err(e) => {
                error!(key = %row.key, error = %e, "giving up on durable write");
                false
            }
        }
    }

    /// Returns the consolidation bookkeeping singleton.
    pub async fn operation_flags(&self) -> Result<OperationFlags, AppError> {
        Ok(self
            .storage
            .get_or_insert(OperationFlags::default(), Tier::Both)
            .await?)
    }

    async fn record_consolidation(&self, flushed: u64) -> Result<(), AppError> {
        let mut flags = self.operation_flags().await?;
        flags.last_consolidation = Some(Utc::now());
        flags.last_flushed = flushed;
        self.storage.set(&flags, Tier::Both).await?;
        Ok(())
    }
}
