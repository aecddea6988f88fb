//! Volatile-tier index of counter keys awaiting consolidation.

use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::StorageError;
use crate::infrastructure::TieredStorage;

/// Name of the pending-key set in the volatile tier.
pub const COUNTER_KEYS: &str = "counter_keys";

/// Registry of counter cache keys whose values must be written to the
/// durable tier by the next consolidation.
///
/// Updates are read-modify-write cycles on a single volatile entry. Within a
/// process they are serialized, so concurrent unions never lose keys; across
/// processes the last writer of the merged set wins.
pub struct CounterRegistry {
    storage: Arc<TieredStorage>,
    lock: Mutex<()>,
}

impl CounterRegistry {
    pub fn new(storage: Arc<TieredStorage>) -> Self {
        Self {
            storage,
            lock: Mutex::new(()),
        }
    }

    /// Returns the registered keys. A missing registry is empty.
    pub async fn get(&self) -> Result<Vec<String>, StorageError> {
        Ok(self
            .storage
            .get_value::<Vec<String>>(COUNTER_KEYS)
            .await?
            .unwrap_or_default())
    }

    /// Replaces the registered keys.
    pub async fn set(&self, keys: &[String]) -> Result<(), StorageError> {
        let keys: BTreeSet<&String> = keys.iter().collect();
        let keys: Vec<&String> = keys.into_iter().collect();
        self.storage.set_value(COUNTER_KEYS, &keys).await
    }

    /// Unions `keys` into the registry. Returns the registry size.
    pub async fn update(&self, keys: &[String]) -> Result<usize, StorageError> {
        if keys.is_empty() {
            return Ok(self.get().await?.len());
        }

        let _guard = self.lock.lock().await;
        let mut merged: BTreeSet<String> = self.get().await?.into_iter().collect();
        merged.extend(keys.iter().cloned());

        let merged: Vec<String> = merged.into_iter().collect();
        self.set(&merged).await?;
        debug!(added = keys.len(), total = merged.len(), "counter keys registered");
        Ok(merged.len())
    }

    /// Empties the registry and returns the keys it held.
    pub async fn drain(&self) -> Result<Vec<String>, StorageError> {
        let _guard = self.lock.lock().await;
        let keys = self.get().await?;
        if !keys.is_empty() {
            self.set(&[]).await?;
        }
        Ok(keys)
    }
}
