//! In-process volatile tier backed by moka.

use super::service::{CacheResult, CacheService};
use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use std::time::{Duration, Instant};
use tracing::debug;

/// Cached value with the TTL it was written with.
#[derive(Clone, Debug)]
struct CachedValue {
    value: String,
    ttl: Duration,
}

/// Expires each entry after the TTL of its last write, like `SETEX`.
struct PerEntryTtl;

impl Expiry<String, CachedValue> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// A cache kept in process memory.
///
/// Used when Redis is not configured and by tests. Entries expire after
/// their TTL like they would in Redis.
///
/// # Use Cases
///
/// - Single-node deployments without Redis
/// - Fallback when the Redis connection fails at startup
/// - Tests that need a real volatile tier
pub struct MemoryCache {
    entries: Cache<String, CachedValue>,
    default_ttl: Duration,
}

impl MemoryCache {
    /// Creates an empty cache with the given default TTL.
    pub fn new(default_ttl_seconds: u64) -> Self {
        debug!("Using MemoryCache (in-process volatile tier)");
        Self {
            entries: Cache::builder().expire_after(PerEntryTtl).build(),
            default_ttl: Duration::from_secs(default_ttl_seconds),
        }
    }

    /// Number of live entries.
    pub async fn len(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn entry(&self, value: &str, ttl_seconds: Option<u64>) -> CachedValue {
        CachedValue {
            value: value.to_string(),
            ttl: ttl_seconds
                .map(Duration::from_secs)
                .unwrap_or(self.default_ttl),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_CACHE_TTL_SECONDS)
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        match self.entries.get(key).await {
            Some(entry) => {
                debug!("Cache HIT: {}", key);
                Ok(Some(entry.value))
            }
            None => {
                debug!("Cache MISS: {}", key);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> CacheResult<()> {
        self.entries
            .insert(key.to_string(), self.entry(value, ttl_seconds))
            .await;
        Ok(())
    }

    async fn set_many(
        &self,
        items: &[(String, String)],
        ttl_seconds: Option<u64>,
    ) -> CacheResult<()> {
        for (key, value) in items {
            self.entries
                .insert(key.clone(), self.entry(value, ttl_seconds))
                .await;
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.entries.invalidate(key).await;
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = MemoryCache::new(60);
        cache.set("a", "1", None).await.unwrap();

        assert_eq!(cache.get("a").await.unwrap(), Some("1".to_string()));
        assert_eq!(cache.get("b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = MemoryCache::new(60);
        cache.set("a", "1", None).await.unwrap();
        cache.delete("a").await.unwrap();

        assert!(cache.get("a").await.unwrap().is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_entries_expire_after_their_own_ttl() {
        let cache = MemoryCache::new(60);
        cache.set("default", "x", None).await.unwrap();
        cache.set("short", "y", Some(1)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(1200)).await;

        assert!(cache.get("short").await.unwrap().is_none());
        assert_eq!(cache.get("default").await.unwrap(), Some("x".to_string()));
    }

    #[tokio::test]
    async fn test_overwrite_resets_ttl() {
        let cache = MemoryCache::new(60);
        cache.set("k", "old", Some(1)).await.unwrap();
        cache.set("k", "new", None).await.unwrap();

        tokio::time::sleep(Duration::from_millis(1200)).await;

        assert_eq!(cache.get("k").await.unwrap(), Some("new".to_string()));
    }

    #[tokio::test]
    async fn test_set_many() {
        let cache = MemoryCache::new(60);
        let items = vec![
            ("k1".to_string(), "v1".to_string()),
            ("k2".to_string(), "v2".to_string()),
        ];
        cache.set_many(&items, None).await.unwrap();

        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get("k2").await.unwrap(), Some("v2".to_string()));
    }
}
