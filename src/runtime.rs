//! Storage connections and the tracker's process lifecycle.

use crate::config::Config;
use crate::domain::consolidation_worker::run_consolidation_worker;
use crate::infrastructure::TieredStorage;
use crate::infrastructure::cache::{CacheService, MemoryCache, RedisCache};
use crate::infrastructure::persistence::PgRecordRepository;
use crate::state::AppState;

use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Opens the PostgreSQL pool with the configured limits.
pub async fn connect_database(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");
    Ok(pool)
}

/// Connects the volatile tier.
///
/// Falls back to an in-process [`MemoryCache`] when Redis is not configured
/// or unreachable. The fallback is not shared between processes.
pub async fn connect_cache(config: &Config) -> Arc<dyn CacheService> {
    if let Some(redis_url) = &config.redis_url {
        match RedisCache::connect(redis_url, config.cache_ttl_seconds).await {
            Ok(redis) => {
                tracing::info!("Volatile tier: Redis");
                return Arc::new(redis);
            }
            Err(e) => {
                tracing::warn!("Failed to connect to Redis: {}. Using in-process cache.", e);
            }
        }
    } else {
        tracing::info!("Volatile tier: in-process cache");
    }

    Arc::new(MemoryCache::new(config.cache_ttl_seconds))
}

/// Connects both tiers and applies pending migrations.
pub async fn connect_storage(config: &Config) -> Result<Arc<TieredStorage>> {
    let pool = connect_database(config).await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to apply migrations")?;

    let cache = connect_cache(config).await;
    let records = Arc::new(PgRecordRepository::new(Arc::new(pool)));

    Ok(Arc::new(TieredStorage::new(cache, records)))
}

/// Runs the tracker until Ctrl-C.
///
/// Initializes:
/// - PostgreSQL connection pool and migrations
/// - Redis volatile tier (or in-process fallback)
/// - Consolidation worker
///
/// # Errors
///
/// Returns an error if the database is unreachable or migrations fail.
pub async fn run(config: Config) -> Result<()> {
    let storage = connect_storage(&config).await?;
    let state = AppState::new(storage, config.thresholds());

    let flags = state.counters.operation_flags().await?;
    tracing::info!(
        last_consolidation = ?flags.last_consolidation,
        last_flushed = flags.last_flushed,
        "Storage ready"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = tokio::spawn(run_consolidation_worker(
        state.counters.clone(),
        Duration::from_secs(config.consolidation_interval_seconds),
        config.consolidation_batch_size,
        shutdown_rx,
    ));

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutdown signal received");

    shutdown_tx.send(true).ok();
    worker.await.context("Consolidation worker panicked")?;

    Ok(())
}
