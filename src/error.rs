//! Crate-wide error types.

use crate::domain::entities::StoreError;
use crate::domain::frequency::KeyError;
use crate::domain::payload::PayloadError;
use crate::infrastructure::cache::CacheError;
use crate::utils::product_url::ProductUrlError;

/// Failures of the storage tiers.
///
/// Transient failures are opaque to the core; callers decide whether to retry.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Durable write failed for {0}")]
    DurableWrite(String),

    #[error("Failed to (de)serialize record {key}: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors surfaced by the tracker's services.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Invalid frequency or key input. A programming error, never retried.
    #[error(transparent)]
    Key(#[from] KeyError),

    /// Unknown locale or unsupported store. Surfaced as-is, never retried.
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    ProductUrl(#[from] ProductUrlError),

    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<CacheError> for AppError {
    fn from(e: CacheError) -> Self {
        AppError::Storage(StorageError::Cache(e))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Storage(StorageError::Database(e))
    }
}
