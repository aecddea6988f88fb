//! Repository trait for the durable storage tier.

use crate::domain::record::{Kind, RecordKey};
use crate::error::StorageError;
use async_trait::async_trait;
use chrono::NaiveDate;

/// A serialized record as stored on the durable tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRow {
    pub key: RecordKey,
    pub body: String,
    pub add_date: Option<NaiveDate>,
}

/// Repository interface for durable records.
///
/// Records are opaque JSON bodies addressed by `(kind, name)`.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgRecordRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemoryRecordRepository`] - In-memory implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Loads the body of a record.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(body))` if the record exists
    /// - `Ok(None)` if not found
    async fn get(&self, key: &RecordKey) -> Result<Option<String>, StorageError>;

    /// Inserts or replaces a batch of records.
    ///
    /// Entries are written independently; the batch is not atomic. Returns the
    /// keys that failed so callers can retry them individually.
    async fn upsert_many(&self, rows: Vec<RecordRow>) -> Result<Vec<RecordKey>, StorageError>;

    /// Inserts a record unless one with the same key already exists.
    ///
    /// # Returns
    ///
    /// `Ok(true)` if this call created the record, `Ok(false)` if it already existed.
    async fn insert_if_absent(&self, row: RecordRow) -> Result<bool, StorageError>;

    /// Returns the names of the most recently added records of a kind,
    /// ordered by add date descending.
    async fn recent_names(&self, kind: Kind, limit: i64) -> Result<Vec<String>, StorageError>;

    /// Checks if the durable backend is reachable.
    async fn health_check(&self) -> bool;
}
