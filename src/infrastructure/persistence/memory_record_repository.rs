//! In-memory implementation of the durable tier.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use crate::domain::record::{Kind, RecordKey};
use crate::domain::repositories::{RecordRepository, RecordRow};
use crate::error::StorageError;

struct StoredRow {
    body: String,
    add_date: Option<chrono::NaiveDate>,
    sequence: u64,
}

/// Durable-tier stand-in that keeps records in process memory.
///
/// Follows the same semantics as [`super::PgRecordRepository`]: upserts
/// replace bodies, inserts-if-absent never overwrite, and keys-only queries
/// order by add date then insertion order, newest first.
#[derive(Default)]
pub struct MemoryRecordRepository {
    rows: RwLock<HashMap<RecordKey, StoredRow>>,
    sequence: AtomicU64,
}

impl MemoryRecordRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records of a kind.
    pub async fn count(&self, kind: Kind) -> usize {
        self.rows
            .read()
            .await
            .keys()
            .filter(|k| k.kind == kind)
            .count()
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }
}

#[async_trait]
impl RecordRepository for MemoryRecordRepository {
    async fn get(&self, key: &RecordKey) -> Result<Option<String>, StorageError> {
        Ok(self.rows.read().await.get(key).map(|row| row.body.clone()))
    }

    async fn upsert_many(&self, rows: Vec<RecordRow>) -> Result<Vec<RecordKey>, StorageError> {
        let mut stored = self.rows.write().await;
        for row in rows {
            let sequence = self.next_sequence();
            stored
                .entry(row.key)
                .and_modify(|existing| existing.body = row.body.clone())
                .or_insert(StoredRow {
                    body: row.body,
                    add_date: row.add_date,
                    sequence,
                });
        }
        Ok(Vec::new())
    }

    async fn insert_if_absent(&self, row: RecordRow) -> Result<bool, StorageError> {
        let mut stored = self.rows.write().await;
        if stored.contains_key(&row.key) {
            return Ok(false);
        }

        let sequence = self.next_sequence();
        stored.insert(
            row.key,
            StoredRow {
                body: row.body,
                add_date: row.add_date,
                sequence,
            },
        );
        Ok(true)
    }

    async fn recent_names(&self, kind: Kind, limit: i64) -> Result<Vec<String>, StorageError> {
        let stored = self.rows.read().await;
        let mut matching: Vec<(&RecordKey, &StoredRow)> =
            stored.iter().filter(|(k, _)| k.kind == kind).collect();

        // Newest add date first, undated rows last, ties broken by insertion order.
        matching.sort_by(|(_, a), (_, b)| {
            b.add_date
                .cmp(&a.add_date)
                .then_with(|| b.sequence.cmp(&a.sequence))
        });

        Ok(matching
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|(k, _)| k.name.clone())
            .collect())
    }

    async fn health_check(&self) -> bool {
        true
    }
}
