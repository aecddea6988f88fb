//! PostgreSQL implementation of the durable tier.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::warn;

use crate::domain::record::{Kind, RecordKey};
use crate::domain::repositories::{RecordRepository, RecordRow};
use crate::error::StorageError;

/// PostgreSQL repository storing every record kind in a single `records` table.
///
/// Bodies are stored as JSONB; `add_date` is kept in its own column so
/// keys-only queries can order by it.
pub struct PgRecordRepository {
    pool: Arc<PgPool>,
}

impl PgRecordRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    async fn upsert(&self, row: &RecordRow) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO records (kind, name, body, add_date)
            VALUES ($1, $2, $3::jsonb, $4)
            ON CONFLICT (kind, name)
            DO UPDATE SET body = EXCLUDED.body, updated_at = NOW()
            "#,
        )
        .bind(row.key.kind.as_str())
        .bind(&row.key.name)
        .bind(&row.body)
        .bind(row.add_date)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }
}

#[async_trait]
impl RecordRepository for PgRecordRepository {
    async fn get(&self, key: &RecordKey) -> Result<Option<String>, StorageError> {
        let body = sqlx::query_scalar::<_, String>(
            r#"
            SELECT body::text
            FROM records
            WHERE kind = $1 AND name = $2
            "#,
        )
        .bind(key.kind.as_str())
        .bind(&key.name)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(body)
    }

    async fn upsert_many(&self, rows: Vec<RecordRow>) -> Result<Vec<RecordKey>, StorageError> {
        let mut failed = Vec::new();

        for row in rows {
            if let Err(e) = self.upsert(&row).await {
                warn!(key = %row.key, error = %e, "durable write failed");
                failed.push(row.key);
            }
        }

        Ok(failed)
    }

    async fn insert_if_absent(&self, row: RecordRow) -> Result<bool, StorageError> {
        let result = sqlx::query(
            r#"
            INSERT INTO records (kind, name, body, add_date)
            VALUES ($1, $2, $3::jsonb, $4)
            ON CONFLICT (kind, name) DO NOTHING
            "#,
        )
        .bind(row.key.kind.as_str())
        .bind(&row.key.name)
        .bind(&row.body)
        .bind(row.add_date)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn recent_names(&self, kind: Kind, limit: i64) -> Result<Vec<String>, StorageError> {
        let names = sqlx::query_scalar::<_, String>(
            r#"
            SELECT name
            FROM records
            WHERE kind = $1
            ORDER BY add_date DESC NULLS LAST, created_at DESC
            LIMIT $2
            "#,
        )
        .bind(kind.as_str())
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(names)
    }

    async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await
            .is_ok()
    }
}
