use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::common::{
    MAX_IDS_PER_STATEMENT, SIGNATURE_COLUMNS, VALIDATION_COLUMNS, placeholders,
    signature_from_row, validation_from_row,
};
use crate::{
    db::{error::DbResult, repos::SignatureQueueRepo},
    models::{LiveQueue, PendingSignature, PendingValidation},
};

pub struct SqliteSignatureQueueRepo {
    pool: SqlitePool,
}

impl SqliteSignatureQueueRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SignatureQueueRepo for SqliteSignatureQueueRepo {
    async fn enqueue_signature(&self, signature: &PendingSignature) -> DbResult<()> {
        let query = format!(
            "INSERT INTO signatures_pending ({SIGNATURE_COLUMNS}) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        );

        sqlx::query(&query)
            .bind(signature.id.to_string())
            .bind(&signature.secret_key)
            .bind(&signature.source)
            .bind(signature.petition_id)
            .bind(signature.petition_close_at)
            .bind(signature.validation_close_at)
            .bind(&signature.name)
            .bind(&signature.email)
            .bind(&signature.postcode)
            .bind(&signature.constituency_id)
            .bind(&signature.location_code)
            .bind(signature.processed)
            .bind(signature.received_at)
            .bind(signature.created_at)
            .bind(signature.updated_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn enqueue_validation(&self, validation: &PendingValidation) -> DbResult<()> {
        let query =
            format!("INSERT INTO validations_pending ({VALIDATION_COLUMNS}) VALUES (?, ?, ?, ?, ?)");

        sqlx::query(&query)
            .bind(validation.id.to_string())
            .bind(&validation.secret_key)
            .bind(validation.validation_close_at)
            .bind(validation.received_at)
            .bind(validation.created_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_unprocessed_unmatched(
        &self,
        received_before: DateTime<Utc>,
        limit: u32,
    ) -> DbResult<Vec<PendingSignature>> {
        let rows = sqlx::query(
            r#"
            SELECT s.id, s.secret_key, s.source, s.petition_id, s.petition_close_at,
                   s.validation_close_at, s.name, s.email, s.postcode, s.constituency_id,
                   s.location_code, s.processed, s.received_at, s.created_at, s.updated_at
            FROM signatures_pending s
            LEFT JOIN validations_pending v ON v.secret_key = s.secret_key
            WHERE s.processed = 0
              AND v.id IS NULL
              AND s.received_at < ?
            ORDER BY s.received_at ASC
            LIMIT ?
            "#,
        )
        .bind(received_before)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(signature_from_row).collect()
    }

    async fn list_processed(&self, limit: u32) -> DbResult<Vec<PendingSignature>> {
        let query = format!(
            "SELECT {SIGNATURE_COLUMNS} FROM signatures_pending \
             WHERE processed = 1 ORDER BY received_at ASC LIMIT ?"
        );

        let rows = sqlx::query(&query)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(signature_from_row).collect()
    }

    async fn list_validations_by_secret_keys(
        &self,
        secret_keys: &[String],
    ) -> DbResult<Vec<PendingValidation>> {
        let mut validations = Vec::new();

        for chunk in secret_keys.chunks(MAX_IDS_PER_STATEMENT) {
            let query = format!(
                "SELECT {VALIDATION_COLUMNS} FROM validations_pending WHERE secret_key IN ({})",
                placeholders(chunk.len())
            );

            let mut query_builder = sqlx::query(&query);
            for key in chunk {
                query_builder = query_builder.bind(key);
            }

            let rows = query_builder.fetch_all(&self.pool).await?;
            for row in &rows {
                validations.push(validation_from_row(row)?);
            }
        }

        Ok(validations)
    }

    async fn list_orphaned_validations(
        &self,
        closed_before: DateTime<Utc>,
        limit: u32,
    ) -> DbResult<Vec<PendingValidation>> {
        let rows = sqlx::query(
            r#"
            SELECT v.id, v.secret_key, v.validation_close_at, v.received_at, v.created_at
            FROM validations_pending v
            LEFT JOIN signatures_pending s ON s.secret_key = v.secret_key
            WHERE s.id IS NULL
              AND v.validation_close_at < ?
            ORDER BY v.validation_close_at ASC
            LIMIT ?
            "#,
        )
        .bind(closed_before)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(validation_from_row).collect()
    }

    async fn delete_by_ids(&self, queue: LiveQueue, ids: &[Uuid]) -> DbResult<u64> {
        let mut total_deleted: u64 = 0;

        for chunk in ids.chunks(MAX_IDS_PER_STATEMENT) {
            let query = format!(
                "DELETE FROM {} WHERE id IN ({})",
                queue.table_name(),
                placeholders(chunk.len())
            );

            let mut query_builder = sqlx::query(&query);
            for id in chunk {
                query_builder = query_builder.bind(id.to_string());
            }

            let result = query_builder.execute(&self.pool).await?;
            total_deleted += result.rows_affected();
        }

        Ok(total_deleted)
    }

    async fn count(&self, queue: LiveQueue) -> DbResult<i64> {
        let query = format!("SELECT COUNT(*) AS count FROM {}", queue.table_name());
        let row = sqlx::query(&query).fetch_one(&self.pool).await?;
        Ok(row.get("count"))
    }
}
