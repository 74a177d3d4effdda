use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::common::{
    SIGNATURE_COLUMNS, VALIDATION_COLUMNS, signature_from_row, validation_from_row,
};
use crate::{
    db::{error::DbResult, repos::SignatureQueueRepo},
    models::{LiveQueue, PendingSignature, PendingValidation},
};

pub struct PostgresSignatureQueueRepo {
    write_pool: PgPool,
    read_pool: PgPool,
}

impl PostgresSignatureQueueRepo {
    pub fn new(write_pool: PgPool, read_pool: Option<PgPool>) -> Self {
        let read_pool = read_pool.unwrap_or_else(|| write_pool.clone());
        Self {
            write_pool,
            read_pool,
        }
    }
}

// Selection reads go to the write pool: a lagging replica could hand back rows
// that were already archived and pruned.
#[async_trait]
impl SignatureQueueRepo for PostgresSignatureQueueRepo {
    async fn enqueue_signature(&self, signature: &PendingSignature) -> DbResult<()> {
        let query = format!(
            "INSERT INTO signatures_pending ({SIGNATURE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)"
        );

        sqlx::query(&query)
            .bind(signature.id)
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
            .execute(&self.write_pool)
            .await?;

        Ok(())
    }

    async fn enqueue_validation(&self, validation: &PendingValidation) -> DbResult<()> {
        let query = format!(
            "INSERT INTO validations_pending ({VALIDATION_COLUMNS}) VALUES ($1, $2, $3, $4, $5)"
        );

        sqlx::query(&query)
            .bind(validation.id)
            .bind(&validation.secret_key)
            .bind(validation.validation_close_at)
            .bind(validation.received_at)
            .bind(validation.created_at)
            .execute(&self.write_pool)
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
            WHERE s.processed = FALSE
              AND v.id IS NULL
              AND s.received_at < $1
            ORDER BY s.received_at ASC
            LIMIT $2
            "#,
        )
        .bind(received_before)
        .bind(limit as i64)
        .fetch_all(&self.write_pool)
        .await?;

        Ok(rows.iter().map(signature_from_row).collect())
    }

    async fn list_processed(&self, limit: u32) -> DbResult<Vec<PendingSignature>> {
        let query = format!(
            "SELECT {SIGNATURE_COLUMNS} FROM signatures_pending \
             WHERE processed = TRUE ORDER BY received_at ASC LIMIT $1"
        );

        let rows = sqlx::query(&query)
            .bind(limit as i64)
            .fetch_all(&self.write_pool)
            .await?;

        Ok(rows.iter().map(signature_from_row).collect())
    }

    async fn list_validations_by_secret_keys(
        &self,
        secret_keys: &[String],
    ) -> DbResult<Vec<PendingValidation>> {
        if secret_keys.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!(
            "SELECT {VALIDATION_COLUMNS} FROM validations_pending WHERE secret_key = ANY($1)"
        );

        let rows = sqlx::query(&query)
            .bind(secret_keys)
            .fetch_all(&self.write_pool)
            .await?;

        Ok(rows.iter().map(validation_from_row).collect())
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
              AND v.validation_close_at < $1
            ORDER BY v.validation_close_at ASC
            LIMIT $2
            "#,
        )
        .bind(closed_before)
        .bind(limit as i64)
        .fetch_all(&self.write_pool)
        .await?;

        Ok(rows.iter().map(validation_from_row).collect())
    }

    async fn delete_by_ids(&self, queue: LiveQueue, ids: &[Uuid]) -> DbResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let query = format!("DELETE FROM {} WHERE id = ANY($1)", queue.table_name());
        let result = sqlx::query(&query)
            .bind(ids)
            .execute(&self.write_pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn count(&self, queue: LiveQueue) -> DbResult<i64> {
        let query = format!("SELECT COUNT(*) AS count FROM {}", queue.table_name());
        let row = sqlx::query(&query).fetch_one(&self.read_pool).await?;
        Ok(row.get("count"))
    }
}
