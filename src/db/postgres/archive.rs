use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::common::{SIGNATURE_COLUMNS, VALIDATION_COLUMNS};
use crate::{
    db::{error::DbResult, repos::ArchiveRepo},
    models::{ArchiveRecord, ArchiveTable, PendingSignature, PendingValidation},
};

pub struct PostgresArchiveRepo {
    write_pool: PgPool,
    read_pool: PgPool,
}

impl PostgresArchiveRepo {
    pub fn new(write_pool: PgPool, read_pool: Option<PgPool>) -> Self {
        let read_pool = read_pool.unwrap_or_else(|| write_pool.clone());
        Self {
            write_pool,
            read_pool,
        }
    }

    async fn upsert_signature(
        &self,
        table: ArchiveTable,
        signature: &PendingSignature,
    ) -> DbResult<()> {
        let query = format!(
            r#"
            INSERT INTO {table} ({SIGNATURE_COLUMNS}, archived_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            ON CONFLICT (id) DO UPDATE SET
                secret_key = EXCLUDED.secret_key,
                source = EXCLUDED.source,
                petition_id = EXCLUDED.petition_id,
                petition_close_at = EXCLUDED.petition_close_at,
                validation_close_at = EXCLUDED.validation_close_at,
                name = EXCLUDED.name,
                email = EXCLUDED.email,
                postcode = EXCLUDED.postcode,
                constituency_id = EXCLUDED.constituency_id,
                location_code = EXCLUDED.location_code,
                processed = EXCLUDED.processed,
                received_at = EXCLUDED.received_at,
                created_at = EXCLUDED.created_at,
                updated_at = EXCLUDED.updated_at,
                archived_at = EXCLUDED.archived_at
            "#,
            table = table.table_name(),
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
            .bind(Utc::now())
            .execute(&self.write_pool)
            .await?;

        Ok(())
    }

    async fn upsert_validation(
        &self,
        table: ArchiveTable,
        validation: &PendingValidation,
    ) -> DbResult<()> {
        let query = format!(
            r#"
            INSERT INTO {table} ({VALIDATION_COLUMNS}, archived_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                secret_key = EXCLUDED.secret_key,
                validation_close_at = EXCLUDED.validation_close_at,
                received_at = EXCLUDED.received_at,
                created_at = EXCLUDED.created_at,
                archived_at = EXCLUDED.archived_at
            "#,
            table = table.table_name(),
        );

        sqlx::query(&query)
            .bind(validation.id)
            .bind(&validation.secret_key)
            .bind(validation.validation_close_at)
            .bind(validation.received_at)
            .bind(validation.created_at)
            .bind(Utc::now())
            .execute(&self.write_pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl ArchiveRepo for PostgresArchiveRepo {
    async fn upsert(&self, record: &ArchiveRecord) -> DbResult<()> {
        match record {
            ArchiveRecord::NotValidatedSignature(s) | ArchiveRecord::ProcessedSignature(s) => {
                self.upsert_signature(record.table(), s).await
            }
            ArchiveRecord::ProcessedValidation(v) | ArchiveRecord::OrphanedValidation(v) => {
                self.upsert_validation(record.table(), v).await
            }
        }
    }

    async fn count(&self, table: ArchiveTable) -> DbResult<i64> {
        let query = format!("SELECT COUNT(*) AS count FROM {}", table.table_name());
        let row = sqlx::query(&query).fetch_one(&self.read_pool).await?;
        Ok(row.get("count"))
    }

    async fn contains(&self, table: ArchiveTable, id: Uuid) -> DbResult<bool> {
        let query = format!("SELECT 1 FROM {} WHERE id = $1", table.table_name());
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.write_pool)
            .await?;
        Ok(row.is_some())
    }
}
