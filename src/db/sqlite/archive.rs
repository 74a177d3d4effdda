use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::common::{SIGNATURE_COLUMNS, VALIDATION_COLUMNS};
use crate::{
    db::{error::DbResult, repos::ArchiveRepo},
    models::{ArchiveRecord, ArchiveTable, PendingSignature, PendingValidation},
};

pub struct SqliteArchiveRepo {
    pool: SqlitePool,
}

impl SqliteArchiveRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn upsert_signature(
        &self,
        table: ArchiveTable,
        signature: &PendingSignature,
    ) -> DbResult<()> {
        // Re-archiving the same id overwrites the earlier copy
        let query = format!(
            r#"
            INSERT INTO {table} ({SIGNATURE_COLUMNS}, archived_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                secret_key = excluded.secret_key,
                source = excluded.source,
                petition_id = excluded.petition_id,
                petition_close_at = excluded.petition_close_at,
                validation_close_at = excluded.validation_close_at,
                name = excluded.name,
                email = excluded.email,
                postcode = excluded.postcode,
                constituency_id = excluded.constituency_id,
                location_code = excluded.location_code,
                processed = excluded.processed,
                received_at = excluded.received_at,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at,
                archived_at = excluded.archived_at
            "#,
            table = table.table_name(),
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
            .bind(Utc::now())
            .execute(&self.pool)
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
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                secret_key = excluded.secret_key,
                validation_close_at = excluded.validation_close_at,
                received_at = excluded.received_at,
                created_at = excluded.created_at,
                archived_at = excluded.archived_at
            "#,
            table = table.table_name(),
        );

        sqlx::query(&query)
            .bind(validation.id.to_string())
            .bind(&validation.secret_key)
            .bind(validation.validation_close_at)
            .bind(validation.received_at)
            .bind(validation.created_at)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl ArchiveRepo for SqliteArchiveRepo {
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
        let row = sqlx::query(&query).fetch_one(&self.pool).await?;
        Ok(row.get("count"))
    }

    async fn contains(&self, table: ArchiveTable, id: Uuid) -> DbResult<bool> {
        let query = format!("SELECT 1 FROM {} WHERE id = ?", table.table_name());
        let row = sqlx::query(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }
}
