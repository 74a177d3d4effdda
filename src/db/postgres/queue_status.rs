use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use crate::db::{error::DbResult, repos::QueueStatusRepo};

pub struct PostgresQueueStatusRepo {
    write_pool: PgPool,
    read_pool: PgPool,
}

impl PostgresQueueStatusRepo {
    pub fn new(write_pool: PgPool, read_pool: Option<PgPool>) -> Self {
        let read_pool = read_pool.unwrap_or_else(|| write_pool.clone());
        Self {
            write_pool,
            read_pool,
        }
    }
}

#[async_trait]
impl QueueStatusRepo for PostgresQueueStatusRepo {
    async fn last_emptied(&self, queue: &str) -> DbResult<Option<DateTime<Utc>>> {
        let row = sqlx::query("SELECT last_emptied_at FROM queue_status WHERE queue_name = $1")
            .bind(queue)
            .fetch_optional(&self.read_pool)
            .await?;

        Ok(row.map(|r| r.get("last_emptied_at")))
    }

    async fn record_emptied(&self, queue: &str, at: DateTime<Utc>) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO queue_status (queue_name, last_emptied_at)
            VALUES ($1, $2)
            ON CONFLICT (queue_name) DO UPDATE SET last_emptied_at = EXCLUDED.last_emptied_at
            "#,
        )
        .bind(queue)
        .bind(at)
        .execute(&self.write_pool)
        .await?;

        Ok(())
    }
}
