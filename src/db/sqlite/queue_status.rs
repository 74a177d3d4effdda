use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::db::{error::DbResult, repos::QueueStatusRepo};

pub struct SqliteQueueStatusRepo {
    pool: SqlitePool,
}

impl SqliteQueueStatusRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueueStatusRepo for SqliteQueueStatusRepo {
    async fn last_emptied(&self, queue: &str) -> DbResult<Option<DateTime<Utc>>> {
        let row = sqlx::query("SELECT last_emptied_at FROM queue_status WHERE queue_name = ?")
            .bind(queue)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.get("last_emptied_at")))
    }

    async fn record_emptied(&self, queue: &str, at: DateTime<Utc>) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO queue_status (queue_name, last_emptied_at)
            VALUES (?, ?)
            ON CONFLICT (queue_name) DO UPDATE SET last_emptied_at = excluded.last_emptied_at
            "#,
        )
        .bind(queue)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
