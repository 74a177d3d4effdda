use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::db::error::DbResult;

/// Drain timestamps for the upstream queues.
#[async_trait]
pub trait QueueStatusRepo: Send + Sync {
    /// When `queue` was last fully emptied, if ever.
    async fn last_emptied(&self, queue: &str) -> DbResult<Option<DateTime<Utc>>>;

    /// Record that `queue` was fully emptied at `at`.
    async fn record_emptied(&self, queue: &str, at: DateTime<Utc>) -> DbResult<()>;
}
