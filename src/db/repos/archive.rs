use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    db::error::DbResult,
    models::{ArchiveRecord, ArchiveTable},
};

/// Write access to the archive store.
#[async_trait]
pub trait ArchiveRepo: Send + Sync {
    /// Insert the record into its archive table, replacing any row with the
    /// same id.
    async fn upsert(&self, record: &ArchiveRecord) -> DbResult<()>;

    /// Total number of rows in `table`.
    async fn count(&self, table: ArchiveTable) -> DbResult<i64>;

    /// Whether a row with `id` exists in `table`.
    async fn contains(&self, table: ArchiveTable, id: Uuid) -> DbResult<bool>;
}
