use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    db::error::DbResult,
    models::{LiveQueue, PendingSignature, PendingValidation},
};

/// Access to the live signature and validation queues.
#[async_trait]
pub trait SignatureQueueRepo: Send + Sync {
    /// Insert a signature into the pending queue.
    ///
    /// Ingestion normally happens upstream; this exists for seeding and tooling.
    async fn enqueue_signature(&self, signature: &PendingSignature) -> DbResult<()>;

    /// Insert a validation token into the validations queue.
    async fn enqueue_validation(&self, validation: &PendingValidation) -> DbResult<()>;

    // ==================== Archive Selection ====================

    /// Unprocessed signatures with no matching validation token, received
    /// before `received_before`, oldest first.
    async fn list_unprocessed_unmatched(
        &self,
        received_before: DateTime<Utc>,
        limit: u32,
    ) -> DbResult<Vec<PendingSignature>>;

    /// Processed signatures, oldest first. No age filter.
    async fn list_processed(&self, limit: u32) -> DbResult<Vec<PendingSignature>>;

    /// Validation tokens whose secret key is one of `secret_keys`.
    async fn list_validations_by_secret_keys(
        &self,
        secret_keys: &[String],
    ) -> DbResult<Vec<PendingValidation>>;

    /// Validation tokens with no matching signature whose validation window
    /// closed before `closed_before`.
    async fn list_orphaned_validations(
        &self,
        closed_before: DateTime<Utc>,
        limit: u32,
    ) -> DbResult<Vec<PendingValidation>>;

    // ==================== Pruning ====================

    /// Delete rows from `queue` whose id is in `ids`.
    ///
    /// Ids that no longer exist are ignored. Returns the number of rows removed.
    async fn delete_by_ids(&self, queue: LiveQueue, ids: &[Uuid]) -> DbResult<u64>;

    /// Number of rows currently in `queue`.
    async fn count(&self, queue: LiveQueue) -> DbResult<i64>;
}
