//! Removes archived rows from the live queues.

use std::collections::HashSet;

use uuid::Uuid;

use crate::{
    archive::{ArchiveError, JobContext},
    config::OrphanDeletePolicy,
    db::SignatureQueueRepo,
    models::LiveQueue,
    observability::metrics,
};

/// Delete `ids` from `queue`. An empty set issues no statement.
///
/// Ids that are already gone are skipped by the store, so the returned count
/// can be lower than `ids.len()`.
pub async fn prune(
    repo: &dyn SignatureQueueRepo,
    queue: LiveQueue,
    ids: &[Uuid],
    job: &JobContext,
) -> Result<u64, ArchiveError> {
    if ids.is_empty() {
        return Ok(0);
    }

    let deleted = repo.delete_by_ids(queue, ids).await?;

    tracing::debug!(
        queue = %queue,
        requested = ids.len(),
        deleted,
        "Pruned live queue"
    );
    if deleted > 0 {
        metrics::record_live_deletions(queue.table_name(), deleted, job);
    }

    Ok(deleted)
}

/// Keys to delete after the orphaned stage has archived its batch.
pub fn orphan_deletion_set(
    policy: OrphanDeletePolicy,
    selected: &[Uuid],
    confirmed: &[Uuid],
) -> Vec<Uuid> {
    match policy {
        OrphanDeletePolicy::Selected => selected.to_vec(),
        OrphanDeletePolicy::Confirmed => {
            let confirmed: HashSet<&Uuid> = confirmed.iter().collect();
            selected
                .iter()
                .filter(|id| confirmed.contains(id))
                .copied()
                .collect()
        }
    }
}
