//! Orchestrates the pending, processed and orphaned stages.
//!
//! [`run_archive`] performs a single pass and reports what it did;
//! [`run_archive_job`] wraps it for a scheduler, mapping the result to a
//! status code; [`start_archive_worker`] repeats the job on an interval.

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use tracing::Instrument;

use crate::{
    archive::{
        ArchiveError, JobContext, JobStatus,
        mover::{self, MoveOutcome},
        policy::{ArchivePolicy, ArchiveStage},
        pruner, selector,
    },
    config::ArchiveConfig,
    db::{SignatureQueueRepo, Stores},
    models::{ArchiveBatch, LiveQueue},
    observability::metrics,
};

/// Counts for one archive table within a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StageReport {
    /// Rows returned by selection.
    pub selected: u64,
    /// Rows confirmed in the archive store.
    pub archived: u64,
    /// Rows whose archive write failed.
    pub failed: u64,
    /// Rows removed from the live queue.
    pub deleted: u64,
}

impl StageReport {
    fn new(batch: &ArchiveBatch, outcome: &MoveOutcome, deleted: u64) -> Self {
        Self {
            selected: batch.len() as u64,
            archived: outcome.archived(),
            failed: outcome.failed(),
            deleted,
        }
    }
}

/// Results from a single archive run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ArchiveRunReport {
    /// Unprocessed signatures that never got a validation token.
    pub not_validated: StageReport,
    pub processed_signatures: StageReport,
    pub processed_validations: StageReport,
    pub orphaned_validations: StageReport,
}

impl ArchiveRunReport {
    fn stages(&self) -> [&StageReport; 4] {
        [
            &self.not_validated,
            &self.processed_signatures,
            &self.processed_validations,
            &self.orphaned_validations,
        ]
    }

    pub fn total_archived(&self) -> u64 {
        self.stages().iter().map(|s| s.archived).sum()
    }

    pub fn total_failed(&self) -> u64 {
        self.stages().iter().map(|s| s.failed).sum()
    }

    pub fn total_deleted(&self) -> u64 {
        self.stages().iter().map(|s| s.deleted).sum()
    }

    /// Check if the run moved or deleted anything.
    pub fn has_activity(&self) -> bool {
        self.total_archived() > 0 || self.total_deleted() > 0
    }
}

/// Run all three stages once against the clock reading `now`.
///
/// Per-row archive failures are counted in the report and never abort the
/// run. Any store failure during selection, counting or deletion does.
pub async fn run_archive(
    stores: &Stores,
    config: &ArchiveConfig,
    job: &JobContext,
    now: DateTime<Utc>,
) -> Result<ArchiveRunReport, ArchiveError> {
    config.validate_batching()?;

    let policy = ArchivePolicy::new(config, now);
    let queues = stores.signature_queues();
    let mut report = ArchiveRunReport::default();

    if policy.allows(ArchiveStage::Pending) {
        report.not_validated = archive_pending(stores, queues.as_ref(), &policy, job).await?;
    }

    if policy.allows(ArchiveStage::Processed) {
        let (signatures, validations) =
            archive_processed(stores, queues.as_ref(), &policy, job).await?;
        report.processed_signatures = signatures;
        report.processed_validations = validations;
    }

    if policy.allows(ArchiveStage::Orphaned) {
        report.orphaned_validations =
            archive_orphaned(stores, queues.as_ref(), &policy, job).await?;
    }

    Ok(report)
}

async fn archive_pending(
    stores: &Stores,
    queues: &dyn SignatureQueueRepo,
    policy: &ArchivePolicy,
    job: &JobContext,
) -> Result<StageReport, ArchiveError> {
    let batch = selector::select_pending(queues, policy).await?;
    if batch.is_empty() {
        return Ok(StageReport::default());
    }

    let outcome = {
        let ctx = stores.archive_context().await;
        mover::move_to_archive(&ctx, &batch, job).await?
    };

    let deleted = pruner::prune(queues, LiveQueue::Signatures, &outcome.confirmed, job).await?;
    Ok(StageReport::new(&batch, &outcome, deleted))
}

async fn archive_processed(
    stores: &Stores,
    queues: &dyn SignatureQueueRepo,
    policy: &ArchivePolicy,
    job: &JobContext,
) -> Result<(StageReport, StageReport), ArchiveError> {
    let selection = selector::select_processed(queues, policy).await?;
    if selection.is_empty() {
        return Ok(Default::default());
    }

    let (signatures, validations) = {
        let ctx = stores.archive_context().await;
        let signatures = mover::move_to_archive(&ctx, &selection.signatures, job).await?;
        let validations = mover::move_to_archive(&ctx, &selection.validations, job).await?;
        (signatures, validations)
    };

    // Each table's confirmed set gates only its own deletions
    let signatures_deleted =
        pruner::prune(queues, LiveQueue::Signatures, &signatures.confirmed, job).await?;
    let validations_deleted =
        pruner::prune(queues, LiveQueue::Validations, &validations.confirmed, job).await?;

    Ok((
        StageReport::new(&selection.signatures, &signatures, signatures_deleted),
        StageReport::new(&selection.validations, &validations, validations_deleted),
    ))
}

async fn archive_orphaned(
    stores: &Stores,
    queues: &dyn SignatureQueueRepo,
    policy: &ArchivePolicy,
    job: &JobContext,
) -> Result<StageReport, ArchiveError> {
    let batch = selector::select_orphaned(queues, policy).await?;
    if batch.is_empty() {
        return Ok(StageReport::default());
    }

    let outcome = {
        let ctx = stores.archive_context().await;
        mover::move_to_archive(&ctx, &batch, job).await?
    };

    let to_delete =
        pruner::orphan_deletion_set(policy.orphan_delete_policy(), &batch.ids(), &outcome.confirmed);
    let deleted = pruner::prune(queues, LiveQueue::Validations, &to_delete, job).await?;
    Ok(StageReport::new(&batch, &outcome, deleted))
}

/// Entry point for a scheduler.
///
/// Runs one pass inside the job's tracing span and returns `0` on success or
/// `1` if a stage hit a fatal store error. `options` is accepted for
/// scheduler compatibility and currently ignored.
pub async fn run_archive_job(
    stores: &Stores,
    config: &ArchiveConfig,
    job: &JobContext,
    options: &HashMap<String, String>,
) -> i32 {
    if !options.is_empty() {
        tracing::debug!(options = ?options, "Ignoring job options");
    }

    let status = async {
        match run_archive(stores, config, job, Utc::now()).await {
            Ok(report) => {
                if report.has_activity() || report.total_failed() > 0 {
                    tracing::info!(
                        not_validated = report.not_validated.archived,
                        processed_signatures = report.processed_signatures.archived,
                        processed_validations = report.processed_validations.archived,
                        orphaned_validations = report.orphaned_validations.archived,
                        failed = report.total_failed(),
                        deleted = report.total_deleted(),
                        "Archive run complete"
                    );
                } else {
                    tracing::debug!("Archive run complete, nothing to archive");
                }
                JobStatus::Ok
            }
            Err(e) => {
                tracing::error!(severity = "alert", error = %e, "Archive run failed");
                JobStatus::Error
            }
        }
    }
    .instrument(job.span())
    .await;

    metrics::record_archive_run(status.as_str(), job);
    status.code()
}

/// Starts the archive worker loop.
///
/// Runs [`run_archive_job`] every `interval_secs` until the task is cancelled.
/// A failed run is logged and retried on the next tick.
pub async fn start_archive_worker(stores: Arc<Stores>, config: ArchiveConfig, job: JobContext) {
    if !config.enabled {
        tracing::info!("Archive worker disabled by configuration");
        return;
    }

    if let Err(e) = config.validate() {
        tracing::error!(severity = "alert", error = %e, "Archive worker not started");
        return;
    }

    tracing::info!(
        interval_secs = config.interval_secs,
        batch_size = config.batch_size,
        minimum_signature_lifetime_days = config.minimum_signature_lifetime_days,
        orphan_delete_policy = %config.orphan_delete_policy,
        "Starting archive worker"
    );

    let interval = config.interval();
    let options = HashMap::new();

    loop {
        run_archive_job(&stores, &config, &job, &options).await;
        tokio::time::sleep(interval).await;
    }
}
