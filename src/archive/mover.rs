//! Copies selected rows into the archive store.
//!
//! Each record is upserted on its own. A failed write is logged at critical
//! severity and the record is left out of the confirmed set; the remaining
//! records are still attempted.

use uuid::Uuid;

use crate::{
    archive::{ArchiveError, JobContext},
    db::{ArchiveContext, DbError},
    models::{ArchiveBatch, ArchiveTable},
    observability::metrics,
};

/// A record whose archive write failed.
#[derive(Debug)]
pub struct ArchiveFailure {
    pub id: Uuid,
    pub error: DbError,
}

/// Result of moving one batch.
#[derive(Debug)]
pub struct MoveOutcome {
    pub table: ArchiveTable,
    /// Ids now present in the archive table, in selection order.
    pub confirmed: Vec<Uuid>,
    pub failures: Vec<ArchiveFailure>,
}

impl MoveOutcome {
    pub fn archived(&self) -> u64 {
        self.confirmed.len() as u64
    }

    pub fn failed(&self) -> u64 {
        self.failures.len() as u64
    }
}

/// Upsert every record of `batch` through `ctx`.
///
/// Only the final row count of the destination table can fail the call;
/// per-record failures are returned in the outcome.
pub async fn move_to_archive(
    ctx: &ArchiveContext<'_>,
    batch: &ArchiveBatch,
    job: &JobContext,
) -> Result<MoveOutcome, ArchiveError> {
    let table = batch.table();
    let mut confirmed = Vec::with_capacity(batch.len());
    let mut failures = Vec::new();

    for record in batch.records() {
        let id = record.id();
        match ctx.repo().upsert(record).await {
            Ok(()) => confirmed.push(id),
            Err(error) => {
                tracing::error!(
                    severity = "critical",
                    table = %table,
                    record_id = %id,
                    error = %error,
                    "Failed to archive record"
                );
                metrics::record_archive_failure(table.table_name(), job);
                failures.push(ArchiveFailure { id, error });
            }
        }
    }

    let table_rows = ctx.repo().count(table).await?;
    metrics::set_archive_table_rows(table.table_name(), table_rows, job);

    if !confirmed.is_empty() {
        tracing::info!(
            table = %table,
            archived = confirmed.len(),
            failed = failures.len(),
            table_rows,
            "Archived records"
        );
        metrics::record_archive_moved(table.table_name(), confirmed.len() as u64, job);
    }

    Ok(MoveOutcome {
        table,
        confirmed,
        failures,
    })
}
