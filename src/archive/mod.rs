//! Archive-then-prune pipeline for the signature validation queues.
//!
//! One invocation runs three stages in order, each bounded by the configured
//! batch size:
//!
//! 1. **Pending**: unprocessed signatures with no validation token, older
//!    than the minimum signature lifetime, go to the not-validated archive.
//! 2. **Processed**: processed signatures (any age) and their validation
//!    tokens go to the processed archives.
//! 3. **Orphaned**: validation tokens with no signature whose validation
//!    window has closed go to the orphaned archive.
//!
//! Every stage copies rows into the archive store first and only then deletes
//! them from the live store. A row whose archive write fails is left in the
//! live queue for the next run.

mod error;
mod job;
pub mod mover;
pub mod policy;
pub mod pruner;
pub mod selector;
mod worker;

pub use error::ArchiveError;
pub use job::{JobContext, JobStatus};
pub use policy::{ArchivePolicy, ArchiveStage, last_fully_emptied, query_last_fully_emptied};
pub use worker::{
    ArchiveRunReport, StageReport, run_archive, run_archive_job, start_archive_worker,
};
