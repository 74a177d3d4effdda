//! Batched archive-then-prune pipeline for signature validation queues.
//!
//! Rows are copied from a live store into an archive store and removed from
//! the live store only once the copy is confirmed. See [`archive`] for the
//! stages and [`archive::run_archive_job`] for the scheduler entry point.

pub mod archive;
pub mod config;
pub mod db;
pub mod models;
pub mod observability;

pub use archive::{ArchiveError, ArchiveRunReport, JobContext, JobStatus, run_archive_job};
pub use config::ArchiverConfig;
pub use db::{ArchiveContext, DbPool, StoreRole, Stores};
