use thiserror::Error;

use crate::db::DbError;

/// Failures that abort an archive invocation.
///
/// Per-row archive write failures are not represented here; the mover
/// recovers from those and reports them in its outcome.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Store error: {0}")]
    Store(#[from] DbError),

    #[error("Invalid archive configuration: {0}")]
    Config(#[from] crate::config::ConfigError),
}
