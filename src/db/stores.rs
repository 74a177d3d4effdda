//! The pair of stores the pipeline moves rows between.
//!
//! Reads and deletes go to the live store directly. Archive writes go through
//! an [`ArchiveContext`], a scoped handle that must be acquired before writing
//! and is released when dropped. Only one context per [`Stores`] can be open at
//! a time.

use std::{sync::Arc, time::Instant};

use tokio::sync::{Mutex, MutexGuard};

use super::{ArchiveRepo, DbPool, QueueStatusRepo, SignatureQueueRepo};

pub struct Stores {
    live: Arc<DbPool>,
    archive: Arc<DbPool>,
    archive_session: Mutex<()>,
}

impl Stores {
    pub fn new(live: Arc<DbPool>, archive: Arc<DbPool>) -> Self {
        Self {
            live,
            archive,
            archive_session: Mutex::new(()),
        }
    }

    pub fn live(&self) -> &Arc<DbPool> {
        &self.live
    }

    pub fn archive(&self) -> &Arc<DbPool> {
        &self.archive
    }

    /// Live signature and validation queues.
    pub fn signature_queues(&self) -> Arc<dyn SignatureQueueRepo> {
        self.live.signature_queues()
    }

    /// Upstream queue drain timestamps, kept in the live store.
    pub fn queue_status(&self) -> Arc<dyn QueueStatusRepo> {
        self.live.queue_status()
    }

    /// Open the archive store for writing.
    ///
    /// Waits while another context on the same `Stores` is open. The returned
    /// guard releases the session on drop, on both the success and error paths.
    pub async fn archive_context(&self) -> ArchiveContext<'_> {
        let session = self.archive_session.lock().await;
        tracing::trace!("Archive store context acquired");
        ArchiveContext {
            repo: self.archive.archive(),
            opened_at: Instant::now(),
            _session: session,
        }
    }

    /// Whether an archive context is currently open.
    pub fn archive_context_open(&self) -> bool {
        self.archive_session.try_lock().is_err()
    }
}

/// Scoped write access to the archive store.
pub struct ArchiveContext<'a> {
    repo: Arc<dyn ArchiveRepo>,
    opened_at: Instant,
    _session: MutexGuard<'a, ()>,
}

impl ArchiveContext<'_> {
    pub fn repo(&self) -> &dyn ArchiveRepo {
        self.repo.as_ref()
    }
}

impl Drop for ArchiveContext<'_> {
    fn drop(&mut self) {
        tracing::trace!(
            held_ms = self.opened_at.elapsed().as_millis() as u64,
            "Archive store context released"
        );
    }
}
