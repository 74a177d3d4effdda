mod archive;
mod common;
mod queue_status;
mod signature_queues;

pub use archive::SqliteArchiveRepo;
pub use queue_status::SqliteQueueStatusRepo;
pub use signature_queues::SqliteSignatureQueueRepo;
