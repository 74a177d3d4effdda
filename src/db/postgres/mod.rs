mod archive;
mod common;
mod queue_status;
mod signature_queues;

pub use archive::PostgresArchiveRepo;
pub use queue_status::PostgresQueueStatusRepo;
pub use signature_queues::PostgresSignatureQueueRepo;
