mod archive;
mod queue_status;
mod signature_queues;

pub use archive::*;
pub use queue_status::*;
pub use signature_queues::*;
