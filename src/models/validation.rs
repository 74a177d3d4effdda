use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A validation token waiting in the validations queue.
///
/// A token whose `secret_key` has no matching [`PendingSignature`](super::PendingSignature)
/// is orphaned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingValidation {
    pub id: Uuid,
    pub secret_key: String,
    pub validation_close_at: DateTime<Utc>,
    pub received_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
