use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A signature waiting in the pending-validation queue.
///
/// Rows are written by upstream ingestion; this crate only reads them,
/// copies them to the archive store and removes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSignature {
    /// Unique row identifier, also the archive key
    pub id: Uuid,
    /// Secret validation key shared with the matching validation token
    pub secret_key: String,
    /// Where the signature was submitted from (e.g. "web", "api")
    pub source: String,
    pub petition_id: i64,
    /// When the petition closes for signing, if it has a close date yet
    pub petition_close_at: Option<DateTime<Utc>>,
    /// After this instant the validation token can no longer be redeemed
    pub validation_close_at: DateTime<Utc>,
    pub name: String,
    pub email: String,
    pub postcode: Option<String>,
    pub constituency_id: Option<String>,
    pub location_code: Option<String>,
    /// Set by the validation stage once the signature has been handled
    pub processed: bool,
    pub received_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
