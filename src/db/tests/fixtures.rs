//! Row builders shared by the repository and pipeline tests.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use uuid::Uuid;

use crate::models::{PendingSignature, PendingValidation};

/// A signature received `age` ago with the given secret key.
pub fn signature(secret_key: &str, age: Duration, processed: bool) -> PendingSignature {
    signature_at(secret_key, Utc::now() - age, processed)
}

pub fn signature_at(
    secret_key: &str,
    received_at: DateTime<Utc>,
    processed: bool,
) -> PendingSignature {
    // Postgres keeps microseconds
    let received_at = received_at.trunc_subsecs(6);
    PendingSignature {
        id: Uuid::new_v4(),
        secret_key: secret_key.to_string(),
        source: "web".to_string(),
        petition_id: 1234,
        petition_close_at: Some(received_at + Duration::days(180)),
        validation_close_at: received_at + Duration::days(7),
        name: "Ada Lovelace".to_string(),
        email: format!("{secret_key}@example.org"),
        postcode: Some("SW1A 1AA".to_string()),
        constituency_id: Some("3415".to_string()),
        location_code: Some("GB".to_string()),
        processed,
        received_at,
        created_at: received_at,
        updated_at: received_at,
    }
}

/// A validation token whose validation window closes at `closes_at`.
pub fn validation(secret_key: &str, closes_at: DateTime<Utc>) -> PendingValidation {
    let closes_at = closes_at.trunc_subsecs(6);
    let received_at = closes_at - Duration::days(7);
    PendingValidation {
        id: Uuid::new_v4(),
        secret_key: secret_key.to_string(),
        validation_close_at: closes_at,
        received_at,
        created_at: received_at,
    }
}
