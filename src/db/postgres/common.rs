use sqlx::{Row, postgres::PgRow};

use crate::models::{PendingSignature, PendingValidation};

pub const SIGNATURE_COLUMNS: &str = "id, secret_key, source, petition_id, petition_close_at, \
     validation_close_at, name, email, postcode, constituency_id, location_code, processed, \
     received_at, created_at, updated_at";

pub const VALIDATION_COLUMNS: &str =
    "id, secret_key, validation_close_at, received_at, created_at";

pub fn signature_from_row(row: &PgRow) -> PendingSignature {
    PendingSignature {
        id: row.get("id"),
        secret_key: row.get("secret_key"),
        source: row.get("source"),
        petition_id: row.get("petition_id"),
        petition_close_at: row.get("petition_close_at"),
        validation_close_at: row.get("validation_close_at"),
        name: row.get("name"),
        email: row.get("email"),
        postcode: row.get("postcode"),
        constituency_id: row.get("constituency_id"),
        location_code: row.get("location_code"),
        processed: row.get("processed"),
        received_at: row.get("received_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub fn validation_from_row(row: &PgRow) -> PendingValidation {
    PendingValidation {
        id: row.get("id"),
        secret_key: row.get("secret_key"),
        validation_close_at: row.get("validation_close_at"),
        received_at: row.get("received_at"),
        created_at: row.get("created_at"),
    }
}
