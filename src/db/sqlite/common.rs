use sqlx::{Row, sqlite::SqliteRow};
use uuid::Uuid;

use crate::{
    db::error::{DbError, DbResult},
    models::{PendingSignature, PendingValidation},
};

/// Ids bound per `IN (...)` statement.
///
/// SQLite caps bound parameters per statement (999 on older builds), so key
/// sets are split into chunks of this size.
pub const MAX_IDS_PER_STATEMENT: usize = 500;

/// Parse a UUID string from the database, returning a DbError on failure
pub fn parse_uuid(s: &str) -> DbResult<Uuid> {
    Uuid::parse_str(s).map_err(|e| DbError::Internal(format!("Invalid UUID in database: {}", e)))
}

/// `?, ?, ?` with one placeholder per item.
pub fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

pub const SIGNATURE_COLUMNS: &str = "id, secret_key, source, petition_id, petition_close_at, \
     validation_close_at, name, email, postcode, constituency_id, location_code, processed, \
     received_at, created_at, updated_at";

pub const VALIDATION_COLUMNS: &str =
    "id, secret_key, validation_close_at, received_at, created_at";

pub fn signature_from_row(row: &SqliteRow) -> DbResult<PendingSignature> {
    Ok(PendingSignature {
        id: parse_uuid(&row.get::<String, _>("id"))?,
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
    })
}

pub fn validation_from_row(row: &SqliteRow) -> DbResult<PendingValidation> {
    Ok(PendingValidation {
        id: parse_uuid(&row.get::<String, _>("id"))?,
        secret_key: row.get("secret_key"),
        validation_close_at: row.get("validation_close_at"),
        received_at: row.get("received_at"),
        created_at: row.get("created_at"),
    })
}
