//! Identifier and timestamp helpers shared by the domain models.

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

/// Current time as an ISO 8601 string with millisecond precision (`2024-05-01T10:00:00.000Z`).
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses an ISO 8601 timestamp into Unix milliseconds.
pub fn iso_to_millis(timestamp: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(timestamp)
        .ok()
        .map(|parsed| parsed.timestamp_millis())
}

/// Generates an identifier of the form `<prefix>-<unix millis>-<suffix>`.
///
/// The embedded creation time keeps ids informative; the random suffix keeps
/// them unique when several entities are created within the same millisecond.
pub fn generate_id(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}",
        prefix,
        Utc::now().timestamp_millis(),
        &suffix[..8]
    )
}
