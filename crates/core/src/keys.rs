//! Key scheme — pure functions mapping (family, user, session, timestamp)
//! to the partition/sort key pair used by the session store.
//!
//! Layout:
//! - partition = `<familyId>` (the family is always the whole partition, so
//!   prefix queries can never cross a tenant boundary)
//! - sort      = `<userId>#SESSION#<sessionId>#MSG#<timestamp>`
//!
//! Timestamps are rendered with [`format_timestamp`] into a fixed-width
//! UTC ISO-8601 string, which makes lexicographic sort-key order equal to
//! chronological order, so ordered retrieval needs no secondary index.

use chrono::{DateTime, SecondsFormat, Utc};

/// Separator between sort-key segments. Not expected to occur inside
/// identifiers beyond their own `family#`/`user#` prefixes.
pub const SEPARATOR: &str = "#";

const SESSION_TAG: &str = "SESSION";
const MSG_TAG: &str = "MSG";

/// Render a timestamp for sort keys: UTC, millisecond precision, `Z` suffix.
/// Fixed width is what keeps string order chronological.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a sort-key timestamp back into a `DateTime<Utc>`.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// The partition key for a family. Family ids arrive already carrying their
/// `family#` prefix and are used verbatim.
pub fn partition_key(family_id: &str) -> String {
    family_id.to_string()
}

/// The sort key for one stored message.
pub fn message_sort_key(user_id: &str, session_id: &str, timestamp: DateTime<Utc>) -> String {
    format!(
        "{user_id}{SEPARATOR}{SESSION_TAG}{SEPARATOR}{session_id}{SEPARATOR}{MSG_TAG}{SEPARATOR}{}",
        format_timestamp(timestamp)
    )
}

/// Prefix matching every message in one (user, session) pair.
pub fn session_prefix(user_id: &str, session_id: &str) -> String {
    format!("{user_id}{SEPARATOR}{SESSION_TAG}{SEPARATOR}{session_id}{SEPARATOR}{MSG_TAG}{SEPARATOR}")
}

/// Prefix matching every message a user has written across all sessions.
/// Used by session listing.
pub fn user_prefix(user_id: &str) -> String {
    format!("{user_id}{SEPARATOR}{SESSION_TAG}{SEPARATOR}")
}

/// Split a message sort key back into (user id, session id, timestamp text).
/// Returns `None` for keys that do not follow the message layout.
pub fn split_sort_key(sort_key: &str) -> Option<(&str, &str, &str)> {
    // userId itself contains a '#' (e.g. "user#abc"), so parse around the
    // fixed SESSION/MSG tags rather than splitting on every separator.
    let session_marker = format!("{SEPARATOR}{SESSION_TAG}{SEPARATOR}");
    let msg_marker = format!("{SEPARATOR}{MSG_TAG}{SEPARATOR}");

    let session_at = sort_key.find(&session_marker)?;
    let user_id = &sort_key[..session_at];
    let rest = &sort_key[session_at + session_marker.len()..];

    let msg_at = rest.find(&msg_marker)?;
    let session_id = &rest[..msg_at];
    let timestamp = &rest[msg_at + msg_marker.len()..];

    if user_id.is_empty() || session_id.is_empty() || timestamp.is_empty() {
        return None;
    }
    Some((user_id, session_id, timestamp))
}
