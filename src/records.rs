//! Typed access to the untyped record payload.
//!
//! Record payloads are authored by arbitrary network participants, so every
//! accessor here returns an `Option` (or a documented default) and never an
//! error. A record that fails the `beads:` subject check is dropped silently.

use serde_json::Value;

use crate::models::IndexerRecord;

/// URI scheme marking a comment subject as a beads issue.
pub const BEADS_URI_PREFIX: &str = "beads:";

/// Read `value.<field>` as a string.
pub fn string_field<'a>(value: &'a Value, field: &str) -> Option<&'a str> {
    value.get(field).and_then(Value::as_str)
}

/// Read `value.subject.uri`.
///
/// Used for both comments (where it names the beads issue) and likes (where
/// it names the liked comment).
pub fn subject_uri(value: &Value) -> Option<&str> {
    value
        .get("subject")
        .and_then(|s| s.get("uri"))
        .and_then(Value::as_str)
}

/// Keep only records whose subject URI targets a beads issue.
pub fn filter_beads_comments(records: Vec<IndexerRecord>) -> Vec<IndexerRecord> {
    records
        .into_iter()
        .filter(|r| subject_uri(&r.value).is_some_and(|uri| uri.starts_with(BEADS_URI_PREFIX)))
        .collect()
}

/// Extract the beads issue ID from `value.subject.uri`.
///
/// For `subject.uri = "beads:my-issue-123"` returns `"my-issue-123"`.
/// Returns an empty string when the record has no subject URI.
pub fn extract_node_id(record: &IndexerRecord) -> String {
    match subject_uri(&record.value) {
        Some(uri) => uri.strip_prefix(BEADS_URI_PREFIX).unwrap_or(uri).to_string(),
        None => String::new(),
    }
}
