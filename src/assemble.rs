//! Join comment records, like records and profiles into flat [`Comment`]s.

use std::collections::HashMap;

use crate::models::{Comment, IndexerRecord, Profile};
use crate::records::{extract_node_id, string_field, subject_uri};

/// Count likes per liked URI. Like records without a subject URI are skipped.
pub fn count_likes(like_records: &[IndexerRecord]) -> HashMap<&str, u64> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for like in like_records {
        if let Some(uri) = subject_uri(&like.value) {
            *counts.entry(uri).or_insert(0) += 1;
        }
    }
    counts
}

/// Convert already-filtered comment records into flat, unthreaded comments.
///
/// Missing or mistyped payload fields degrade to defaults: empty text, empty
/// timestamp, no reply target. An author absent from `profiles` gets the
/// DID-as-handle fallback.
pub fn assemble_comments(
    comment_records: &[IndexerRecord],
    like_records: &[IndexerRecord],
    profiles: &HashMap<String, Profile>,
) -> Vec<Comment> {
    let likes = count_likes(like_records);

    comment_records
        .iter()
        .map(|record| {
            let profile = profiles
                .get(&record.did)
                .cloned()
                .unwrap_or_else(|| Profile::fallback(&record.did));

            let reply_to = string_field(&record.value, "replyTo")
                .filter(|s| !s.is_empty())
                .map(str::to_string);

            Comment {
                did: record.did.clone(),
                handle: profile.handle,
                display_name: profile.display_name.filter(|s| !s.is_empty()),
                text: string_field(&record.value, "text")
                    .unwrap_or_default()
                    .to_string(),
                created_at: string_field(&record.value, "createdAt")
                    .unwrap_or_default()
                    .to_string(),
                uri: record.uri.clone(),
                rkey: record.rkey.clone(),
                node_id: extract_node_id(record),
                reply_to,
                likes: likes.get(record.uri.as_str()).copied().unwrap_or(0),
                replies: Vec::new(),
            }
        })
        .collect()
}
