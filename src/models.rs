//! Core data models used throughout the comment pipeline.
//!
//! These types represent the raw indexer records, resolved profiles, and
//! threaded comments that flow from the fetch step to the renderers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A record returned by the GraphQL indexer.
///
/// `value` is the record payload as published by its author; nothing about
/// its shape is guaranteed, so it is kept as untyped JSON and read through
/// the accessors in [`crate::records`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexerRecord {
    /// Content hash.
    #[serde(default)]
    pub cid: String,
    #[serde(default)]
    pub collection: String,
    /// Author DID.
    #[serde(default)]
    pub did: String,
    /// Record key within the author's repository.
    #[serde(default)]
    pub rkey: String,
    /// Content URI, `at://<did>/<collection>/<rkey>`.
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub value: Value,
}

/// A public actor profile.
///
/// A profile whose lookup failed carries the DID as its handle and is
/// otherwise indistinguishable from a resolved one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub did: String,
    pub handle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl Profile {
    /// Placeholder for an unresolvable DID: the DID doubles as the handle.
    pub fn fallback(did: &str) -> Self {
        Self {
            did: did.to_string(),
            handle: did.to_string(),
            display_name: None,
            avatar: None,
        }
    }
}

/// A comment on a beads issue, with its replies nested inside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub did: String,
    pub handle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub text: String,
    /// ISO-8601 UTC timestamp, compared as an opaque string.
    pub created_at: String,
    pub uri: String,
    pub rkey: String,
    /// Beads issue ID the comment is attached to.
    pub node_id: String,
    /// Content URI of the parent comment; `None` for a top-level comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    pub likes: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<Comment>,
}

impl Comment {
    /// Whether the comment declares a parent, even one that was never found.
    pub fn is_reply(&self) -> bool {
        self.reply_to.is_some()
    }
}

/// Caller-supplied selection applied to the root level of the forest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchSelection {
    /// Exact node ID match. Takes precedence over `pattern`.
    pub node_id: Option<String>,
    /// Glob over node IDs.
    pub pattern: Option<String>,
    /// Maximum number of root comments; 0 means unlimited.
    pub limit: usize,
}

impl FetchSelection {
    /// Select comments on exactly one issue.
    pub fn for_node(node_id: impl Into<String>) -> Self {
        Self {
            node_id: Some(node_id.into()),
            ..Self::default()
        }
    }

    /// Select comments on issues whose ID matches a glob.
    pub fn matching(pattern: impl Into<String>) -> Self {
        Self {
            pattern: Some(pattern.into()),
            ..Self::default()
        }
    }

    /// Cap the number of root comments; 0 disables the cap.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}
