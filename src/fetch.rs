//! Comment retrieval pipeline.
//!
//! # Workflow
//!
//! 1. Fetch the comment and like collections concurrently.
//! 2. Keep comment records whose subject is a beads issue.
//! 3. Resolve profiles for the distinct comment authors.
//! 4. Assemble flat comments with like counts and profile info.
//! 5. Build reply trees.
//! 6. Apply the [`FetchSelection`] to the root level.
//!
//! A failed comment fetch fails the whole call. A failed like fetch is
//! logged and treated as "no likes".

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobMatcher};
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::assemble::assemble_comments;
use crate::config::Config;
use crate::indexer::IndexerClient;
use crate::models::{Comment, FetchSelection};
use crate::profile::ProfileResolver;
use crate::records::filter_beads_comments;
use crate::thread::build_threads;

/// Everything needed to run one retrieval.
#[derive(Debug, Clone)]
pub struct CommentFetcher {
    indexer: IndexerClient,
    profiles: ProfileResolver,
    comment_collection: String,
    like_collection: String,
}

impl CommentFetcher {
    /// Combine an indexer client and a profile resolver, reading the default
    /// comment and like collections.
    pub fn new(indexer: IndexerClient, profiles: ProfileResolver) -> Self {
        Self {
            indexer,
            profiles,
            comment_collection: crate::config::COMMENT_COLLECTION.to_string(),
            like_collection: crate::config::LIKE_COLLECTION.to_string(),
        }
    }

    /// Build every component from `config`, sharing one HTTP client.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = config.http.build_client()?;
        let indexer = IndexerClient::from_config(http.clone(), &config.indexer);
        let profiles = ProfileResolver::new(http, config.profiles.url.clone())
            .with_concurrency(config.profiles.concurrency);
        Ok(Self::new(indexer, profiles).with_collections(
            config.indexer.comment_collection.clone(),
            config.indexer.like_collection.clone(),
        ))
    }

    /// Read comments and likes from other collections.
    pub fn with_collections(mut self, comments: String, likes: String) -> Self {
        self.comment_collection = comments;
        self.like_collection = likes;
        self
    }

    /// Fetch, thread and select comments.
    ///
    /// Returns root comments newest first, replies nested oldest first.
    pub async fn fetch_comments(
        &self,
        selection: &FetchSelection,
        cancel: &CancellationToken,
    ) -> Result<Vec<Comment>> {
        let matcher = compile_pattern(selection)?;

        let (comment_result, like_result) = tokio::join!(
            self.indexer
                .fetch_collection(&self.comment_collection, cancel),
            self.indexer.fetch_collection(&self.like_collection, cancel),
        );

        let comment_records = comment_result.with_context(|| {
            format!(
                "failed to fetch {} from {}",
                self.comment_collection,
                self.indexer.endpoint()
            )
        })?;
        let like_records = like_result.unwrap_or_else(|e| {
            warn!(error = %e, "like fetch failed, continuing without likes");
            Vec::new()
        });

        let comment_records = filter_beads_comments(comment_records);
        debug!(
            comments = comment_records.len(),
            likes = like_records.len(),
            "fetched records"
        );

        let mut seen = HashSet::new();
        let dids: Vec<String> = comment_records
            .iter()
            .filter(|r| seen.insert(r.did.as_str()))
            .map(|r| r.did.clone())
            .collect();

        let profiles = self.profiles.resolve(&dids, cancel).await;
        if cancel.is_cancelled() {
            bail!("comment fetch cancelled");
        }

        let assembled = assemble_comments(&comment_records, &like_records, &profiles);
        let threads = build_threads(assembled);
        debug!(roots = threads.len(), "built comment threads");

        Ok(select_roots(threads, selection, matcher.as_ref()))
    }
}

fn compile_pattern(selection: &FetchSelection) -> Result<Option<GlobMatcher>> {
    if selection.node_id.is_some() {
        return Ok(None);
    }
    match selection.pattern.as_deref() {
        Some(pattern) => {
            let glob = Glob::new(pattern)
                .with_context(|| format!("invalid glob pattern: {}", pattern))?;
            Ok(Some(glob.compile_matcher()))
        }
        None => Ok(None),
    }
}

/// Filter root comments by node ID (exact match wins over glob), then
/// truncate the root list. Replies are never filtered or truncated.
pub fn select_roots(
    roots: Vec<Comment>,
    selection: &FetchSelection,
    matcher: Option<&GlobMatcher>,
) -> Vec<Comment> {
    let mut selected: Vec<Comment> = match (&selection.node_id, matcher) {
        (Some(id), _) => roots.into_iter().filter(|c| &c.node_id == id).collect(),
        (None, Some(m)) => roots.into_iter().filter(|c| m.is_match(&c.node_id)).collect(),
        (None, None) => roots,
    };

    if selection.limit > 0 {
        selected.truncate(selection.limit);
    }
    selected
}

/// Convenience wrapper that builds a [`CommentFetcher`] from `config`.
pub async fn fetch_comments(
    config: &Config,
    selection: &FetchSelection,
    cancel: &CancellationToken,
) -> Result<Vec<Comment>> {
    CommentFetcher::from_config(config)?
        .fetch_comments(selection, cancel)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root(uri: &str, node_id: &str, replies: Vec<Comment>) -> Comment {
        Comment {
            did: "did:plc:a".into(),
            handle: "a.test".into(),
            display_name: None,
            text: String::new(),
            created_at: "2025-01-15T10:00:00Z".into(),
            uri: uri.into(),
            rkey: uri.into(),
            node_id: node_id.into(),
            reply_to: None,
            likes: 0,
            replies,
        }
    }

    fn sample() -> Vec<Comment> {
        let reply = Comment {
            node_id: "other".into(),
            reply_to: Some("1".into()),
            ..root("r", "other", Vec::new())
        };
        vec![
            root("1", "hb-abc", vec![reply]),
            root("2", "hb-def", Vec::new()),
            root("3", "xyz", Vec::new()),
        ]
    }

    #[test]
    fn test_exact_match_keeps_children() {
        let out = select_roots(sample(), &FetchSelection::for_node("hb-abc"), None);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].replies.len(), 1);
        assert_eq!(out[0].replies[0].node_id, "other");
    }

    #[test]
    fn test_glob_match() {
        let sel = FetchSelection::matching("hb-*");
        let matcher = compile_pattern(&sel).unwrap();
        let out = select_roots(sample(), &sel, matcher.as_ref());
        let uris: Vec<_> = out.iter().map(|c| c.uri.as_str()).collect();
        assert_eq!(uris, vec!["1", "2"]);
    }

    #[test]
    fn test_exact_wins_over_pattern() {
        let sel = FetchSelection {
            node_id: Some("xyz".into()),
            pattern: Some("hb-*".into()),
            limit: 0,
        };
        let matcher = compile_pattern(&sel).unwrap();
        assert!(matcher.is_none());
        let out = select_roots(sample(), &sel, matcher.as_ref());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].uri, "3");
    }

    #[test]
    fn test_limit_applies_to_roots_only() {
        let out = select_roots(sample(), &FetchSelection::default().with_limit(1), None);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].replies.len(), 1);
    }

    #[test]
    fn test_zero_limit_is_unlimited() {
        let out = select_roots(sample(), &FetchSelection::default(), None);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let err = compile_pattern(&FetchSelection::matching("hb-[")).unwrap_err();
        assert!(err.to_string().contains("invalid glob pattern"));
    }
}
