//! Posting comments.
//!
//! A comment is a `org.impactindexer.review.comment` record created in the
//! author's own repository through `com.atproto.repo.createRecord`. Session
//! management lives outside this crate; a [`Session`] only carries what the
//! write call needs.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::COMMENT_COLLECTION;
use crate::records::BEADS_URI_PREFIX;

/// Parameters for a new comment.
#[derive(Debug, Clone, Default)]
pub struct NewComment {
    pub node_id: String,
    pub text: String,
    /// Content URI of the parent comment, for replies.
    pub reply_to: Option<String>,
}

/// Result of a successful post.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PostedComment {
    pub uri: String,
    pub cid: String,
}

/// An authenticated actor.
#[derive(Debug, Clone)]
pub struct Session {
    pub did: String,
    pub access_token: String,
}

impl Session {
    /// Read the session from `HB_DID` and `HB_ACCESS_TOKEN`.
    pub fn from_env() -> Result<Self> {
        let did = std::env::var("HB_DID").context("HB_DID environment variable not set")?;
        let access_token = std::env::var("HB_ACCESS_TOKEN")
            .context("HB_ACCESS_TOKEN environment variable not set")?;
        Ok(Self { did, access_token })
    }
}

/// Destination for new comments.
#[async_trait]
pub trait CommentPublisher: Send + Sync {
    /// Post `comment`. Fails without side effects if `cancel` fires before
    /// the request completes.
    async fn publish(
        &self,
        comment: &NewComment,
        cancel: &CancellationToken,
    ) -> Result<PostedComment>;
}

#[derive(Debug, Serialize)]
struct CreateRecordRequest<'a> {
    repo: &'a str,
    collection: &'a str,
    record: CommentRecord<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CommentRecord<'a> {
    #[serde(rename = "$type")]
    record_type: &'a str,
    subject: Subject,
    text: &'a str,
    created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct Subject {
    uri: String,
    #[serde(rename = "type")]
    subject_type: &'static str,
}

/// Publishes through the XRPC endpoint of a personal data server.
pub struct XrpcPublisher {
    http: reqwest::Client,
    pds_url: String,
    session: Session,
}

impl XrpcPublisher {
    /// Publish as `session` through the PDS at `pds_url`.
    pub fn new(http: reqwest::Client, pds_url: impl Into<String>, session: Session) -> Self {
        Self {
            http,
            pds_url: pds_url.into(),
            session,
        }
    }
}

fn build_request<'a>(
    repo: &'a str,
    comment: &'a NewComment,
    created_at: String,
) -> Result<CreateRecordRequest<'a>> {
    if comment.node_id.trim().is_empty() {
        bail!("node ID must not be empty");
    }
    if comment.text.trim().is_empty() {
        bail!("comment text must not be empty");
    }

    Ok(CreateRecordRequest {
        repo,
        collection: COMMENT_COLLECTION,
        record: CommentRecord {
            record_type: COMMENT_COLLECTION,
            subject: Subject {
                uri: format!("{}{}", BEADS_URI_PREFIX, comment.node_id),
                subject_type: "record",
            },
            text: &comment.text,
            created_at,
            reply_to: comment.reply_to.as_deref().filter(|s| !s.is_empty()),
        },
    })
}

impl XrpcPublisher {
    async fn create_record(
        &self,
        url: &str,
        body: &CreateRecordRequest<'_>,
    ) -> Result<PostedComment> {
        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.session.access_token)
            .json(body)
            .send()
            .await
            .with_context(|| format!("failed to reach {}", url))?;

        let status = resp.status();
        if !status.is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            bail!(
                "createRecord failed (HTTP {}): {}",
                status,
                body_text.chars().take(500).collect::<String>()
            );
        }

        resp.json()
            .await
            .context("failed to decode createRecord response")
    }
}

#[async_trait]
impl CommentPublisher for XrpcPublisher {
    async fn publish(
        &self,
        comment: &NewComment,
        cancel: &CancellationToken,
    ) -> Result<PostedComment> {
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let body = build_request(&self.session.did, comment, created_at)?;

        let url = format!(
            "{}/xrpc/com.atproto.repo.createRecord",
            self.pds_url.trim_end_matches('/')
        );
        let posted = tokio::select! {
            biased;
            _ = cancel.cancelled() => bail!("publish cancelled"),
            posted = self.create_record(&url, &body) => posted?,
        };
        info!(uri = %posted.uri, "comment posted");
        Ok(posted)
    }
}
