//! GraphQL indexer client.
//!
//! Fetches every record of a named collection from the Hypergoat indexer
//! using cursor pagination:
//!
//! - `first` = page size (100 by default), `after` = previous `endCursor`
//! - stops when `hasNextPage` is false or no cursor is returned
//! - stops silently after `max_pages` pages (5 by default), even if the
//!   indexer reports more
//!
//! There are no retries. Any transport failure, non-success status, decode
//! failure or GraphQL error aborts the whole collection fetch and discards
//! records already received.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::IndexerConfig;
use crate::models::IndexerRecord;

const RECORDS_QUERY: &str = r#"query FetchRecords($collection: String!, $first: Int, $after: String) {
  records(collection: $collection, first: $first, after: $after) {
    edges {
      node {
        cid
        collection
        did
        rkey
        uri
        value
      }
    }
    pageInfo {
      hasNextPage
      endCursor
    }
  }
}"#;

/// Indexer client errors
#[derive(Debug, Error)]
pub enum IndexerError {
    /// Transport failure: connect, timeout, or body read.
    #[error("failed to execute request: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-2xx HTTP status.
    #[error("unexpected status code: {0}")]
    Status(u16),

    /// Response body is not a valid records response.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// First message of the response's `errors` list.
    #[error("graphql error: {0}")]
    GraphQl(String),

    #[error("request cancelled")]
    Cancelled,
}

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'static str,
    variables: Variables<'a>,
}

#[derive(Debug, Serialize)]
struct Variables<'a> {
    collection: &'a str,
    first: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    after: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<GraphQlData>,
    #[serde(default)]
    errors: Option<Vec<GraphQlErrorMessage>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlData {
    #[serde(default)]
    records: Option<RecordsPage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordsPage {
    #[serde(default)]
    edges: Vec<RecordEdge>,
    #[serde(default)]
    page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
struct RecordEdge {
    node: IndexerRecord,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    #[serde(default)]
    has_next_page: bool,
    #[serde(default)]
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorMessage {
    message: String,
}

/// Client for the records query of one indexer endpoint.
///
/// Cheap to clone; the underlying `reqwest::Client` shares its connection
/// pool between clones.
#[derive(Debug, Clone)]
pub struct IndexerClient {
    http: reqwest::Client,
    endpoint: String,
    page_size: usize,
    max_pages: usize,
}

impl IndexerClient {
    /// Create a client for `endpoint` with the default page size (100) and
    /// page cap (5).
    pub fn new(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            page_size: 100,
            max_pages: 5,
        }
    }

    /// Create a client from the `[indexer]` config section.
    pub fn from_config(http: reqwest::Client, config: &IndexerConfig) -> Self {
        Self::new(http, config.url.clone())
            .with_page_size(config.page_size)
            .with_max_pages(config.max_pages)
    }

    /// Set the `first` argument sent with each page request. Values below 1
    /// are raised to 1.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Set the maximum number of pages fetched per collection. Values below
    /// 1 are raised to 1.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// The GraphQL endpoint URL this client posts to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch all records in `collection`, up to the page cap.
    ///
    /// Records are returned in the order the indexer served them, pages
    /// concatenated. Any failing page fails the whole call; records from
    /// earlier pages are discarded. Returns [`IndexerError::Cancelled`] if
    /// `cancel` fires before the last page arrives.
    pub async fn fetch_collection(
        &self,
        collection: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<IndexerRecord>, IndexerError> {
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;

        for page in 0..self.max_pages {
            let variables = Variables {
                collection,
                first: self.page_size,
                after: cursor.as_deref(),
            };

            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(IndexerError::Cancelled),
                resp = self.fetch_page(variables) => resp?,
            };

            let Some(batch) = response.data.and_then(|d| d.records) else {
                break;
            };

            debug!(
                collection,
                page,
                records = batch.edges.len(),
                has_next_page = batch.page_info.has_next_page,
                "fetched indexer page"
            );
            records.extend(batch.edges.into_iter().map(|e| e.node));

            if !batch.page_info.has_next_page {
                break;
            }
            match batch.page_info.end_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Ok(records)
    }

    async fn fetch_page(&self, variables: Variables<'_>) -> Result<GraphQlResponse, IndexerError> {
        let body = GraphQlRequest {
            query: RECORDS_QUERY,
            variables,
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(IndexerError::Status(status.as_u16()));
        }

        let bytes = resp.bytes().await?;
        let parsed: GraphQlResponse = serde_json::from_slice(&bytes)?;

        if let Some(first) = parsed.errors.as_ref().and_then(|e| e.first()) {
            return Err(IndexerError::GraphQl(first.message.clone()));
        }

        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variables_omit_missing_cursor() {
        let v = serde_json::to_value(Variables {
            collection: "c",
            first: 100,
            after: None,
        })
        .unwrap();
        assert_eq!(v, serde_json::json!({ "collection": "c", "first": 100 }));
    }

    #[test]
    fn test_response_with_null_data() {
        let parsed: GraphQlResponse = serde_json::from_str(r#"{"data": null}"#).unwrap();
        assert!(parsed.data.is_none());
        assert!(parsed.errors.is_none());
    }

    #[test]
    fn test_response_page_decodes() {
        let parsed: GraphQlResponse = serde_json::from_str(
            r#"{"data":{"records":{"edges":[{"node":{"cid":"c1","collection":"x","did":"d","rkey":"r","uri":"u","value":{"text":"hi"}}}],"pageInfo":{"hasNextPage":true,"endCursor":"abc"}}}}"#,
        )
        .unwrap();
        let page = parsed.data.unwrap().records.unwrap();
        assert_eq!(page.edges.len(), 1);
        assert_eq!(page.edges[0].node.uri, "u");
        assert!(page.page_info.has_next_page);
        assert_eq!(page.page_info.end_cursor.as_deref(), Some("abc"));
    }

    #[test]
    fn test_builders_clamp_to_one() {
        let client = IndexerClient::new(reqwest::Client::new(), "http://x")
            .with_page_size(0)
            .with_max_pages(0);
        assert_eq!(client.page_size, 1);
        assert_eq!(client.max_pages, 1);
    }
}
