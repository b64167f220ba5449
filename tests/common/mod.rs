//! Shared helpers for the HTTP-backed integration tests.
//!
//! Mock indexer and profile servers are plain axum routers bound to an
//! ephemeral local port.

#![allow(dead_code)]

use axum::Router;
use serde_json::{json, Value};

/// Serve `router` on a free local port and return its base URL.
pub async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A URL on which nothing is listening.
pub fn dead_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

/// One page of a records query response.
pub fn records_page(nodes: Vec<Value>, has_next_page: bool, end_cursor: Option<&str>) -> Value {
    let edges: Vec<Value> = nodes.into_iter().map(|n| json!({ "node": n })).collect();
    json!({
        "data": {
            "records": {
                "edges": edges,
                "pageInfo": { "hasNextPage": has_next_page, "endCursor": end_cursor }
            }
        }
    })
}

/// A comment record on `beads:<node_id>`.
pub fn comment_node(
    did: &str,
    rkey: &str,
    node_id: &str,
    text: &str,
    created_at: &str,
    reply_to: Option<&str>,
) -> Value {
    let mut value = json!({
        "$type": "org.impactindexer.review.comment",
        "subject": { "uri": format!("beads:{}", node_id), "type": "record" },
        "text": text,
        "createdAt": created_at,
    });
    if let Some(parent) = reply_to {
        value["replyTo"] = json!(parent);
    }
    json!({
        "cid": format!("cid-{}", rkey),
        "collection": "org.impactindexer.review.comment",
        "did": did,
        "rkey": rkey,
        "uri": comment_uri(did, rkey),
        "value": value,
    })
}

/// A like record pointing at `subject_uri`.
pub fn like_node(did: &str, rkey: &str, subject_uri: &str) -> Value {
    json!({
        "cid": format!("cid-like-{}", rkey),
        "collection": "org.impactindexer.review.like",
        "did": did,
        "rkey": rkey,
        "uri": format!("at://{}/org.impactindexer.review.like/{}", did, rkey),
        "value": { "subject": { "uri": subject_uri } },
    })
}

pub fn comment_uri(did: &str, rkey: &str) -> String {
    format!("at://{}/org.impactindexer.review.comment/{}", did, rkey)
}
