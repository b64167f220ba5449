//! Text and JSON rendering of comment forests.
//!
//! Text layout, per comment, indented two spaces per nesting level:
//!
//! ```text
//! [hb-123] Alice @alice.bsky.social (2025-01-15T10:00:00Z) [2 likes]
//!   First comment
//!   [hb-123] ↩ reply · @bob.bsky.social (2025-01-15T11:00:00Z)
//!     A reply
//! ```
//!
//! Root entries are separated by a blank line. An empty forest renders as
//! `No comments found.` (text) or `[]` (JSON).

use std::io::{self, Write};

use anyhow::Result;
use serde::Deserialize;

use crate::models::Comment;

const REPLY_MARKER: &str = "↩ reply · ";

/// Write the forest in the text layout described above.
pub fn format_text<W: Write>(w: &mut W, comments: &[Comment]) -> io::Result<()> {
    if comments.is_empty() {
        return writeln!(w, "No comments found.");
    }

    for (i, comment) in comments.iter().enumerate() {
        if i > 0 {
            writeln!(w)?;
        }
        format_comment(w, comment, 0)?;
    }
    Ok(())
}

fn format_comment<W: Write>(w: &mut W, comment: &Comment, depth: usize) -> io::Result<()> {
    let indent = " ".repeat(depth * 2);
    let marker = if comment.is_reply() { REPLY_MARKER } else { "" };
    let name = match comment.display_name.as_deref() {
        Some(name) if !name.is_empty() => format!("{} ", name),
        _ => String::new(),
    };

    writeln!(
        w,
        "{}[{}] {}{}@{} ({}){}",
        indent,
        comment.node_id,
        marker,
        name,
        comment.handle,
        comment.created_at,
        likes_suffix(comment.likes)
    )?;
    writeln!(w, "{}  {}", indent, comment.text)?;

    for reply in &comment.replies {
        format_comment(w, reply, depth + 1)?;
    }
    Ok(())
}

fn likes_suffix(likes: u64) -> String {
    match likes {
        0 => String::new(),
        1 => " [1 like]".to_string(),
        n => format!(" [{} likes]", n),
    }
}

/// Write the forest as a pretty-printed JSON array (2-space indent).
pub fn format_json<W: Write>(w: &mut W, comments: &[Comment]) -> Result<()> {
    if comments.is_empty() {
        writeln!(w, "[]")?;
        return Ok(());
    }
    serde_json::to_writer_pretty(&mut *w, comments)?;
    writeln!(w)?;
    Ok(())
}

/// Parse a forest written by [`format_json`].
///
/// Reply chains have no depth bound, so the parser's recursion limit is
/// lifted and the stack is grown on demand instead.
pub fn parse_json(bytes: &[u8]) -> Result<Vec<Comment>> {
    let mut de = serde_json::Deserializer::from_slice(bytes);
    de.disable_recursion_limit();
    let comments = Vec::<Comment>::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(comments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(uri: &str, handle: &str, likes: u64) -> Comment {
        Comment {
            did: format!("did:plc:{}", handle),
            handle: handle.into(),
            display_name: None,
            text: format!("text {}", uri),
            created_at: "2025-01-15T10:00:00Z".into(),
            uri: uri.into(),
            rkey: uri.into(),
            node_id: "hb-1".into(),
            reply_to: None,
            likes,
            replies: Vec::new(),
        }
    }

    fn render_text(comments: &[Comment]) -> String {
        let mut buf = Vec::new();
        format_text(&mut buf, comments).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(render_text(&[]), "No comments found.\n");
    }

    #[test]
    fn test_empty_json() {
        let mut buf = Vec::new();
        format_json(&mut buf, &[]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "[]\n");
    }

    #[test]
    fn test_likes_suffix() {
        assert_eq!(likes_suffix(0), "");
        assert_eq!(likes_suffix(1), " [1 like]");
        assert_eq!(likes_suffix(5), " [5 likes]");
    }

    #[test]
    fn test_nested_layout() {
        let mut root = comment("a", "alice", 2);
        root.display_name = Some("Alice".into());
        let mut reply = comment("b", "bob", 1);
        reply.reply_to = Some("a".into());
        root.replies.push(reply);
        let other = comment("c", "carol", 0);

        let out = render_text(&[root, other]);
        let expected = "\
[hb-1] Alice @alice (2025-01-15T10:00:00Z) [2 likes]
  text a
  [hb-1] ↩ reply · @bob (2025-01-15T10:00:00Z) [1 like]
    text b

[hb-1] @carol (2025-01-15T10:00:00Z)
  text c
";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_json_round_trip() {
        let mut root = comment("a", "alice", 3);
        let mut reply = comment("b", "bob", 0);
        reply.reply_to = Some("a".into());
        reply.display_name = Some("Bob".into());
        root.replies.push(reply);
        let forest = vec![root, comment("c", "carol", 0)];

        let mut buf = Vec::new();
        format_json(&mut buf, &forest).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("[\n  {\n    \"did\""));

        let parsed = parse_json(text.as_bytes()).unwrap();
        assert_eq!(parsed, forest);
    }

    #[test]
    fn test_json_round_trip_deep_chain() {
        let depth = 300;
        let mut node = comment(&format!("c{}", depth - 1), "alice", 0);
        for i in (0..depth - 1).rev() {
            let mut parent = comment(&format!("c{}", i), "alice", 0);
            node.reply_to = Some(parent.uri.clone());
            parent.replies.push(node);
            node = parent;
        }
        let forest = vec![node];

        let mut buf = Vec::new();
        format_json(&mut buf, &forest).unwrap();
        let parsed = parse_json(&buf).unwrap();

        let mut current = &parsed[0];
        let mut levels = 1;
        while let Some(child) = current.replies.first() {
            current = child;
            levels += 1;
        }
        assert_eq!(levels, depth);
        assert_eq!(current.uri, format!("c{}", depth - 1));
        assert_eq!(parsed, forest);
    }

    #[test]
    fn test_parse_rejects_trailing_garbage() {
        assert!(parse_json(b"[] []").is_err());
        assert!(parse_json(b"[]\n").unwrap().is_empty());
    }
}
