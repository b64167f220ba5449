//! Reply-tree construction.
//!
//! Comments arrive flat and in no particular order. Each one is placed into
//! an arena slot addressed by its content URI; parent/child links are lists
//! of slot indices, so attaching a reply never moves a node and nesting
//! depth or insertion order cannot invalidate a link. The owned tree is
//! materialized only once every link is in place.
//!
//! Ordering, applied at every level once the tree is complete:
//! - roots: newest first (descending `created_at`)
//! - replies: oldest first (ascending `created_at`)
//!
//! Both sorts are stable and compare timestamps as raw strings.

use std::collections::HashMap;

use crate::models::Comment;

struct Node {
    comment: Comment,
    children: Vec<usize>,
}

/// Build a forest of reply trees from a flat comment list.
///
/// A comment whose `reply_to` names a URI missing from the input is an
/// orphan and becomes a root. So does a reply whose attachment would close a
/// cycle. Later comments sharing a content URI with an earlier one are
/// discarded.
pub fn build_threads(comments: Vec<Comment>) -> Vec<Comment> {
    let mut nodes: Vec<Node> = Vec::with_capacity(comments.len());
    let mut by_uri: HashMap<String, usize> = HashMap::with_capacity(comments.len());

    for mut comment in comments {
        if by_uri.contains_key(&comment.uri) {
            continue;
        }
        // Replies are rebuilt from the arena links.
        comment.replies.clear();
        by_uri.insert(comment.uri.clone(), nodes.len());
        nodes.push(Node {
            comment,
            children: Vec::new(),
        });
    }

    // Tree-root links with path compression. A node is still its own tree
    // root when its turn comes, so attaching it under `p` closes a cycle
    // exactly when `p` already sits in its tree.
    let mut tree_root: Vec<usize> = (0..nodes.len()).collect();
    let mut roots = Vec::new();
    for idx in 0..nodes.len() {
        let parent = nodes[idx]
            .comment
            .reply_to
            .as_deref()
            .and_then(|uri| by_uri.get(uri).copied())
            .filter(|&p| find_tree_root(&mut tree_root, p) != idx);

        match parent {
            Some(p) => {
                nodes[p].children.push(idx);
                tree_root[idx] = p;
            }
            None => roots.push(idx),
        }
    }

    let mut slots: Vec<Option<Node>> = nodes.into_iter().map(Some).collect();
    let mut forest: Vec<Comment> = roots
        .into_iter()
        .filter_map(|idx| materialize(&mut slots, idx))
        .collect();

    forest.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    forest
}

fn find_tree_root(links: &mut [usize], mut idx: usize) -> usize {
    let mut root = idx;
    while links[root] != root {
        root = links[root];
    }
    while links[idx] != root {
        let next = links[idx];
        links[idx] = root;
        idx = next;
    }
    root
}

/// Move a node and its subtree out of the arena, sorting replies oldest first.
fn materialize(slots: &mut [Option<Node>], idx: usize) -> Option<Comment> {
    let node = slots[idx].take()?;
    let mut comment = node.comment;
    comment.replies = node
        .children
        .into_iter()
        .filter_map(|child| materialize(slots, child))
        .collect();
    comment
        .replies
        .sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Some(comment)
}
