//! Comment-forest reconstruction.
//!
//! The search API delivers a page's comments as one flat descendant list;
//! each entry embeds shallow copies of its direct replies under
//! `children.comment`. Rebuilding the reply forest takes two passes over
//! the flat list, O(n) in the number of comments.

use std::collections::{HashMap, HashSet};

use confdown_shared::{Comment, CommentLocation};

use crate::raw::RawComment;

/// Rebuild the reply forest from a flat descendant-comment list.
///
/// Pass 1 converts every entry into a [`Comment`] indexed by id and records
/// which ids appear in any entry's children list. Pass 2 assigns ownership:
/// a comment is a root iff nothing referenced it as a child; replies are
/// attached by id lookup against the index, following each parent's own
/// children order. Root order follows the flat list. Nodes are moved out of
/// the index as they are attached, so a comment ends up in exactly one
/// place and cycles are unrepresentable.
pub fn build_comment_forest(raw_comments: Vec<RawComment>) -> Vec<Comment> {
    let mut converted: HashMap<String, Comment> = HashMap::with_capacity(raw_comments.len());
    let mut child_ids: HashSet<String> = HashSet::new();
    let mut kids_by_parent: HashMap<String, Vec<String>> = HashMap::new();
    let mut flat_order: Vec<String> = Vec::with_capacity(raw_comments.len());

    for raw in raw_comments {
        let kid_ids: Vec<String> = raw
            .children
            .as_ref()
            .and_then(|c| c.comment.as_ref())
            .map(|list| list.results.iter().map(|child| child.id.clone()).collect())
            .unwrap_or_default();

        for id in &kid_ids {
            child_ids.insert(id.clone());
        }
        flat_order.push(raw.id.clone());
        kids_by_parent.insert(raw.id.clone(), kid_ids);

        let comment = convert_raw_comment(raw);
        converted.insert(comment.id.clone(), comment);
    }

    let mut roots = Vec::new();
    for id in &flat_order {
        if child_ids.contains(id) {
            continue;
        }
        if let Some(root) = attach_replies(id, &mut converted, &kids_by_parent) {
            roots.push(root);
        }
    }
    roots
}

/// Take a comment out of the index and recursively attach its replies.
fn attach_replies(
    id: &str,
    converted: &mut HashMap<String, Comment>,
    kids_by_parent: &HashMap<String, Vec<String>>,
) -> Option<Comment> {
    let mut comment = converted.remove(id)?;
    if let Some(kid_ids) = kids_by_parent.get(id) {
        comment.replies = kid_ids
            .iter()
            .filter_map(|kid| attach_replies(kid, converted, kids_by_parent))
            .collect();
    }
    Some(comment)
}

fn convert_raw_comment(raw: RawComment) -> Comment {
    let RawComment {
        id,
        title,
        status,
        body,
        extensions,
        version,
        children: _,
    } = raw;

    let (location, original_text) = match extensions {
        Some(ext) => {
            let location = match ext.location.as_deref() {
                Some("inline") => CommentLocation::Inline,
                // "footer" and anything unrecognized land in the page section
                _ => CommentLocation::Footer,
            };
            let original_text = ext.inline_properties.and_then(|p| p.original_selection);
            (location, original_text)
        }
        None => (CommentLocation::Footer, None),
    };

    Comment {
        id,
        title,
        status,
        body: body.and_then(|b| b.atlas_doc_format).map(|rep| rep.value),
        location,
        original_text,
        replies: Vec::new(),
        version: version.map(Into::into),
    }
}
