//! Frameset documents.

use crate::dom_tree::{DomTree, NodeId};
use crate::parse::parse_html;
use crate::walk::{Decision, walk_elements};
use crate::{LecternError, Result};

const FRAME_TAGS: [&str; 3] = ["frame", "frameset", "noframes"];

/// Makes sure the document has a `body` and no frames.
///
/// A frameset document without a body gets one built from its `noframes`
/// fallback markup. Any remaining `frame`, `frameset` and `noframes`
/// elements are removed.
///
/// # Errors
///
/// [`LecternError::InvalidDocument`] when there is neither a body nor a
/// frameset to build one from.
pub fn normalize_frames(tree: &mut DomTree) -> Result<()> {
    let root = tree.root();
    if tree.body().is_none() {
        let Some(frameset) = tree.find_first(root, "frameset") else {
            return Err(LecternError::InvalidDocument("document has no body".into()));
        };
        build_body_from_noframes(tree, frameset)?;
    }

    walk_elements(tree, root, |tree, id| {
        if tree.tag_name(id).is_some_and(|tag| FRAME_TAGS.contains(&tag)) {
            Decision::Remove
        } else {
            Decision::Retain
        }
    })
}

fn build_body_from_noframes(tree: &mut DomTree, frameset: NodeId) -> Result<()> {
    let fallback: String = tree
        .elements_by_tag(frameset, "noframes")
        .into_iter()
        .map(|noframes| tree.text_content(noframes))
        .collect::<Vec<_>>()
        .join("\n");

    let parent = tree.html_element().unwrap_or_else(|| tree.root());
    let body = tree.create_element("body");
    tree.append(parent, body)?;

    if fallback.trim().is_empty() {
        tracing::warn!("frameset document without noframes content, body is empty");
        return Ok(());
    }

    let fragment = parse_html(&fallback)?;
    if let Some(fragment_body) = fragment.body() {
        for &child in fragment.children(fragment_body) {
            let copy = tree.import_subtree(&fragment, child);
            tree.append(body, copy)?;
        }
    }
    tracing::debug!("built body from noframes content");
    Ok(())
}
