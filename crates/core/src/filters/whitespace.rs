//! Whitespace condensing, empty-element pruning and document trimming.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::dom_tree::{DomTree, NodeId, NodeKind};
use crate::walk::{Decision, walk};
use crate::{LecternError, Result};

static WHITESPACE_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\n\r\x0C]+").expect("valid whitespace regex"));

/// Elements whose text keeps its whitespace.
const PREFORMATTED_TAGS: [&str; 3] = ["code", "pre", "textarea"];

/// Elements that are content on their own, whatever their children.
const SELF_CONTAINED_TAGS: [&str; 8] = ["audio", "canvas", "embed", "iframe", "math", "object", "svg", "video"];

/// Elements the leaf filter never removes on their own.
const KEPT_EMPTY_TAGS: [&str; 8] = ["body", "br", "col", "hr", "html", "td", "th", "wbr"];

fn is_preformatted(tree: &DomTree, id: NodeId) -> bool {
    tree.ancestors(id)
        .any(|a| tree.tag_name(a).is_some_and(|tag| PREFORMATTED_TAGS.contains(&tag)))
}

/// Collapses whitespace runs in text outside preformatted elements and
/// removes text nodes that end up empty.
pub fn condense_whitespace(tree: &mut DomTree) -> Result<()> {
    let root = tree.root();
    walk(tree, root, |tree, id| {
        let Some(text) = tree.text(id) else {
            return Decision::Retain;
        };
        if text.is_empty() {
            return Decision::Remove;
        }
        if is_preformatted(tree, id) {
            return Decision::Retain;
        }
        let condensed = WHITESPACE_RUN_RE.replace_all(text, " ");
        if condensed != text {
            let condensed = condensed.into_owned();
            tree.set_text(id, condensed);
        }
        Decision::Retain
    })
}

/// True if the node itself is content: visible text or a sourced media element.
fn is_meaningful_node(tree: &DomTree, id: NodeId) -> bool {
    match tree.kind(id) {
        NodeKind::Text(value) => !value.trim().is_empty(),
        NodeKind::Element(element) => match element.tag_name() {
            "img" => element.attr("src").is_some_and(|src| !src.trim().is_empty()),
            "source" => element.has_attr("src") || element.has_attr("srcset"),
            tag => SELF_CONTAINED_TAGS.contains(&tag),
        },
        _ => false,
    }
}

/// True if `id` or anything below it is content.
pub fn has_meaningful_content(tree: &DomTree, id: NodeId) -> bool {
    is_meaningful_node(tree, id) || tree.descendants(id).into_iter().any(|d| is_meaningful_node(tree, d))
}

/// Removes elements with no meaningful content anywhere below them.
///
/// Emptiness is judged on the whole subtree, so a single pass reaches the
/// fixed point that repeated leaf removal would.
pub fn remove_leaf_elements(tree: &mut DomTree) -> Result<()> {
    let root = tree.root();
    walk(tree, root, |tree, id| {
        let Some(tag) = tree.tag_name(id) else {
            return Decision::Retain;
        };
        if KEPT_EMPTY_TAGS.contains(&tag) || has_meaningful_content(tree, id) {
            Decision::Retain
        } else {
            Decision::Remove
        }
    })
}

fn is_edge_filler(tree: &DomTree, id: NodeId) -> bool {
    tree.has_tag(id, "br") || tree.is_comment(id) || tree.text(id).is_some_and(|t| t.trim().is_empty())
}

/// Removes whitespace-only text and `br` elements from both ends of the body.
pub fn trim_document(tree: &mut DomTree) -> Result<()> {
    let body = tree.body().ok_or_else(|| LecternError::InvalidDocument("document has no body".into()))?;
    let children = tree.children(body).to_vec();

    let mut edges: HashSet<NodeId> = children.iter().copied().take_while(|&c| is_edge_filler(tree, c)).collect();
    edges.extend(children.iter().rev().copied().take_while(|&c| is_edge_filler(tree, c)));
    if edges.is_empty() {
        return Ok(());
    }

    walk(tree, body, |_, id| if edges.contains(&id) { Decision::Remove } else { Decision::RetainRaw })
}
