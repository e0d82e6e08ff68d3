//! Depth-first traversal with in-place mutation.
//!
//! Filters never restructure the tree while iterating it themselves. They
//! return a [`Decision`] for each visited node and [`walk`] applies it, so the
//! one tricky part (mutating siblings and parents mid-traversal) lives here.
//!
//! # Example
//!
//! ```rust
//! use lectern_core::parse::parse_html;
//! use lectern_core::walk::{Decision, walk};
//!
//! let mut tree = parse_html("<body><p>keep</p><script>drop()</script></body>").unwrap();
//! let body = tree.body().unwrap();
//! walk(&mut tree, body, |tree, id| {
//!     if tree.has_tag(id, "script") { Decision::Remove } else { Decision::Retain }
//! })
//! .unwrap();
//! assert_eq!(tree.text_content(body), "keep");
//! ```

use crate::Result;
use crate::dom_tree::{DomTree, NodeId};

/// What the walker should do with a visited node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Keep the node and descend into its children.
    Retain,
    /// Keep the node but treat its subtree as opaque.
    RetainRaw,
    /// Detach the node and its subtree.
    Remove,
    /// Splice the children into the parent, drop the node, keep walking the children.
    Unwrap,
    /// Swap in the given detached node and descend into its children.
    ///
    /// The replacement itself is not visited, so the same pass never filters
    /// it.
    Replace(NodeId),
}

/// Visits every node strictly below `root` in pre-order, left to right.
///
/// `visit` may change attributes and text and may allocate detached nodes
/// (for [`Decision::Replace`]); it must not re-link nodes itself. Nodes that
/// are no longer below `root` when their turn comes are skipped, so a visit
/// can never observe an abandoned subtree.
///
/// # Errors
///
/// Returns [`crate::LecternError::InvalidDocument`] if a replacement node is
/// already attached or would create a cycle.
pub fn walk<F>(tree: &mut DomTree, root: NodeId, mut visit: F) -> Result<()>
where
    F: FnMut(&mut DomTree, NodeId) -> Decision,
{
    let mut stack: Vec<NodeId> = tree.children(root).iter().rev().copied().collect();

    while let Some(id) = stack.pop() {
        if id == root || !tree.is_ancestor_of(root, id) {
            continue;
        }

        match visit(tree, id) {
            Decision::Retain => stack.extend(tree.children(id).iter().rev()),
            Decision::RetainRaw => {}
            Decision::Remove => tree.detach(id),
            Decision::Unwrap => {
                let spliced = tree.unwrap(id);
                stack.extend(spliced.iter().rev());
            }
            Decision::Replace(replacement) => {
                tree.replace(id, replacement)?;
                stack.extend(tree.children(replacement).iter().rev());
            }
        }
    }

    Ok(())
}

/// Walks only element nodes; other nodes are retained untouched.
pub fn walk_elements<F>(tree: &mut DomTree, root: NodeId, mut visit: F) -> Result<()>
where
    F: FnMut(&mut DomTree, NodeId) -> Decision,
{
    walk(tree, root, |tree, id| if tree.is_element(id) { visit(tree, id) } else { Decision::Retain })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_html;
    use crate::serialize::inner_html;

    fn body_html(tree: &DomTree) -> String {
        inner_html(tree, tree.body().unwrap())
    }

    #[test]
    fn test_visits_in_document_order() {
        let mut tree = parse_html("<body><div><p>a</p><span>b</span></div><em>c</em></body>").unwrap();
        let body = tree.body().unwrap();
        let mut seen = Vec::new();
        walk_elements(&mut tree, body, |tree, id| {
            seen.push(tree.tag_name(id).unwrap_or_default().to_string());
            Decision::Retain
        })
        .unwrap();
        assert_eq!(seen, vec!["div", "p", "span", "em"]);
    }

    #[test]
    fn test_remove_skips_subtree_and_continues_with_sibling() {
        let mut tree = parse_html("<body><div><p>a</p></div><em>c</em></body>").unwrap();
        let body = tree.body().unwrap();
        let mut seen = Vec::new();
        walk_elements(&mut tree, body, |tree, id| {
            let tag = tree.tag_name(id).unwrap_or_default().to_string();
            seen.push(tag.clone());
            if tag == "div" { Decision::Remove } else { Decision::Retain }
        })
        .unwrap();
        assert_eq!(seen, vec!["div", "em"]);
        assert_eq!(body_html(&tree), "<em>c</em>");
    }

    #[test]
    fn test_unwrap_visits_spliced_children_once() {
        let mut tree = parse_html("<body><span><b>x</b><i>y</i></span><u>z</u></body>").unwrap();
        let body = tree.body().unwrap();
        let mut seen = Vec::new();
        walk_elements(&mut tree, body, |tree, id| {
            let tag = tree.tag_name(id).unwrap_or_default().to_string();
            seen.push(tag.clone());
            if tag == "span" { Decision::Unwrap } else { Decision::Retain }
        })
        .unwrap();
        assert_eq!(seen, vec!["span", "b", "i", "u"]);
        assert_eq!(body_html(&tree), "<b>x</b><i>y</i><u>z</u>");
    }

    #[test]
    fn test_nested_unwraps() {
        let mut tree = parse_html("<body><font><font><p>deep</p></font></font></body>").unwrap();
        let body = tree.body().unwrap();
        walk_elements(&mut tree, body, |tree, id| {
            if tree.has_tag(id, "font") { Decision::Unwrap } else { Decision::Retain }
        })
        .unwrap();
        assert_eq!(body_html(&tree), "<p>deep</p>");
    }

    #[test]
    fn test_retain_raw_skips_children() {
        let mut tree = parse_html("<body><object><script>x</script></object></body>").unwrap();
        let body = tree.body().unwrap();
        let mut seen = Vec::new();
        walk_elements(&mut tree, body, |tree, id| {
            seen.push(tree.tag_name(id).unwrap_or_default().to_string());
            if tree.has_tag(id, "object") { Decision::RetainRaw } else { Decision::Remove }
        })
        .unwrap();
        assert_eq!(seen, vec!["object"]);
        assert_eq!(body_html(&tree), "<object><script>x</script></object>");
    }

    #[test]
    fn test_replace_descends_into_replacement() {
        let mut tree = parse_html("<body><center><p>a</p></center></body>").unwrap();
        let body = tree.body().unwrap();
        let mut seen = Vec::new();
        walk_elements(&mut tree, body, |tree, id| {
            let tag = tree.tag_name(id).unwrap_or_default().to_string();
            seen.push(tag.clone());
            if tag == "center" {
                let div = tree.create_element("div");
                let text = tree.create_text("new");
                let p = tree.create_element("p");
                tree.append(p, text).ok();
                tree.append(div, p).ok();
                Decision::Replace(div)
            } else {
                Decision::Retain
            }
        })
        .unwrap();
        assert_eq!(seen, vec!["center", "p"]);
        assert_eq!(body_html(&tree), "<div><p>new</p></div>");
    }

    #[test]
    fn test_replace_with_attached_node_fails() {
        let mut tree = parse_html("<body><p>a</p><p>b</p></body>").unwrap();
        let body = tree.body().unwrap();
        let first = tree.children(body)[0];
        let result = walk_elements(&mut tree, body, |_, id| {
            if id == first { Decision::Retain } else { Decision::Replace(first) }
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_tree_stays_consistent_after_mixed_decisions() {
        let mut tree =
            parse_html("<body><div><span>a</span><script>b</script><em>c</em></div><nav>d</nav></body>").unwrap();
        let body = tree.body().unwrap();
        walk_elements(&mut tree, body, |tree, id| match tree.tag_name(id) {
            Some("span") | Some("div") => Decision::Unwrap,
            Some("script") | Some("nav") => Decision::Remove,
            _ => Decision::Retain,
        })
        .unwrap();
        assert_eq!(body_html(&tree), "a<em>c</em>");
        for id in tree.descendants(body) {
            let parent = tree.parent(id).unwrap();
            assert_eq!(tree.children(parent).iter().filter(|&&c| c == id).count(), 1);
        }
    }
}
