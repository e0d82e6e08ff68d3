//! Structural normalization of the surviving content: anchors, emphasis,
//! presentational wrappers, lists, layout tables and line breaks.

use crate::Result;
use crate::dom_tree::{DomTree, NodeId};
use crate::scoring::visible_text_length;
use crate::walk::{Decision, walk_elements};

const EMPHASIS_TAGS: [&str; 5] = ["b", "em", "i", "mark", "strong"];

/// Presentational elements that add nothing to the reading view.
pub const FORMATTING_TAGS: [&str; 8] = ["big", "blink", "center", "font", "marquee", "nobr", "span", "tt"];

const LIST_TAGS: [&str; 3] = ["menu", "ol", "ul"];
const CELL_TAGS: [&str; 2] = ["td", "th"];

fn tag_in(tree: &DomTree, id: Option<NodeId>, tags: &[&str]) -> bool {
    id.and_then(|id| tree.tag_name(id)).is_some_and(|tag| tags.contains(&tag))
}

/// Unwraps `a` elements without an `href`.
pub fn unwrap_nameless_anchors(tree: &mut DomTree) -> Result<()> {
    let root = tree.root();
    walk_elements(tree, root, |tree, id| {
        if tree.has_tag(id, "a") && tree.attr(id, "href").is_none_or(|href| href.trim().is_empty()) {
            Decision::Unwrap
        } else {
            Decision::Retain
        }
    })
}

/// Unwraps emphasis spanning more than `max_length` characters; emphasis
/// that long is layout, not stress.
pub fn unwrap_long_emphasis(tree: &mut DomTree, max_length: usize) -> Result<()> {
    let root = tree.root();
    walk_elements(tree, root, |tree, id| {
        let emphasis = tree.tag_name(id).is_some_and(|tag| EMPHASIS_TAGS.contains(&tag));
        if emphasis && visible_text_length(tree, id) > max_length {
            Decision::Unwrap
        } else {
            Decision::Retain
        }
    })
}

pub fn unwrap_formatting_elements(tree: &mut DomTree) -> Result<()> {
    let root = tree.root();
    walk_elements(tree, root, |tree, id| {
        if tree.tag_name(id).is_some_and(|tag| FORMATTING_TAGS.contains(&tag)) {
            Decision::Unwrap
        } else {
            Decision::Retain
        }
    })
}

/// Removes empty lists, unwraps single-item lists and orphaned list items.
pub fn normalize_lists(tree: &mut DomTree) -> Result<()> {
    let root = tree.root();
    walk_elements(tree, root, |tree, id| {
        if tree.has_tag(id, "li") && !tag_in(tree, tree.parent(id), &LIST_TAGS) {
            return Decision::Unwrap;
        }
        if !tag_in(tree, Some(id), &LIST_TAGS) && !tree.has_tag(id, "dl") {
            return Decision::Retain;
        }

        if tree.text_content(id).trim().is_empty() && tree.child_elements(id).all(|c| tree.has_tag(c, "li")) {
            let has_media = tree.descendants(id).into_iter().any(|d| tree.is_element(d) && !tree.has_tag(d, "li"));
            if !has_media {
                return Decision::Remove;
            }
        }

        let items = tree.child_elements(id).filter(|&c| tree.has_tag(c, "li")).count();
        let others = tree.child_elements(id).filter(|&c| !tree.has_tag(c, "li")).count();
        if !tree.has_tag(id, "dl") && items == 1 && others == 0 {
            Decision::Unwrap
        } else {
            Decision::Retain
        }
    })
}

/// Rows belonging directly to `table`, skipping nested tables.
fn table_rows(tree: &DomTree, table: NodeId, limit: usize) -> Vec<NodeId> {
    tree.elements_by_tag(table, "tr")
        .into_iter()
        .filter(|&row| tree.ancestors(row).find(|&a| tree.has_tag(a, "table")) == Some(table))
        .take(limit)
        .collect()
}

/// True if every scanned row has at most one cell.
pub fn is_single_column_table(tree: &DomTree, table: NodeId, max_rows: usize) -> bool {
    table_rows(tree, table, max_rows)
        .into_iter()
        .all(|row| tree.child_elements(row).filter(|&c| tag_in(tree, Some(c), &CELL_TAGS)).count() <= 1)
}

/// Unwraps layout tables: tables whose first `max_rows` rows all have at
/// most one cell lose their table, section, row and cell wrappers.
pub fn normalize_tables(tree: &mut DomTree, max_rows: usize) -> Result<()> {
    let root = tree.root();
    walk_elements(tree, root, |tree, id| {
        let Some(tag) = tree.tag_name(id) else {
            return Decision::Retain;
        };
        let parent = tree.parent(id);
        match tag {
            "table" if is_single_column_table(tree, id, max_rows) => Decision::Unwrap,
            "caption" | "tbody" | "tfoot" | "thead" if !tag_in(tree, parent, &["table"]) => Decision::Unwrap,
            "colgroup" | "col" if !tag_in(tree, parent, &["table", "colgroup"]) => Decision::Remove,
            "tr" if !tag_in(tree, parent, &["table", "tbody", "tfoot", "thead"]) => Decision::Unwrap,
            "td" | "th" if !tag_in(tree, parent, &["tr"]) => Decision::Unwrap,
            _ => Decision::Retain,
        }
    })
}

/// Removes a `br` that directly follows another `br`, ignoring whitespace.
pub fn condense_line_breaks(tree: &mut DomTree) -> Result<()> {
    let root = tree.root();
    walk_elements(tree, root, |tree, id| {
        if !tree.has_tag(id, "br") {
            return Decision::Retain;
        }
        let mut previous = tree.previous_sibling(id);
        while let Some(sibling) = previous
            && tree.text(sibling).is_some_and(|t| t.trim().is_empty())
        {
            previous = tree.previous_sibling(sibling);
        }
        if previous.is_some_and(|p| tree.has_tag(p, "br")) { Decision::Remove } else { Decision::Retain }
    })
}
