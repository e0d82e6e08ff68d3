//! Removal of comments, scripts, embeds and non-content elements.

use crate::Result;
use crate::dom_tree::DomTree;
use crate::walk::{Decision, walk, walk_elements};

const SCRIPT_TAGS: [&str; 2] = ["script", "noscript"];

/// Elements that embed foreign documents or plugins.
pub const EMBED_TAGS: [&str; 4] = ["applet", "embed", "iframe", "object"];

/// Elements that never carry article content.
pub const BLACKLISTED_TAGS: &[&str] = &[
    "base",
    "basefont",
    "bgsound",
    "button",
    "command",
    "datalist",
    "dialog",
    "fieldset",
    "head",
    "input",
    "isindex",
    "keygen",
    "label",
    "link",
    "menu",
    "menuitem",
    "meta",
    "optgroup",
    "option",
    "output",
    "param",
    "select",
    "style",
    "template",
    "textarea",
    "title",
];

/// Elements whose content is kept while the element itself goes.
const UNWRAPPED_TAGS: [&str; 1] = ["form"];

pub fn remove_comments(tree: &mut DomTree) -> Result<()> {
    let root = tree.root();
    walk(tree, root, |tree, id| if tree.is_comment(id) { Decision::Remove } else { Decision::Retain })
}

pub fn remove_script_elements(tree: &mut DomTree) -> Result<()> {
    let root = tree.root();
    walk_elements(tree, root, |tree, id| {
        if tree.tag_name(id).is_some_and(|tag| SCRIPT_TAGS.contains(&tag)) {
            Decision::Remove
        } else {
            Decision::Retain
        }
    })
}

/// Drops embedded documents, or keeps them untouched when `preserve` is set.
pub fn filter_embeds(tree: &mut DomTree, preserve: bool) -> Result<()> {
    let root = tree.root();
    walk_elements(tree, root, |tree, id| match tree.tag_name(id) {
        Some(tag) if EMBED_TAGS.contains(&tag) => {
            if preserve && tag != "applet" {
                Decision::RetainRaw
            } else {
                Decision::Remove
            }
        }
        _ => Decision::Retain,
    })
}

pub fn remove_blacklisted_elements(tree: &mut DomTree) -> Result<()> {
    let root = tree.root();
    walk_elements(tree, root, |tree, id| match tree.tag_name(id) {
        Some(tag) if BLACKLISTED_TAGS.contains(&tag) => Decision::Remove,
        Some(tag) if UNWRAPPED_TAGS.contains(&tag) => Decision::Unwrap,
        _ => Decision::Retain,
    })
}
