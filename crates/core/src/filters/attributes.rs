//! Attribute whitelisting and cleanup.

use crate::Result;
use crate::dom_tree::DomTree;
use crate::options::AttributeWhitelist;
use crate::walk::{Decision, walk_elements};

/// Attributes whose presence alone carries meaning.
pub const BOOLEAN_ATTRIBUTES: [&str; 7] =
    ["allowfullscreen", "autoplay", "controls", "default", "loop", "muted", "reversed"];

/// Strips every attribute the whitelist does not allow for the element's tag.
pub fn filter_attribute_whitelist(tree: &mut DomTree, whitelist: &AttributeWhitelist) -> Result<()> {
    let root = tree.root();
    walk_elements(tree, root, |tree, id| {
        if let Some(element) = tree.element_mut(id) {
            let tag = element.tag_name().to_string();
            element.retain_attrs(|attribute| whitelist.allows(&tag, &attribute.name));
        }
        Decision::Retain
    })
}

/// Removes attributes whose value is empty after trimming, except boolean ones.
pub fn remove_empty_attributes(tree: &mut DomTree) -> Result<()> {
    let root = tree.root();
    walk_elements(tree, root, |tree, id| {
        if let Some(element) = tree.element_mut(id) {
            element.retain_attrs(|attribute| {
                !attribute.value.trim().is_empty()
                    || BOOLEAN_ATTRIBUTES.iter().any(|b| attribute.name.eq_ignore_ascii_case(b))
            });
        }
        Decision::Retain
    })
}
