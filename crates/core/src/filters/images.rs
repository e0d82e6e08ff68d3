//! Lazy-loading and responsive image normalization.

use url::Url;

use crate::Result;
use crate::dom_tree::{DomTree, NodeId};
use crate::srcset::{best_candidate, parse_srcset};
use crate::urls::{is_excluded_scheme, resolve_srcset, resolve_url};
use crate::walk::{Decision, walk_elements};

/// Attributes lazy-loading scripts park the real `src` in, by preference.
pub const LAZY_SRC_ATTRIBUTES: [&str; 8] = [
    "data-src",
    "data-lazy-src",
    "data-original",
    "data-hi-res-src",
    "data-lazyload",
    "data-echo",
    "data-url",
    "data-actualsrc",
];

/// Attributes lazy-loading scripts park the real `srcset` in.
pub const LAZY_SRCSET_ATTRIBUTES: [&str; 3] = ["data-srcset", "data-lazy-srcset", "data-original-set"];

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

/// A `src` that is missing, empty, or an inline placeholder.
fn needs_real_source(value: Option<&str>) -> bool {
    value.is_none_or(|v| {
        let v = v.trim();
        v.is_empty() || v.get(..5).is_some_and(|p| p.eq_ignore_ascii_case("data:"))
    })
}

fn absolutize(base: &Url, value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || is_excluded_scheme(value) {
        return None;
    }
    Some(resolve_url(base, value).unwrap_or_else(|| value.to_string()))
}

/// Copies the real source out of lazy-loading attributes.
///
/// `src` is replaced when it is missing, empty or a `data:` placeholder;
/// `srcset` only when missing or empty. Promoted values are resolved against
/// `base`.
pub fn normalize_lazy_images(tree: &mut DomTree, base: &Url) -> Result<()> {
    let root = tree.root();
    walk_elements(tree, root, |tree, id| {
        if tree.has_tag(id, "img") || tree.has_tag(id, "source") {
            promote_lazy_attributes(tree, id, base);
        }
        Decision::Retain
    })
}

fn promote_lazy_attributes(tree: &mut DomTree, id: NodeId, base: &Url) {
    if tree.has_tag(id, "img") && needs_real_source(tree.attr(id, "src")) {
        let promoted = LAZY_SRC_ATTRIBUTES
            .iter()
            .find_map(|name| tree.attr(id, name).and_then(|value| absolutize(base, value)));
        if let Some(src) = promoted {
            tracing::debug!(src = %src, "promoting lazy image source");
            tree.set_attr(id, "src", &src);
        }
    }

    if is_blank(tree.attr(id, "srcset")) {
        let promoted = LAZY_SRCSET_ATTRIBUTES
            .iter()
            .find_map(|name| tree.attr(id, name).filter(|v| !v.trim().is_empty()).map(|v| resolve_srcset(base, v)));
        if let Some(srcset) = promoted {
            tree.set_attr(id, "srcset", &srcset);
        }
    }
}

/// The best candidate URL of a `srcset` value.
fn best_srcset_url(value: &str) -> Option<String> {
    best_candidate(&parse_srcset(value)).map(|entry| entry.url.clone())
}

/// Collapses `picture` elements to a single `img` and gives `srcset`-only
/// images a `src`.
pub fn collapse_responsive_images(tree: &mut DomTree) -> Result<()> {
    let root = tree.root();
    walk_elements(tree, root, |tree, id| {
        if tree.has_tag(id, "picture") {
            return collapse_picture(tree, id);
        }
        if tree.has_tag(id, "img")
            && is_blank(tree.attr(id, "src"))
            && let Some(src) = tree.attr(id, "srcset").and_then(best_srcset_url)
        {
            tree.set_attr(id, "src", &src);
        }
        Decision::Retain
    })
}

fn collapse_picture(tree: &mut DomTree, picture: NodeId) -> Decision {
    let img = tree.find_first(picture, "img");
    let fallback = tree
        .elements_by_tag(picture, "source")
        .into_iter()
        .find_map(|source| {
            let srcset = tree.attr(source, "srcset").and_then(best_srcset_url);
            srcset.or_else(|| tree.attr(source, "src").filter(|s| !s.trim().is_empty()).map(str::to_string))
        });

    let replacement = match img {
        Some(img) => tree.shallow_clone(img),
        None if fallback.is_some() => tree.create_element("img"),
        None => return Decision::Remove,
    };

    if is_blank(tree.attr(replacement, "src")) {
        let src = tree.attr(replacement, "srcset").and_then(best_srcset_url).or(fallback);
        if let Some(src) = src {
            tree.set_attr(replacement, "src", &src);
        }
    }
    Decision::Replace(replacement)
}

/// Removes images with neither a usable `src` nor a `srcset`.
pub fn remove_sourceless_images(tree: &mut DomTree) -> Result<()> {
    let root = tree.root();
    walk_elements(tree, root, |tree, id| {
        if tree.has_tag(id, "img") && is_blank(tree.attr(id, "src")) && is_blank(tree.attr(id, "srcset")) {
            Decision::Remove
        } else {
            Decision::Retain
        }
    })
}
