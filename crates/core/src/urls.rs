//! Resolution of relative resource references.
//!
//! Every URL-bearing attribute in the document is rewritten to an absolute
//! URL against the document's base. Values that already carry a scheme
//! (`https:`, `javascript:`, `data:`, `mailto:`, `tel:` …) are never touched,
//! and a value that cannot be joined is left as it was.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::Result;
use crate::dom_tree::{DomTree, NodeId};
use crate::srcset::{SrcsetEntry, parse_srcset, serialize_srcset};
use crate::walk::{Decision, walk_elements};

/// Schemes that are deliberately never resolved or rewritten.
pub const EXCLUDED_SCHEMES: [&str; 4] = ["javascript", "data", "mailto", "tel"];

/// `(tag, attribute)` pairs holding a single URL.
const URL_ATTRIBUTES: &[(&str, &str)] = &[
    ("a", "href"),
    ("area", "href"),
    ("audio", "src"),
    ("blockquote", "cite"),
    ("body", "background"),
    ("button", "formaction"),
    ("del", "cite"),
    ("embed", "src"),
    ("form", "action"),
    ("frame", "longdesc"),
    ("frame", "src"),
    ("iframe", "longdesc"),
    ("iframe", "src"),
    ("img", "longdesc"),
    ("img", "src"),
    ("input", "formaction"),
    ("input", "src"),
    ("ins", "cite"),
    ("link", "href"),
    ("object", "data"),
    ("q", "cite"),
    ("script", "src"),
    ("source", "src"),
    ("track", "src"),
    ("video", "poster"),
    ("video", "src"),
];

/// `(tag, attribute)` pairs holding a `srcset` list.
const SRCSET_ATTRIBUTES: &[(&str, &str)] = &[("img", "srcset"), ("source", "srcset")];

static SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.\-]*:").expect("valid scheme regex"));

/// True if the value starts with an explicit `scheme:`.
pub fn has_scheme(value: &str) -> bool {
    SCHEME_RE.is_match(value.trim_start())
}

/// True if the value uses one of [`EXCLUDED_SCHEMES`].
pub fn is_excluded_scheme(value: &str) -> bool {
    let value = value.trim_start();
    EXCLUDED_SCHEMES.iter().any(|scheme| {
        value.get(..scheme.len()).is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
            && value[scheme.len()..].starts_with(':')
    })
}

/// Resolves `value` against `base`.
///
/// Returns `None` when the value must stay untouched: it is empty, a bare
/// fragment, already has a scheme, or cannot be joined.
pub fn resolve_url(base: &Url, value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') || has_scheme(trimmed) {
        return None;
    }
    match base.join(trimmed) {
        Ok(resolved) => Some(resolved.to_string()),
        Err(e) => {
            tracing::debug!(value = trimmed, error = %e, "leaving unresolvable URL as is");
            None
        }
    }
}

/// Resolves each candidate of a `srcset` value independently.
///
/// Candidates that cannot be resolved or carry a malformed descriptor keep
/// their original text; order and descriptors are preserved.
pub fn resolve_srcset(base: &Url, value: &str) -> String {
    let entries: Vec<SrcsetEntry> = parse_srcset(value)
        .into_iter()
        .map(|entry| {
            if entry.is_malformed() {
                return entry;
            }
            match resolve_url(base, &entry.url) {
                Some(url) => SrcsetEntry { url, ..entry },
                None => entry,
            }
        })
        .collect();
    serialize_srcset(&entries)
}

/// Consumes `base` elements and resolves all URL attributes in place.
///
/// The first `base[href]` (joined to `document_url`) becomes the effective
/// base for the document, which is returned for later filters.
pub fn resolve_document_urls(tree: &mut DomTree, document_url: &Url) -> Result<Url> {
    let root = tree.root();
    let bases = tree.elements_by_tag(root, "base");
    let declared = bases.iter().find_map(|&id| {
        let href = tree.attr(id, "href")?;
        document_url.join(href.trim()).ok()
    });
    for id in bases {
        tree.detach(id);
    }

    let base = declared.unwrap_or_else(|| document_url.clone());
    if base.cannot_be_a_base() {
        tracing::warn!(url = %base, "document URL cannot act as a base; relative URLs stay unresolved");
        return Ok(base);
    }

    walk_elements(tree, root, |tree, id| {
        resolve_element(tree, id, &base);
        Decision::Retain
    })?;
    Ok(base)
}

fn resolve_element(tree: &mut DomTree, id: NodeId, base: &Url) {
    let Some(tag) = tree.tag_name(id).map(str::to_string) else {
        return;
    };

    for &(_, attribute) in URL_ATTRIBUTES.iter().filter(|(t, _)| *t == tag) {
        if let Some(resolved) = tree.attr(id, attribute).and_then(|value| resolve_url(base, value)) {
            tree.set_attr(id, attribute, &resolved);
        }
    }

    for &(_, attribute) in SRCSET_ATTRIBUTES.iter().filter(|(t, _)| *t == tag) {
        if let Some(value) = tree.attr(id, attribute) {
            let resolved = resolve_srcset(base, value);
            tree.set_attr(id, attribute, &resolved);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_html;
    use rstest::rstest;

    fn base() -> Url {
        Url::parse("https://example.com/blog/post").unwrap()
    }

    #[rstest]
    #[case("/about", Some("https://example.com/about"))]
    #[case("img/a.png", Some("https://example.com/blog/img/a.png"))]
    #[case("//cdn.example.net/x.js", Some("https://cdn.example.net/x.js"))]
    #[case("https://other.org/", None)]
    #[case("javascript:evil()", None)]
    #[case("data:image/png;base64,AAAA", None)]
    #[case("mailto:me@example.com", None)]
    #[case("tel:+15555555", None)]
    #[case("#section", None)]
    #[case("", None)]
    #[case("//[broken", None)]
    fn test_resolve_url(#[case] value: &str, #[case] expected: Option<&str>) {
        assert_eq!(resolve_url(&base(), value).as_deref(), expected);
    }

    #[test]
    fn test_excluded_schemes() {
        assert!(is_excluded_scheme("JavaScript:void(0)"));
        assert!(is_excluded_scheme("data:,x"));
        assert!(!is_excluded_scheme("https://example.com"));
        assert!(!is_excluded_scheme("datafile.png"));
        assert!(!is_excluded_scheme("图片.jpg"));
        assert!(!is_excluded_scheme("d图"));
    }

    #[test]
    fn test_srcset_keeps_malformed_entry() {
        let resolved = resolve_srcset(&base(), "a.png 1x, //[broken 2x, /c.png 640w");
        assert_eq!(
            resolved,
            "https://example.com/blog/a.png 1x, //[broken 2x, https://example.com/c.png 640w"
        );
    }

    #[test]
    fn test_srcset_keeps_entry_with_unknown_descriptor() {
        let resolved = resolve_srcset(&base(), "a.png 1x, b.png 2q, c.png 640w");
        assert_eq!(
            resolved,
            "https://example.com/blog/a.png 1x, b.png 2q, https://example.com/blog/c.png 640w"
        );
    }

    #[test]
    fn test_resolve_document_urls() {
        let mut tree = parse_html(
            r#"<html><body>
                <a href="/post">Post</a>
                <a href="javascript:evil()">Evil</a>
                <img src="image.jpg" srcset="small.jpg 1x, large.jpg 2x">
                <video poster="poster.png"><source src="movie.mp4"></video>
                <blockquote cite="quotes/1">q</blockquote>
            </body></html>"#,
        )
        .unwrap();
        resolve_document_urls(&mut tree, &base()).unwrap();

        let root = tree.root();
        let anchors = tree.elements_by_tag(root, "a");
        assert_eq!(tree.attr(anchors[0], "href"), Some("https://example.com/post"));
        assert_eq!(tree.attr(anchors[1], "href"), Some("javascript:evil()"));
        let img = tree.find_first(root, "img").unwrap();
        assert_eq!(tree.attr(img, "src"), Some("https://example.com/blog/image.jpg"));
        assert_eq!(
            tree.attr(img, "srcset"),
            Some("https://example.com/blog/small.jpg 1x, https://example.com/blog/large.jpg 2x")
        );
        let video = tree.find_first(root, "video").unwrap();
        assert_eq!(tree.attr(video, "poster"), Some("https://example.com/blog/poster.png"));
        let source = tree.find_first(root, "source").unwrap();
        assert_eq!(tree.attr(source, "src"), Some("https://example.com/blog/movie.mp4"));
        let quote = tree.find_first(root, "blockquote").unwrap();
        assert_eq!(tree.attr(quote, "cite"), Some("https://example.com/blog/quotes/1"));
    }

    #[test]
    fn test_base_element_is_consumed() {
        let mut tree = parse_html(
            r#"<html><head><base href="/static/"></head><body><img src="a.png"></body></html>"#,
        )
        .unwrap();
        let effective = resolve_document_urls(&mut tree, &base()).unwrap();
        assert_eq!(effective.as_str(), "https://example.com/static/");

        let root = tree.root();
        assert!(tree.find_first(root, "base").is_none());
        let img = tree.find_first(root, "img").unwrap();
        assert_eq!(tree.attr(img, "src"), Some("https://example.com/static/a.png"));
    }
}
