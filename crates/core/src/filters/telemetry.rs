//! Tracking pixel removal.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::Result;
use crate::dom_tree::{DomTree, NodeId};
use crate::walk::{Decision, walk_elements};

use super::image_size::parse_dimension;
use super::images::LAZY_SRC_ATTRIBUTES;

/// Hosts that only ever serve analytics images.
const TRACKER_HOSTS: &[&str] = &[
    "ad.doubleclick.net",
    "analytics.twitter.com",
    "b.scorecardresearch.com",
    "bat.bing.com",
    "certify.alexametrics.com",
    "google-analytics.com",
    "mc.yandex.ru",
    "pi.pardot.com",
    "pixel.mathtag.com",
    "pixel.quantserve.com",
    "pixel.wp.com",
    "px.ads.linkedin.com",
    "sb.scorecardresearch.com",
    "sp.analytics.yahoo.com",
    "stats.g.doubleclick.net",
    "stats.wordpress.com",
    "track.hubspot.com",
    "www.facebook.com/tr",
    "www.google-analytics.com",
];

/// Second-level labels under which registrations happen one level deeper.
const SECOND_LEVEL_SUFFIXES: &[&str] = &["ac", "co", "com", "edu", "gov", "ne", "net", "or", "org"];

/// Prefix of the ubiquitous transparent 1×1 GIF data URI.
const PIXEL_GIF_DATA_URI: &str = "data:image/gif;base64,r0lgodlhaqabai";

static TRACKER_PATTERN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:^|[/._\-?=&])(?:pixel|beacon|track(?:ing|er)?|analytics|stats|collect|impression|spacer|1x1|clear\.gif|blank\.gif)(?:[/._\-?=&]|$)",
    )
    .expect("valid tracker regex")
});

/// Registrable part of a host name (`news.bbc.co.uk` → `bbc.co.uk`).
///
/// Uses the last two labels, or three when the second-to-last is a common
/// second-level suffix under a two-letter country code.
pub fn registrable_domain(host: &str) -> String {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() <= 2 || host.parse::<std::net::IpAddr>().is_ok() {
        return host;
    }

    let n = labels.len();
    let take = if labels[n - 1].len() == 2 && SECOND_LEVEL_SUFFIXES.contains(&labels[n - 2]) { 3 } else { 2 };
    labels[n.saturating_sub(take)..].join(".")
}

fn is_tracker_host(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    let host_and_path = format!("{}{}", host, url.path());

    TRACKER_HOSTS.iter().any(|tracker| match tracker.split_once('/') {
        Some(_) => host_and_path.starts_with(tracker),
        None => host == *tracker || host.ends_with(&format!(".{}", tracker)),
    })
}

fn is_cross_site(url: &Url, document_url: &Url) -> bool {
    match (url.host_str(), document_url.host_str()) {
        (Some(image), Some(document)) => registrable_domain(image) != registrable_domain(document),
        _ => false,
    }
}

/// True if the image is declared at 1×1 pixel or smaller.
pub fn is_tiny_image(tree: &DomTree, id: NodeId) -> bool {
    let width = tree.attr(id, "width").and_then(parse_dimension);
    let height = tree.attr(id, "height").and_then(parse_dimension);
    matches!((width, height), (Some(w), Some(h)) if w <= 1 && h <= 1)
}

/// True if `src` looks like a tracking pixel for a page at `document_url`.
pub fn is_telemetry_source(src: &str, document_url: &Url) -> bool {
    let src = src.trim();
    if src.to_ascii_lowercase().starts_with(PIXEL_GIF_DATA_URI) {
        return true;
    }
    let Ok(url) = Url::parse(src) else {
        return false;
    };
    if is_tracker_host(&url) {
        return true;
    }

    let host_and_path = format!("{}{}", url.host_str().unwrap_or_default(), url.path());
    is_cross_site(&url, document_url) && TRACKER_PATTERN_RE.is_match(&host_and_path)
}

/// An inline `src` parked on an image that lazy loading will fill in later.
fn is_lazy_placeholder(tree: &DomTree, id: NodeId, src: &str) -> bool {
    src.trim_start().get(..5).is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
        && LAZY_SRC_ATTRIBUTES.iter().any(|name| tree.attr(id, name).is_some())
}

/// Removes images that are tiny or served by trackers.
///
/// A pixel GIF standing in for a lazily loaded source is left for the
/// lazy-image filter.
pub fn remove_telemetry_images(tree: &mut DomTree, document_url: &Url) -> Result<()> {
    let root = tree.root();
    walk_elements(tree, root, |tree, id| {
        if !tree.has_tag(id, "img") {
            return Decision::Retain;
        }
        let tracked = tree
            .attr(id, "src")
            .is_some_and(|src| is_telemetry_source(src, document_url) && !is_lazy_placeholder(tree, id, src));
        if tracked || is_tiny_image(tree, id) {
            tracing::debug!(src = tree.attr(id, "src"), "removing telemetry image");
            Decision::Remove
        } else {
            Decision::Retain
        }
    })
}

/// Removes images whose size, now known, is 1×1 or smaller.
pub fn remove_tiny_images(tree: &mut DomTree) -> Result<()> {
    let root = tree.root();
    walk_elements(tree, root, |tree, id| {
        if tree.has_tag(id, "img") && is_tiny_image(tree, id) { Decision::Remove } else { Decision::Retain }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_html;
    use rstest::rstest;

    fn page() -> Url {
        Url::parse("https://news.example.co.uk/story").unwrap()
    }

    #[rstest]
    #[case("news.bbc.co.uk", "bbc.co.uk")]
    #[case("www.example.com", "example.com")]
    #[case("example.com", "example.com")]
    #[case("cdn.assets.example.org", "example.org")]
    #[case("127.0.0.1", "127.0.0.1")]
    fn test_registrable_domain(#[case] host: &str, #[case] expected: &str) {
        assert_eq!(registrable_domain(host), expected);
    }

    #[rstest]
    #[case("https://www.google-analytics.com/collect?v=1", true)]
    #[case("https://pixel.wp.com/g.gif", true)]
    #[case("https://www.facebook.com/tr?id=1", true)]
    #[case("https://metrics.othersite.com/pixel.gif", true)]
    #[case("https://img.example.co.uk/pixel.gif", false)]
    #[case("https://cdn.othersite.com/photos/statue.jpg", false)]
    #[case("data:image/gif;base64,R0lGODlhAQABAIAAAP", true)]
    #[case("/relative/pixel.gif", false)]
    fn test_is_telemetry_source(#[case] src: &str, #[case] expected: bool) {
        assert_eq!(is_telemetry_source(src, &page()), expected);
    }

    #[test]
    fn test_removes_pixels_and_trackers() {
        let mut tree = parse_html(
            r#"<body>
                <img src="https://news.example.co.uk/photo.jpg" width="600" height="400">
                <img src="https://news.example.co.uk/p.gif" width="1" height="1">
                <img src="https://stats.wordpress.com/b.gif">
            </body>"#,
        )
        .unwrap();
        remove_telemetry_images(&mut tree, &page()).unwrap();

        let images = tree.elements_by_tag(tree.root(), "img");
        assert_eq!(images.len(), 1);
        assert_eq!(tree.attr(images[0], "src"), Some("https://news.example.co.uk/photo.jpg"));
    }

    #[test]
    fn test_lazy_placeholder_survives() {
        let mut tree = parse_html(
            r#"<body><img src="data:image/gif;base64,R0lGODlhAQABAIAAAP" data-src="/real.jpg"><img src="data:image/gif;base64,R0lGODlhAQABAIAAAP"></body>"#,
        )
        .unwrap();
        remove_telemetry_images(&mut tree, &page()).unwrap();

        let images = tree.elements_by_tag(tree.root(), "img");
        assert_eq!(images.len(), 1);
        assert_eq!(tree.attr(images[0], "data-src"), Some("/real.jpg"));
    }

    #[test]
    fn test_remove_tiny_images_ignores_unknown_sizes() {
        let mut tree = parse_html(r#"<body><img src="a.png"><img src="b.png" width="0" height="1"></body>"#).unwrap();
        remove_tiny_images(&mut tree).unwrap();
        assert_eq!(tree.elements_by_tag(tree.root(), "img").len(), 1);
    }
}
