//! Image dimension inference.
//!
//! Images without `width`/`height` attributes get them from, in order: inline
//! style, size hints in the URL (query parameters or a `640x480` file name),
//! and finally a bounded fetch through an [`ImageFetcher`]. Every failure just
//! leaves the image dimensionless.

use std::future::Future;
use std::sync::LazyLock;
use std::time::Duration;

use futures::future::join_all;
use regex::Regex;
use url::Url;

use crate::dom_tree::{DomTree, NodeId};
use crate::srcset::parse_srcset;
use crate::walk::{Decision, walk_elements};
use crate::{LecternError, Result};

static STYLE_WIDTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|;)\s*width\s*:\s*(\d+(?:\.\d+)?)\s*(?:px)?\s*(?:;|$)").expect("valid regex"));
static STYLE_HEIGHT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|;)\s*height\s*:\s*(\d+(?:\.\d+)?)\s*(?:px)?\s*(?:;|$)").expect("valid regex"));
static FILENAME_SIZE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|[^0-9])(\d{1,5})x(\d{1,5})(?:[^0-9]|$)").expect("valid regex"));

const WIDTH_KEYS: [&str; 2] = ["w", "width"];
const HEIGHT_KEYS: [&str; 2] = ["h", "height"];

/// Pixel size of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> f64 {
        f64::from(self.width) * f64::from(self.height)
    }
}

/// Something that can find out how large a remote image is.
pub trait ImageFetcher: Send + Sync {
    fn fetch_image_dimensions(&self, url: &Url) -> impl Future<Output = Result<Dimensions>> + Send;
}

/// Parses an HTML dimension attribute (`"640"`, `"640px"`). Percentages are rejected.
pub fn parse_dimension(value: &str) -> Option<u32> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value).trim();
    number.parse::<f64>().ok().filter(|n| n.is_finite() && *n >= 0.0).map(|n| n.round() as u32)
}

/// Dimensions from the `width` and `height` attributes, when both parse.
pub fn declared_dimensions(tree: &DomTree, id: NodeId) -> Option<Dimensions> {
    let width = tree.attr(id, "width").and_then(parse_dimension)?;
    let height = tree.attr(id, "height").and_then(parse_dimension)?;
    Some(Dimensions::new(width, height))
}

/// Pixel width and height declared in an inline style.
pub fn style_dimensions(style: &str) -> Option<Dimensions> {
    let width = STYLE_WIDTH_RE.captures(style)?.get(1)?.as_str().parse::<f64>().ok()?;
    let height = STYLE_HEIGHT_RE.captures(style)?.get(1)?.as_str().parse::<f64>().ok()?;
    Some(Dimensions::new(width.round() as u32, height.round() as u32))
}

/// Size hints carried by an image URL.
///
/// Looks at `w`/`width` and `h`/`height` query parameters first, then a
/// `WIDTHxHEIGHT` pattern in the file name. Works on relative URLs too.
pub fn url_dimensions(value: &str) -> Option<Dimensions> {
    let without_fragment = value.split('#').next().unwrap_or(value);
    let (path, query) = match without_fragment.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (without_fragment, None),
    };

    if let Some(query) = query {
        let mut width = None;
        let mut height = None;
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let key = key.to_ascii_lowercase();
            let parsed = value.trim().parse::<u32>().ok().filter(|n| *n > 0);
            if WIDTH_KEYS.contains(&key.as_str()) {
                width = width.or(parsed);
            } else if HEIGHT_KEYS.contains(&key.as_str()) {
                height = height.or(parsed);
            }
        }
        if let (Some(width), Some(height)) = (width, height) {
            return Some(Dimensions::new(width, height));
        }
    }

    let file_name = path.rsplit('/').next().unwrap_or(path);
    let caps = FILENAME_SIZE_RE.captures(file_name)?;
    let width = caps.get(1)?.as_str().parse().ok()?;
    let height = caps.get(2)?.as_str().parse().ok()?;
    Some(Dimensions::new(width, height))
}

/// Reads width and height from the first bytes of a PNG, GIF, JPEG or WebP file.
pub fn sniff_dimensions(data: &[u8]) -> Option<Dimensions> {
    if data.len() < 10 {
        return None;
    }

    if data.starts_with(b"\x89PNG") && data.len() >= 24 {
        let width = u32::from_be_bytes([data[16], data[17], data[18], data[19]]);
        let height = u32::from_be_bytes([data[20], data[21], data[22], data[23]]);
        return Some(Dimensions::new(width, height));
    }

    if data.starts_with(b"GIF") {
        let width = u32::from(u16::from_le_bytes([data[6], data[7]]));
        let height = u32::from(u16::from_le_bytes([data[8], data[9]]));
        return Some(Dimensions::new(width, height));
    }

    if data[0] == 0xFF && data[1] == 0xD8 {
        return sniff_jpeg(data);
    }

    if data.len() >= 30 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return sniff_webp(data);
    }

    None
}

fn sniff_jpeg(data: &[u8]) -> Option<Dimensions> {
    let mut i = 2;
    while i + 4 < data.len() {
        if data[i] != 0xFF {
            i += 1;
            continue;
        }

        let marker = data[i + 1];
        let is_sof = matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF);
        if is_sof && i + 8 < data.len() {
            let height = u32::from(u16::from_be_bytes([data[i + 5], data[i + 6]]));
            let width = u32::from(u16::from_be_bytes([data[i + 7], data[i + 8]]));
            return Some(Dimensions::new(width, height));
        }

        let length = usize::from(u16::from_be_bytes([data[i + 2], data[i + 3]]));
        i += 2 + length;
    }
    None
}

fn sniff_webp(data: &[u8]) -> Option<Dimensions> {
    match &data[12..16] {
        b"VP8 " => {
            let width = u32::from(u16::from_le_bytes([data[26], data[27]]) & 0x3FFF);
            let height = u32::from(u16::from_le_bytes([data[28], data[29]]) & 0x3FFF);
            Some(Dimensions::new(width, height))
        }
        b"VP8L" => {
            let (b0, b1, b2, b3) = (u32::from(data[21]), u32::from(data[22]), u32::from(data[23]), u32::from(data[24]));
            let width = 1 + (((b1 & 0x3F) << 8) | b0);
            let height = 1 + (((b3 & 0x0F) << 10) | (b2 << 2) | ((b1 & 0xC0) >> 6));
            Some(Dimensions::new(width, height))
        }
        b"VP8X" => {
            let width = 1 + u32::from_le_bytes([data[24], data[25], data[26], 0]);
            let height = 1 + u32::from_le_bytes([data[27], data[28], data[29], 0]);
            Some(Dimensions::new(width, height))
        }
        _ => None,
    }
}

fn set_dimensions(tree: &mut DomTree, id: NodeId, dimensions: Dimensions) {
    tree.set_attr(id, "width", &dimensions.width.to_string());
    tree.set_attr(id, "height", &dimensions.height.to_string());
}

/// Dimensions that can be inferred without touching the network.
fn local_dimensions(tree: &DomTree, id: NodeId) -> Option<Dimensions> {
    if let Some(dims) = tree.attr(id, "style").and_then(style_dimensions) {
        return Some(dims);
    }
    if let Some(dims) = tree.attr(id, "src").and_then(url_dimensions) {
        return Some(dims);
    }
    tree.attr(id, "srcset")
        .map(parse_srcset)
        .unwrap_or_default()
        .iter()
        .find_map(|entry| url_dimensions(&entry.url))
}

/// Fills in dimensions from style and URL hints.
///
/// Returns the images that are still dimensionless, in document order.
pub fn infer_image_sizes_offline(tree: &mut DomTree) -> Result<Vec<NodeId>> {
    let mut unknown = Vec::new();
    let root = tree.root();
    walk_elements(tree, root, |tree, id| {
        if tree.has_tag(id, "img") && declared_dimensions(tree, id).is_none() {
            match local_dimensions(tree, id) {
                Some(dims) => set_dimensions(tree, id, dims),
                None => unknown.push(id),
            }
        }
        Decision::Retain
    })?;
    Ok(unknown)
}

/// Fills in dimensions from hints, then fetches the rest concurrently.
///
/// Each fetch is bounded by `timeout` (`None` waits indefinitely). Failed or
/// timed-out fetches are logged and leave the image untouched.
pub async fn infer_image_sizes<F: ImageFetcher>(
    tree: &mut DomTree,
    fetcher: &F,
    timeout: Option<Duration>,
) -> Result<()> {
    let pending = infer_image_sizes_offline(tree)?;
    let requests: Vec<(NodeId, Url)> = pending
        .into_iter()
        .filter_map(|id| {
            let url = Url::parse(tree.attr(id, "src")?.trim()).ok()?;
            matches!(url.scheme(), "http" | "https").then_some((id, url))
        })
        .collect();

    if requests.is_empty() {
        return Ok(());
    }
    tracing::debug!(count = requests.len(), "fetching image dimensions");

    let results = join_all(requests.iter().map(|(_, url)| fetch_bounded(fetcher, url, timeout))).await;

    for ((id, url), result) in requests.iter().zip(results) {
        match result {
            Ok(dims) => set_dimensions(tree, *id, dims),
            Err(e) => tracing::debug!(url = %url, error = %e, "image size stays unknown"),
        }
    }
    Ok(())
}

async fn fetch_bounded<F: ImageFetcher>(fetcher: &F, url: &Url, timeout: Option<Duration>) -> Result<Dimensions> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fetcher.fetch_image_dimensions(url))
            .await
            .map_err(|_| LecternError::ImageFetch(format!("timed out after {} ms", limit.as_millis())))?,
        None => fetcher.fetch_image_dimensions(url).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_html;
    use rstest::rstest;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedFetcher {
        calls: AtomicUsize,
    }

    impl ImageFetcher for FixedFetcher {
        async fn fetch_image_dimensions(&self, url: &Url) -> Result<Dimensions> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if url.path().ends_with("missing.png") {
                return Err(LecternError::ImageFetch("404".into()));
            }
            Ok(Dimensions::new(320, 240))
        }
    }

    struct SlowFetcher;

    impl ImageFetcher for SlowFetcher {
        async fn fetch_image_dimensions(&self, _url: &Url) -> Result<Dimensions> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Dimensions::new(1, 1))
        }
    }

    #[rstest]
    #[case("640", Some(640))]
    #[case(" 480px ", Some(480))]
    #[case("12.6", Some(13))]
    #[case("50%", None)]
    #[case("auto", None)]
    fn test_parse_dimension(#[case] input: &str, #[case] expected: Option<u32>) {
        assert_eq!(parse_dimension(input), expected);
    }

    #[rstest]
    #[case("https://x.com/a.png?w=100&h=50", Some(Dimensions::new(100, 50)))]
    #[case("/img/a.png?width=800&height=600&q=80", Some(Dimensions::new(800, 600)))]
    #[case("https://cdn.x.com/photo-1024x768.jpg", Some(Dimensions::new(1024, 768)))]
    #[case("https://x.com/a.png?w=100", None)]
    #[case("https://x.com/2x/photo.png", None)]
    fn test_url_dimensions(#[case] url: &str, #[case] expected: Option<Dimensions>) {
        assert_eq!(url_dimensions(url), expected);
    }

    #[test]
    fn test_style_dimensions() {
        assert_eq!(style_dimensions("border: 0; width: 300px; height:200px"), Some(Dimensions::new(300, 200)));
        assert_eq!(style_dimensions("max-width: 300px; height: 200px"), None);
    }

    #[test]
    fn test_sniff_png_and_gif() {
        let mut png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR".to_vec();
        png.extend_from_slice(&640u32.to_be_bytes());
        png.extend_from_slice(&480u32.to_be_bytes());
        assert_eq!(sniff_dimensions(&png), Some(Dimensions::new(640, 480)));

        let gif = b"GIF89a\x01\x00\x01\x00\x80\x00\x00";
        assert_eq!(sniff_dimensions(gif), Some(Dimensions::new(1, 1)));
    }

    #[test]
    fn test_sniff_jpeg() {
        let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x04, 0x00, 0x00];
        jpeg.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08, 0x01, 0xE0, 0x02, 0x80, 0x03]);
        assert_eq!(sniff_dimensions(&jpeg), Some(Dimensions::new(640, 480)));
    }

    #[test]
    fn test_sniff_webp_extended() {
        let mut webp = b"RIFF\0\0\0\0WEBPVP8X\x0a\0\0\0\0\0\0\0".to_vec();
        webp.extend_from_slice(&[0x3F, 0x01, 0x00, 0xC7, 0x00, 0x00]);
        assert_eq!(sniff_dimensions(&webp), Some(Dimensions::new(320, 200)));
        assert_eq!(sniff_dimensions(b"not an image at all"), None);
    }

    #[test]
    fn test_hint_from_srcset_candidate() {
        let mut tree =
            parse_html(r#"<body><img src="/a.png" srcset="/a.png 1x, /a-large.png?w=100&h=50 2x"></body>"#).unwrap();
        let unknown = infer_image_sizes_offline(&mut tree).unwrap();
        assert!(unknown.is_empty());

        let img = tree.find_first(tree.root(), "img").unwrap();
        assert_eq!(declared_dimensions(&tree, img), Some(Dimensions::new(100, 50)));
    }

    #[test]
    fn test_declared_dimensions_are_kept() {
        let mut tree = parse_html(r#"<body><img src="/a-10x10.png" width="5" height="6"></body>"#).unwrap();
        infer_image_sizes_offline(&mut tree).unwrap();
        let img = tree.find_first(tree.root(), "img").unwrap();
        assert_eq!(declared_dimensions(&tree, img), Some(Dimensions::new(5, 6)));
    }

    #[tokio::test]
    async fn test_fetches_only_unknown_images() {
        let mut tree = parse_html(
            r#"<body>
                <img src="https://x.com/hinted.png?w=10&h=10">
                <img src="https://x.com/photo.png">
                <img src="https://x.com/missing.png">
                <img src="data:image/png;base64,AAAA">
            </body>"#,
        )
        .unwrap();
        let fetcher = FixedFetcher { calls: AtomicUsize::new(0) };
        infer_image_sizes(&mut tree, &fetcher, Some(Duration::from_secs(1))).await.unwrap();

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        let images = tree.elements_by_tag(tree.root(), "img");
        assert_eq!(declared_dimensions(&tree, images[0]), Some(Dimensions::new(10, 10)));
        assert_eq!(declared_dimensions(&tree, images[1]), Some(Dimensions::new(320, 240)));
        assert_eq!(declared_dimensions(&tree, images[2]), None);
        assert_eq!(declared_dimensions(&tree, images[3]), None);
    }

    #[tokio::test]
    async fn test_timeout_leaves_image_dimensionless() {
        let mut tree = parse_html(r#"<body><img src="https://x.com/slow.png"></body>"#).unwrap();
        infer_image_sizes(&mut tree, &SlowFetcher, Some(Duration::from_millis(50))).await.unwrap();
        let img = tree.find_first(tree.root(), "img").unwrap();
        assert_eq!(declared_dimensions(&tree, img), None);
    }
}
