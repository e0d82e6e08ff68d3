//! Sanitization pipeline.
//!
//! The main entry point is [`Sanitizer`], which runs every filter over a
//! document in a fixed order: structural repair and URL resolution first,
//! then removal of unsafe and invisible content, image normalization, the
//! boilerplate scorer and pruner, and finally the cosmetic and attribute
//! passes. The free functions [`sanitize`] and [`sanitize_tree`] run it with
//! default [`Options`].
//!
//! # Example
//!
//! ```rust
//! use lectern_core::{Options, Sanitizer};
//!
//! let options = Options::builder().emphasis_max_length(80).build();
//! let sanitizer = Sanitizer::with_options(options);
//! let html = r#"<html><body><div class="article"><p>Readable text.</p><script>track()</script></div></body></html>"#;
//! let article = sanitizer.sanitize(html, "https://example.com/post").unwrap();
//! assert!(!article.content.contains("script"));
//! ```

use url::Url;

use crate::article::{Article, document_title};
use crate::dom_tree::DomTree;
use crate::extract::extract_content;
use crate::filters::{self, ImageFetcher};
use crate::options::Options;
use crate::parse::parse_html;
use crate::urls::resolve_document_urls;
use crate::{LecternError, Result};

/// Runs the filter pipeline with a fixed set of [`Options`].
///
/// # Example
///
/// ```rust
/// use lectern_core::Sanitizer;
/// use lectern_core::parse::parse_html;
/// use url::Url;
///
/// let mut tree = parse_html(r#"<body><p><a href="/next">Next</a> page</p></body>"#).unwrap();
/// let url = Url::parse("https://example.com/a/").unwrap();
/// Sanitizer::new().sanitize_tree(&mut tree, &url).unwrap();
///
/// let a = tree.find_first(tree.root(), "a").unwrap();
/// assert_eq!(tree.attr(a, "href"), Some("https://example.com/next"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Sanitizer {
    options: Options,
}

impl Sanitizer {
    /// Creates a sanitizer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sanitizer with custom options.
    pub fn with_options(options: Options) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Sanitizes a tree in place without touching the network.
    ///
    /// Image sizes are inferred from inline styles and URL hints only.
    ///
    /// # Errors
    ///
    /// [`LecternError::InvalidDocument`] when the document has no body and
    /// none can be recovered from a frameset. Per-element problems never
    /// fail the run.
    pub fn sanitize_tree(&self, tree: &mut DomTree, document_url: &Url) -> Result<()> {
        self.prepare(tree, document_url)?;
        let unknown = filters::infer_image_sizes_offline(tree)?;
        tracing::debug!(unknown = unknown.len(), "image sizes inferred offline");
        self.finish(tree)
    }

    /// Sanitizes a tree in place, fetching the sizes of images that carry
    /// no usable hints through `fetcher`.
    ///
    /// Each fetch is bounded by [`Options::image_fetch_timeout`]; failures
    /// leave the image dimensionless.
    pub async fn sanitize_tree_with_fetcher<F: ImageFetcher>(
        &self,
        tree: &mut DomTree,
        document_url: &Url,
        fetcher: &F,
    ) -> Result<()> {
        self.prepare(tree, document_url)?;
        filters::infer_image_sizes(tree, fetcher, self.options.image_fetch_timeout).await?;
        self.finish(tree)
    }

    /// Parses and sanitizes an HTML document.
    ///
    /// # Errors
    ///
    /// [`LecternError::InvalidUrl`] for an unparsable document URL,
    /// [`LecternError::NoContent`] for blank input, and the errors of
    /// [`Sanitizer::sanitize_tree`].
    pub fn sanitize(&self, html: &str, document_url: &str) -> Result<Article> {
        let url = parse_document_url(document_url)?;
        let mut tree = parse_html(html)?;
        let title = document_title(&tree);

        self.sanitize_tree(&mut tree, &url)?;
        article_from(&tree, title, &url)
    }

    /// Parses and sanitizes an HTML document, fetching unknown image sizes.
    pub async fn sanitize_with_fetcher<F: ImageFetcher>(
        &self,
        html: &str,
        document_url: &str,
        fetcher: &F,
    ) -> Result<Article> {
        let url = parse_document_url(document_url)?;
        let mut tree = parse_html(html)?;
        let title = document_title(&tree);

        self.sanitize_tree_with_fetcher(&mut tree, &url, fetcher).await?;
        article_from(&tree, title, &url)
    }

    /// Everything up to image-size inference.
    fn prepare(&self, tree: &mut DomTree, document_url: &Url) -> Result<()> {
        let options = &self.options;

        filters::normalize_frames(tree)?;
        let base = resolve_document_urls(tree, document_url)?;
        tracing::debug!(base = %base, "resolved document URLs");

        filters::remove_comments(tree)?;
        filters::remove_script_elements(tree)?;
        filters::filter_embeds(tree, options.preserve_embeds)?;
        filters::remove_blacklisted_elements(tree)?;
        filters::remove_hidden_elements(tree, options)?;
        filters::remove_telemetry_images(tree, document_url)?;
        tracing::debug!("removed unsafe and invisible content");

        filters::normalize_lazy_images(tree, &base)?;
        filters::collapse_responsive_images(tree)?;
        filters::remove_sourceless_images(tree)?;
        Ok(())
    }

    /// Everything after image-size inference.
    fn finish(&self, tree: &mut DomTree) -> Result<()> {
        let options = &self.options;

        filters::remove_tiny_images(tree)?;

        let extracted = extract_content(tree, &options.scoring)?;
        tracing::debug!(
            best = extracted.best.index(),
            score = extracted.score,
            removed = extracted.removed,
            "extracted content"
        );

        filters::unwrap_nameless_anchors(tree)?;
        filters::unwrap_long_emphasis(tree, options.emphasis_max_length)?;
        filters::unwrap_formatting_elements(tree)?;
        filters::normalize_lists(tree)?;
        filters::normalize_tables(tree, options.table_scan_max_rows)?;
        filters::condense_line_breaks(tree)?;
        filters::condense_whitespace(tree)?;
        filters::remove_leaf_elements(tree)?;
        filters::trim_document(tree)?;
        filters::filter_attribute_whitelist(tree, &options.attribute_whitelist)?;
        filters::remove_empty_attributes(tree)?;
        tracing::debug!("cleaned up structure and attributes");
        Ok(())
    }
}

fn parse_document_url(value: &str) -> Result<Url> {
    Url::parse(value.trim()).map_err(|e| LecternError::InvalidUrl(format!("{}: {}", value, e)))
}

fn article_from(tree: &DomTree, title: Option<String>, url: &Url) -> Result<Article> {
    let body = tree.body().ok_or_else(|| LecternError::InvalidDocument("document lost its body".into()))?;
    let article = Article::from_tree(tree, body, title, Some(url.to_string()));
    if article.text_content.trim().is_empty() {
        tracing::warn!(url = %url, "sanitized document has no text");
    }
    Ok(article)
}

/// Sanitizes an HTML document with default options.
///
/// # Example
///
/// ```rust
/// let html = r#"<html><head><title>Hello</title></head><body><p>World</p></body></html>"#;
/// let article = lectern_core::sanitize(html, "https://example.com/").unwrap();
/// assert_eq!(article.title.as_deref(), Some("Hello"));
/// assert_eq!(article.content, "<p>World</p>");
/// ```
pub fn sanitize(html: &str, document_url: &str) -> Result<Article> {
    Sanitizer::new().sanitize(html, document_url)
}

/// Sanitizes a tree in place with default options.
pub fn sanitize_tree(tree: &mut DomTree, document_url: &Url) -> Result<()> {
    Sanitizer::new().sanitize_tree(tree, document_url)
}
