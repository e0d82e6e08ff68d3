//! Sanitized article output and format conversion.
//!
//! This module defines the [`Article`] struct which is the result of running
//! the pipeline over a document: the cleaned HTML, its plain text, and a few
//! derived metrics.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::dom_tree::{DomTree, NodeId};
use crate::serialize::{inner_html, to_plain_text};
use crate::{LecternError, Result};

/// Words per minute used for the reading time estimate.
pub const WORDS_PER_MINUTE: f64 = 200.0;

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[\w'-]+\b").expect("valid word regex"));

/// Output format options for Article content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Sanitized HTML.
    Html,
    /// Markdown, headed by the title when known.
    Markdown,
    /// Plain text with paragraphs separated by blank lines.
    PlainText,
    /// JSON with content and metrics.
    Json,
}

/// A sanitized, reader-ready document.
#[derive(Debug, Clone, Serialize)]
pub struct Article {
    /// Document title, taken from `<title>` before sanitizing.
    pub title: Option<String>,

    /// Sanitized content as HTML (the inner HTML of the surviving body).
    pub content: String,

    /// Plain text version of content.
    pub text_content: String,

    /// Source URL if known.
    pub source_url: Option<String>,

    /// Length of the text content in characters.
    pub length: usize,

    /// Word count of the text content.
    pub word_count: usize,

    /// Estimated reading time in minutes.
    pub reading_time: f64,
}

impl Article {
    /// Creates an Article from its HTML, computing the derived fields.
    pub fn new(title: Option<String>, content: String, text_content: String, source_url: Option<String>) -> Self {
        let length = text_content.chars().count();
        let word_count = count_words(&text_content);
        let reading_time = word_count as f64 / WORDS_PER_MINUTE;

        Self { title, content, text_content, source_url, length, word_count, reading_time }
    }

    /// Builds an Article from the children of `container` in a sanitized tree.
    pub fn from_tree(tree: &DomTree, container: NodeId, title: Option<String>, source_url: Option<String>) -> Self {
        Self::new(title, inner_html(tree, container), to_plain_text(tree, container), source_url)
    }

    /// Converts content to the specified format.
    pub fn to_format(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Html => Ok(self.content.clone()),
            OutputFormat::Markdown => Ok(self.to_markdown()),
            OutputFormat::PlainText => Ok(self.text_content.clone()),
            OutputFormat::Json => self.to_json().map(|v| v.to_string()),
        }
    }

    /// Gets content as Markdown, with the title as a level-one heading.
    pub fn to_markdown(&self) -> String {
        let body = html_to_markdown(&self.content);
        match &self.title {
            Some(title) if !title.trim().is_empty() => format!("# {}\n\n{}", title.trim(), body),
            _ => body,
        }
    }

    /// Gets the article as structured JSON.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| LecternError::SerializeError(e.to_string()))
    }
}

/// The trimmed text of the document's first `title` element.
pub fn document_title(tree: &DomTree) -> Option<String> {
    let title = tree.find_first(tree.root(), "title")?;
    let text = tree.text_content(title);
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}

fn count_words(text: &str) -> usize {
    WORD_RE.find_iter(text).count()
}

#[cfg(feature = "markdown")]
fn html_to_markdown(html: &str) -> String {
    htmd::convert(html).unwrap_or_default()
}

/// Fallback when the markdown feature is disabled
#[cfg(not(feature = "markdown"))]
fn html_to_markdown(html: &str) -> String {
    crate::parse::parse_html(html)
        .map(|tree| to_plain_text(&tree, tree.root()))
        .unwrap_or_default()
}
