//! Error types for Lectern operations.
//!
//! This module defines the main error type [`LecternError`]. Only a few of its
//! variants ever abort a sanitization run: a malformed tree
//! ([`LecternError::InvalidDocument`]) or unusable input. Everything that goes
//! wrong for a single element (a bad URL, a failed image fetch) is logged and
//! recovered from inside the filter that hit it.
//!
//! # Example
//!
//! ```rust
//! use lectern_core::{LecternError, Result};
//!
//! fn sanitize_page(html: &str) -> Result<String> {
//!     if html.trim().is_empty() {
//!         return Err(LecternError::NoContent);
//!     }
//!     // ... pipeline
//!     # Ok(String::new())
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for sanitization operations.
///
/// # Example
///
/// ```rust
/// use lectern_core::{LecternError, sanitize};
///
/// match sanitize("<html><body><p>Hi</p></body></html>", "https://example.com/") {
///     Ok(article) => println!("{}", article.content),
///     Err(LecternError::InvalidDocument(reason)) => eprintln!("bad tree: {reason}"),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum LecternError {
    /// HTTP request errors from reqwest.
    #[cfg(feature = "fetch")]
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request timeout.
    ///
    /// Returned when a page request exceeds the configured timeout duration.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided.
    ///
    /// Returned when a document URL cannot be parsed or cannot act as a base.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// An article could not be rendered as JSON.
    #[error("Failed to serialize article: {0}")]
    SerializeError(String),

    /// The node tree is structurally unusable.
    ///
    /// Raised when a mutation would create a cycle, or when the document has
    /// no `body` (and no frameset to build one from). This is the only error
    /// the filter pipeline itself ever returns.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// No content to work with (empty input).
    #[error("No content could be extracted from the document")]
    NoContent,

    /// A single image could not be fetched or decoded.
    ///
    /// Image fetchers return this; the size inference filter swallows it.
    #[error("Image fetch failed: {0}")]
    ImageFetch(String),

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File write errors.
    #[error("Failed to write to file: {0}")]
    WriteError(#[from] std::io::Error),

    /// Options file errors.
    ///
    /// Returned when an options file is missing or contains invalid JSON.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<serde_json::Error> for LecternError {
    fn from(err: serde_json::Error) -> Self {
        LecternError::ConfigError(err.to_string())
    }
}

/// Result type alias for LecternError.
pub type Result<T> = std::result::Result<T, LecternError>;
