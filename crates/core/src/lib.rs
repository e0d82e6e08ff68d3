//! Reader-mode HTML sanitizing.
//!
//! `lectern_core` turns a noisy web page into a clean, self-contained
//! article: scripts, trackers, hidden text and page chrome are removed,
//! relative URLs are resolved, lazy and responsive images are normalized and
//! only whitelisted attributes survive.
//!
//! # Example
//!
//! ```rust
//! let html = r#"<html><head><title>Notes</title></head><body>
//!     <nav><a href="/">Home</a> <a href="/about">About</a></nav>
//!     <div class="content"><p>The part worth reading, with <a href="/ref">a reference</a>.</p></div>
//! </body></html>"#;
//!
//! let article = lectern_core::sanitize(html, "https://example.com/notes").unwrap();
//! assert_eq!(article.title.as_deref(), Some("Notes"));
//! assert!(article.content.contains(r#"<a href="https://example.com/ref">"#));
//! assert!(!article.content.contains("About"));
//! ```

pub mod article;
pub mod color;
pub mod dom_tree;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod filters;
pub mod options;
pub mod parse;
pub mod pipeline;
pub mod scoring;
pub mod serialize;
pub mod srcset;
pub mod urls;
pub mod walk;

pub use article::{Article, OutputFormat};
pub use color::Color;
pub use dom_tree::{DomTree, NodeId};
pub use error::{LecternError, Result};
pub use extract::{ExtractedContent, extract_content, prune};
pub use fetch::{fetch_file, fetch_stdin};
#[cfg(feature = "fetch")]
pub use fetch::{FetchConfig, HttpImageFetcher, fetch_url};
pub use filters::{Dimensions, ImageFetcher};
pub use options::{AttributeWhitelist, Options, OptionsBuilder};
pub use parse::parse_html;
pub use pipeline::{Sanitizer, sanitize, sanitize_tree};
pub use scoring::{ScoreConfig, ScoreResult, find_best_content_element};
pub use walk::{Decision, walk};
