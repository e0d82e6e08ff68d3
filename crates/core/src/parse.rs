//! HTML tokenizing.
//!
//! This module turns raw markup into a [`DomTree`]. The heavy lifting is done
//! by `scraper` (html5ever), whose error-recovering tree is copied node by
//! node into the arena representation the rest of the crate works on.
//! Doctypes and processing instructions are dropped.
//!
//! # Example
//!
//! ```rust
//! use lectern_core::parse::parse_html;
//!
//! let tree = parse_html("<html><body><h1>Title</h1><p>Paragraph</p></body></html>").unwrap();
//! let body = tree.body().unwrap();
//! assert_eq!(tree.text_content(body), "TitleParagraph");
//! ```

use scraper::{Html, Node};

use crate::dom_tree::DomTree;
use crate::{LecternError, Result};

/// Parses a full HTML document into a node tree.
///
/// The parser never fails on malformed markup; it recovers the way browsers
/// do. Blank input is rejected with [`LecternError::NoContent`].
pub fn parse_html(html: &str) -> Result<DomTree> {
    if html.trim().is_empty() {
        return Err(LecternError::NoContent);
    }

    let document = Html::parse_document(html);
    if !document.errors.is_empty() {
        tracing::debug!(count = document.errors.len(), "recovered from markup errors");
    }

    convert(&document)
}

/// Copies a scraper document into a fresh arena tree.
fn convert(document: &Html) -> Result<DomTree> {
    let mut tree = DomTree::new();
    let root = tree.root();
    let mut stack = vec![(document.tree.root(), root)];

    while let Some((source, target)) = stack.pop() {
        for child in source.children() {
            let id = match child.value() {
                Node::Element(element) => {
                    let id = tree.create_element(element.name());
                    for (name, value) in element.attrs() {
                        tree.set_attr(id, name, value);
                    }
                    id
                }
                Node::Text(text) => tree.create_text(text),
                Node::Comment(comment) => tree.create_comment(comment),
                _ => continue,
            };
            tree.append(target, id)?;
            stack.push((child, id));
        }
    }

    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom_tree::NodeKind;

    const SAMPLE_HTML: &str = r#"
        <!DOCTYPE html>
        <html lang="en">
        <head>
            <meta charset="UTF-8">
            <title>Test Page</title>
        </head>
        <body>
            <!-- note -->
            <H1>Heading</H1>
            <p class="content">Paragraph 1</p>
            <p class="content">Paragraph 2</p>
            <a HREF="https://example.com">Link</a>
        </body>
        </html>
    "#;

    #[test]
    fn test_parse_document_structure() {
        let tree = parse_html(SAMPLE_HTML).unwrap();
        let html = tree.html_element().unwrap();
        assert_eq!(tree.attr(html, "lang"), Some("en"));
        assert!(tree.head().is_some());
        let body = tree.body().unwrap();
        let tags: Vec<_> = tree.child_elements(body).filter_map(|id| tree.tag_name(id)).collect();
        assert_eq!(tags, vec!["h1", "p", "p", "a"]);
    }

    #[test]
    fn test_parse_keeps_attribute_values() {
        let tree = parse_html(SAMPLE_HTML).unwrap();
        let body = tree.body().unwrap();
        let link = tree.find_first(body, "a").unwrap();
        assert_eq!(tree.attr(link, "href"), Some("https://example.com"));
        assert_eq!(tree.text_content(link), "Link");
    }

    #[test]
    fn test_parse_keeps_comments() {
        let tree = parse_html(SAMPLE_HTML).unwrap();
        let body = tree.body().unwrap();
        let comment = tree.children(body).iter().find(|&&id| tree.is_comment(id)).copied().unwrap();
        assert_eq!(tree.kind(comment), &NodeKind::Comment(" note ".to_string()));
    }

    #[test]
    fn test_parse_fragment_gets_body() {
        let tree = parse_html("<p>loose</p>").unwrap();
        let body = tree.body().unwrap();
        assert_eq!(tree.text_content(body), "loose");
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(matches!(parse_html("   \n"), Err(LecternError::NoContent)));
    }
}
