//! HTML and plain-text serialization of a [`DomTree`].

use crate::dom_tree::{DomTree, NodeId, NodeKind};

/// Elements that never have a closing tag.
const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source", "track", "wbr",
];

/// Elements whose text children are written without escaping.
const RAW_TEXT_ELEMENTS: [&str; 8] = [
    "script",
    "style",
    "xmp",
    "iframe",
    "noembed",
    "noframes",
    "plaintext",
    "noscript",
];

const BLOCK_ELEMENTS: [&str; 22] = [
    "address",
    "article",
    "aside",
    "blockquote",
    "dd",
    "div",
    "dl",
    "dt",
    "figcaption",
    "figure",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "li",
    "p",
    "pre",
    "section",
    "table",
    "tr",
];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Serializes `id` including its own tags.
pub fn outer_html(tree: &DomTree, id: NodeId) -> String {
    let mut out = String::new();
    write_node(tree, id, &mut out);
    out
}

/// Serializes the children of `id`.
pub fn inner_html(tree: &DomTree, id: NodeId) -> String {
    let mut out = String::new();
    for &child in tree.children(id) {
        write_node(tree, child, &mut out);
    }
    out
}

fn write_node(tree: &DomTree, id: NodeId, out: &mut String) {
    match tree.kind(id) {
        NodeKind::Document => {
            for &child in tree.children(id) {
                write_node(tree, child, out);
            }
        }
        NodeKind::Text(value) => {
            let raw = tree
                .parent(id)
                .and_then(|p| tree.tag_name(p))
                .is_some_and(|tag| RAW_TEXT_ELEMENTS.contains(&tag));
            if raw {
                out.push_str(value);
            } else {
                escape_text(value, out);
            }
        }
        NodeKind::Comment(value) => {
            out.push_str("<!--");
            out.push_str(value);
            out.push_str("-->");
        }
        NodeKind::Element(element) => {
            out.push('<');
            out.push_str(element.tag_name());
            for attribute in element.attributes() {
                out.push(' ');
                out.push_str(&attribute.name);
                out.push_str("=\"");
                escape_attribute(&attribute.value, out);
                out.push('"');
            }
            out.push('>');
            if is_void_element(element.tag_name()) {
                return;
            }
            for &child in tree.children(id) {
                write_node(tree, child, out);
            }
            out.push_str("</");
            out.push_str(element.tag_name());
            out.push('>');
        }
    }
}

fn escape_text(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

/// Renders readable plain text: block elements become paragraphs, `br`
/// becomes a line break and runs of whitespace collapse to one space.
pub fn to_plain_text(tree: &DomTree, id: NodeId) -> String {
    let mut out = String::new();
    write_text(tree, id, &mut out);

    let paragraphs: Vec<String> = out
        .split("\n\n")
        .map(|block| block.lines().map(str::trim).filter(|l| !l.is_empty()).collect::<Vec<_>>().join("\n"))
        .filter(|block| !block.is_empty())
        .collect();
    paragraphs.join("\n\n")
}

fn write_text(tree: &DomTree, id: NodeId, out: &mut String) {
    match tree.kind(id) {
        NodeKind::Text(value) => {
            let mut last_space = out.ends_with(' ') || out.ends_with('\n');
            for c in value.chars() {
                if c.is_whitespace() {
                    if !last_space {
                        out.push(' ');
                        last_space = true;
                    }
                } else {
                    out.push(c);
                    last_space = false;
                }
            }
        }
        NodeKind::Comment(_) => {}
        NodeKind::Document => {
            for &child in tree.children(id) {
                write_text(tree, child, out);
            }
        }
        NodeKind::Element(element) => {
            let tag = element.tag_name();
            if tag == "br" {
                out.push('\n');
                return;
            }
            let block = BLOCK_ELEMENTS.contains(&tag);
            if block {
                out.push_str("\n\n");
            }
            for &child in tree.children(id) {
                write_text(tree, child, out);
            }
            if block {
                out.push_str("\n\n");
            }
        }
    }
}
