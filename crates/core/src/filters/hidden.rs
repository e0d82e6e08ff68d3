//! Removal of content a reader would never have seen.

use crate::Result;
use crate::color::Color;
use crate::dom_tree::{DomTree, NodeId};
use crate::options::Options;
use crate::walk::{Decision, walk_elements};

use super::image_size::parse_dimension;

/// Elements that are never removed for being hidden.
const PROTECTED_TAGS: [&str; 2] = ["html", "body"];

/// Splits an inline style into lowercase `(property, value)` pairs.
pub fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|declaration| {
            let (property, value) = declaration.split_once(':')?;
            let value = value.trim().trim_end_matches("!important").trim();
            Some((property.trim().to_ascii_lowercase(), value.to_ascii_lowercase()))
        })
        .filter(|(property, value)| !property.is_empty() && !value.is_empty())
        .collect()
}

fn style_value<'a>(declarations: &'a [(String, String)], property: &str) -> Option<&'a str> {
    declarations.iter().rev().find(|(p, _)| p == property).map(|(_, v)| v.as_str())
}

fn is_zero_length(value: &str) -> bool {
    parse_dimension(value).is_some_and(|n| n == 0)
}

/// True if the element's own attributes and style hide it.
pub fn is_hidden_by_style(tree: &DomTree, id: NodeId) -> bool {
    if tree.element(id).is_some_and(|e| e.has_attr("hidden")) {
        return true;
    }
    let Some(style) = tree.attr(id, "style") else {
        return false;
    };
    let declarations = parse_style(style);

    if style_value(&declarations, "display") == Some("none") {
        return true;
    }
    if matches!(style_value(&declarations, "visibility"), Some("hidden" | "collapse")) {
        return true;
    }
    if style_value(&declarations, "opacity").and_then(|v| v.parse::<f64>().ok()).is_some_and(|o| o <= 0.0) {
        return true;
    }
    matches!(
        (style_value(&declarations, "width"), style_value(&declarations, "height")),
        (Some(w), Some(h)) if is_zero_length(w) && is_zero_length(h)
    )
}

fn declared_background(tree: &DomTree, id: NodeId) -> Option<Color> {
    let declarations = parse_style(tree.attr(id, "style")?);
    let value = style_value(&declarations, "background-color").or_else(|| style_value(&declarations, "background"))?;
    Color::parse(value).filter(|color| color.a > 0.0)
}

/// Background behind `id`: the nearest declared background, composited over
/// `matte` when translucent.
pub fn effective_background(tree: &DomTree, id: NodeId, matte: Color) -> Color {
    std::iter::once(id)
        .chain(tree.ancestors(id))
        .find_map(|node| declared_background(tree, node))
        .map(|color| color.blend_over(matte))
        .unwrap_or(matte)
}

/// True if the element sets a text color that barely differs from its background.
pub fn has_low_contrast(tree: &DomTree, id: NodeId, options: &Options) -> bool {
    let Some(style) = tree.attr(id, "style") else {
        return false;
    };
    let declarations = parse_style(style);
    let Some(foreground) = style_value(&declarations, "color").and_then(Color::parse) else {
        return false;
    };
    if tree.text_content(id).trim().is_empty() {
        return false;
    }

    let background = effective_background(tree, id, options.contrast_matte);
    foreground.blend_over(background).contrast_ratio(background) < options.min_contrast_ratio
}

/// Removes elements hidden by attributes, inline style or near-invisible text color.
pub fn remove_hidden_elements(tree: &mut DomTree, options: &Options) -> Result<()> {
    let root = tree.root();
    walk_elements(tree, root, |tree, id| {
        if tree.tag_name(id).is_some_and(|tag| PROTECTED_TAGS.contains(&tag)) {
            return Decision::Retain;
        }
        if is_hidden_by_style(tree, id) || has_low_contrast(tree, id, options) {
            tracing::debug!(tag = tree.tag_name(id), "removing hidden element");
            Decision::Remove
        } else {
            Decision::Retain
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_html;
    use rstest::rstest;

    fn survives(html: &str) -> bool {
        let mut tree = parse_html(&format!("<body>{}<p id=\"anchor\">visible</p></body>", html)).unwrap();
        remove_hidden_elements(&mut tree, &Options::default()).unwrap();
        tree.text_content(tree.root()).contains("secret")
    }

    #[rstest]
    #[case(r#"<div hidden>secret</div>"#)]
    #[case(r#"<div style="display: none">secret</div>"#)]
    #[case(r#"<div style="DISPLAY:NONE !important">secret</div>"#)]
    #[case(r#"<div style="visibility:hidden">secret</div>"#)]
    #[case(r#"<div style="opacity: 0">secret</div>"#)]
    #[case(r#"<div style="width:0;height:0px;overflow:hidden">secret</div>"#)]
    #[case(r#"<div style="color: #fff">secret</div>"#)]
    #[case(r#"<div style="background-color: #000"><div style="color: #010101">secret</div></div>"#)]
    fn test_hidden(#[case] html: &str) {
        assert!(!survives(html));
    }

    #[rstest]
    #[case(r#"<div>secret</div>"#)]
    #[case(r#"<div style="display: block; color: #333">secret</div>"#)]
    #[case(r#"<div style="width: 0">secret</div>"#)]
    #[case(r#"<div style="opacity: 0.8">secret</div>"#)]
    #[case(r#"<div style="background: #000; color: #fff">secret</div>"#)]
    fn test_visible(#[case] html: &str) {
        assert!(survives(html));
    }

    #[test]
    fn test_custom_matte() {
        let mut tree = parse_html(r#"<body><div style="color: #000">dark text</div></body>"#).unwrap();
        let options = Options::builder().contrast_matte(Color::BLACK).build();
        remove_hidden_elements(&mut tree, &options).unwrap();
        assert!(tree.find_first(tree.root(), "div").is_none());
    }

    #[test]
    fn test_parse_style() {
        let declarations = parse_style("Color: RED; ; margin:0 ;bad");
        assert_eq!(declarations, vec![("color".to_string(), "red".to_string()), ("margin".to_string(), "0".to_string())]);
    }
}
