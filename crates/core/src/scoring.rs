//! Boilerplate scoring.
//!
//! Each candidate container gets the sum of four bias terms (text, child
//! tags, id/class/name tokens, images) plus penalties for sitting inside
//! lists or page chrome. The single highest-scoring candidate is taken to be
//! the article body. All weights are empirically tuned; the coefficients are
//! exposed through [`ScoreConfig`] and the tables are named constants.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::dom_tree::{DomTree, NodeId};
use crate::filters::image_size::declared_dimensions;

/// Tags eligible for scoring.
pub const CANDIDATE_TAGS: [&str; 6] = ["article", "div", "main", "section", "span", "td"];

/// Weights for the tags of a candidate's immediate child elements.
pub const CHILD_TAG_WEIGHTS: &[(&str, f64)] = &[
    ("a", -5.0),
    ("aside", -50.0),
    ("blockquote", 20.0),
    ("br", 3.0),
    ("div", -50.0),
    ("figure", 20.0),
    ("h1", 10.0),
    ("h2", 10.0),
    ("h3", 10.0),
    ("h4", 10.0),
    ("h5", 10.0),
    ("h6", 10.0),
    ("nav", -100.0),
    ("ol", -20.0),
    ("p", 10.0),
    ("pre", 10.0),
    ("section", -20.0),
    ("ul", -20.0),
];

/// Weights for tokens found in `id`, `name` and `class`.
pub const TOKEN_WEIGHTS: &[(&str, f64)] = &[
    ("ad", -500.0),
    ("ads", -500.0),
    ("advert", -500.0),
    ("article", 500.0),
    ("body", 500.0),
    ("comment", -500.0),
    ("comments", -500.0),
    ("content", 500.0),
    ("contentpane", 500.0),
    ("footer", -300.0),
    ("gutter", -300.0),
    ("header", -100.0),
    ("left", -50.0),
    ("main", 500.0),
    ("menu", -200.0),
    ("meta", -50.0),
    ("nav", -200.0),
    ("navbar", -200.0),
    ("newsarticle", 500.0),
    ("page", 200.0),
    ("post", 300.0),
    ("promo", -100.0),
    ("rail", -300.0),
    ("rel", -50.0),
    ("relate", -500.0),
    ("related", -500.0),
    ("right", -50.0),
    ("share", -200.0),
    ("sidebar", -300.0),
    ("social", -200.0),
    ("sponsor", -200.0),
    ("story", 100.0),
    ("storytxt", 500.0),
    ("tool", -200.0),
    ("tools", -200.0),
    ("widget", -200.0),
    ("zone", -50.0),
];

/// Ancestors that mark a candidate as part of a list.
pub const LIST_ANCESTOR_TAGS: [&str; 4] = ["dl", "li", "ol", "ul"];

/// Ancestors that mark a candidate as page chrome.
pub const CHROME_ANCESTOR_TAGS: [&str; 4] = ["aside", "footer", "header", "nav"];

pub const TEXT_WEIGHT: f64 = 0.25;
pub const ANCHOR_TEXT_WEIGHT: f64 = 0.7;
pub const IMAGE_AREA_CAP: f64 = 100_000.0;
pub const IMAGE_AREA_WEIGHT: f64 = 0.0015;
pub const IMAGE_ALT_BONUS: f64 = 20.0;
pub const IMAGE_TITLE_BONUS: f64 = 30.0;
pub const IMAGE_CAPTION_BONUS: f64 = 100.0;
pub const CAROUSEL_PENALTY: f64 = 50.0;
pub const LIST_NESTING_PENALTY: f64 = 200.0;
pub const CHROME_NESTING_PENALTY: f64 = 500.0;

/// Attribute strings shorter than this are not tokenized.
const MIN_TOKEN_SOURCE_LEN: usize = 3;

static TOKEN_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s\-_0-9]+").expect("valid token regex"));

/// Coefficients of the scoring algorithm.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScoreConfig {
    /// Reward per visible character
    pub text_weight: f64,
    /// Penalty per character of link text
    pub anchor_text_weight: f64,
    /// Largest image area that still earns a reward
    pub image_area_cap: f64,
    /// Reward per square pixel of image area
    pub image_area_weight: f64,
    pub image_alt_bonus: f64,
    pub image_title_bonus: f64,
    pub image_caption_bonus: f64,
    /// Penalty for every image beyond the first
    pub carousel_penalty: f64,
    pub list_nesting_penalty: f64,
    pub chrome_nesting_penalty: f64,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            text_weight: TEXT_WEIGHT,
            anchor_text_weight: ANCHOR_TEXT_WEIGHT,
            image_area_cap: IMAGE_AREA_CAP,
            image_area_weight: IMAGE_AREA_WEIGHT,
            image_alt_bonus: IMAGE_ALT_BONUS,
            image_title_bonus: IMAGE_TITLE_BONUS,
            image_caption_bonus: IMAGE_CAPTION_BONUS,
            carousel_penalty: CAROUSEL_PENALTY,
            list_nesting_penalty: LIST_NESTING_PENALTY,
            chrome_nesting_penalty: CHROME_NESTING_PENALTY,
        }
    }
}

/// Score breakdown for one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    pub node: NodeId,
    pub text_bias: f64,
    pub ancestor_bias: f64,
    pub attribute_bias: f64,
    pub image_bias: f64,
    pub nesting_penalty: f64,
    pub score: f64,
}

pub fn is_candidate(tree: &DomTree, id: NodeId) -> bool {
    tree.tag_name(id).is_some_and(|tag| CANDIDATE_TAGS.contains(&tag))
}

/// Character count of the element's text with whitespace runs collapsed and
/// the ends trimmed.
pub fn visible_text_length(tree: &DomTree, id: NodeId) -> usize {
    let text = tree.text_content(id);
    let mut words = 0usize;
    let mut chars = 0usize;
    for word in text.split_whitespace() {
        words += 1;
        chars += word.chars().count();
    }
    chars + words.saturating_sub(1)
}

/// Sum of trimmed text lengths of all descendant links.
pub fn anchor_text_length(tree: &DomTree, id: NodeId) -> usize {
    tree.elements_by_tag(id, "a")
        .into_iter()
        .map(|a| tree.text_content(a).trim().chars().count())
        .sum()
}

pub fn text_bias(tree: &DomTree, id: NodeId, config: &ScoreConfig) -> f64 {
    config.text_weight * visible_text_length(tree, id) as f64
        - config.anchor_text_weight * anchor_text_length(tree, id) as f64
}

/// Sum of [`CHILD_TAG_WEIGHTS`] over immediate child elements.
pub fn ancestor_tag_bias(tree: &DomTree, id: NodeId) -> f64 {
    tree.child_elements(id)
        .filter_map(|child| {
            let tag = tree.tag_name(child)?;
            CHILD_TAG_WEIGHTS.iter().find(|(t, _)| *t == tag).map(|(_, w)| *w)
        })
        .sum()
}

/// Lowercased, deduplicated tokens of a class/id string, in first-seen order.
pub fn tokenize(value: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    TOKEN_SPLIT_RE
        .split(value)
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .filter(|token| seen.insert(token.clone()))
        .collect()
}

/// Sum of [`TOKEN_WEIGHTS`] over the tokens of `id`, `name` and `class`.
pub fn attribute_token_bias(tree: &DomTree, id: NodeId) -> f64 {
    let source = ["id", "name", "class"]
        .iter()
        .filter_map(|name| tree.attr(id, name))
        .collect::<Vec<_>>()
        .join(" ");
    if source.len() < MIN_TOKEN_SOURCE_LEN {
        return 0.0;
    }

    tokenize(&source)
        .iter()
        .filter_map(|token| TOKEN_WEIGHTS.iter().find(|(t, _)| t == token).map(|(_, w)| *w))
        .sum()
}

/// Rewards for the candidate's direct child images and the carousel penalty.
pub fn image_bias(tree: &DomTree, id: NodeId, config: &ScoreConfig) -> f64 {
    let images: Vec<NodeId> = tree.child_elements(id).filter(|&c| tree.has_tag(c, "img")).collect();
    let mut bias = 0.0;

    for &image in &images {
        if let Some(dims) = declared_dimensions(tree, image) {
            bias += dims.area().min(config.image_area_cap) * config.image_area_weight;
        }
        if tree.attr(image, "alt").is_some_and(|alt| !alt.trim().is_empty()) {
            bias += config.image_alt_bonus;
        }
        if tree.attr(image, "title").is_some_and(|title| !title.trim().is_empty()) {
            bias += config.image_title_bonus;
        }
        if find_caption(tree, image).is_some() {
            bias += config.image_caption_bonus;
        }
    }

    if images.len() > 1 {
        bias -= config.carousel_penalty * (images.len() - 1) as f64;
    }
    bias
}

/// The `figcaption` of the nearest enclosing `figure`, if any.
pub fn find_caption(tree: &DomTree, image: NodeId) -> Option<NodeId> {
    let figure = tree.ancestors(image).find(|&a| tree.has_tag(a, "figure"))?;
    tree.find_first(figure, "figcaption")
}

/// Penalties for sitting inside a list or inside navigation/header/footer.
pub fn nesting_penalty(tree: &DomTree, id: NodeId, config: &ScoreConfig) -> f64 {
    let mut in_list = false;
    let mut in_chrome = false;
    for ancestor in tree.ancestors(id) {
        let Some(tag) = tree.tag_name(ancestor) else {
            break;
        };
        if tag == "body" {
            break;
        }
        in_list |= LIST_ANCESTOR_TAGS.contains(&tag);
        in_chrome |= CHROME_ANCESTOR_TAGS.contains(&tag);
    }

    let mut penalty = 0.0;
    if in_list {
        penalty += config.list_nesting_penalty;
    }
    if in_chrome {
        penalty += config.chrome_nesting_penalty;
    }
    penalty
}

/// Scores one element.
pub fn score_element(tree: &DomTree, id: NodeId, config: &ScoreConfig) -> ScoreResult {
    let text_bias = text_bias(tree, id, config);
    let ancestor_bias = ancestor_tag_bias(tree, id);
    let attribute_bias = attribute_token_bias(tree, id);
    let image_bias = image_bias(tree, id, config);
    let nesting_penalty = nesting_penalty(tree, id, config);
    let score = text_bias + ancestor_bias + attribute_bias + image_bias - nesting_penalty;

    ScoreResult { node: id, text_bias, ancestor_bias, attribute_bias, image_bias, nesting_penalty, score }
}

/// Scores every candidate below `body` (or the root), in document order.
pub fn score_candidates(tree: &DomTree, config: &ScoreConfig) -> Vec<ScoreResult> {
    let scope = tree.body().unwrap_or_else(|| tree.root());
    tree.descendants(scope)
        .into_iter()
        .filter(|&id| is_candidate(tree, id))
        .map(|id| score_element(tree, id, config))
        .collect()
}

/// Picks the element most likely to be the article body.
///
/// A candidate must score strictly above every earlier one, starting from
/// zero, so ties keep the first in document order. Falls back to `body`, or
/// the root when there is no body.
pub fn find_best_content_element(tree: &DomTree, config: &ScoreConfig) -> NodeId {
    best_candidate(tree, config)
        .map(|result| result.node)
        .or_else(|| tree.body())
        .unwrap_or_else(|| tree.root())
}

/// The winning candidate with its breakdown, if any scored above zero.
pub fn best_candidate(tree: &DomTree, config: &ScoreConfig) -> Option<ScoreResult> {
    let mut best: Option<ScoreResult> = None;
    let mut max = 0.0;
    for result in score_candidates(tree, config) {
        if result.score > max {
            max = result.score;
            best = Some(result);
        }
    }
    best
}
