use crate::Result;
use crate::dom_tree::{DomTree, NodeId};
use crate::scoring::{ScoreConfig, best_candidate, is_candidate};
use crate::walk::{Decision, walk};

/// The result of content extraction
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedContent {
    /// The element kept as the article body
    pub best: NodeId,
    /// Its score, or `None` when nothing scored above zero and the fallback was
    /// used, or when the body was already extracted
    pub score: Option<f64>,
    /// Number of nodes detached by pruning
    pub removed: usize,
}

/// Keeps the spine from `body` down to `best` plus `best`'s subtree and
/// detaches everything else below `body`.
///
/// No-op when `best` is the document root or the body itself, or when the
/// document has no body.
pub fn prune(tree: &mut DomTree, best: NodeId) -> Result<usize> {
    let Some(body) = tree.body() else {
        return Ok(0);
    };
    if best == tree.root() || best == body || !tree.is_ancestor_of(body, best) {
        return Ok(0);
    }

    let mut removed = 0;
    walk(tree, body, |tree, id| {
        if id == best {
            Decision::RetainRaw
        } else if tree.is_ancestor_of(id, best) {
            Decision::Retain
        } else {
            removed += 1;
            Decision::Remove
        }
    })?;

    tracing::debug!(removed, "pruned boilerplate around best candidate");
    Ok(removed)
}

/// Attributes whose tokens feed the scorer.
const TOKEN_ATTRIBUTES: [&str; 3] = ["id", "name", "class"];

/// The only element child of `id`, if it has exactly one and no text beside it.
fn lone_element_child(tree: &DomTree, id: NodeId) -> Option<NodeId> {
    let mut lone = None;
    for &child in tree.children(id) {
        if tree.is_element(child) {
            if lone.replace(child).is_some() {
                return None;
            }
        } else if tree.text(child).is_some_and(|text| !text.trim().is_empty()) {
            return None;
        }
    }
    lone
}

/// The bottom of the lone-element chain below `body` when the body has the
/// shape [`prune`] leaves behind and no candidate carries scoring tokens.
///
/// Sanitized output matches this shape once the attribute whitelist has
/// dropped `id` and `class`, and scoring it again would rank it without them.
fn extracted_spine_end(tree: &DomTree, body: NodeId) -> Option<NodeId> {
    let tokenized = tree
        .descendants(body)
        .into_iter()
        .any(|id| is_candidate(tree, id) && TOKEN_ATTRIBUTES.iter().any(|name| tree.attr(id, name).is_some()));
    if tokenized {
        return None;
    }

    let mut end = lone_element_child(tree, body)?;
    while let Some(child) = lone_element_child(tree, end) {
        end = child;
    }
    Some(end)
}

/// Scores the document, then prunes around the winner.
///
/// A body that already holds a single untokenized spine is left alone, so
/// extracting sanitized output again keeps it whole.
pub fn extract_content(tree: &mut DomTree, config: &ScoreConfig) -> Result<ExtractedContent> {
    if let Some(body) = tree.body()
        && let Some(end) = extracted_spine_end(tree, body)
    {
        tracing::debug!(node = end.index(), tag = tree.tag_name(end), "body already holds an extracted spine");
        return Ok(ExtractedContent { best: end, score: None, removed: 0 });
    }

    let winner = best_candidate(tree, config);
    let best = match &winner {
        Some(result) => result.node,
        None => tree.body().unwrap_or_else(|| tree.root()),
    };
    let score = winner.map(|result| result.score);

    if let Some(score) = score {
        tracing::debug!(node = best.index(), tag = tree.tag_name(best), score, "selected content element");
    } else {
        tracing::debug!("no candidate scored above zero, keeping the whole body");
    }

    let removed = prune(tree, best)?;
    Ok(ExtractedContent { best, score, removed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_html;

    const COMMENTS_AND_ARTICLE: &str = r##"<html><body>
        <div id="comments">
            <a href="#c1">Reader one wrote a short reply</a>
            <a href="#c2">Reader two disagreed strongly</a>
            <a href="#c3">Reader three shared a link</a>
        </div>
        <div id="article">
            <p>Paragraph one describes the event in plain language for everyone.</p>
            <p>Paragraph two gives background and a little history of the topic.</p>
            <p>Paragraph three closes with what happens next and why it matters.</p>
        </div>
    </body></html>"##;

    #[test]
    fn test_extract_selects_article_and_drops_comments() {
        let mut tree = parse_html(COMMENTS_AND_ARTICLE).unwrap();
        let extracted = extract_content(&mut tree, &ScoreConfig::default()).unwrap();

        assert_eq!(tree.attr(extracted.best, "id"), Some("article"));
        assert!(extracted.score.unwrap() > 0.0);
        assert!(extracted.removed > 0);

        let root = tree.root();
        assert!(tree.elements_by_tag(root, "div").iter().all(|&d| tree.attr(d, "id") != Some("comments")));
        assert_eq!(tree.elements_by_tag(root, "p").len(), 3);
    }

    #[test]
    fn test_prune_containment() {
        let mut tree = parse_html(
            "<body><header><nav>menu</nav></header><main><aside>x</aside><article><p>a</p><div>b</div></article></main><footer>f</footer></body>",
        )
        .unwrap();
        let article = tree.find_first(tree.root(), "article").unwrap();
        prune(&mut tree, article).unwrap();

        let body = tree.body().unwrap();
        for id in tree.descendants(body) {
            assert!(
                tree.contains(article, id) || tree.is_ancestor_of(id, article),
                "node {:?} survived pruning",
                tree.tag_name(id)
            );
        }
        assert!(tree.find_first(body, "div").is_some());
        assert!(tree.find_first(body, "aside").is_none());
    }

    #[test]
    fn test_extract_leaves_untokenized_spine_alone() {
        let mut tree = parse_html(
            "<body><div><p>Short intro line.</p><div><p>A much longer paragraph that would win on its own.</p></div></div></body>",
        )
        .unwrap();
        let outer = tree.find_first(tree.root(), "div").unwrap();
        let extracted = extract_content(&mut tree, &ScoreConfig::default()).unwrap();

        assert_eq!(extracted, ExtractedContent { best: outer, score: None, removed: 0 });
        assert_eq!(tree.elements_by_tag(tree.root(), "p").len(), 2);
    }

    #[test]
    fn test_extract_scores_tokenized_spine() {
        let mut tree = parse_html(
            r#"<body><div><div class="sidebar"><a href="/x">Related link</a></div><div class="content"><p>Body text of the story.</p></div></div></body>"#,
        )
        .unwrap();
        let extracted = extract_content(&mut tree, &ScoreConfig::default()).unwrap();

        assert_eq!(tree.attr(extracted.best, "class"), Some("content"));
        assert!(tree.elements_by_tag(tree.root(), "a").is_empty());
    }

    #[test]
    fn test_prune_body_is_noop() {
        let mut tree = parse_html("<body><nav>a</nav><p>b</p></body>").unwrap();
        let body = tree.body().unwrap();
        assert_eq!(prune(&mut tree, body).unwrap(), 0);
        let root = tree.root();
        assert_eq!(prune(&mut tree, root).unwrap(), 0);
        assert_eq!(tree.child_elements(body).count(), 2);
    }
}
