//! Arena-backed node tree.
//!
//! Every node of a document lives in a single `Vec` owned by [`DomTree`] and
//! is addressed by a copyable [`NodeId`]. Parent and child links are plain
//! indices, so detaching, unwrapping and replacing nodes are re-links rather
//! than ownership transfers. A detached node simply stops being reachable
//! from the root; its slot is released together with the tree.
//!
//! # Example
//!
//! ```rust
//! use lectern_core::DomTree;
//!
//! let mut tree = DomTree::new();
//! let root = tree.root();
//! let div = tree.create_element("DIV");
//! let text = tree.create_text("hello");
//! tree.append(root, div).unwrap();
//! tree.append(div, text).unwrap();
//!
//! assert_eq!(tree.tag_name(div), Some("div"));
//! assert_eq!(tree.text_content(div), "hello");
//! ```

use crate::{LecternError, Result};

/// Handle to a node inside a [`DomTree`].
///
/// Handles are only meaningful for the tree that created them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A single attribute, keeping the spelling it was created with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// Tag name and ordered attributes of an element node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    tag_name: String,
    attributes: Vec<Attribute>,
}

impl ElementData {
    /// Creates element data; the tag name is lowercased.
    pub fn new(tag_name: &str) -> Self {
        Self { tag_name: tag_name.to_ascii_lowercase(), attributes: Vec::new() }
    }

    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Looks an attribute up by name, ignoring ASCII case.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Sets an attribute. An existing attribute keeps its position and spelling.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|a| a.name.eq_ignore_ascii_case(name)) {
            Some(existing) => existing.value = value.to_string(),
            None => self.attributes.push(Attribute { name: name.to_string(), value: value.to_string() }),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attributes.iter().position(|a| a.name.eq_ignore_ascii_case(name))?;
        Some(self.attributes.remove(pos).value)
    }

    pub fn retain_attrs(&mut self, keep: impl FnMut(&Attribute) -> bool) {
        self.attributes.retain(keep);
    }
}

/// The payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element(ElementData),
    Text(String),
    Comment(String),
}

/// A node slot in the arena.
#[derive(Debug, Clone)]
pub struct DomNode {
    pub kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl DomNode {
    fn new(kind: NodeKind) -> Self {
        Self { kind, parent: None, children: Vec::new() }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// An in-memory HTML document.
///
/// The node at index 0 is always the [`NodeKind::Document`] root.
#[derive(Debug, Clone)]
pub struct DomTree {
    nodes: Vec<DomNode>,
}

impl DomTree {
    /// Creates a tree holding only the document root.
    pub fn new() -> Self {
        Self { nodes: vec![DomNode::new(NodeKind::Document)] }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of allocated nodes, detached ones included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the root has no children.
    pub fn is_empty(&self) -> bool {
        self.nodes[0].children.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &DomNode {
        &self.nodes[id.0]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(ElementData::tag_name)
    }

    /// True if `id` is an element with the given (lowercase) tag name.
    pub fn has_tag(&self, id: NodeId, tag: &str) -> bool {
        self.tag_name(id) == Some(tag)
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attr(name)
    }

    /// Sets an attribute on an element; ignored for other node kinds.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(element) = self.element_mut(id) {
            element.set_attr(name, value);
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Option<String> {
        self.element_mut(id)?.remove_attr(name)
    }

    /// Value of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, value: String) {
        if let NodeKind::Text(existing) = &mut self.nodes[id.0].kind {
            *existing = value;
        }
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        self.text(id).is_some()
    }

    pub fn is_comment(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].kind, NodeKind::Comment(_))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Element children of `id`, in order.
    pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id).iter().copied().filter(|&c| self.is_element(c))
    }

    /// Ancestors of `id`, nearest first, ending at the root of its subtree.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors { tree: self, next: self.parent(id) }
    }

    /// All nodes strictly below `id`, in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev());
        }
        out
    }

    /// Element descendants of `from` with the given tag, in document order.
    pub fn elements_by_tag(&self, from: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(from).into_iter().filter(|&id| self.has_tag(id, tag)).collect()
    }

    pub fn find_first(&self, from: NodeId, tag: &str) -> Option<NodeId> {
        self.elements_by_tag(from, tag).into_iter().next()
    }

    /// True if `ancestor` is a strict ancestor of `id`.
    pub fn is_ancestor_of(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    /// True if `id` is `ancestor` or lies below it.
    pub fn contains(&self, ancestor: NodeId, id: NodeId) -> bool {
        ancestor == id || self.is_ancestor_of(ancestor, id)
    }

    /// True if `id` is still reachable from the document root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.contains(self.root(), id)
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let index = self.index_in_parent(id)?;
        let parent = self.parent(id)?;
        index.checked_sub(1).map(|i| self.children(parent)[i])
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let index = self.index_in_parent(id)?;
        let parent = self.parent(id)?;
        self.children(parent).get(index + 1).copied()
    }

    /// The top-level `html` element.
    pub fn html_element(&self) -> Option<NodeId> {
        self.child_elements(self.root()).find(|&c| self.has_tag(c, "html"))
    }

    /// The top-level content container (`html > body`).
    pub fn body(&self) -> Option<NodeId> {
        let html = self.html_element()?;
        self.child_elements(html).find(|&c| self.has_tag(c, "body"))
    }

    pub fn head(&self) -> Option<NodeId> {
        let html = self.html_element()?;
        self.child_elements(html).find(|&c| self.has_tag(c, "head"))
    }

    /// Concatenated text of all text nodes at or below `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(value) = self.text(id) {
            return value.to_string();
        }
        self.descendants(id).into_iter().filter_map(|d| self.text(d)).collect()
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(DomNode::new(kind));
        id
    }

    /// Allocates a detached element.
    pub fn create_element(&mut self, tag_name: &str) -> NodeId {
        self.push(NodeKind::Element(ElementData::new(tag_name)))
    }

    /// Allocates a detached text node.
    pub fn create_text(&mut self, value: &str) -> NodeId {
        self.push(NodeKind::Text(value.to_string()))
    }

    /// Allocates a detached comment node.
    pub fn create_comment(&mut self, value: &str) -> NodeId {
        self.push(NodeKind::Comment(value.to_string()))
    }

    /// Allocates a detached copy of `id` without its children.
    pub fn shallow_clone(&mut self, id: NodeId) -> NodeId {
        let kind = self.kind(id).clone();
        self.push(kind)
    }

    /// Rejects links that would break the tree shape.
    fn check_attachable(&self, parent: NodeId, child: NodeId) -> Result<()> {
        if child == self.root() {
            return Err(LecternError::InvalidDocument("the document root cannot be re-attached".into()));
        }
        if self.parent(child).is_some() {
            return Err(LecternError::InvalidDocument(format!(
                "node {} already has a parent",
                child.0
            )));
        }
        if self.contains(child, parent) {
            return Err(LecternError::InvalidDocument(format!(
                "attaching node {} below node {} would create a cycle",
                child.0, parent.0
            )));
        }
        if !matches!(self.kind(parent), NodeKind::Document | NodeKind::Element(_)) {
            return Err(LecternError::InvalidDocument(format!(
                "node {} cannot have children",
                parent.0
            )));
        }
        Ok(())
    }

    /// Appends a detached node as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.check_attachable(parent, child)?;
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    /// Inserts a detached node right before `reference`.
    pub fn insert_before(&mut self, reference: NodeId, child: NodeId) -> Result<()> {
        let parent = self
            .parent(reference)
            .ok_or_else(|| LecternError::InvalidDocument("reference node is detached".into()))?;
        self.check_attachable(parent, child)?;
        let index = self.index_in_parent(reference).unwrap_or(0);
        self.nodes[parent.0].children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    /// Detaches `id` (with its subtree) from its parent. No-op when already detached.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    /// Replaces `id` with its children, in place, and detaches it.
    ///
    /// Returns the spliced children. A detached node is left untouched.
    pub fn unwrap(&mut self, id: NodeId) -> Vec<NodeId> {
        let Some(parent) = self.parent(id) else {
            return Vec::new();
        };
        let index = self.index_in_parent(id).unwrap_or(0);
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for &child in &children {
            self.nodes[child.0].parent = Some(parent);
        }
        let siblings = &mut self.nodes[parent.0].children;
        siblings.splice(index..=index, children.iter().copied());
        self.nodes[id.0].parent = None;
        children
    }

    /// Puts the detached node `replacement` where `old` is, detaching `old`.
    pub fn replace(&mut self, old: NodeId, replacement: NodeId) -> Result<()> {
        let parent = self
            .parent(old)
            .ok_or_else(|| LecternError::InvalidDocument("cannot replace a detached node".into()))?;
        if self.contains(replacement, parent) || self.parent(replacement).is_some() || replacement == self.root() {
            return Err(LecternError::InvalidDocument(format!(
                "node {} cannot replace node {}",
                replacement.0, old.0
            )));
        }
        let index = self.index_in_parent(old).unwrap_or(0);
        self.nodes[parent.0].children[index] = replacement;
        self.nodes[replacement.0].parent = Some(parent);
        self.nodes[old.0].parent = None;
        Ok(())
    }

    /// Moves all children of `from` to the end of `to`.
    pub fn reparent_children(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        for child in self.children(from).to_vec() {
            self.detach(child);
            self.append(to, child)?;
        }
        Ok(())
    }

    /// Deep-copies `node` from `other` into this tree and returns the detached copy.
    pub fn import_subtree(&mut self, other: &DomTree, node: NodeId) -> NodeId {
        let copy = self.push(other.kind(node).clone());
        let mut stack = vec![(node, copy)];
        while let Some((source, target)) = stack.pop() {
            for &child in other.children(source) {
                let child_copy = self.push(other.kind(child).clone());
                self.nodes[target.0].children.push(child_copy);
                self.nodes[child_copy.0].parent = Some(target);
                stack.push((child, child_copy));
            }
        }
        copy
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the ancestors of a node, nearest first.
pub struct Ancestors<'a> {
    tree: &'a DomTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}
