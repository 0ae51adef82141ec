//! DOM tree consumed by the Kestrel layout core.
//!
//! This crate provides an arena-based DOM tree structure following the
//! [DOM Living Standard](https://dom.spec.whatwg.org/).
//!
//! # Design
//!
//! The tree uses arena allocation with [`NodeId`] indices for all relationships,
//! providing O(1) access and traversal without borrow checker issues. The
//! layout core never owns DOM nodes: render objects and positions hold plain
//! [`NodeId`] handles into the [`DomTree`] that outlives them.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::Serialize;

mod error;

pub use error::DomError;

/// Map of attribute names to values for an element.
pub type AttributesMap = HashMap<String, String>;

/// A type-safe index into the DOM tree.
///
/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
/// "Each node has an associated node document..."
///
/// `NodeId` provides O(1) access to any node in the tree without borrowing issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The root document node is always at index 0.
    pub const ROOT: Self = Self(0);
}

/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
///
/// "Node is an abstract interface that is used by all nodes in a tree."
#[derive(Debug, Clone)]
pub struct Node {
    /// "Each node has an associated node type"
    pub node_type: NodeType,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-parent)
    /// "An object that participates in a tree has a parent, which is either
    /// null or an object."
    pub parent: Option<NodeId>,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-child)
    /// "A node has an associated list of children"
    pub children: Vec<NodeId>,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-next-sibling)
    pub next_sibling: Option<NodeId>,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-previous-sibling)
    pub prev_sibling: Option<NodeId>,
}

impl Node {
    fn detached(node_type: NodeType) -> Self {
        Self {
            node_type,
            parent: None,
            children: Vec::new(),
            next_sibling: None,
            prev_sibling: None,
        }
    }
}

/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
///
/// "Each node has an associated node type"
#[derive(Debug, Clone)]
pub enum NodeType {
    /// [§ 4.5 Interface Document](https://dom.spec.whatwg.org/#interface-document)
    Document,
    /// [§ 4.9 Interface Element](https://dom.spec.whatwg.org/#interface-element)
    Element(ElementData),
    /// [§ 4.10 Interface Text](https://dom.spec.whatwg.org/#interface-text)
    Text(String),
    /// [§ 4.7 Interface Comment](https://dom.spec.whatwg.org/#interface-comment)
    Comment(String),
}

/// Element-specific data.
///
/// NOTE: We only store the local name and attributes. Namespaces and custom
/// element state are irrelevant to layout.
#[derive(Debug, Clone, Default)]
pub struct ElementData {
    /// "An element's local name"
    pub tag_name: String,
    /// "An element has an associated attribute list"
    pub attrs: AttributesMap,
}

impl ElementData {
    /// Create element data for `tag` with no attributes.
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self {
            tag_name: tag.to_ascii_lowercase(),
            attrs: AttributesMap::new(),
        }
    }

    /// Returns the element's id attribute value if present.
    #[must_use]
    pub fn id(&self) -> Option<&String> {
        self.attrs.get("id")
    }

    /// Returns the set of class names from the class attribute.
    #[must_use]
    pub fn classes(&self) -> HashSet<&str> {
        self.attrs
            .get("class")
            .map(|list| list.split_ascii_whitespace().collect())
            .unwrap_or_default()
    }

    /// [HTML § 6.8.1 Making document regions editable](https://html.spec.whatwg.org/multipage/interaction.html#contenteditable)
    ///
    /// "The contenteditable content attribute is an enumerated attribute whose
    /// keywords are the empty string, true, and false."
    ///
    /// Returns `Some(true)`/`Some(false)` for an explicit state and `None`
    /// for the inherit state.
    #[must_use]
    pub fn content_editable(&self) -> Option<bool> {
        let value = self.attrs.get("contenteditable")?;
        match value.to_ascii_lowercase().as_str() {
            "" | "true" | "plaintext-only" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }
}

/// Arena-based DOM tree with O(1) node access and traversal.
///
/// [§ 4 Nodes](https://dom.spec.whatwg.org/#nodes)
///
/// "The DOM represents a document as a tree."
///
/// Nodes are never freed individually: a removed node stays allocated and
/// detached, so stale [`NodeId`]s held by positions stay valid.
#[derive(Debug, Clone)]
pub struct DomTree {
    /// All nodes in the tree, indexed by `NodeId`.
    /// The Document node is always at index 0 (`NodeId::ROOT`).
    nodes: Vec<Node>,
}

impl DomTree {
    /// Create a new DOM tree with just the Document node.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::detached(NodeType::Document)],
        }
    }

    /// Get the root document node ID.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by its ID.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Get a mutable reference to a node by its ID.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Whether `id` names a node of this tree.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    /// Get the number of nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the tree is empty (should always have at least the Document).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a new node and return its ID.
    /// The node is not yet attached to the tree.
    pub fn alloc(&mut self, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::detached(node_type));
        id
    }

    /// Allocate a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeType::Element(ElementData::new(tag)))
    }

    /// Allocate a detached text node.
    pub fn create_text(&mut self, data: &str) -> NodeId {
        self.alloc(NodeType::Text(data.to_string()))
    }

    /// [§ 4.2.2 Append](https://dom.spec.whatwg.org/#concept-node-append)
    ///
    /// "To append a node to a parent, pre-insert node into parent before null."
    ///
    /// Appends `child` as the last child of `parent`, updating all relationships.
    /// A child that is already attached elsewhere is removed first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        let prev_last_child = self.nodes[parent.0].children.last().copied();

        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);

        if let Some(prev_id) = prev_last_child {
            self.nodes[prev_id.0].next_sibling = Some(child);
            self.nodes[child.0].prev_sibling = Some(prev_id);
        }
    }

    /// [§ 4.2.3 Pre-insert](https://dom.spec.whatwg.org/#concept-node-pre-insert)
    ///
    /// Inserts `child` into `parent` immediately before `reference`, or
    /// appends when `reference` is `None`.
    ///
    /// # Errors
    /// [`DomError::NotFound`] when `reference` is not a child of `parent`;
    /// [`DomError::HierarchyRequest`] when `child` is an inclusive ancestor
    /// of `parent`.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        if !self.contains(parent) || !self.contains(child) {
            return Err(DomError::NotFound);
        }
        if child == parent || self.is_descendant_of(parent, child) {
            return Err(DomError::HierarchyRequest);
        }
        let Some(reference) = reference else {
            self.append_child(parent, child);
            return Ok(());
        };
        if self.parent(reference) != Some(parent) {
            return Err(DomError::NotFound);
        }
        if reference == child {
            return Ok(());
        }

        self.detach(child);
        let index = self.node_index(reference);
        let before = self.nodes[reference.0].prev_sibling;

        self.nodes[parent.0].children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[child.0].prev_sibling = before;
        self.nodes[child.0].next_sibling = Some(reference);
        self.nodes[reference.0].prev_sibling = Some(child);
        if let Some(before) = before {
            self.nodes[before.0].next_sibling = Some(child);
        }
        Ok(())
    }

    /// [§ 4.2.3 Remove](https://dom.spec.whatwg.org/#concept-node-remove)
    ///
    /// Removes `child` from `parent`. The node stays allocated and detached.
    ///
    /// # Errors
    /// [`DomError::NotFound`] when `child` is not a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        if self.parent(child) != Some(parent) {
            return Err(DomError::NotFound);
        }
        self.detach(child);
        Ok(())
    }

    /// Move all children of `from` to the end of `to`, preserving order.
    pub fn move_children(&mut self, from: NodeId, to: NodeId) {
        let children = self.children(from).to_vec();
        for child in children {
            self.append_child(to, child);
        }
    }

    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.nodes[child.0].parent else {
            return;
        };
        let prev = self.nodes[child.0].prev_sibling;
        let next = self.nodes[child.0].next_sibling;
        if let Some(prev) = prev {
            self.nodes[prev.0].next_sibling = next;
        }
        if let Some(next) = next {
            self.nodes[next.0].prev_sibling = prev;
        }
        self.nodes[parent.0].children.retain(|&c| c != child);
        let node = &mut self.nodes[child.0];
        node.parent = None;
        node.prev_sibling = None;
        node.next_sibling = None;
    }

    /// Get the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Get all children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Whether the node has any children.
    #[must_use]
    pub fn has_children(&self, id: NodeId) -> bool {
        !self.children(id).is_empty()
    }

    /// Get the first child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.children.first().copied())
    }

    /// Get the last child of a node.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.children.last().copied())
    }

    /// Get the child at `index`, if any.
    #[must_use]
    pub fn child_at(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    /// Get the next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.next_sibling)
    }

    /// Get the previous sibling of a node.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.prev_sibling)
    }

    /// [§ 4.2.1 Index](https://dom.spec.whatwg.org/#concept-tree-index)
    ///
    /// "The index of an object is its number of preceding siblings, or 0 if it
    /// has none."
    #[must_use]
    pub fn node_index(&self, id: NodeId) -> usize {
        self.preceding_siblings(id).count()
    }

    /// [§ 4.2.6 Descendant](https://dom.spec.whatwg.org/#concept-tree-descendant)
    ///
    /// Check if `descendant` is a descendant of `ancestor`.
    #[must_use]
    pub fn is_descendant_of(&self, descendant: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(descendant).any(|id| id == ancestor)
    }

    /// Iterate over all ancestors of a node, from parent to root.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> AncestorIterator<'_> {
        AncestorIterator {
            tree: self,
            current: self.parent(id),
        }
    }

    /// Iterate over preceding siblings (from immediately before to first child).
    #[must_use]
    pub fn preceding_siblings(&self, id: NodeId) -> PrecedingSiblingIterator<'_> {
        PrecedingSiblingIterator {
            tree: self,
            current: self.prev_sibling(id),
        }
    }

    /// Get element data if this node is an element.
    #[must_use]
    pub fn as_element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(|n| match &n.node_type {
            NodeType::Element(data) => Some(data),
            _ => None,
        })
    }

    /// Mutable element data if this node is an element.
    pub fn as_element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.get_mut(id).and_then(|n| match &mut n.node_type {
            NodeType::Element(data) => Some(data),
            _ => None,
        })
    }

    /// Get text content if this node is a text node.
    #[must_use]
    pub fn as_text(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.node_type {
            NodeType::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Whether the node is a text node.
    #[must_use]
    pub fn is_text(&self, id: NodeId) -> bool {
        self.as_text(id).is_some()
    }

    /// Lower-case tag name of an element, if `id` is one.
    #[must_use]
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.as_element(id).map(|e| e.tag_name.as_str())
    }

    /// [§ 4.11 Interface CharacterData](https://dom.spec.whatwg.org/#interface-characterdata)
    ///
    /// Replace the data of a text node.
    ///
    /// # Errors
    /// [`DomError::NotFound`] when `id` is not a text node.
    pub fn set_text(&mut self, id: NodeId, data: &str) -> Result<(), DomError> {
        match self.get_mut(id).map(|n| &mut n.node_type) {
            Some(NodeType::Text(text)) => {
                data.clone_into(text);
                Ok(())
            }
            _ => Err(DomError::NotFound),
        }
    }

    /// Set an attribute on an element.
    ///
    /// # Errors
    /// [`DomError::NotFound`] when `id` is not an element.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let element = self.as_element_mut(id).ok_or(DomError::NotFound)?;
        let _ = element
            .attrs
            .insert(name.to_ascii_lowercase(), value.to_string());
        Ok(())
    }

    /// [§ 4.2 Boundary points](https://dom.spec.whatwg.org/#concept-node-length)
    ///
    /// "To determine the length of a node node: ... If node is a
    /// CharacterData node, then return node's data's length. Return the
    /// number of node's children."
    ///
    /// Lengths are counted in characters.
    #[must_use]
    pub fn max_offset(&self, id: NodeId) -> usize {
        match self.get(id).map(|n| &n.node_type) {
            Some(NodeType::Text(s) | NodeType::Comment(s)) => s.chars().count(),
            Some(_) => self.children(id).len(),
            None => 0,
        }
    }

    /// Tree order: whether `a` precedes `b` in a preorder, depth-first walk.
    ///
    /// [§ 4.2 Trees](https://dom.spec.whatwg.org/#concept-tree-order)
    ///
    /// "An object A is preceding an object B if A and B are in the same tree
    /// and A comes before B in tree order."
    ///
    /// Nodes in different trees are ordered by allocation so the relation
    /// stays total.
    #[must_use]
    pub fn is_before(&self, a: NodeId, b: NodeId) -> bool {
        self.tree_order(a, b) == Ordering::Less
    }

    /// Total order over nodes consistent with [`DomTree::is_before`].
    #[must_use]
    pub fn tree_order(&self, a: NodeId, b: NodeId) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        let path_a = self.path_from_root(a);
        let path_b = self.path_from_root(b);
        if path_a.first() != path_b.first() {
            return a.cmp(&b);
        }
        for (x, y) in path_a.iter().zip(path_b.iter()) {
            if x != y {
                return self.node_index(*x).cmp(&self.node_index(*y));
            }
        }
        // One path is a prefix of the other: the ancestor comes first.
        path_a.len().cmp(&path_b.len())
    }

    fn path_from_root(&self, id: NodeId) -> Vec<NodeId> {
        let mut path: Vec<NodeId> = self.ancestors(id).collect();
        path.reverse();
        path.push(id);
        path
    }

    /// [§ 5.2 Boundary points](https://dom.spec.whatwg.org/#concept-range-bp-position)
    ///
    /// "The position of a boundary point (nodeA, offsetA) relative to a
    /// boundary point (nodeB, offsetB) is before, equal, or after."
    #[must_use]
    pub fn compare_points(&self, a: (NodeId, usize), b: (NodeId, usize)) -> Ordering {
        let (node_a, offset_a) = a;
        let (node_b, offset_b) = b;

        // "If nodeA is the same as nodeB, then return before if offsetA is
        // less than offsetB, equal if offsetA is offsetB, and after if offsetA
        // is greater than offsetB."
        if node_a == node_b {
            return offset_a.cmp(&offset_b);
        }

        // "If nodeA is following nodeB, then if the position of (nodeB,
        // offsetB) relative to (nodeA, offsetA) is before, return after, and
        // if it is after, return before."
        if self.is_before(node_b, node_a) {
            return self.compare_points(b, a).reverse();
        }

        // "If nodeA is an ancestor of nodeB: Let child be nodeB. While child
        // is not a child of nodeA, set child to its parent. If child's index
        // is less than offsetA, then return after."
        if self.is_descendant_of(node_b, node_a) {
            let mut child = node_b;
            while let Some(parent) = self.parent(child) {
                if parent == node_a {
                    break;
                }
                child = parent;
            }
            if self.node_index(child) < offset_a {
                return Ordering::Greater;
            }
        }

        // "Return before."
        Ordering::Less
    }

    /// Next node in preorder, or `None` past the end.
    #[must_use]
    pub fn next_node(&self, id: NodeId) -> Option<NodeId> {
        if let Some(child) = self.first_child(id) {
            return Some(child);
        }
        self.next_node_skipping_children(id)
    }

    /// Next node in preorder that is not a descendant of `id`.
    #[must_use]
    pub fn next_node_skipping_children(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        loop {
            if let Some(next) = self.next_sibling(current) {
                return Some(next);
            }
            current = self.parent(current)?;
        }
    }

    /// Previous node in preorder, or `None` before the start.
    #[must_use]
    pub fn previous_node(&self, id: NodeId) -> Option<NodeId> {
        match self.prev_sibling(id) {
            Some(prev) => Some(self.deepest_last_descendant(prev)),
            None => self.parent(id),
        }
    }

    /// The last node in preorder of the subtree rooted at `id`.
    #[must_use]
    pub fn deepest_last_descendant(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(last) = self.last_child(current) {
            current = last;
        }
        current
    }

    /// The first leaf of the subtree rooted at `id`.
    #[must_use]
    pub fn deepest_first_descendant(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(first) = self.first_child(current) {
            current = first;
        }
        current
    }

    /// The next childless node after `id` in preorder.
    #[must_use]
    pub fn next_leaf_node(&self, id: NodeId) -> Option<NodeId> {
        let mut node = self.next_node(id);
        while let Some(current) = node {
            if !self.has_children(current) {
                return Some(current);
            }
            node = self.next_node(current);
        }
        None
    }

    /// The previous childless node before `id` in preorder.
    #[must_use]
    pub fn previous_leaf_node(&self, id: NodeId) -> Option<NodeId> {
        let mut node = self.previous_node(id);
        while let Some(current) = node {
            if !self.has_children(current) {
                return Some(current);
            }
            node = self.previous_node(current);
        }
        None
    }

    /// Whether the node's content is editable through `contenteditable` on
    /// itself or its nearest ancestor element that sets the attribute.
    #[must_use]
    pub fn is_content_editable(&self, id: NodeId) -> bool {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find_map(|n| self.as_element(n).and_then(ElementData::content_editable))
            .unwrap_or(false)
    }

    /// The outermost element of the editable region containing `id`.
    #[must_use]
    pub fn root_editable_element(&self, id: NodeId) -> Option<NodeId> {
        if !self.is_content_editable(id) {
            return None;
        }
        let mut result = if self.as_element(id).is_some() {
            id
        } else {
            self.parent(id)?
        };
        while let Some(parent) = self.parent(result) {
            if self.as_element(parent).is_none() || !self.is_content_editable(parent) {
                break;
            }
            result = parent;
        }
        Some(result)
    }

    /// Find the first element whose `id` attribute equals `value`.
    #[must_use]
    pub fn element_by_id(&self, value: &str) -> Option<NodeId> {
        let mut node = Some(NodeId::ROOT);
        while let Some(current) = node {
            if self
                .as_element(current)
                .and_then(ElementData::id)
                .is_some_and(|id| id == value)
            {
                return Some(current);
            }
            node = self.next_node(current);
        }
        None
    }

    /// [§ 3.1.1 The document element](https://html.spec.whatwg.org/multipage/dom.html#the-html-element-2)
    ///
    /// "The document element of a document is the element whose parent is that
    /// document, if it exists; otherwise null."
    #[must_use]
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(NodeId::ROOT)
            .iter()
            .find(|&&id| self.as_element(id).is_some())
            .copied()
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over ancestors of a node.
pub struct AncestorIterator<'a> {
    tree: &'a DomTree,
    current: Option<NodeId>,
}

impl Iterator for AncestorIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.parent(id);
        Some(id)
    }
}

/// Iterator over preceding siblings of a node.
pub struct PrecedingSiblingIterator<'a> {
    tree: &'a DomTree,
    current: Option<NodeId>,
}

impl Iterator for PrecedingSiblingIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.prev_sibling(id);
        Some(id)
    }
}
