//! Logical document positions and their mapping onto rendered content.
//!
//! [§ 5.2 Boundary points](https://dom.spec.whatwg.org/#concept-range-bp)
//!
//! "A boundary point is a tuple consisting of a node (a node) and an offset
//! (a non-negative integer)."
//!
//! A [`Position`] is such a boundary point. It says nothing about where the
//! point is drawn: collapsed white space, line wrapping and bidi reordering
//! all sit between the DOM offset and the pixel. [`RenderPosition`] resolves
//! a position against the line boxes, and the navigation methods in this
//! module move positions the way a caret moves: by rendered character, word
//! or line, skipping DOM offsets that draw in the same place.
//!
//! Every query reads two trees at once, bundled as a [`LayoutView`].

mod iterator;
mod navigation;
mod render_position;
mod word;

use std::cmp::Ordering;
use std::fmt;

use kestrel_dom::{DomTree, NodeId};
use serde::Serialize;

use crate::render::{RenderId, RenderObject, RenderTree};

pub use iterator::PositionIterator;
pub use render_position::RenderPosition;
pub use word::{WordBoundary, find_word_boundary};
pub(crate) use word::find_word_boundary_for_end;

/// A point in the logical document: a node and an offset into it.
///
/// The offset counts characters for text nodes and children for element
/// nodes. Positions do not own their node; a position whose node has been
/// removed simply stops resolving to rendered content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Position {
    /// The container node, `None` for the empty position.
    pub node: Option<NodeId>,
    /// Offset into `node`.
    pub offset: usize,
}

impl Position {
    /// A position at `offset` inside `node`.
    #[must_use]
    pub const fn new(node: NodeId, offset: usize) -> Self {
        Self {
            node: Some(node),
            offset,
        }
    }

    /// The null position. Navigation that fails returns either this or the
    /// unmoved input.
    #[must_use]
    pub const fn empty() -> Self {
        Self { node: None, offset: 0 }
    }

    /// Whether this is the null position.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.node.is_none()
    }

    /// Tree order of two positions. The empty position sorts first.
    #[must_use]
    pub fn compare(&self, other: &Self, dom: &DomTree) -> Ordering {
        match (self.node, other.node) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => dom.compare_points((a, self.offset), (b, other.offset)),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node {
            Some(node) => write!(f, "({}:{})", node.0, self.offset),
            None => f.write_str("(empty)"),
        }
    }
}

/// The DOM and render tree of one document, read together.
///
/// Positions live in the DOM but every caret question is answered by the
/// render tree, so navigation takes both.
#[derive(Debug, Clone, Copy)]
pub struct LayoutView<'a> {
    /// The logical tree positions point into.
    pub dom: &'a DomTree,
    /// The laid out render tree.
    pub tree: &'a RenderTree,
}

impl<'a> LayoutView<'a> {
    /// Pair `dom` with the render tree generated for it.
    #[must_use]
    pub const fn new(dom: &'a DomTree, tree: &'a RenderTree) -> Self {
        Self { dom, tree }
    }

    /// The render object of `node`, if it is rendered.
    #[must_use]
    pub fn renderer(&self, node: NodeId) -> Option<RenderId> {
        self.tree.renderer(node)
    }

    fn object(&self, node: NodeId) -> Option<&'a RenderObject> {
        self.tree.get(self.tree.renderer(node)?)
    }

    /// Whether `node` renders as a block flow.
    #[must_use]
    pub fn is_block_flow(&self, node: NodeId) -> bool {
        self.object(node).is_some_and(|o| o.is_block_flow() && !o.is_inline())
    }

    /// The nearest node at or above `node` that renders as a block flow.
    ///
    /// `body` counts as a block even when it is not rendered as one.
    #[must_use]
    pub fn enclosing_block_flow_element(&self, node: NodeId) -> Option<NodeId> {
        if self.is_block_flow(node) {
            return Some(node);
        }
        self.dom
            .ancestors(node)
            .find(|&n| self.is_block_flow(n) || self.dom.tag_name(n) == Some("body"))
    }

    /// Whether `a` and `b` flow in the same block.
    #[must_use]
    pub fn in_same_containing_block_flow_element(&self, a: NodeId, b: NodeId) -> bool {
        self.enclosing_block_flow_element(a) == self.enclosing_block_flow_element(b)
    }

    /// Whether the caret may enter `node`: everywhere in caret browsing,
    /// otherwise only inside content-editable regions.
    #[must_use]
    pub fn is_navigable(&self, node: NodeId) -> bool {
        self.tree.settings().caret_browsing || self.dom.is_content_editable(node)
    }

    /// The outermost element the caret can reach from `node` without
    /// leaving its editable region. In caret browsing that is the body.
    #[must_use]
    pub fn root_navigable_element(&self, node: NodeId) -> Option<NodeId> {
        if self.tree.settings().caret_browsing {
            let html = self.dom.document_element()?;
            let body = self
                .dom
                .children(html)
                .iter()
                .copied()
                .find(|&c| self.dom.tag_name(c) == Some("body"));
            return Some(body.unwrap_or(html));
        }
        self.dom.root_editable_element(node)
    }

    /// Whether `a` and `b` share a root navigable element.
    #[must_use]
    pub fn in_same_root_navigable_element(&self, a: NodeId, b: NodeId) -> bool {
        let root = self.root_navigable_element(a);
        root.is_some() && root == self.root_navigable_element(b)
    }

    /// The next leaf after `node` the caret may enter.
    #[must_use]
    pub fn next_editable(&self, node: NodeId) -> Option<NodeId> {
        let mut current = self.dom.next_leaf_node(node);
        while let Some(n) = current {
            if self.is_navigable(n) {
                return Some(n);
            }
            current = self.dom.next_leaf_node(n);
        }
        None
    }

    /// The previous leaf before `node` the caret may enter.
    #[must_use]
    pub fn previous_editable(&self, node: NodeId) -> Option<NodeId> {
        let mut current = self.dom.previous_leaf_node(node);
        while let Some(n) = current {
            if self.is_navigable(n) {
                return Some(n);
            }
            current = self.dom.previous_leaf_node(n);
        }
        None
    }

    /// Largest offset a position inside `node` can have.
    ///
    /// Childless elements that render atomically (images, line breaks) have
    /// a position before and after them.
    #[must_use]
    pub fn max_offset(&self, node: NodeId) -> usize {
        if self.dom.is_text(node) || self.dom.has_children(node) {
            return self.dom.max_offset(node);
        }
        usize::from(self.object(node).is_some_and(|o| o.is_replaced() || o.is_br()))
    }

    /// Smallest DOM offset the caret can take in `node`.
    #[must_use]
    pub fn caret_min_offset(&self, node: NodeId) -> usize {
        match self.tree.renderer(node) {
            Some(r) => self.tree.convert_to_dom_position(r, self.tree.caret_min_offset(r)),
            None => 0,
        }
    }

    /// Largest DOM offset the caret can take in `node`.
    #[must_use]
    pub fn caret_max_offset(&self, node: NodeId) -> usize {
        match self.tree.renderer(node) {
            Some(r) => self.tree.convert_to_dom_position(r, self.tree.caret_max_offset(r)),
            None => self.max_offset(node),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_position_sorts_first() {
        let mut dom = DomTree::new();
        let p = dom.create_element("p");
        dom.append_child(NodeId::ROOT, p);
        let a = Position::new(p, 0);
        assert_eq!(Position::empty().compare(&a, &dom), Ordering::Less);
        assert_eq!(a.compare(&a, &dom), Ordering::Equal);
    }

    #[test]
    fn test_display_names_node_and_offset() {
        assert_eq!(Position::new(NodeId(4), 2).to_string(), "(4:2)");
        assert_eq!(Position::empty().to_string(), "(empty)");
    }
}
