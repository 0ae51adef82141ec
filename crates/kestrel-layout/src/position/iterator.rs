//! Stepping through every DOM position in document order.

use super::{LayoutView, Position};

/// Walks positions one offset at a time, hopping between leaf nodes at
/// node boundaries.
///
/// The iterator knows nothing about rendering: consecutive positions may
/// draw in the same place. Callers filter with
/// [`Position::renders_in_different_position`].
#[derive(Debug, Clone, Copy)]
pub struct PositionIterator<'a> {
    view: LayoutView<'a>,
    current: Position,
}

impl<'a> PositionIterator<'a> {
    /// An iterator standing on `position`.
    #[must_use]
    pub const fn new(view: LayoutView<'a>, position: Position) -> Self {
        Self { view, current: position }
    }

    /// The position the iterator stands on.
    #[must_use]
    pub const fn current(&self) -> Position {
        self.current
    }

    /// Jump to `position`.
    pub const fn set_position(&mut self, position: Position) {
        self.current = position;
    }

    /// The position one step back, without moving.
    #[must_use]
    pub fn peek_previous(&self) -> Position {
        let Some(node) = self.current.node else {
            return self.current;
        };
        if self.current.offset == 0 {
            return match self.view.dom.previous_leaf_node(node) {
                Some(prev) => Position::new(prev, self.view.max_offset(prev)),
                None => self.current,
            };
        }
        Position::new(node, self.current.offset - 1)
    }

    /// The position one step forward, without moving.
    #[must_use]
    pub fn peek_next(&self) -> Position {
        let Some(node) = self.current.node else {
            return self.current;
        };
        if self.current.offset >= self.view.max_offset(node) {
            return match self.view.dom.next_leaf_node(node) {
                Some(next) => Position::new(next, 0),
                None => self.current,
            };
        }
        Position::new(node, self.current.offset + 1)
    }

    /// Step back and return the new position.
    pub fn previous(&mut self) -> Position {
        self.current = self.peek_previous();
        self.current
    }

    /// Step forward and return the new position.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Position {
        self.current = self.peek_next();
        self.current
    }

    /// Whether no position precedes the current one.
    #[must_use]
    pub fn at_start(&self) -> bool {
        match self.current.node {
            None => true,
            Some(node) => self.current.offset == 0 && self.view.dom.previous_leaf_node(node).is_none(),
        }
    }

    /// Whether no position follows the current one.
    #[must_use]
    pub fn at_end(&self) -> bool {
        match self.current.node {
            None => true,
            Some(node) => {
                self.current.offset >= self.view.max_offset(node) && self.view.dom.next_leaf_node(node).is_none()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use kestrel_dom::{DomTree, NodeId};

    use super::*;
    use crate::render::RenderTree;
    use crate::settings::LayoutSettings;

    fn two_texts() -> (DomTree, NodeId, NodeId) {
        let mut dom = DomTree::new();
        let p = dom.create_element("p");
        let a = dom.create_text("ab");
        let b = dom.create_text("c");
        dom.append_child(NodeId::ROOT, p);
        dom.append_child(p, a);
        dom.append_child(p, b);
        (dom, a, b)
    }

    #[test]
    fn test_next_crosses_into_following_leaf() {
        let (dom, a, b) = two_texts();
        let tree = RenderTree::new(LayoutSettings::default());
        let view = LayoutView::new(&dom, &tree);
        let mut it = PositionIterator::new(view, Position::new(a, 1));
        assert_eq!(it.next(), Position::new(a, 2));
        assert_eq!(it.next(), Position::new(b, 0));
        assert_eq!(it.next(), Position::new(b, 1));
        assert!(it.at_end());
        assert_eq!(it.next(), Position::new(b, 1));
    }

    #[test]
    fn test_previous_lands_on_end_of_preceding_leaf() {
        let (dom, a, b) = two_texts();
        let tree = RenderTree::new(LayoutSettings::default());
        let view = LayoutView::new(&dom, &tree);
        let mut it = PositionIterator::new(view, Position::new(b, 0));
        assert_eq!(it.previous(), Position::new(a, 2));
        it.set_position(Position::new(a, 0));
        assert!(it.at_start());
    }
}
