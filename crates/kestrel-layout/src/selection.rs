//! The selection: a caret or a range between two positions.
//!
//! [§ Selection API: Definitions](https://w3c.github.io/selection-api/#definition)
//!
//! "Each selection can be associated with a single range... The anchor and
//! focus of selection are the start and end of its range respectively
//! unless its direction is backwards."
//!
//! The user moves the *extent* (focus) while the *base* (anchor) stays put.
//! After every mutation [`Selection::validate`] snaps both ends to leaf
//! positions, orders them, and widens them to the requested granularity to
//! produce `start` and `end`. Granularity is an argument of validation, not
//! state: selecting a word and then extending by character works on the
//! original base and extent.

use std::cmp::Ordering;
use std::fmt;

use kestrel_dom::{DomTree, NodeId};
use serde::Serialize;

use crate::geometry::Rect;
use crate::position::{LayoutView, Position, RenderPosition, find_word_boundary, find_word_boundary_for_end};

/// Whether anything is selected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, strum_macros::Display)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum SelectionState {
    /// No selection.
    #[default]
    None,
    /// A collapsed selection: start and end coincide.
    Caret,
    /// A non-empty range.
    Range,
}

/// How far `validate` widens the ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, strum_macros::Display, strum_macros::EnumString)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Granularity {
    /// Exactly the base and extent.
    #[default]
    Character,
    /// Out to word boundaries.
    Word,
    /// Out to the edges of the visual lines.
    Line,
}

/// Whether a modification moves the whole selection or only its extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum_macros::Display, strum_macros::EnumString)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Alter {
    /// Collapse to the new position.
    Move,
    /// Keep the base, move the extent.
    Extend,
}

/// Direction of a modification.
///
/// Left and right are logical: they alias backward and forward whatever
/// the paragraph direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum_macros::Display, strum_macros::EnumString)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum MoveDirection {
    /// Toward the end of the document.
    Forward,
    /// Toward the start of the document.
    Backward,
    /// Same as [`MoveDirection::Forward`].
    Right,
    /// Same as [`MoveDirection::Backward`].
    Left,
}

impl MoveDirection {
    const fn is_forward(self) -> bool {
        matches!(self, Self::Forward | Self::Right)
    }
}

/// Which side of a position the caret is drawn on when the two sides
/// differ (the end of one line and the start of the next).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, strum_macros::Display)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Affinity {
    /// With the content before the position.
    Upstream,
    /// With the content after the position.
    #[default]
    Downstream,
}

/// The end a vertical move measures its x coordinate from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    Start,
    End,
    Extent,
}

/// The range a selection reports to editing code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SelectionRange {
    /// First boundary point.
    pub start: Position,
    /// Last boundary point.
    pub end: Position,
}

/// A caret or range selection with cached caret geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    base: Position,
    extent: Position,
    start: Position,
    end: Position,
    state: SelectionState,
    affinity: Affinity,
    base_is_start: bool,
    modify_bias_set: bool,
    needs_caret_layout: bool,
    caret: Rect,
    /// Remembered x of the caret for consecutive up/down moves.
    x_pos_for_vertical_arrow: Option<i32>,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            base: Position::empty(),
            extent: Position::empty(),
            start: Position::empty(),
            end: Position::empty(),
            state: SelectionState::None,
            affinity: Affinity::Downstream,
            base_is_start: true,
            modify_bias_set: false,
            needs_caret_layout: true,
            caret: Rect::ZERO,
            x_pos_for_vertical_arrow: None,
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Selection[{} base={} extent={} start={} end={} {}]",
            self.state, self.base, self.extent, self.start, self.end, self.affinity
        )
    }
}

impl Selection {
    /// The empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A caret at `position`.
    #[must_use]
    pub fn caret(view: LayoutView<'_>, position: Position) -> Self {
        Self::range(view, position, position)
    }

    /// A selection from `base` to `extent`.
    #[must_use]
    pub fn range(view: LayoutView<'_>, base: Position, extent: Position) -> Self {
        let mut selection = Self {
            base,
            extent,
            ..Self::default()
        };
        selection.validate(view, Granularity::Character);
        selection
    }

    /// The fixed end.
    #[must_use]
    pub const fn base(&self) -> Position {
        self.base
    }

    /// The moving end.
    #[must_use]
    pub const fn extent(&self) -> Position {
        self.extent
    }

    /// The earlier end after validation.
    #[must_use]
    pub const fn start(&self) -> Position {
        self.start
    }

    /// The later end after validation.
    #[must_use]
    pub const fn end(&self) -> Position {
        self.end
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> SelectionState {
        self.state
    }

    /// Whether nothing is selected.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self.state, SelectionState::None)
    }

    /// Whether the base precedes the extent.
    #[must_use]
    pub const fn base_is_start(&self) -> bool {
        self.base_is_start
    }

    /// Where the caret is drawn: at the end the user is moving.
    #[must_use]
    pub const fn caret_pos(&self) -> Position {
        if self.base_is_start { self.end } else { self.start }
    }

    /// Current affinity.
    #[must_use]
    pub const fn affinity(&self) -> Affinity {
        self.affinity
    }

    /// Change the affinity; the caret is laid out again.
    pub fn set_affinity(&mut self, affinity: Affinity) {
        if affinity != self.affinity {
            self.affinity = affinity;
            self.needs_caret_layout = true;
        }
    }

    /// Whether the cached caret rectangle is stale.
    #[must_use]
    pub const fn needs_caret_layout(&self) -> bool {
        self.needs_caret_layout
    }

    /// Mark the cached caret rectangle stale, or fresh.
    pub const fn set_needs_layout(&mut self, flag: bool) {
        self.needs_caret_layout = flag;
    }

    /// Collapse to a caret at `position`.
    pub fn move_to(&mut self, view: LayoutView<'_>, position: Position) {
        self.move_to_range(view, position, position);
    }

    /// Select from `base` to `extent`.
    pub fn move_to_range(&mut self, view: LayoutView<'_>, base: Position, extent: Position) {
        self.x_pos_for_vertical_arrow = None;
        self.assign_and_validate(view, base, extent);
    }

    fn assign_and_validate(&mut self, view: LayoutView<'_>, base: Position, extent: Position) {
        self.base = base;
        self.extent = extent;
        self.validate(view, Granularity::Character);
    }

    /// Move the base.
    pub fn set_base(&mut self, view: LayoutView<'_>, position: Position) {
        self.move_to_range(view, position, self.extent);
    }

    /// Move the extent.
    pub fn set_extent(&mut self, view: LayoutView<'_>, position: Position) {
        self.move_to_range(view, self.base, position);
    }

    /// Move both ends.
    pub fn set_base_and_extent(&mut self, view: LayoutView<'_>, base: Position, extent: Position) {
        self.move_to_range(view, base, extent);
    }

    /// Move whichever of base and extent is currently the start.
    pub fn set_start(&mut self, view: LayoutView<'_>, position: Position) {
        if self.base_is_start {
            self.move_to_range(view, position, self.extent);
        } else {
            self.move_to_range(view, self.base, position);
        }
    }

    /// Move whichever of base and extent is currently the end.
    pub fn set_end(&mut self, view: LayoutView<'_>, position: Position) {
        if self.base_is_start {
            self.move_to_range(view, self.base, position);
        } else {
            self.move_to_range(view, position, self.extent);
        }
    }

    /// Select from `start` to `end`, with the base at `start`.
    pub fn set_start_and_end(&mut self, view: LayoutView<'_>, start: Position, end: Position) {
        self.move_to_range(view, start, end);
    }

    /// Drop the selection.
    pub fn clear(&mut self, view: LayoutView<'_>) {
        self.move_to_range(view, Position::empty(), Position::empty());
    }

    /// Collapse to a caret where the caret is drawn now.
    pub fn collapse(&mut self, view: LayoutView<'_>) {
        let caret = self.caret_pos();
        self.move_to(view, caret);
    }

    /// Move or extend by one unit of `granularity` in `direction`.
    ///
    /// Moving a range by character collapses it to the edge in that
    /// direction. Up/down moves (line granularity) keep the x coordinate
    /// of the first move in a series. Returns `false` when no new position
    /// was found.
    pub fn modify(&mut self, view: LayoutView<'_>, alter: Alter, direction: MoveDirection, granularity: Granularity) -> bool {
        if granularity != Granularity::Line {
            self.x_pos_for_vertical_arrow = None;
        }
        let forward = direction.is_forward();
        let pos = match alter {
            Alter::Extend => {
                if !self.modify_bias_set {
                    self.modify_bias_set = true;
                    if forward {
                        (self.base, self.extent) = (self.start, self.end);
                    } else {
                        (self.base, self.extent) = (self.end, self.start);
                    }
                }
                match (granularity, forward) {
                    (Granularity::Character, true) => self.extent.next_character_position(view),
                    (Granularity::Character, false) => self.extent.previous_character_position(view),
                    (Granularity::Word, true) => self.extent.next_word_position(view),
                    (Granularity::Word, false) => self.extent.previous_word_position(view),
                    (Granularity::Line, true) => {
                        let x = self.x_pos_for_vertical_arrow_navigation(view, Endpoint::Extent, false);
                        self.extent.next_line_position(view, x)
                    }
                    (Granularity::Line, false) => {
                        let x = self.x_pos_for_vertical_arrow_navigation(view, Endpoint::Extent, false);
                        self.extent.previous_line_position(view, x)
                    }
                }
            }
            Alter::Move => {
                self.modify_bias_set = false;
                let range = self.state == SelectionState::Range;
                match (granularity, forward) {
                    (Granularity::Character, true) if range => self.end,
                    (Granularity::Character, true) => self.extent.next_character_position(view),
                    (Granularity::Character, false) if range => self.start,
                    (Granularity::Character, false) => self.extent.previous_character_position(view),
                    (Granularity::Word, true) => self.extent.next_word_position(view),
                    (Granularity::Word, false) => self.extent.previous_word_position(view),
                    (Granularity::Line, true) => {
                        let x = self.x_pos_for_vertical_arrow_navigation(view, Endpoint::End, range);
                        self.end.next_line_position(view, x)
                    }
                    (Granularity::Line, false) => {
                        let x = self.x_pos_for_vertical_arrow_navigation(view, Endpoint::Start, range);
                        self.start.previous_line_position(view, x)
                    }
                }
            }
        };

        if pos.is_empty() {
            return false;
        }
        match alter {
            Alter::Move => self.assign_and_validate(view, pos, pos),
            Alter::Extend => self.assign_and_validate(view, self.base, pos),
        }
        true
    }

    /// Re-run validation at `granularity`. Returns `false` for an empty
    /// selection.
    pub fn expand_using_granularity(&mut self, view: LayoutView<'_>, granularity: Granularity) -> bool {
        if self.state == SelectionState::None {
            return false;
        }
        self.validate(view, granularity);
        true
    }

    /// The remembered x coordinate for up/down movement, measured from
    /// `endpoint` when nothing is remembered or `recalc` is set.
    fn x_pos_for_vertical_arrow_navigation(&mut self, view: LayoutView<'_>, endpoint: Endpoint, recalc: bool) -> i32 {
        if self.state == SelectionState::None {
            return 0;
        }
        if let Some(x) = self.x_pos_for_vertical_arrow.filter(|_| !recalc) {
            return x;
        }
        let pos = match endpoint {
            Endpoint::Start => self.start,
            Endpoint::End => self.end,
            Endpoint::Extent => self.extent,
        };
        let x = pos
            .node
            .and_then(|n| view.renderer(n))
            .and_then(|r| view.tree.caret_pos(r, pos.rendered_offset(view), false))
            .map_or(0, |rect| rect.x);
        self.x_pos_for_vertical_arrow = Some(x);
        x
    }

    /// The x coordinate up/down movement will aim for, if a series of
    /// vertical moves is in progress.
    #[must_use]
    pub const fn remembered_x(&self) -> Option<i32> {
        self.x_pos_for_vertical_arrow
    }

    /// The range editing code should act on.
    ///
    /// A caret reports its upstream position, so that style queries look
    /// at the character before it. A range is shrunk to the rendered
    /// content it covers: its start moves downstream and its end upstream,
    /// swapped back if only collapsed white space was selected. Both ends
    /// are then made range compliant.
    #[must_use]
    pub fn selection_range(&self, view: LayoutView<'_>) -> Option<SelectionRange> {
        match self.state {
            SelectionState::None => None,
            SelectionState::Caret => {
                let s = self
                    .start
                    .equivalent_upstream_position(view)
                    .equivalent_range_compliant_position(view);
                Some(SelectionRange { start: s, end: s })
            }
            SelectionState::Range => {
                let mut s = self.start.equivalent_downstream_position(view);
                let mut e = self.end.equivalent_upstream_position(view);
                let out_of_order = if s.node == e.node {
                    s.offset > e.offset
                } else {
                    !Self::node_is_before_node(view.dom, s.node, e.node)
                };
                if out_of_order {
                    std::mem::swap(&mut s, &mut e);
                }
                Some(SelectionRange {
                    start: s.equivalent_range_compliant_position(view),
                    end: e.equivalent_range_compliant_position(view),
                })
            }
        }
    }

    /// Compute the caret rectangle for the current caret position.
    pub fn layout_caret(&mut self, view: LayoutView<'_>) {
        let caret = self.caret_pos();
        let renderer = caret.node.and_then(|n| view.renderer(n));
        self.caret = match renderer {
            Some(r) if !self.is_empty() => {
                let offset = RenderPosition::from_dom_position(view, caret).rendered_offset(view);
                view.tree
                    .caret_pos(r, offset, false)
                    .unwrap_or(Rect::ZERO)
            }
            _ => Rect::ZERO,
        };
        self.needs_caret_layout = false;
    }

    /// The caret rectangle, laid out first if stale.
    pub fn caret_rect(&mut self, view: LayoutView<'_>) -> Rect {
        if self.needs_caret_layout {
            self.layout_caret(view);
        }
        self.caret
    }

    /// The area to repaint for the caret: its rectangle grown by a pixel on
    /// every side, three pixels wide.
    pub fn repaint_rect(&mut self, view: LayoutView<'_>) -> Rect {
        let caret = self.caret_rect(view);
        Rect::new(caret.x - 1, caret.y - 1, 3, caret.height + 2)
    }

    /// Move a caret that sits in unrendered content to the nearest rendered
    /// position in the same block, trying backwards first.
    ///
    /// Returns `false` for ranges, empty selections, and carets with
    /// nowhere to go.
    pub fn move_to_rendered_content(&mut self, view: LayoutView<'_>) -> bool {
        if self.state != SelectionState::Caret {
            return false;
        }
        let pos = self.start;
        if pos.in_rendered_content(view) {
            return true;
        }
        let Some(node) = pos.node else {
            return false;
        };
        let same_block = |p: &Position| p.node.is_some_and(|n| view.in_same_containing_block_flow_element(n, node));

        let prev = pos.previous_character_position(view);
        if prev != pos && same_block(&prev) {
            self.move_to(view, prev);
            return true;
        }
        let next = pos.next_character_position(view);
        if next != pos && same_block(&next) {
            self.move_to(view, next);
            return true;
        }
        false
    }

    /// Tree order of two nodes; a missing node or a node compared with
    /// itself counts as before.
    #[must_use]
    pub fn node_is_before_node(dom: &DomTree, a: Option<NodeId>, b: Option<NodeId>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => a == b || dom.is_before(a, b),
            _ => true,
        }
    }

    /// Recompute start, end and state from base and extent.
    ///
    /// STEP 1 snaps both ends to leaf positions. STEP 2 orders them. STEP 3
    /// widens each end independently to `granularity`. Running it twice in
    /// a row changes nothing.
    pub fn validate(&mut self, view: LayoutView<'_>, granularity: Granularity) {
        // STEP 1: Leaf positions. An empty end takes the other's value.
        let same = self.base == self.extent;
        if !self.base.is_empty() {
            self.base = self.base.equivalent_leaf_position(view);
            if same {
                self.extent = self.base;
            }
        }
        if !self.extent.is_empty() && !same {
            self.extent = self.extent.equivalent_leaf_position(view);
        }

        // STEP 2: Order.
        if self.base.is_empty() {
            self.base = self.extent;
            self.base_is_start = true;
        } else if self.extent.is_empty() {
            self.extent = self.base;
            self.base_is_start = true;
        } else {
            self.base_is_start = self.base.compare(&self.extent, view.dom) != Ordering::Greater;
        }

        // STEP 3: Widen.
        let (first, last) = if self.base_is_start {
            (self.base, self.extent)
        } else {
            (self.extent, self.base)
        };
        (self.start, self.end) = match granularity {
            Granularity::Character => (first, last),
            Granularity::Word => {
                let collapsed = first == last;
                (word_start(view, first), word_end(view, last, collapsed))
            }
            Granularity::Line => {
                let first_line = line_range(view, first);
                let last_line = line_range(view, last);
                (
                    first_line.map_or(first, |(s, _)| s),
                    last_line.map_or(last, |(_, e)| e),
                )
            }
        };

        // STEP 4: State.
        self.state = if self.start.is_empty() && self.end.is_empty() {
            SelectionState::None
        } else if self.start == self.end {
            SelectionState::Caret
        } else {
            SelectionState::Range
        };
        self.needs_caret_layout = true;

        #[cfg(feature = "layout-trace")]
        log::trace!("[SELECTION] {granularity}: {self}");
    }
}

fn text_chars(dom: &DomTree, node: NodeId) -> Option<Vec<char>> {
    dom.as_text(node).map(|t| t.chars().collect())
}

fn word_start(view: LayoutView<'_>, pos: Position) -> Position {
    let Some(node) = pos.node else {
        return pos;
    };
    match text_chars(view.dom, node) {
        Some(chars) => Position::new(node, find_word_boundary(&chars, pos.offset).start),
        None => pos,
    }
}

fn word_end(view: LayoutView<'_>, pos: Position, collapsed: bool) -> Position {
    let Some(node) = pos.node else {
        return pos;
    };
    let Some(chars) = text_chars(view.dom, node) else {
        return pos;
    };
    let boundary = if collapsed {
        find_word_boundary(&chars, pos.offset)
    } else {
        find_word_boundary_for_end(&chars, pos.offset)
    };
    Position::new(node, boundary.end)
}

/// The first and last positions of the visual line holding text position
/// `pos`, found by scanning the enclosing block's text boxes for the
/// first and last run on the same line.
fn line_range(view: LayoutView<'_>, pos: Position) -> Option<(Position, Position)> {
    let node = pos.node?;
    let tree = view.tree;
    let renderer = view.renderer(node)?;
    if !tree[renderer].is_text() {
        return None;
    }
    let (b, _) = RenderPosition::from_dom_position(view, pos).inline_box_and_offset(view);
    let root = tree.root_box(b?);

    let block = std::iter::once(renderer)
        .chain(tree.ancestors(renderer))
        .find(|&o| !tree[o].is_inline())?;
    let mut first = None;
    let mut last = None;
    let mut current = tree.first_leaf_object(block);
    while let Some(o) = current {
        if tree[o].is_text() {
            for tb in tree.line_boxes(o) {
                if tree.root_box(tb) != root {
                    continue;
                }
                let (Some(element), Some(run)) = (tree[o].element(), tree[tb].text_run()) else {
                    continue;
                };
                if first.is_none() {
                    first = Some((element, run.start));
                }
                last = Some((element, run.end()));
            }
        }
        current = tree.next_renderer(o).filter(|&n| tree.ancestors(n).any(|a| a == block));
    }
    let (start_node, start_offset) = first?;
    let (end_node, end_offset) = last?;
    Some((
        RenderPosition::new(view, start_node, start_offset).position(),
        RenderPosition::new(view, end_node, end_offset).position(),
    ))
}

#[cfg(test)]
mod tests {
    use kestrel_dom::{DomTree, NodeId};

    use super::*;
    use crate::render::RenderTree;
    use crate::settings::LayoutSettings;

    /// A text node outside any render tree: leaf snapping and word scans
    /// only need the DOM.
    fn hello_world() -> (DomTree, NodeId) {
        let mut dom = DomTree::new();
        let p = dom.create_element("p");
        let text = dom.create_text("Hello world");
        dom.append_child(NodeId::ROOT, p);
        dom.append_child(p, text);
        (dom, text)
    }

    #[test]
    fn test_word_granularity_selects_first_word() {
        let (dom, text) = hello_world();
        let tree = RenderTree::new(LayoutSettings::default());
        let view = LayoutView::new(&dom, &tree);
        let mut selection = Selection::range(view, Position::new(text, 0), Position::new(text, 5));
        selection.validate(view, Granularity::Word);
        assert_eq!(selection.start(), Position::new(text, 0));
        assert_eq!(selection.end(), Position::new(text, 5));
    }

    #[test]
    fn test_word_granularity_around_caret() {
        let (dom, text) = hello_world();
        let tree = RenderTree::new(LayoutSettings::default());
        let view = LayoutView::new(&dom, &tree);
        let mut selection = Selection::caret(view, Position::new(text, 7));
        assert!(selection.expand_using_granularity(view, Granularity::Word));
        assert_eq!(selection.start(), Position::new(text, 6));
        assert_eq!(selection.end(), Position::new(text, 11));
        assert_eq!(selection.state(), SelectionState::Range);
    }

    #[test]
    fn test_backward_range_orders_ends() {
        let (dom, text) = hello_world();
        let tree = RenderTree::new(LayoutSettings::default());
        let view = LayoutView::new(&dom, &tree);
        let selection = Selection::range(view, Position::new(text, 8), Position::new(text, 2));
        assert!(!selection.base_is_start());
        assert_eq!(selection.start(), Position::new(text, 2));
        assert_eq!(selection.end(), Position::new(text, 8));
        assert_eq!(selection.caret_pos(), Position::new(text, 2));
    }

    #[test]
    fn test_empty_end_takes_other_value() {
        let (dom, text) = hello_world();
        let tree = RenderTree::new(LayoutSettings::default());
        let view = LayoutView::new(&dom, &tree);
        let selection = Selection::range(view, Position::empty(), Position::new(text, 3));
        assert_eq!(selection.state(), SelectionState::Caret);
        assert_eq!(selection.base(), Position::new(text, 3));
    }

    #[test]
    fn test_clear_is_terminal_not_failure() {
        let (dom, text) = hello_world();
        let tree = RenderTree::new(LayoutSettings::default());
        let view = LayoutView::new(&dom, &tree);
        let mut selection = Selection::caret(view, Position::new(text, 3));
        selection.clear(view);
        assert!(selection.is_empty());
        assert!(!selection.expand_using_granularity(view, Granularity::Word));
        assert_eq!(selection.selection_range(view), None);
    }

    #[test]
    fn test_node_is_before_node_treats_missing_as_before() {
        let (dom, text) = hello_world();
        assert!(Selection::node_is_before_node(&dom, None, Some(text)));
        assert!(Selection::node_is_before_node(&dom, Some(text), Some(text)));
        assert!(!Selection::node_is_before_node(&dom, Some(text), Some(NodeId::ROOT)));
    }
}
