//! Line boxes: the per-line inline box trees built by inline layout.
//!
//! [§ 9.4.2 Inline formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#inline-formatting)
//!
//! "In an inline formatting context, boxes are laid out horizontally, one
//! after the other, beginning at the top of a containing block. ... The
//! rectangular area that contains the boxes that form a line is called a
//! line box."
//!
//! Each visual line is a root box ([`BoxKind::Root`]) owned by the block.
//! Its children, linked through `next_on_line`/`prev_on_line`, are leaf
//! boxes for atomic content and line breaks, text boxes for runs of rendered
//! text, and flow boxes for inline elements, which own children of their
//! own. Independently, `next_line_box`/`prev_line_box` chain together the
//! boxes a single render object produced across lines.
//!
//! Boxes live in the render tree's box arena and are addressed by [`BoxId`].
//! The operations are methods on [`RenderTree`](crate::RenderTree) so they
//! can reach both the boxes and the objects they were generated for.

mod ellipsis;
mod flow;
mod placement;

use std::rc::Rc;

use bitflags::bitflags;
use unicode_bidi::BidiClass;

use crate::arena::Handle;
use crate::render::RenderId;
use crate::style::Direction;

/// Handle of an inline box in its tree's box arena.
pub type BoxId = Handle<InlineBox>;

/// Vertical position sentinel: align with the top of the line box.
pub const POSITION_TOP: i32 = -0x4000;
/// Vertical position sentinel: align with the bottom of the line box.
pub const POSITION_BOTTOM: i32 = 0x4000;

bitflags! {
    /// State bits of an inline box.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BoxFlags: u16 {
        /// Stale; the line must be rebuilt.
        const DIRTY = 1;
        /// Temporarily unlinked from its object's line box chain.
        const EXTRACTED = 1 << 1;
        /// Lies on the first line of its block.
        const FIRST_LINE = 1 << 2;
        /// Fully built by the line layout pass.
        const CONSTRUCTED = 1 << 3;
        /// Margin, border and padding of the left side apply on this line.
        const INCLUDE_LEFT_EDGE = 1 << 4;
        /// Margin, border and padding of the right side apply on this line.
        const INCLUDE_RIGHT_EDGE = 1 << 5;
        /// A direct child is text.
        const HAS_TEXT_CHILDREN = 1 << 6;
        /// Some descendant is text.
        const HAS_TEXT_DESCENDANT = 1 << 7;
        /// The line ends with a forced break.
        const ENDS_WITH_BREAK = 1 << 8;
        /// Right-to-left run; characters are painted in reverse.
        const REVERSED = 1 << 9;
    }
}

/// How much of a text run is hidden behind an ellipsis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Truncation {
    /// The whole run is visible.
    #[default]
    None,
    /// The whole run is hidden.
    Full,
    /// Characters from this rendered offset on are hidden.
    At(usize),
}

/// The slice of rendered text a text box covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextRun {
    /// First rendered offset.
    pub start: usize,
    /// Number of characters.
    pub len: usize,
    /// Ellipsis truncation state.
    pub truncation: Truncation,
}

impl TextRun {
    /// One past the last rendered offset.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Child list of a flow or root box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlowChildren {
    /// First child on the line.
    pub first: Option<BoxId>,
    /// Last child on the line.
    pub last: Option<BoxId>,
}

/// Bidi state at a line break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BidiStatus {
    /// Class at the end of the last resolved run.
    pub eor: BidiClass,
    /// Last strong class seen.
    pub last_strong: BidiClass,
    /// Class of the last character.
    pub last: BidiClass,
}

impl Default for BidiStatus {
    fn default() -> Self {
        Self {
            eor: BidiClass::ON,
            last_strong: BidiClass::ON,
            last: BidiClass::ON,
        }
    }
}

/// An embedding level and its enclosing contexts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidiContext {
    /// Embedding level.
    pub level: u8,
    /// Direction of the embedding.
    pub direction: Direction,
    /// Whether the embedding overrides character classes.
    pub is_override: bool,
    /// Enclosing context.
    pub parent: Option<Rc<BidiContext>>,
}

/// The truncation marker placed on an overflowing line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EllipsisBox {
    /// Text drawn.
    pub text: String,
    /// Left edge, relative to the block.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Advance of the text.
    pub width: i32,
    /// Line height.
    pub height: i32,
    /// Baseline offset from `y`.
    pub baseline: i32,
}

/// Per-line bookkeeping held by root boxes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineInfo {
    /// Object where the next line resumes; `None` at the end of the block.
    pub line_break_obj: Option<RenderId>,
    /// Rendered offset inside `line_break_obj`.
    pub line_break_pos: usize,
    /// Bidi state at the break.
    pub bidi_status: BidiStatus,
    /// Embedding context at the break.
    pub context: Option<Rc<BidiContext>>,
    /// Topmost painted pixel, relative to the block.
    pub top_overflow: i32,
    /// Bottommost painted pixel, relative to the block.
    pub bottom_overflow: i32,
    /// Height of the block at the end of this line; where the next line
    /// starts.
    pub block_height: i32,
    /// Ellipsis marker, when the line is truncated.
    pub ellipsis: Option<EllipsisBox>,
}

/// What an inline box represents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoxKind {
    /// Atomic content or a line break.
    Leaf,
    /// A run of text.
    Text(TextRun),
    /// An inline element on one line.
    Flow(FlowChildren),
    /// One visual line.
    Root(FlowChildren, Box<LineInfo>),
}

/// A rectangle on a line, generated by one render object.
#[derive(Debug, Clone)]
pub struct InlineBox {
    /// The object this box is a piece of.
    pub object: RenderId,
    /// Left edge, relative to the block.
    pub x: i32,
    /// Top edge, relative to the block.
    pub y: i32,
    /// Horizontal extent.
    pub width: i32,
    /// Vertical extent.
    pub height: i32,
    /// Baseline offset from `y`.
    pub baseline: i32,
    /// Enclosing flow or root box.
    pub parent: Option<BoxId>,
    /// Next box on the same line.
    pub next_on_line: Option<BoxId>,
    /// Previous box on the same line.
    pub prev_on_line: Option<BoxId>,
    /// Next box of the same object, on a later line.
    pub next_line_box: Option<BoxId>,
    /// Previous box of the same object, on an earlier line.
    pub prev_line_box: Option<BoxId>,
    /// State bits.
    pub flags: BoxFlags,
    /// Resolved bidi embedding level.
    pub bidi_level: u8,
    /// Variant data.
    pub kind: BoxKind,
}

impl InlineBox {
    /// A detached box for `object`.
    #[must_use]
    pub fn new(object: RenderId, kind: BoxKind) -> Self {
        // Leaves answer "yes" to the text child queries so that atomic
        // content always contributes to line height.
        let flags = match kind {
            BoxKind::Leaf | BoxKind::Text(_) => {
                BoxFlags::HAS_TEXT_CHILDREN | BoxFlags::HAS_TEXT_DESCENDANT
            }
            BoxKind::Flow(_) | BoxKind::Root(..) => BoxFlags::empty(),
        };
        Self {
            object,
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            baseline: 0,
            parent: None,
            next_on_line: None,
            prev_on_line: None,
            next_line_box: None,
            prev_line_box: None,
            flags,
            bidi_level: 0,
            kind,
        }
    }

    /// Text box.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self.kind, BoxKind::Text(_))
    }

    /// Flow or root box.
    #[must_use]
    pub const fn is_flow(&self) -> bool {
        matches!(self.kind, BoxKind::Flow(_) | BoxKind::Root(..))
    }

    /// Root box.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        matches!(self.kind, BoxKind::Root(..))
    }

    /// The text run of a text box.
    #[must_use]
    pub const fn text_run(&self) -> Option<&TextRun> {
        match &self.kind {
            BoxKind::Text(run) => Some(run),
            _ => None,
        }
    }

    /// Child list of a flow or root box.
    #[must_use]
    pub const fn children(&self) -> Option<&FlowChildren> {
        match &self.kind {
            BoxKind::Flow(children) | BoxKind::Root(children, _) => Some(children),
            _ => None,
        }
    }

    pub(crate) const fn children_mut(&mut self) -> Option<&mut FlowChildren> {
        match &mut self.kind {
            BoxKind::Flow(children) | BoxKind::Root(children, _) => Some(children),
            _ => None,
        }
    }

    /// Line bookkeeping of a root box.
    #[must_use]
    pub fn line_info(&self) -> Option<&LineInfo> {
        match &self.kind {
            BoxKind::Root(_, info) => Some(info),
            _ => None,
        }
    }

    pub(crate) fn line_info_mut(&mut self) -> Option<&mut LineInfo> {
        match &mut self.kind {
            BoxKind::Root(_, info) => Some(info),
            _ => None,
        }
    }

    /// First child on the line.
    #[must_use]
    pub const fn first_child(&self) -> Option<BoxId> {
        match self.children() {
            Some(c) => c.first,
            None => None,
        }
    }

    /// Last child on the line.
    #[must_use]
    pub const fn last_child(&self) -> Option<BoxId> {
        match self.children() {
            Some(c) => c.last,
            None => None,
        }
    }

    /// Stale.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.flags.contains(BoxFlags::DIRTY)
    }

    /// Whether a child is text. Always true for leaves.
    #[must_use]
    pub const fn has_text_children(&self) -> bool {
        self.flags.contains(BoxFlags::HAS_TEXT_CHILDREN)
    }

    /// Whether a descendant is text. Always true for leaves.
    #[must_use]
    pub const fn has_text_descendant(&self) -> bool {
        self.flags.contains(BoxFlags::HAS_TEXT_DESCENDANT)
    }

    /// Right-to-left run.
    #[must_use]
    pub const fn is_reversed(&self) -> bool {
        self.flags.contains(BoxFlags::REVERSED)
    }

    /// Smallest caret offset inside this box.
    #[must_use]
    pub const fn caret_min_offset(&self) -> usize {
        match &self.kind {
            BoxKind::Text(run) => run.start,
            _ => 0,
        }
    }

    /// Largest caret offset inside this box.
    #[must_use]
    pub const fn caret_max_offset(&self) -> usize {
        match &self.kind {
            BoxKind::Text(run) => run.end(),
            _ => 1,
        }
    }
}
