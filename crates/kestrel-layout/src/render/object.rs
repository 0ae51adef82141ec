//! The render object: one participant in the visual tree.

use std::rc::Rc;

use bitflags::bitflags;
use kestrel_dom::NodeId;

use crate::arena::Handle;
use crate::geometry::{Edges, Rect};
use crate::line::BoxId;
use crate::style::{PositionType, RenderStyle};

/// Handle of a render object in its tree's arena.
pub type RenderId = Handle<RenderObject>;

/// Character data of a text renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextData {
    /// The DOM string, unmodified.
    pub dom: Vec<char>,
    /// The string as laid out: white space collapsed unless the style
    /// preserves it. Inline text box offsets index into this string.
    pub rendered: Vec<char>,
}

impl TextData {
    /// Build from DOM text, collapsing white space when `preserve` is false.
    ///
    /// [§ 16.6.1 The 'white-space' processing model](https://www.w3.org/TR/CSS2/text.html#white-space-model)
    ///
    /// "every tab (U+0009) is converted to a space (U+0020)"; "any space
    /// (U+0020) following another space (U+0020) ... is removed."
    #[must_use]
    pub fn new(dom: &str, preserve: bool) -> Self {
        let dom: Vec<char> = dom.chars().collect();
        let rendered = collapse_white_space(&dom, preserve);
        Self { dom, rendered }
    }

    /// Whether the rendered string differs from the DOM string.
    #[must_use]
    pub fn is_collapsed(&self) -> bool {
        self.dom != self.rendered
    }
}

/// Collapse each run of white space into a single space.
#[must_use]
pub fn collapse_white_space(text: &[char], preserve: bool) -> Vec<char> {
    if preserve {
        return text.to_vec();
    }
    let mut out = Vec::with_capacity(text.len());
    let mut in_space = false;
    for &c in text {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// The closed set of render object kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderKind {
    /// The root of the render tree; the initial containing block.
    Canvas,
    /// A block container. Inline-blocks are blocks with the `INLINE` and
    /// `REPLACED` flags set.
    Block,
    /// An inline flow element such as `<span>`.
    Inline,
    /// A run of text.
    Text(TextData),
    /// A forced line break (`<br>`).
    LineBreak,
    /// An atomic element with intrinsic dimensions, such as `<img>`.
    Replaced {
        /// Intrinsic content width.
        intrinsic_width: i32,
        /// Intrinsic content height.
        intrinsic_height: i32,
    },
    /// A block carrying a list marker counter.
    ListItem,
    /// A table wrapper, laid out as a block.
    Table,
    /// A row group, laid out as a block.
    TableSection,
    /// A table row, laid out as a block.
    TableRow,
    /// A column. Generates no boxes.
    TableColumn,
    /// A table cell, laid out as a block.
    TableCell,
}

bitflags! {
    /// State bits of a render object.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RenderFlags: u32 {
        /// Floated left or right.
        const FLOATING = 1;
        /// `position: absolute` or `fixed`.
        const POSITIONED = 1 << 1;
        /// `position: relative`.
        const REL_POSITIONED = 1 << 2;
        /// Atomic inline-level content.
        const REPLACED = 1 << 3;
        /// Participates in an inline formatting context.
        const INLINE = 1 << 4;
        /// Generated wrapper with no DOM node of its own.
        const ANONYMOUS = 1 << 5;
        /// A block whose children are all inline-level.
        const CHILDREN_INLINE = 1 << 6;
        /// The object itself must be laid out again.
        const NEEDS_LAYOUT = 1 << 7;
        /// Some in-flow descendant needs layout.
        const NORMAL_CHILD_NEEDS_LAYOUT = 1 << 8;
        /// Some out-of-flow descendant needs layout.
        const POS_CHILD_NEEDS_LAYOUT = 1 << 9;
        /// Intrinsic min/max widths are stale.
        const MIN_MAX_DIRTY = 1 << 10;
        /// Already marked during the current formatting-context walk.
        const MARKED_FOR_REPAINT = 1 << 11;
    }
}

impl RenderFlags {
    /// Any of the three layout dirty bits.
    pub const ANY_LAYOUT: Self = Self::NEEDS_LAYOUT
        .union(Self::NORMAL_CHILD_NEEDS_LAYOUT)
        .union(Self::POS_CHILD_NEEDS_LAYOUT);
}

/// One node of the render tree.
///
/// Tree links are handles into the owning [`RenderTree`](super::RenderTree);
/// the DOM back-reference never owns the node. Geometry is relative to the
/// containing block for block-level and atomic objects; inline flows and
/// text keep `x`/`y` at their relative offset and carry their geometry in
/// their inline boxes.
#[derive(Debug, Clone)]
pub struct RenderObject {
    /// What kind of object this is.
    pub kind: RenderKind,
    /// Resolved style, shared with siblings of identical style.
    pub style: Rc<RenderStyle>,
    /// Originating DOM node. Anonymous objects point at the nearest real
    /// ancestor, for style inheritance only.
    pub node: Option<NodeId>,
    /// Parent object.
    pub parent: Option<RenderId>,
    /// Previous sibling.
    pub prev_sibling: Option<RenderId>,
    /// Next sibling.
    pub next_sibling: Option<RenderId>,
    /// First child.
    pub first_child: Option<RenderId>,
    /// Last child.
    pub last_child: Option<RenderId>,
    /// State bits.
    pub flags: RenderFlags,
    /// Left edge of the border box.
    pub x: i32,
    /// Top edge of the border box.
    pub y: i32,
    /// Border-box width.
    pub width: i32,
    /// Border-box height.
    pub height: i32,
    /// Used margins.
    pub margin: Edges<i32>,
    /// Used padding.
    pub padding: Edges<i32>,
    /// Position before relative offsets, or the static position of an
    /// out-of-flow object.
    pub static_x: i32,
    /// See [`static_x`](Self::static_x).
    pub static_y: i32,
    /// Height of the content from the last layout, before `height` was
    /// applied.
    pub content_height: i32,
    /// Extent of visible overflow, relative to the border box.
    pub overflow: Rect,
    /// First line box: root boxes for a block with inline children, flow
    /// boxes for an inline, text boxes for text.
    pub first_line_box: Option<BoxId>,
    /// Last line box.
    pub last_line_box: Option<BoxId>,
    /// The box standing in for atomic, floating or positioned content on
    /// its parent's line.
    pub placeholder_box: Option<BoxId>,
    /// Narrowest width without overflow.
    pub min_width: i32,
    /// Width with no line breaks except forced ones.
    pub max_width: i32,
}

impl RenderObject {
    /// A detached object of `kind` with `style`.
    #[must_use]
    pub fn new(kind: RenderKind, style: Rc<RenderStyle>, node: Option<NodeId>) -> Self {
        let mut object = Self {
            kind,
            style,
            node,
            parent: None,
            prev_sibling: None,
            next_sibling: None,
            first_child: None,
            last_child: None,
            flags: RenderFlags::NEEDS_LAYOUT | RenderFlags::MIN_MAX_DIRTY,
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            margin: Edges::default(),
            padding: Edges::default(),
            static_x: 0,
            static_y: 0,
            content_height: 0,
            overflow: Rect::ZERO,
            first_line_box: None,
            last_line_box: None,
            placeholder_box: None,
            min_width: 0,
            max_width: 0,
        };
        object.update_style_flags();
        object
    }

    /// Recompute the style-derived flags.
    pub fn update_style_flags(&mut self) {
        let style = Rc::clone(&self.style);
        self.flags.remove(
            RenderFlags::FLOATING
                | RenderFlags::POSITIONED
                | RenderFlags::REL_POSITIONED
                | RenderFlags::INLINE,
        );
        let inline = match self.kind {
            RenderKind::Text(_) | RenderKind::LineBreak | RenderKind::Inline => true,
            RenderKind::Canvas
            | RenderKind::TableSection
            | RenderKind::TableRow
            | RenderKind::TableColumn
            | RenderKind::TableCell => false,
            _ => !style.display.is_block_level(),
        };
        if matches!(self.kind, RenderKind::Canvas) {
            return;
        }
        let out_of_flow = style.position.is_out_of_flow() && !self.is_text_or_br();
        self.flags.set(RenderFlags::INLINE, inline && !out_of_flow);
        self.flags.set(RenderFlags::POSITIONED, out_of_flow);
        self.flags.set(
            RenderFlags::REL_POSITIONED,
            style.position == PositionType::Relative && !self.is_text_or_br(),
        );
        self.flags.set(
            RenderFlags::FLOATING,
            style.is_floating() && !self.is_text_or_br() && !matches!(self.kind, RenderKind::Inline),
        );
        let replaced = matches!(self.kind, RenderKind::Replaced { .. })
            || (matches!(self.kind, RenderKind::Block) && inline);
        self.flags.set(RenderFlags::REPLACED, replaced);
        if self.is_floating() || self.is_positioned() {
            self.flags.remove(RenderFlags::INLINE);
        }
    }

    /// The DOM element this object was generated for; `None` when anonymous.
    #[must_use]
    pub const fn element(&self) -> Option<NodeId> {
        if self.flags.contains(RenderFlags::ANONYMOUS) {
            None
        } else {
            self.node
        }
    }

    /// Text renderer.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self.kind, RenderKind::Text(_))
    }

    /// Line break renderer.
    #[must_use]
    pub const fn is_br(&self) -> bool {
        matches!(self.kind, RenderKind::LineBreak)
    }

    const fn is_text_or_br(&self) -> bool {
        self.is_text() || self.is_br()
    }

    /// The render tree root.
    #[must_use]
    pub const fn is_canvas(&self) -> bool {
        matches!(self.kind, RenderKind::Canvas)
    }

    /// Inline flow container (`<span>`, `<b>`...).
    #[must_use]
    pub const fn is_inline_flow(&self) -> bool {
        matches!(self.kind, RenderKind::Inline)
    }

    /// A block container that can own line boxes.
    #[must_use]
    pub const fn is_block_flow(&self) -> bool {
        matches!(
            self.kind,
            RenderKind::Canvas
                | RenderKind::Block
                | RenderKind::ListItem
                | RenderKind::Table
                | RenderKind::TableSection
                | RenderKind::TableRow
                | RenderKind::TableCell
        )
    }

    /// List item.
    #[must_use]
    pub const fn is_list_item(&self) -> bool {
        matches!(self.kind, RenderKind::ListItem)
    }

    /// Table cell.
    #[must_use]
    pub const fn is_table_cell(&self) -> bool {
        matches!(self.kind, RenderKind::TableCell)
    }

    /// Table row, row group or column; never a containing block.
    #[must_use]
    pub const fn is_table_part(&self) -> bool {
        matches!(
            self.kind,
            RenderKind::TableRow | RenderKind::TableSection | RenderKind::TableColumn
        )
    }

    /// Whether the object sits on a line as a single placeholder box
    /// rather than as text or flow boxes.
    #[must_use]
    pub const fn is_box(&self) -> bool {
        !self.is_text() && !self.is_inline_flow()
    }

    /// Padding plus border on each side.
    #[must_use]
    pub fn border_and_padding(&self) -> Edges<i32> {
        let b = self.style.border;
        Edges {
            top: b.top + self.padding.top,
            right: b.right + self.padding.right,
            bottom: b.bottom + self.padding.bottom,
            left: b.left + self.padding.left,
        }
    }

    /// Floated.
    #[must_use]
    pub const fn is_floating(&self) -> bool {
        self.flags.contains(RenderFlags::FLOATING)
    }

    /// Absolutely or fixed positioned.
    #[must_use]
    pub const fn is_positioned(&self) -> bool {
        self.flags.contains(RenderFlags::POSITIONED)
    }

    /// Relatively positioned.
    #[must_use]
    pub const fn is_rel_positioned(&self) -> bool {
        self.flags.contains(RenderFlags::REL_POSITIONED)
    }

    /// Atomic inline-level content.
    #[must_use]
    pub const fn is_replaced(&self) -> bool {
        self.flags.contains(RenderFlags::REPLACED)
    }

    /// Inline-level.
    #[must_use]
    pub const fn is_inline(&self) -> bool {
        self.flags.contains(RenderFlags::INLINE)
    }

    /// Generated wrapper.
    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        self.flags.contains(RenderFlags::ANONYMOUS)
    }

    /// Block whose children are inline-level.
    #[must_use]
    pub const fn children_inline(&self) -> bool {
        self.flags.contains(RenderFlags::CHILDREN_INLINE)
    }

    /// The object itself needs layout.
    #[must_use]
    pub const fn self_needs_layout(&self) -> bool {
        self.flags.contains(RenderFlags::NEEDS_LAYOUT)
    }

    /// The object or any descendant needs layout.
    #[must_use]
    pub const fn needs_layout(&self) -> bool {
        self.flags.intersects(RenderFlags::ANY_LAYOUT)
    }

    /// The text data of a text renderer.
    #[must_use]
    pub const fn text(&self) -> Option<&TextData> {
        match &self.kind {
            RenderKind::Text(data) => Some(data),
            _ => None,
        }
    }

    /// Length of the rendered string; zero for non-text.
    #[must_use]
    pub fn rendered_len(&self) -> usize {
        self.text().map_or(0, |t| t.rendered.len())
    }

    /// Border box relative to the containing block.
    #[must_use]
    pub const fn frame(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Resolved border widths.
    #[must_use]
    pub fn border(&self) -> Edges<i32> {
        self.style.border
    }

    /// Whether this object establishes a new block formatting context for
    /// its children.
    #[must_use]
    pub fn has_overflow_clip(&self) -> bool {
        self.style.has_overflow_clip() && !self.is_inline_flow() && !self.is_text_or_br()
    }

    /// Short name used by tree dumps.
    #[must_use]
    pub const fn render_name(&self) -> &'static str {
        match self.kind {
            RenderKind::Canvas => "RenderCanvas",
            RenderKind::Block if self.flags.contains(RenderFlags::INLINE) => "RenderBlock (inline-block)",
            RenderKind::Block => "RenderBlock",
            RenderKind::Inline => "RenderInline",
            RenderKind::Text(_) => "RenderText",
            RenderKind::LineBreak => "RenderBR",
            RenderKind::Replaced { .. } => "RenderReplaced",
            RenderKind::ListItem => "RenderListItem",
            RenderKind::Table => "RenderTable",
            RenderKind::TableSection => "RenderTableSection",
            RenderKind::TableRow => "RenderTableRow",
            RenderKind::TableColumn => "RenderTableCol",
            RenderKind::TableCell => "RenderTableCell",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{Display, Float};

    #[test]
    fn test_collapse_white_space() {
        let text: Vec<char> = "  a \n\t b  ".chars().collect();
        let collapsed: String = collapse_white_space(&text, false).into_iter().collect();
        assert_eq!(collapsed, " a b ");
        let kept: String = collapse_white_space(&text, true).into_iter().collect();
        assert_eq!(kept, "  a \n\t b  ");
    }

    #[test]
    fn test_inline_block_is_replaced_inline() {
        let style = Rc::new(RenderStyle::default().with_display(Display::InlineBlock));
        let object = RenderObject::new(RenderKind::Block, style, None);
        assert!(object.is_inline());
        assert!(object.is_replaced());
        assert!(object.is_block_flow());
    }

    #[test]
    fn test_floats_leave_the_inline_flow() {
        let mut style = RenderStyle::default();
        style.float = Float::Left;
        let object = RenderObject::new(
            RenderKind::Replaced {
                intrinsic_width: 10,
                intrinsic_height: 10,
            },
            Rc::new(style),
            None,
        );
        assert!(object.is_floating());
        assert!(!object.is_inline());
    }
}
