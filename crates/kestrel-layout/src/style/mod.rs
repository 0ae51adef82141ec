//! The resolved style snapshot consumed by the render tree.
//!
//! Cascading happens upstream; the layout core only ever sees fully resolved
//! values. Render objects hold their style as `Rc<RenderStyle>` so siblings
//! with identical computed style share one allocation, and a render object
//! can never be without a style.

mod diff;
mod values;

pub use diff::StyleDiff;
pub use values::{
    Clear, CounterDirective, Direction, Display, Float, Length, LineHeight, Overflow, PositionType,
    TextAlign, TextOverflow, UnicodeBidi, VerticalAlign, Visibility, WhiteSpace,
};

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::geometry::Edges;

/// Default font size in pixels.
pub const DEFAULT_FONT_SIZE: i32 = 16;

/// Resolved visual properties of one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderStyle {
    /// 'display'.
    pub display: Display,
    /// 'position'.
    pub position: PositionType,
    /// 'float'.
    pub float: Float,
    /// 'clear'.
    pub clear: Clear,
    /// 'direction'. Inherited.
    pub direction: Direction,
    /// 'unicode-bidi'.
    pub unicode_bidi: UnicodeBidi,
    /// 'visibility'. Inherited.
    pub visibility: Visibility,
    /// 'white-space'. Inherited.
    pub white_space: WhiteSpace,
    /// 'text-align'. Inherited.
    pub text_align: TextAlign,
    /// 'text-overflow'.
    pub text_overflow: TextOverflow,
    /// 'overflow'.
    pub overflow: Overflow,
    /// 'vertical-align'.
    pub vertical_align: VerticalAlign,
    /// Font size in pixels. Inherited.
    pub font_size: i32,
    /// 'line-height'. Inherited.
    pub line_height: LineHeight,
    /// 'width'.
    pub width: Length,
    /// 'height'.
    pub height: Length,
    /// 'margin-*'.
    pub margin: Edges<Length>,
    /// 'padding-*'. `auto` resolves to zero.
    pub padding: Edges<Length>,
    /// 'border-*-width' in pixels.
    pub border: Edges<i32>,
    /// 'top', 'right', 'bottom', 'left'.
    pub offsets: Edges<Length>,
    /// 'z-index'; `None` is `auto`.
    pub z_index: Option<i32>,
    /// 'color' as packed RGBA. Inherited.
    pub color: u32,
    /// 'background-color' as packed RGBA.
    pub background_color: u32,
    /// 'outline-width' in pixels.
    pub outline_width: i32,
    /// 'counter-reset'.
    pub counter_reset: Vec<CounterDirective>,
    /// 'counter-increment'.
    pub counter_increment: Vec<CounterDirective>,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            display: Display::Inline,
            position: PositionType::Static,
            float: Float::None,
            clear: Clear::None,
            direction: Direction::Ltr,
            unicode_bidi: UnicodeBidi::Normal,
            visibility: Visibility::Visible,
            white_space: WhiteSpace::Normal,
            text_align: TextAlign::Start,
            text_overflow: TextOverflow::Clip,
            overflow: Overflow::Visible,
            vertical_align: VerticalAlign::Baseline,
            font_size: DEFAULT_FONT_SIZE,
            line_height: LineHeight::Normal,
            width: Length::Auto,
            height: Length::Auto,
            margin: Edges::all(Length::Px(0)),
            padding: Edges::all(Length::Px(0)),
            border: Edges::all(0),
            offsets: Edges::all(Length::Auto),
            z_index: None,
            color: 0x0000_00ff,
            background_color: 0,
            outline_width: 0,
            counter_reset: Vec::new(),
            counter_increment: Vec::new(),
        }
    }
}

impl RenderStyle {
    /// Initial values for every property, with the inherited properties
    /// taken from `parent`.
    ///
    /// [§ 6.2 Inheritance](https://www.w3.org/TR/CSS2/cascade.html#inheritance)
    #[must_use]
    pub fn inherit(parent: &Self) -> Self {
        Self {
            direction: parent.direction,
            visibility: parent.visibility,
            white_space: parent.white_space,
            text_align: parent.text_align,
            font_size: parent.font_size,
            line_height: parent.line_height,
            color: parent.color,
            ..Self::default()
        }
    }

    /// Same style with a different display value.
    #[must_use]
    pub fn with_display(mut self, display: Display) -> Self {
        self.display = display;
        self
    }

    /// 'position' is `relative`, `absolute` or `fixed`.
    #[must_use]
    pub const fn is_positioned(&self) -> bool {
        !matches!(self.position, PositionType::Static)
    }

    /// Taken out of flow by `absolute` or `fixed`.
    #[must_use]
    pub const fn is_out_of_flow(&self) -> bool {
        self.position.is_out_of_flow()
    }

    /// Floated and in flow.
    #[must_use]
    pub const fn is_floating(&self) -> bool {
        !matches!(self.float, Float::None) && !self.position.is_out_of_flow()
    }

    /// Whether the content is visible.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        matches!(self.visibility, Visibility::Visible)
    }

    /// Whether the element clips its overflow.
    #[must_use]
    pub const fn has_overflow_clip(&self) -> bool {
        !matches!(self.overflow, Overflow::Visible)
    }

    /// Resolved border widths.
    #[must_use]
    pub const fn border_widths(&self) -> Edges<i32> {
        self.border
    }

    /// Padding resolved against `reference`.
    #[must_use]
    pub const fn padding_widths(&self, reference: i32) -> Edges<i32> {
        Edges {
            top: self.padding.top.resolve_or_zero(reference),
            right: self.padding.right.resolve_or_zero(reference),
            bottom: self.padding.bottom.resolve_or_zero(reference),
            left: self.padding.left.resolve_or_zero(reference),
        }
    }
}

/// Whether `a` and `b` are the same shared style allocation.
#[must_use]
pub fn same_style(a: &Rc<RenderStyle>, b: &Rc<RenderStyle>) -> bool {
    Rc::ptr_eq(a, b)
}
