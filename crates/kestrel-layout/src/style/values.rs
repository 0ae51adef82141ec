//! Resolved keyword and length values carried by [`RenderStyle`](super::RenderStyle).

use serde::{Deserialize, Serialize};
use strum_macros::{EnumString, IntoStaticStr};

/// [§ 9.2.4 The 'display' property](https://www.w3.org/TR/CSS2/visuren.html#display-prop)
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Display {
    /// "This value causes an element to generate one or more inline boxes."
    #[default]
    Inline,
    /// "This value causes an element to generate a block box."
    Block,
    /// "This value causes an element to generate an inline-level block
    /// container."
    InlineBlock,
    /// "This value causes an element (e.g., LI in HTML) to generate a
    /// principal block box and a marker box."
    ListItem,
    /// Block-level table.
    Table,
    /// `table-row-group`, `table-header-group` and `table-footer-group`.
    TableRowGroup,
    /// `table-row`.
    TableRow,
    /// `table-column`.
    TableColumn,
    /// `table-cell`.
    TableCell,
    /// "This value causes an element to not appear in the formatting
    /// structure."
    None,
}

impl Display {
    /// Whether the value generates a block-level box.
    #[must_use]
    pub const fn is_block_level(self) -> bool {
        !matches!(self, Self::Inline | Self::InlineBlock | Self::None)
    }
}

/// [§ 9.3.1 Choosing a positioning scheme: 'position' property](https://www.w3.org/TR/CSS2/visuren.html#choose-position)
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum PositionType {
    /// "The box is a normal box, laid out according to the normal flow."
    #[default]
    Static,
    /// "The box's position is calculated according to the normal flow. Then
    /// the box is offset relative to its normal position."
    Relative,
    /// "The box's position (and possibly size) is specified with the 'top',
    /// 'right', 'bottom', and 'left' properties."
    Absolute,
    /// "The box's position is calculated according to the 'absolute' model,
    /// but in addition, the box is fixed with respect to some reference."
    Fixed,
}

impl PositionType {
    /// `absolute` or `fixed`: taken out of normal flow.
    #[must_use]
    pub const fn is_out_of_flow(self) -> bool {
        matches!(self, Self::Absolute | Self::Fixed)
    }
}

/// [§ 9.5.1 Positioning the float: the 'float' property](https://www.w3.org/TR/CSS2/visuren.html#float-position)
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Float {
    /// "The box is not floated."
    #[default]
    None,
    /// "The element generates a block box that is floated to the left."
    Left,
    /// "The element generates a block box that is floated to the right."
    Right,
}

/// [§ 9.5.2 Controlling flow next to floats: the 'clear' property](https://www.w3.org/TR/CSS2/visuren.html#flow-control)
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Clear {
    /// No constraint.
    #[default]
    None,
    /// Below left floats.
    Left,
    /// Below right floats.
    Right,
    /// Below all floats.
    Both,
}

/// [§ 9.10 Text direction: the 'direction' and 'unicode-bidi' properties](https://www.w3.org/TR/CSS2/visuren.html#direction)
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Direction {
    /// Left-to-right.
    #[default]
    Ltr,
    /// Right-to-left.
    Rtl,
}

impl Direction {
    /// Whether this is the left-to-right direction.
    #[must_use]
    pub const fn is_ltr(self) -> bool {
        matches!(self, Self::Ltr)
    }
}

/// [§ 9.10](https://www.w3.org/TR/CSS2/visuren.html#propdef-unicode-bidi) 'unicode-bidi'
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum UnicodeBidi {
    /// "The element does not open an additional level of embedding."
    #[default]
    Normal,
    /// "the element opens an additional level of embedding."
    Embed,
    /// "this creates an override for inline-level elements."
    BidiOverride,
}

/// [§ 11.2 Visibility: the 'visibility' property](https://www.w3.org/TR/CSS2/visufx.html#visibility)
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Visibility {
    /// "The generated box is visible."
    #[default]
    Visible,
    /// "The generated box is invisible (fully transparent, nothing is drawn),
    /// but still affects layout."
    Hidden,
    /// Same as hidden outside tables.
    Collapse,
}

/// [§ 16.6 White space: the 'white-space' property](https://www.w3.org/TR/CSS2/text.html#white-space-prop)
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum WhiteSpace {
    /// "This value directs user agents to collapse sequences of white space,
    /// and break lines as necessary to fill line boxes."
    #[default]
    Normal,
    /// "This value prevents user agents from collapsing sequences of white
    /// space. Lines are only broken at preserved newline characters."
    Pre,
    /// "This value collapses white space as for 'normal', but suppresses line
    /// breaks within text."
    Nowrap,
    /// "This value prevents user agents from collapsing sequences of white
    /// space. Lines are broken at preserved newline characters, and as
    /// necessary to fill line boxes."
    PreWrap,
}

impl WhiteSpace {
    /// Whether runs of white space are kept as-is.
    #[must_use]
    pub const fn preserves_spaces(self) -> bool {
        matches!(self, Self::Pre | Self::PreWrap)
    }

    /// Whether lines may wrap at soft break opportunities.
    #[must_use]
    pub const fn allows_wrap(self) -> bool {
        matches!(self, Self::Normal | Self::PreWrap)
    }
}

/// [§ 16.2 Alignment: the 'text-align' property](https://www.w3.org/TR/CSS2/text.html#alignment-prop)
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TextAlign {
    /// Start edge of the line, following 'direction'.
    #[default]
    Start,
    /// Left edge.
    Left,
    /// Right edge.
    Right,
    /// Centered.
    Center,
    /// Treated as the start edge; inter-word stretching is not applied.
    Justify,
}

/// [CSS Overflow 3 § 4.1 'text-overflow'](https://www.w3.org/TR/css-overflow-3/#text-overflow)
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TextOverflow {
    /// "Clip inline content that overflows its block container element."
    #[default]
    Clip,
    /// "Render an ellipsis character (U+2026) to represent clipped inline
    /// content."
    Ellipsis,
}

/// [§ 11.1.1 Overflow: the 'overflow' property](https://www.w3.org/TR/CSS2/visufx.html#overflow)
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Overflow {
    /// "This value indicates that content is not clipped."
    #[default]
    Visible,
    /// "This value indicates that the content is clipped."
    Hidden,
    /// Clipped with a scrolling mechanism.
    Scroll,
    /// UA dependent.
    Auto,
}

/// [§ 10.8.1 Leading and half-leading](https://www.w3.org/TR/CSS2/visudet.html#propdef-vertical-align) 'vertical-align'
///
/// `Top` and `Bottom` are aligned relative to the line box, not the parent,
/// and are resolved after the rest of the line.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum VerticalAlign {
    /// "Align the baseline of the box with the baseline of the parent box."
    #[default]
    Baseline,
    /// "Lower the baseline of the box to the proper position for subscripts
    /// of the parent's box."
    Sub,
    /// "Raise the baseline of the box to the proper position for
    /// superscripts of the parent's box."
    Super,
    /// "Align the top of the box with the top of the parent's content area."
    TextTop,
    /// "Align the bottom of the box with the bottom of the parent's content
    /// area."
    TextBottom,
    /// "Align the vertical midpoint of the box with the baseline of the
    /// parent box plus half the x-height of the parent."
    Middle,
    /// "Align the top of the aligned subtree with the top of the line box."
    Top,
    /// "Align the bottom of the aligned subtree with the bottom of the line
    /// box."
    Bottom,
    /// "Raise (positive value) or lower (negative value) the box by this
    /// distance."
    Length(i32),
}

/// A length that may be `auto` or a percentage of the containing block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Length {
    /// `auto`.
    #[default]
    Auto,
    /// Absolute pixels.
    Px(i32),
    /// Percentage of the containing block's width.
    Percent(i32),
}

impl Length {
    /// Resolve against `reference`, yielding `None` for `auto`.
    #[must_use]
    pub const fn resolve(self, reference: i32) -> Option<i32> {
        match self {
            Self::Auto => None,
            Self::Px(px) => Some(px),
            Self::Percent(p) => Some(reference * p / 100),
        }
    }

    /// Resolve with `auto` treated as zero.
    #[must_use]
    pub const fn resolve_or_zero(self, reference: i32) -> i32 {
        match self.resolve(reference) {
            Some(v) => v,
            None => 0,
        }
    }

    /// Whether the value is `auto`.
    #[must_use]
    pub const fn is_auto(self) -> bool {
        matches!(self, Self::Auto)
    }
}

/// [§ 10.8.1](https://www.w3.org/TR/CSS2/visudet.html#propdef-line-height) 'line-height'
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineHeight {
    /// "Tells user agents to set the used value to a 'reasonable' value
    /// based on the font of the element."
    #[default]
    Normal,
    /// Absolute pixels.
    Px(i32),
    /// Percentage of the font size.
    Percent(i32),
}

/// One `counter-reset` or `counter-increment` entry.
///
/// [§ 12.4 Automatic counters and numbering](https://www.w3.org/TR/CSS2/generate.html#counters)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CounterDirective {
    /// Counter name.
    pub name: String,
    /// Reset value or increment amount.
    pub value: i32,
}
