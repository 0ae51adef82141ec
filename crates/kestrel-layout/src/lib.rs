//! Layout core of the Kestrel engine: render tree, line boxes, caret
//! positions and selection.
//!
//! # Scope
//!
//! This crate implements:
//! - **Render tree** ([§ 9.2 Controlling box generation](https://www.w3.org/TR/CSS2/visuren.html#box-gen))
//!   - One object per rendered DOM node, anonymous blocks for mixed content
//!   - Containing blocks, stacking of dirty bits, repaint invalidation
//!   - Hit testing and caret rectangles
//!
//! - **Layout** ([§ 10 Visual formatting model details](https://www.w3.org/TR/CSS2/visudet.html))
//!   - Block stacking, widths and heights, floats, positioned objects
//!   - Inline line building with bidi reordering
//!     ([UAX #9](https://www.unicode.org/reports/tr9/))
//!   - Vertical alignment inside line boxes, `text-overflow: ellipsis`
//!   - Incremental relayout of dirty lines
//!
//! - **Positions and selection** ([§ 5.2 Boundary points](https://dom.spec.whatwg.org/#concept-range-bp))
//!   - DOM positions mapped to and from rendered text offsets
//!   - Caret movement by character, word and line
//!   - Anchor/focus selection with granularity expansion
//!
//! - **Counters** ([§ 12.4 Automatic counters and numbering](https://www.w3.org/TR/CSS2/generate.html#counters))
//!
//! # Not Yet Implemented
//!
//! - Painting; the host receives repaint rectangles only
//! - Table layout beyond stacking rows and cells as blocks
//! - Bidi-aware left/right arrow movement

/// Generation-checked slab storage for objects and boxes.
pub mod arena;
/// CSS counters per [§ 12.4](https://www.w3.org/TR/CSS2/generate.html#counters).
pub mod counter;
/// The document facade.
pub mod document;
/// Render tree and line box dumps.
pub mod dump;
/// Boundary errors.
pub mod error;
/// Text measurement.
pub mod font;
/// Rectangles and edge sizes.
pub mod geometry;
mod layout;
/// Line boxes per [§ 9.4.2 Inline formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#inline-formatting).
pub mod line;
/// DOM positions and caret navigation.
pub mod position;
/// The render tree.
pub mod render;
/// Selection model.
pub mod selection;
/// Document settings.
pub mod settings;
/// Resolved style snapshot.
pub mod style;

pub use document::Document;
pub use error::LayoutError;
pub use font::{ApproximateFontMetrics, FontMetrics};
pub use geometry::{Edges, Rect};
pub use line::{BoxId, BoxKind, InlineBox};
pub use position::{LayoutView, Position, RenderPosition};
pub use render::{
    HitTestAction, HitTestResult, Invalidation, LayoutHost, RenderId, RenderKind, RenderObject, RenderTree,
    RepaintPriority, StyleMap,
};
pub use selection::{Alter, Granularity, MoveDirection, Selection, SelectionRange, SelectionState};
pub use settings::LayoutSettings;
pub use style::RenderStyle;
