//! The render tree: one object per visually participating DOM node.
//!
//! [§ 9.2 Controlling box generation](https://www.w3.org/TR/CSS2/visuren.html#box-gen)
//!
//! "The following sections describe the types of boxes that may be
//! generated in CSS 2.1. A box's type affects, in part, its behavior in the
//! visual formatting model."
//!
//! The tree is parallel to, but structurally divergent from, the DOM tree:
//! anonymous blocks wrap runs of inline content, `display: none` subtrees
//! are absent, and positioned objects are laid out against a containing
//! block that need not be their parent.

mod construction;
mod hit_test;
mod invalidation;
mod metrics;
mod object;
mod text;
mod traversal;
mod tree;

pub use construction::{StyleMap, default_display, default_style};
pub use hit_test::{HitTestAction, HitTestResult};
pub use invalidation::{Invalidation, LayoutHost, RepaintPriority};
pub use object::{RenderFlags, RenderId, RenderKind, RenderObject, TextData, collapse_white_space};
pub use tree::RenderTree;
