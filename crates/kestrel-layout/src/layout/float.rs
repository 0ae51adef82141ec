//! Float placement within one block flow.
//!
//! [§ 9.5 Floats](https://www.w3.org/TR/CSS2/visuren.html#floats)
//!
//! "A float is a box that is shifted to the left or right on the current
//! line. The most interesting characteristic of a float is that content may
//! flow along its side (or be prohibited from doing so by the 'clear'
//! property)."
//!
//! Coordinates are relative to the block: `x` from the left content edge,
//! `y` from the top border edge.

use crate::geometry::Rect;
use crate::render::RenderId;
use crate::style::{Clear, Float};

/// Which side a float is shifted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FloatSide {
    /// "The element generates a block box that is floated to the left."
    Left,
    /// "The element generates a block box that is floated to the right."
    Right,
}

impl FloatSide {
    pub(crate) const fn from_style(float: Float) -> Option<Self> {
        match float {
            Float::None => None,
            Float::Left => Some(Self::Left),
            Float::Right => Some(Self::Right),
        }
    }
}

/// A float that has been placed in the flow.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PlacedFloat {
    /// The floated object.
    pub object: RenderId,
    /// Which side it is on.
    pub side: FloatSide,
    /// Its margin box.
    pub margin_box: Rect,
}

/// Floats placed so far in one block flow.
///
/// "Since a float is not in the flow, non-positioned block boxes created
/// before and after the float box flow vertically as if the float did not
/// exist. However, the current and subsequent line boxes created next to
/// the float are shortened as necessary to make room for the margin box of
/// the float."
#[derive(Debug, Clone, Default)]
pub(crate) struct FloatContext {
    floats: Vec<PlacedFloat>,
    containing_width: i32,
}

impl FloatContext {
    pub(crate) const fn new(containing_width: i32) -> Self {
        Self {
            floats: Vec::new(),
            containing_width,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.floats.is_empty()
    }

    pub(crate) fn floats(&self) -> &[PlacedFloat] {
        &self.floats
    }

    /// Whether `object` has already been placed.
    pub(crate) fn contains(&self, object: RenderId) -> bool {
        self.floats.iter().any(|f| f.object == object)
    }

    /// Lowest bottom margin edge of any placed float.
    ///
    /// [§ 10.6.7](https://www.w3.org/TR/CSS2/visudet.html#root-height)
    ///
    /// "If the element has any floating descendants whose bottom margin
    /// edge is below the element's bottom content edge, then the height is
    /// increased to include those edges."
    pub(crate) fn max_float_bottom(&self) -> i32 {
        self.floats.iter().map(|f| f.margin_box.bottom()).max().unwrap_or(0)
    }

    /// Place the margin box of `object` as high as possible at or below
    /// `current_y`, and return it.
    ///
    /// [§ 9.5.1 Positioning the float](https://www.w3.org/TR/CSS2/visuren.html#float-position)
    ///
    /// "A floated box is shifted to the left or right until its outer edge
    /// touches the containing block edge or the outer edge of another
    /// float."
    pub(crate) fn place_float(
        &mut self,
        object: RenderId,
        side: FloatSide,
        width: i32,
        height: i32,
        current_y: i32,
    ) -> Rect {
        // STEP 1: Start at the highest allowed position.
        //
        // "A floating box's outer top may not be higher than the top of its
        // containing block." "A floating box must be placed as high as
        // possible."
        let mut y = current_y.max(0);

        // STEP 2: Scan down float bottoms until the box fits beside the
        // floats already placed, or nothing is left to clear.
        loop {
            let (left, available) = self.available_width_at(y, height.max(1));
            let next_y = self.next_float_bottom_after(y);
            if available >= width || available >= self.containing_width || next_y <= y {
                // STEP 3: "A left-floating box must be put as far to the
                // left as possible, a right-floating box as far to the right
                // as possible."
                let x = match side {
                    FloatSide::Left => left,
                    FloatSide::Right => (left + available - width).max(0),
                };
                let margin_box = Rect::new(x, y, width, height);
                self.floats.push(PlacedFloat {
                    object,
                    side,
                    margin_box,
                });
                return margin_box;
            }
            y = next_y;
        }
    }

    /// The y a box with `clear` must move down to.
    ///
    /// [§ 9.5.2 Controlling flow next to floats](https://www.w3.org/TR/CSS2/visuren.html#flow-control)
    ///
    /// "Requires that the top border edge of the box be below the bottom
    /// outer edge of any left-floating boxes that resulted from elements
    /// earlier in the source document."
    pub(crate) fn clear(&self, clear: Clear, current_y: i32) -> i32 {
        let applies = |side: FloatSide| match clear {
            Clear::None => false,
            Clear::Left => side == FloatSide::Left,
            Clear::Right => side == FloatSide::Right,
            Clear::Both => true,
        };
        self.floats
            .iter()
            .filter(|f| applies(f.side))
            .map(|f| f.margin_box.bottom())
            .fold(current_y, i32::max)
    }

    /// `(left_offset, available_width)` for a band of content from `y` down
    /// `height` pixels.
    ///
    /// A float is active in the band when its margin box overlaps it
    /// vertically.
    pub(crate) fn available_width_at(&self, y: i32, height: i32) -> (i32, i32) {
        let (top, bottom) = (y, y + height);
        let active = |f: &&PlacedFloat| f.margin_box.y < bottom && f.margin_box.bottom() > top;

        let left_edge = self
            .floats
            .iter()
            .filter(active)
            .filter(|f| f.side == FloatSide::Left)
            .map(|f| f.margin_box.right())
            .fold(0, i32::max);
        let right_edge = self
            .floats
            .iter()
            .filter(active)
            .filter(|f| f.side == FloatSide::Right)
            .map(|f| f.margin_box.x)
            .fold(self.containing_width, i32::min);

        (left_edge, (right_edge - left_edge).max(0))
    }

    /// The smallest float bottom strictly below `y`, or `y` when there is
    /// none.
    pub(crate) fn next_float_bottom_after(&self, y: i32) -> i32 {
        self.floats
            .iter()
            .map(|f| f.margin_box.bottom())
            .filter(|&b| b > y)
            .min()
            .unwrap_or(y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderTree;
    use crate::settings::LayoutSettings;

    fn object() -> RenderId {
        RenderTree::new(LayoutSettings::default()).canvas()
    }

    #[test]
    fn test_left_floats_stack_horizontally() {
        let o = object();
        let mut ctx = FloatContext::new(300);
        let a = ctx.place_float(o, FloatSide::Left, 100, 50, 0);
        let b = ctx.place_float(o, FloatSide::Left, 100, 50, 0);
        assert_eq!(a, Rect::new(0, 0, 100, 50));
        assert_eq!(b, Rect::new(100, 0, 100, 50));
        assert_eq!(ctx.available_width_at(10, 19), (200, 100));
    }

    #[test]
    fn test_float_that_does_not_fit_moves_below() {
        let o = object();
        let mut ctx = FloatContext::new(300);
        let _ = ctx.place_float(o, FloatSide::Left, 200, 50, 0);
        let placed = ctx.place_float(o, FloatSide::Right, 150, 20, 0);
        assert_eq!(placed, Rect::new(150, 50, 150, 20));
    }

    #[test]
    fn test_clear_moves_below_matching_side_only() {
        let o = object();
        let mut ctx = FloatContext::new(300);
        let _ = ctx.place_float(o, FloatSide::Left, 50, 40, 0);
        let _ = ctx.place_float(o, FloatSide::Right, 50, 70, 0);
        assert_eq!(ctx.clear(Clear::Left, 10), 40);
        assert_eq!(ctx.clear(Clear::Right, 10), 70);
        assert_eq!(ctx.clear(Clear::Both, 100), 100);
        assert_eq!(ctx.clear(Clear::None, 10), 10);
        assert_eq!(ctx.max_float_bottom(), 70);
    }
}
