//! Leveled comparison of two style snapshots.

use serde::Serialize;
use strum_macros::IntoStaticStr;

use super::RenderStyle;

/// How much work a style change requires, ordered from cheapest to most
/// expensive.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, strum_macros::Display, IntoStaticStr,
)]
pub enum StyleDiff {
    /// Nothing observable changed.
    Equal,
    /// Only painting changed; a repaint suffices.
    Visible,
    /// Only the offsets of a positioned element changed; the box can be
    /// translated in place if its size is unaffected.
    Position,
    /// The element's own geometry must be recomputed.
    Layout,
    /// The change can affect which block contains the element, so the
    /// containing block must be laid out again too.
    CbLayout,
}

impl StyleDiff {
    /// Compare `old` against `new`.
    #[must_use]
    pub fn between(old: &RenderStyle, new: &RenderStyle) -> Self {
        if old.display != new.display || old.float != new.float || old.position != new.position {
            return Self::CbLayout;
        }

        if old.width != new.width
            || old.height != new.height
            || old.margin != new.margin
            || old.padding != new.padding
            || old.border != new.border
            || old.font_size != new.font_size
            || old.line_height != new.line_height
            || old.white_space != new.white_space
            || old.text_align != new.text_align
            || old.text_overflow != new.text_overflow
            || old.vertical_align != new.vertical_align
            || old.direction != new.direction
            || old.unicode_bidi != new.unicode_bidi
            || old.clear != new.clear
            || old.overflow != new.overflow
            || old.counter_reset != new.counter_reset
            || old.counter_increment != new.counter_increment
        {
            return Self::Layout;
        }

        if old.offsets != new.offsets {
            // Offsets of a static box are ignored entirely.
            return if new.is_positioned() {
                Self::Position
            } else {
                Self::Equal
            };
        }

        if old.color != new.color
            || old.background_color != new.background_color
            || old.visibility != new.visibility
            || old.outline_width != new.outline_width
            || old.z_index != new.z_index
        {
            return Self::Visible;
        }

        Self::Equal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{Display, Length, PositionType};

    #[test]
    fn test_levels_are_ordered() {
        assert!(StyleDiff::Equal < StyleDiff::Visible);
        assert!(StyleDiff::Visible < StyleDiff::Position);
        assert!(StyleDiff::Position < StyleDiff::Layout);
        assert!(StyleDiff::Layout < StyleDiff::CbLayout);
    }

    #[test]
    fn test_offsets_only_matter_when_positioned() {
        let mut old = RenderStyle::default();
        let mut new = old.clone();
        new.offsets.left = Length::Px(10);
        assert_eq!(StyleDiff::between(&old, &new), StyleDiff::Equal);

        old.position = PositionType::Absolute;
        new.position = PositionType::Absolute;
        assert_eq!(StyleDiff::between(&old, &new), StyleDiff::Position);
    }

    #[test]
    fn test_display_change_needs_containing_block_layout() {
        let old = RenderStyle::default();
        let new = old.clone().with_display(Display::Block);
        assert_eq!(StyleDiff::between(&old, &new), StyleDiff::CbLayout);
    }

    #[test]
    fn test_color_change_is_visible_only() {
        let old = RenderStyle::default();
        let mut new = old.clone();
        new.color = 0xff00_00ff;
        assert_eq!(StyleDiff::between(&old, &new), StyleDiff::Visible);
    }
}
