//! Document-wide layout configuration.

use serde::{Deserialize, Serialize};

/// Settings supplied when a [`Document`](crate::Document) is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    /// Width of the initial containing block.
    pub viewport_width: i32,
    /// Height of the initial containing block.
    pub viewport_height: i32,
    /// Standards mode. In quirks mode line boxes without text shrink to
    /// the height of their replaced content.
    pub strict_mode: bool,
    /// Caret browsing: every rendered node accepts the caret, not only
    /// content-editable ones.
    pub caret_browsing: bool,
    /// Text drawn where `text-overflow: ellipsis` truncates a line.
    pub ellipsis: String,
    /// Width of the caret in pixels.
    pub caret_width: i32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            viewport_width: 800,
            viewport_height: 600,
            strict_mode: true,
            caret_browsing: false,
            ellipsis: String::from("..."),
            caret_width: 1,
        }
    }
}
