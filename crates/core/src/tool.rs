//! Active tool and its styling.

use crate::geometry::Color;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    #[default]
    Select,
    Highlight,
    Draw,
    Eraser,
}

/// Style applied to newly started strokes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    pub color: Color,
    /// Width in page units.
    pub width: f32,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self { color: Color::RED, width: 2.0 }
    }
}

/// Exactly one tool is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToolState {
    pub active: Tool,
    pub stroke: StrokeStyle,
    pub highlight_color: Color,
}

impl Default for ToolState {
    fn default() -> Self {
        Self {
            active: Tool::Select,
            stroke: StrokeStyle::default(),
            highlight_color: Color::HIGHLIGHT_YELLOW,
        }
    }
}

impl ToolState {
    pub fn is_active(&self, tool: Tool) -> bool {
        self.active == tool
    }
}
