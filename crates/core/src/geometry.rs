//! Points, rectangles and colors.
//!
//! Two coordinate spaces are kept apart at the type level:
//! - page-intrinsic space ([`PagePoint`], [`PageRect`]): the page at its
//!   natural size, scale 1, rotation 0, origin top-left, y growing downward.
//!   Everything stored in the annotation store lives here.
//! - screen space ([`ScreenPoint`], [`ScreenRect`]): device pixels as reported
//!   by pointer events and text-selection client rectangles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Point in page-intrinsic units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PagePoint {
    pub x: f32,
    pub y: f32,
}

impl PagePoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &PagePoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Point in screen (device pixel) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in page-intrinsic units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageRect {
    pub x: f32,
    pub y: f32,
    #[serde(rename = "w")]
    pub width: f32,
    #[serde(rename = "h")]
    pub height: f32,
}

impl PageRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Normalised rectangle spanning two opposite corners.
    pub fn from_corners(a: PagePoint, b: PagePoint) -> Self {
        let min_x = a.x.min(b.x);
        let min_y = a.y.min(b.y);
        Self { x: min_x, y: min_y, width: a.x.max(b.x) - min_x, height: a.y.max(b.y) - min_y }
    }

    pub fn has_area(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Inclusive containment test.
    pub fn contains(&self, point: &PagePoint) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}

/// Axis-aligned rectangle in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ScreenRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn top_left(&self) -> ScreenPoint {
        ScreenPoint::new(self.x, self.y)
    }

    pub fn bottom_right(&self) -> ScreenPoint {
        ScreenPoint::new(self.x + self.width, self.y + self.height)
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains(&self, point: &ScreenPoint) -> bool {
        point.x >= self.x && point.x <= self.x + self.width && point.y >= self.y && point.y <= self.bottom()
    }

    pub fn intersects_vertically(&self, other: &ScreenRect) -> bool {
        self.y < other.bottom() && other.y < self.bottom()
    }
}

/// RGBA color, written as `#rrggbb` or `#rrggbbaa`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const RED: Color = Color { r: 229, g: 57, b: 53, a: 255 };
    pub const BLUE: Color = Color { r: 30, g: 136, b: 229, a: 255 };
    pub const HIGHLIGHT_YELLOW: Color = Color { r: 255, g: 235, b: 59, a: 128 };

    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid color {0:?}: expected #rrggbb or #rrggbbaa")]
pub struct ParseColorError(pub String);

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseColorError(s.to_string());
        let hex = s.strip_prefix('#').ok_or_else(err)?;
        if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
            return Err(err());
        }

        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
        let a = if hex.len() == 8 { channel(6)? } else { 255 };
        Ok(Color::new(channel(0)?, channel(2)?, channel(4)?, a))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

impl TryFrom<String> for Color {
    type Error = ParseColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(value: Color) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_point_distance() {
        let p1 = PagePoint::new(0.0, 0.0);
        let p2 = PagePoint::new(3.0, 4.0);
        assert!((p1.distance_to(&p2) - 5.0).abs() < 0.001);
    }

    #[test]
    fn rect_from_corners_normalizes() {
        let rect = PageRect::from_corners(PagePoint::new(50.0, 80.0), PagePoint::new(10.0, 20.0));
        assert_eq!(rect, PageRect::new(10.0, 20.0, 40.0, 60.0));
        assert!(rect.has_area());
        assert!(!PageRect::new(0.0, 0.0, 10.0, 0.0).has_area());
    }

    #[test]
    fn rect_containment_is_inclusive() {
        let rect = PageRect::new(10.0, 10.0, 20.0, 5.0);
        assert!(rect.contains(&PagePoint::new(10.0, 15.0)));
        assert!(rect.contains(&PagePoint::new(20.0, 12.0)));
        assert!(!rect.contains(&PagePoint::new(31.0, 12.0)));
    }

    #[test]
    fn color_hex_parsing() {
        assert_eq!("#ff8000".parse::<Color>().unwrap(), Color::new(255, 128, 0, 255));
        assert_eq!("#ffeb3b80".parse::<Color>().unwrap(), Color::HIGHLIGHT_YELLOW);
        assert!("ff8000".parse::<Color>().is_err());
        assert!("#ff80".parse::<Color>().is_err());
        assert!("#gg0000".parse::<Color>().is_err());
    }

    #[test]
    fn color_serializes_as_hex_string() {
        let json = serde_json::to_string(&Color::HIGHLIGHT_YELLOW).unwrap();
        assert_eq!(json, "\"#ffeb3b80\"");
        let back: Color = serde_json::from_str("\"#e53935\"").unwrap();
        assert_eq!(back, Color::RED);
    }
}
