//! Coordinate transform engine.
//!
//! A [`PageTransform`] maps page-intrinsic coordinates to screen pixels for
//! one rendered page (forward) and back (inverse). The forward matrix is
//! composed as: rotate clockwise inside the page box, scale by zoom, then
//! translate to the page element's on-screen origin. The inverse is computed
//! once at construction; if the page is not laid out (zero-sized bounds,
//! degenerate page size) construction fails and callers drop the input.

use crate::geometry::{PagePoint, PageRect, ScreenPoint, ScreenRect};
use pdf_engine::PageSize;
use serde::{Deserialize, Serialize};

/// Determinants smaller than this are treated as singular.
const SINGULAR_EPSILON: f32 = 1e-9;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransformError {
    #[error("page element is not laid out")]
    NotLaidOut,
    #[error("transform matrix is not invertible")]
    Singular,
    #[error("rotation must be a multiple of 90 degrees, got {0}")]
    InvalidRotation(i32),
}

/// Clockwise page rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Any multiple of 90 (negative allowed), normalised mod 360.
    pub fn from_degrees(degrees: i32) -> Result<Self, TransformError> {
        if degrees % 90 != 0 {
            return Err(TransformError::InvalidRotation(degrees));
        }
        Ok(match degrees.rem_euclid(360) {
            0 => Rotation::Deg0,
            90 => Rotation::Deg90,
            180 => Rotation::Deg180,
            _ => Rotation::Deg270,
        })
    }

    pub fn degrees(self) -> i32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    pub fn rotated(self, delta_degrees: i32) -> Result<Self, TransformError> {
        if delta_degrees % 90 != 0 {
            return Err(TransformError::InvalidRotation(delta_degrees));
        }
        Self::from_degrees(self.degrees() + delta_degrees.rem_euclid(360))
    }

    /// Width and height of the page box after rotation, at scale 1.
    pub fn displayed_size(self, size: PageSize) -> (f32, f32) {
        match self {
            Rotation::Deg0 | Rotation::Deg180 => (size.width_pt, size.height_pt),
            Rotation::Deg90 | Rotation::Deg270 => (size.height_pt, size.width_pt),
        }
    }
}

impl TryFrom<i32> for Rotation {
    type Error = TransformError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::from_degrees(value)
    }
}

impl From<Rotation> for i32 {
    fn from(value: Rotation) -> Self {
        value.degrees()
    }
}

/// 2D affine matrix `[a c e; b d f; 0 0 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Affine {
    pub const IDENTITY: Affine = Affine { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 };

    pub fn scale(s: f32) -> Self {
        Affine { a: s, d: s, ..Self::IDENTITY }
    }

    pub fn translate(tx: f32, ty: f32) -> Self {
        Affine { e: tx, f: ty, ..Self::IDENTITY }
    }

    /// Clockwise rotation of a `size` page box, keeping the result inside the
    /// positive quadrant.
    pub fn rotation_in_box(rotation: Rotation, size: PageSize) -> Self {
        let (w, h) = (size.width_pt, size.height_pt);
        match rotation {
            Rotation::Deg0 => Self::IDENTITY,
            Rotation::Deg90 => Affine { a: 0.0, b: 1.0, c: -1.0, d: 0.0, e: h, f: 0.0 },
            Rotation::Deg180 => Affine { a: -1.0, b: 0.0, c: 0.0, d: -1.0, e: w, f: h },
            Rotation::Deg270 => Affine { a: 0.0, b: -1.0, c: 1.0, d: 0.0, e: 0.0, f: w },
        }
    }

    /// Applies `self` first, then `next`.
    pub fn then(&self, next: &Affine) -> Affine {
        let n = next;
        Affine {
            a: n.a * self.a + n.c * self.b,
            b: n.b * self.a + n.d * self.b,
            c: n.a * self.c + n.c * self.d,
            d: n.b * self.c + n.d * self.d,
            e: n.a * self.e + n.c * self.f + n.e,
            f: n.b * self.e + n.d * self.f + n.f,
        }
    }

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (self.a * x + self.c * y + self.e, self.b * x + self.d * y + self.f)
    }

    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    pub fn invert(&self) -> Option<Affine> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < SINGULAR_EPSILON {
            return None;
        }
        Some(Affine {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            e: (self.c * self.f - self.d * self.e) / det,
            f: (self.b * self.e - self.a * self.f) / det,
        })
    }
}

/// Forward and inverse mapping for one rendered page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageTransform {
    page_size: PageSize,
    rotation: Rotation,
    scale: f32,
    forward: Affine,
    inverse: Affine,
}

impl PageTransform {
    /// Transform for a page drawn at `scale` and `rotation` whose rotated
    /// box has its top-left corner at `origin`.
    pub fn new(
        page_size: PageSize,
        scale: f32,
        rotation: Rotation,
        origin: ScreenPoint,
    ) -> Result<Self, TransformError> {
        if page_size.is_degenerate() || !scale.is_finite() || scale <= 0.0 {
            return Err(TransformError::NotLaidOut);
        }

        let forward = Affine::rotation_in_box(rotation, page_size)
            .then(&Affine::scale(scale))
            .then(&Affine::translate(origin.x, origin.y));
        let inverse = forward.invert().ok_or(TransformError::Singular)?;

        Ok(Self { page_size, rotation, scale, forward, inverse })
    }

    /// Transform derived from the page element's reported on-screen bounds.
    /// The scale is recovered from the bounds width.
    pub fn from_bounds(
        page_size: PageSize,
        rotation: Rotation,
        bounds: ScreenRect,
    ) -> Result<Self, TransformError> {
        if !(bounds.width > 0.0 && bounds.height > 0.0) || page_size.is_degenerate() {
            return Err(TransformError::NotLaidOut);
        }
        let (displayed_width, _) = rotation.displayed_size(page_size);
        Self::new(page_size, bounds.width / displayed_width, rotation, bounds.top_left())
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn forward(&self) -> &Affine {
        &self.forward
    }

    pub fn to_screen(&self, point: PagePoint) -> ScreenPoint {
        let (x, y) = self.forward.apply(point.x, point.y);
        ScreenPoint::new(x, y)
    }

    pub fn to_page(&self, point: ScreenPoint) -> PagePoint {
        let (x, y) = self.inverse.apply(point.x, point.y);
        PagePoint::new(x, y)
    }

    /// Maps two opposite corners and renormalises.
    pub fn rect_to_page(&self, rect: &ScreenRect) -> PageRect {
        PageRect::from_corners(self.to_page(rect.top_left()), self.to_page(rect.bottom_right()))
    }

    pub fn rect_to_screen(&self, rect: &PageRect) -> ScreenRect {
        let a = self.to_screen(PagePoint::new(rect.x, rect.y));
        let b = self.to_screen(PagePoint::new(rect.x + rect.width, rect.y + rect.height));
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        ScreenRect::new(x, y, a.x.max(b.x) - x, a.y.max(b.y) - y)
    }

    /// Converts a screen-space length (e.g. eraser reach) to page units.
    pub fn length_to_page(&self, pixels: f32) -> f32 {
        pixels / self.scale
    }

    /// Screen rectangle covered by the whole page.
    pub fn page_bounds(&self) -> ScreenRect {
        self.rect_to_screen(&PageRect::new(
            0.0,
            0.0,
            self.page_size.width_pt,
            self.page_size.height_pt,
        ))
    }
}
