//! Eraser gesture.
//!
//! Each pointer-down, and each pointer-move while pressed, is one independent
//! `erase_near` call on the page under the pointer. The reach is configured in
//! screen pixels and converted to page units through the page transform, so
//! the visual reach does not change with zoom.

use crate::annotation::{AnnotationStore, EraseOutcome};
use crate::geometry::ScreenPoint;
use crate::transform::PageTransform;

#[derive(Debug, Clone)]
pub struct Eraser {
    radius_px: f32,
    pressed: bool,
}

impl Eraser {
    pub fn new(radius_px: f32) -> Self {
        Self { radius_px, pressed: false }
    }

    pub fn radius_px(&self) -> f32 {
        self.radius_px
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn pointer_down(
        &mut self,
        page: u32,
        position: ScreenPoint,
        transform: Option<&PageTransform>,
        store: &mut AnnotationStore,
    ) -> EraseOutcome {
        self.pressed = true;
        self.erase_at(page, position, transform, store)
    }

    /// Erases only while the pointer is held down.
    pub fn pointer_move(
        &mut self,
        page: u32,
        position: ScreenPoint,
        transform: Option<&PageTransform>,
        store: &mut AnnotationStore,
    ) -> EraseOutcome {
        if !self.pressed {
            return EraseOutcome::default();
        }
        self.erase_at(page, position, transform, store)
    }

    pub fn pointer_up(&mut self) {
        self.pressed = false;
    }

    fn erase_at(
        &self,
        page: u32,
        position: ScreenPoint,
        transform: Option<&PageTransform>,
        store: &mut AnnotationStore,
    ) -> EraseOutcome {
        let Some(transform) = transform else {
            log::debug!("ignoring erase on page {page}: page not laid out");
            return EraseOutcome::default();
        };
        let point = transform.to_page(position);
        let outcome = store.erase_near(page, point, transform.length_to_page(self.radius_px));
        if !outcome.is_empty() {
            log::debug!(
                "erased {} strokes and {} highlights on page {page}",
                outcome.strokes_removed,
                outcome.highlights_removed
            );
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Stroke;
    use crate::geometry::{Color, PagePoint};
    use crate::transform::Rotation;
    use pdf_engine::PageSize;

    fn store_with_stroke_at(x: f32, y: f32) -> AnnotationStore {
        let mut store = AnnotationStore::new();
        store.add_stroke(
            1,
            Stroke::with_points(vec![PagePoint::new(x, y), PagePoint::new(x + 50.0, y)], Color::RED, 2.0),
        );
        store
    }

    fn transform(scale: f32) -> PageTransform {
        PageTransform::new(PageSize::new(612.0, 792.0), scale, Rotation::Deg0, ScreenPoint::new(0.0, 0.0))
            .unwrap()
    }

    #[test]
    fn reach_is_constant_on_screen_across_zoom() {
        for scale in [0.5, 1.0, 3.0] {
            let t = transform(scale);
            let mut store = store_with_stroke_at(100.0, 100.0);
            let mut eraser = Eraser::new(10.0);

            // 8 screen pixels away from the first point.
            let on_screen = t.to_screen(PagePoint::new(100.0, 100.0));
            let pointer = ScreenPoint::new(on_screen.x, on_screen.y + 8.0);
            let outcome = eraser.pointer_down(1, pointer, Some(&t), &mut store);
            assert_eq!(outcome.strokes_removed, 1, "scale {scale}");
        }
    }

    #[test]
    fn out_of_reach_on_screen_is_kept() {
        let t = transform(0.5);
        let mut store = store_with_stroke_at(100.0, 100.0);
        let mut eraser = Eraser::new(10.0);

        // 12 screen pixels = 24 page units at half zoom.
        let pointer = ScreenPoint::new(50.0, 50.0 + 12.0);
        assert!(eraser.pointer_down(1, pointer, Some(&t), &mut store).is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn move_erases_only_while_pressed() {
        let t = transform(1.0);
        let mut store = store_with_stroke_at(100.0, 100.0);
        let mut eraser = Eraser::new(5.0);

        assert!(eraser.pointer_move(1, ScreenPoint::new(100.0, 100.0), Some(&t), &mut store).is_empty());
        assert_eq!(store.len(), 1);

        eraser.pointer_down(1, ScreenPoint::new(400.0, 400.0), Some(&t), &mut store);
        let outcome = eraser.pointer_move(1, ScreenPoint::new(150.0, 101.0), Some(&t), &mut store);
        assert_eq!(outcome.strokes_removed, 1);

        eraser.pointer_up();
        assert!(!eraser.is_pressed());
    }

    #[test]
    fn missing_transform_is_a_no_op() {
        let mut store = store_with_stroke_at(0.0, 0.0);
        let mut eraser = Eraser::new(100.0);
        assert!(eraser.pointer_down(1, ScreenPoint::new(0.0, 0.0), None, &mut store).is_empty());
        assert_eq!(store.len(), 1);
    }
}
