//! Freehand drawing state machine: `Idle -> Drawing -> Idle`.
//!
//! Pointer positions arrive in screen space and are converted with the page
//! transform before capture. Points are stored raw, without resampling or
//! smoothing. The in-progress stroke is not in the store until
//! [`DrawingController::finish`] commits it.

use crate::annotation::{AnnotationStore, Stroke};
use crate::geometry::ScreenPoint;
use crate::tool::StrokeStyle;
use crate::transform::PageTransform;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum DrawingState {
    #[default]
    Idle,
    Drawing { page: u32, stroke: Stroke },
}

/// How a drawing gesture ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeOutcome {
    Committed { page: u32, points: usize },
    /// Fewer than two points were captured (a tap).
    Discarded { page: u32 },
    /// No gesture was in progress.
    NotDrawing,
}

#[derive(Debug, Clone, Default)]
pub struct DrawingController {
    state: DrawingState,
}

impl DrawingController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DrawingState {
        &self.state
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, DrawingState::Drawing { .. })
    }

    /// Page of the stroke being drawn.
    pub fn active_page(&self) -> Option<u32> {
        match &self.state {
            DrawingState::Drawing { page, .. } => Some(*page),
            DrawingState::Idle => None,
        }
    }

    /// Live stroke for rendering, with its page.
    pub fn in_progress(&self) -> Option<(u32, &Stroke)> {
        match &self.state {
            DrawingState::Drawing { page, stroke } => Some((*page, stroke)),
            DrawingState::Idle => None,
        }
    }

    /// Starts a stroke on `page`. Without a transform (page not laid out) the
    /// event is ignored and the controller stays idle. A second pointer-down
    /// during a stroke is ignored; the live stroke keeps capturing.
    pub fn pointer_down(
        &mut self,
        page: u32,
        position: ScreenPoint,
        transform: Option<&PageTransform>,
        style: StrokeStyle,
    ) -> bool {
        if let DrawingState::Drawing { page: active, .. } = &self.state {
            log::debug!("ignoring pointer-down on page {page}: stroke on page {active} in progress");
            return false;
        }
        let Some(transform) = transform else {
            log::debug!("ignoring pointer-down on page {page}: page not laid out");
            return false;
        };

        let mut stroke = Stroke::new(style.color, style.width);
        stroke.points.push(transform.to_page(position));
        self.state = DrawingState::Drawing { page, stroke };
        true
    }

    /// Appends a point while drawing. `transform` must belong to the stroke's
    /// page; a missing transform drops this sample only.
    pub fn pointer_move(&mut self, position: ScreenPoint, transform: Option<&PageTransform>) -> bool {
        let DrawingState::Drawing { page, stroke } = &mut self.state else {
            return false;
        };
        let Some(transform) = transform else {
            log::debug!("dropping stroke sample on page {page}: page not laid out");
            return false;
        };
        stroke.points.push(transform.to_page(position));
        true
    }

    /// Ends the gesture (pointer-up and pointer-leave both land here) and
    /// commits the stroke if it has at least two points.
    pub fn finish(&mut self, store: &mut AnnotationStore) -> StrokeOutcome {
        match std::mem::take(&mut self.state) {
            DrawingState::Idle => StrokeOutcome::NotDrawing,
            DrawingState::Drawing { page, stroke } => {
                let points = stroke.points.len();
                if store.add_stroke(page, stroke) {
                    StrokeOutcome::Committed { page, points }
                } else {
                    StrokeOutcome::Discarded { page }
                }
            }
        }
    }

    /// Drops any in-progress stroke without committing it.
    pub fn cancel(&mut self) {
        self.state = DrawingState::Idle;
    }
}
