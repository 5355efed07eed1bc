//! Annotation store.
//!
//! Per-page collections of freehand strokes and text highlights. All geometry
//! is kept in page-intrinsic units so it renders correctly at any zoom or
//! rotation. Insertion order within a page is preserved and is the z-order
//! used for rendering.
//!
//! The store has no history: erased annotations are gone for good.

use crate::geometry::{Color, PagePoint, PageRect};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A committed freehand drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub points: Vec<PagePoint>,
    pub color: Color,
    /// Line width in page units.
    pub width: f32,
}

impl Stroke {
    pub fn new(color: Color, width: f32) -> Self {
        Self { points: Vec::new(), color, width }
    }

    pub fn with_points(points: Vec<PagePoint>, color: Color, width: f32) -> Self {
        Self { points, color, width }
    }

    /// Strokes need at least two finite points; a single point is a tap.
    pub fn is_committable(&self) -> bool {
        self.points.len() >= 2 && self.points.iter().all(PagePoint::is_finite)
    }

    /// True if any captured point lies within `radius` of `point`.
    pub fn is_near(&self, point: &PagePoint, radius: f32) -> bool {
        self.points.iter().any(|p| p.distance_to(point) <= radius)
    }
}

/// One highlight action; a multi-line selection yields several rectangles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightRegion {
    pub rects: Vec<PageRect>,
    pub color: Color,
}

impl HighlightRegion {
    pub fn new(rects: Vec<PageRect>, color: Color) -> Self {
        Self { rects, color }
    }

    /// Region with every zero-area rectangle removed, or `None` if none remain.
    pub fn without_degenerate_rects(mut self) -> Option<Self> {
        self.rects.retain(PageRect::has_area);
        if self.rects.is_empty() {
            None
        } else {
            Some(self)
        }
    }

    pub fn contains(&self, point: &PagePoint) -> bool {
        self.rects.iter().any(|rect| rect.contains(point))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageAnnotations {
    #[serde(default)]
    pub strokes: Vec<Stroke>,
    #[serde(default)]
    pub highlights: Vec<HighlightRegion>,
}

impl PageAnnotations {
    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty() && self.highlights.is_empty()
    }
}

/// What a single erase removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EraseOutcome {
    pub strokes_removed: usize,
    pub highlights_removed: usize,
}

impl EraseOutcome {
    pub fn is_empty(&self) -> bool {
        self.strokes_removed == 0 && self.highlights_removed == 0
    }
}

/// Serializable copy of the whole store: `{ "<page>": { strokes, highlights } }`.
pub type AnnotationSnapshot = BTreeMap<u32, PageAnnotations>;

#[derive(Debug, thiserror::Error)]
pub enum AnnotationError {
    #[error("annotation JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("page numbers start at 1")]
    PageZero,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationStore {
    pages: BTreeMap<u32, PageAnnotations>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `stroke` to `page`. Returns false (and stores nothing) for
    /// strokes with fewer than two points.
    pub fn add_stroke(&mut self, page: u32, stroke: Stroke) -> bool {
        if !stroke.is_committable() {
            log::debug!("dropping degenerate stroke on page {page} ({} points)", stroke.points.len());
            return false;
        }
        self.pages.entry(page).or_default().strokes.push(stroke);
        true
    }

    /// Adds `region` to `page` after dropping zero-area rectangles. Returns
    /// false when no rectangle survives.
    pub fn add_highlight(&mut self, page: u32, region: HighlightRegion) -> bool {
        match region.without_degenerate_rects() {
            Some(region) => {
                self.pages.entry(page).or_default().highlights.push(region);
                true
            }
            None => {
                log::debug!("dropping empty highlight on page {page}");
                false
            }
        }
    }

    /// Removes from `page` every stroke with a point within `radius` of
    /// `point` and every highlight with a rectangle containing `point`.
    pub fn erase_near(&mut self, page: u32, point: PagePoint, radius: f32) -> EraseOutcome {
        let Some(annotations) = self.pages.get_mut(&page) else {
            return EraseOutcome::default();
        };

        let strokes_before = annotations.strokes.len();
        annotations.strokes.retain(|stroke| !stroke.is_near(&point, radius));
        let highlights_before = annotations.highlights.len();
        annotations.highlights.retain(|region| !region.contains(&point));

        let outcome = EraseOutcome {
            strokes_removed: strokes_before - annotations.strokes.len(),
            highlights_removed: highlights_before - annotations.highlights.len(),
        };

        if annotations.is_empty() {
            self.pages.remove(&page);
        }
        outcome
    }

    pub fn page(&self, page: u32) -> Option<&PageAnnotations> {
        self.pages.get(&page)
    }

    pub fn strokes(&self, page: u32) -> &[Stroke] {
        self.pages.get(&page).map(|a| a.strokes.as_slice()).unwrap_or_default()
    }

    pub fn highlights(&self, page: u32) -> &[HighlightRegion] {
        self.pages.get(&page).map(|a| a.highlights.as_slice()).unwrap_or_default()
    }

    /// Pages that currently hold annotations, ascending.
    pub fn annotated_pages(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages.keys().copied()
    }

    /// Total number of strokes and highlights.
    pub fn len(&self) -> usize {
        self.pages.values().map(|a| a.strokes.len() + a.highlights.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }

    pub fn snapshot(&self) -> AnnotationSnapshot {
        self.pages.clone()
    }

    pub fn to_json(&self) -> Result<String, AnnotationError> {
        Ok(serde_json::to_string_pretty(&self.pages)?)
    }

    /// Rebuilds a store from a snapshot, applying the same degenerate-geometry
    /// filtering as live input.
    pub fn from_snapshot(snapshot: AnnotationSnapshot) -> Result<Self, AnnotationError> {
        let mut store = Self::new();
        for (page, annotations) in snapshot {
            if page == 0 {
                return Err(AnnotationError::PageZero);
            }
            for stroke in annotations.strokes {
                store.add_stroke(page, stroke);
            }
            for region in annotations.highlights {
                store.add_highlight(page, region);
            }
        }
        Ok(store)
    }

    pub fn from_json(json: &str) -> Result<Self, AnnotationError> {
        Self::from_snapshot(serde_json::from_str(json)?)
    }
}
