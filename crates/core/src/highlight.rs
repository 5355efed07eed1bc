//! Text-selection highlighting.
//!
//! On pointer-up with the highlight tool, the host hands over the native
//! selection's client rectangles. Each rectangle is mapped to page space by
//! its two opposite corners; rectangles without positive area are dropped and
//! the survivors are committed together as one region.

use crate::annotation::{AnnotationStore, HighlightRegion};
use crate::geometry::{Color, ScreenRect};
use crate::transform::PageTransform;
use serde::{Deserialize, Serialize};

/// A finished native text selection on one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextSelection {
    pub page: u32,
    /// Client-space rectangles, one per visual line fragment.
    pub rects: Vec<ScreenRect>,
}

impl TextSelection {
    pub fn new(page: u32, rects: Vec<ScreenRect>) -> Self {
        Self { page, rects }
    }

    pub fn is_collapsed(&self) -> bool {
        self.rects.iter().all(|r| !(r.width > 0.0 && r.height > 0.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightOutcome {
    /// A region was stored; the host should clear its native selection.
    Committed { page: u32, rects: usize },
    /// Selection was empty or collapsed.
    EmptySelection,
    /// The page is not laid out, so nothing can be converted.
    NotLaidOut,
    /// Every converted rectangle was degenerate.
    Degenerate,
}

impl HighlightOutcome {
    pub fn should_clear_selection(&self) -> bool {
        matches!(self, HighlightOutcome::Committed { .. })
    }
}

pub fn commit_selection(
    selection: &TextSelection,
    transform: Option<&PageTransform>,
    color: Color,
    store: &mut AnnotationStore,
) -> HighlightOutcome {
    if selection.rects.is_empty() || selection.is_collapsed() {
        return HighlightOutcome::EmptySelection;
    }
    let Some(transform) = transform else {
        log::debug!("ignoring selection on page {}: page not laid out", selection.page);
        return HighlightOutcome::NotLaidOut;
    };

    let rects = selection.rects.iter().map(|rect| transform.rect_to_page(rect)).collect();
    let region = HighlightRegion::new(rects, color);

    match region.without_degenerate_rects() {
        Some(region) => {
            let count = region.rects.len();
            store.add_highlight(selection.page, region);
            HighlightOutcome::Committed { page: selection.page, rects: count }
        }
        None => HighlightOutcome::Degenerate,
    }
}
