//! Continuous vertical page layout.
//!
//! Pages are stacked top to bottom at the current zoom and rotation,
//! separated by a fixed gap and centred horizontally in the viewport. Page
//! numbers are 1-based.

use pdf_annotator_core::{PageTransform, Rotation, ScreenPoint, ScreenRect};
use pdf_engine::PageSize;

#[derive(Debug, Clone, PartialEq)]
pub struct ContinuousLayout {
    pub page_sizes: Vec<PageSize>,
    pub zoom: f32,
    pub rotation: Rotation,
    pub page_gap_px: f32,
    /// On-screen rectangle of the scrollable viewport.
    pub viewport: ScreenRect,
    pub scroll_offset_px: f32,
}

/// On-screen placement of one page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSlot {
    pub page: u32,
    pub bounds: ScreenRect,
}

impl ContinuousLayout {
    pub fn page_count(&self) -> u32 {
        self.page_sizes.len() as u32
    }

    /// The viewport has an area and there is at least one page.
    pub fn is_laid_out(&self) -> bool {
        !self.page_sizes.is_empty()
            && self.viewport.width > 0.0
            && self.viewport.height > 0.0
            && self.zoom > 0.0
    }

    fn size(&self, page: u32) -> Option<PageSize> {
        if page == 0 {
            return None;
        }
        self.page_sizes.get((page - 1) as usize).copied()
    }

    /// Rendered width and height of `page` in pixels.
    pub fn page_extent(&self, page: u32) -> Option<(f32, f32)> {
        let (w, h) = self.rotation.displayed_size(self.size(page)?);
        Some((w * self.zoom, h * self.zoom))
    }

    /// Distance from the top of the content to the top of `page`.
    pub fn page_start_offset(&self, page: u32) -> f32 {
        let mut cursor = 0.0;

        for index in 1..page.min(self.page_count() + 1) {
            if let Some((_, height)) = self.page_extent(index) {
                cursor += height + self.page_gap_px;
            }
        }

        cursor
    }

    pub fn content_height(&self) -> f32 {
        let count = self.page_count();
        if count == 0 {
            return 0.0;
        }
        let last = self.page_extent(count).map(|(_, h)| h).unwrap_or_default();
        self.page_start_offset(count) + last
    }

    pub fn max_scroll_offset(&self) -> f32 {
        (self.content_height() - self.viewport.height).max(0.0)
    }

    /// Scroll offset that brings the top of `page` to the top of the viewport.
    pub fn scroll_offset_for_page(&self, page: u32) -> f32 {
        self.page_start_offset(page).clamp(0.0, self.max_scroll_offset())
    }

    pub fn page_bounds(&self, page: u32) -> Option<ScreenRect> {
        if !self.is_laid_out() {
            return None;
        }
        let (width, height) = self.page_extent(page)?;
        let x = self.viewport.x + ((self.viewport.width - width) / 2.0).max(0.0);
        let y = self.viewport.y + self.page_start_offset(page) - self.scroll_offset_px;
        Some(ScreenRect::new(x, y, width, height))
    }

    pub fn slots(&self) -> Vec<PageSlot> {
        (1..=self.page_count())
            .filter_map(|page| self.page_bounds(page).map(|bounds| PageSlot { page, bounds }))
            .collect()
    }

    /// Pages whose rendering intersects the viewport, ascending.
    pub fn visible_pages(&self) -> Vec<u32> {
        self.slots()
            .into_iter()
            .filter(|slot| slot.bounds.intersects_vertically(&self.viewport))
            .map(|slot| slot.page)
            .collect()
    }

    /// Page whose rendered rectangle contains `point`.
    pub fn page_at(&self, point: ScreenPoint) -> Option<u32> {
        self.slots().into_iter().find(|slot| slot.bounds.contains(&point)).map(|slot| slot.page)
    }

    pub fn transform_for(&self, page: u32) -> Option<PageTransform> {
        let bounds = self.page_bounds(page)?;
        match PageTransform::from_bounds(self.size(page)?, self.rotation, bounds) {
            Ok(transform) => Some(transform),
            Err(err) => {
                log::debug!("no transform for page {page}: {err}");
                None
            }
        }
    }

    /// Zoom factor at which the widest page exactly fills the viewport width.
    pub fn fit_width_zoom(&self) -> Option<f32> {
        let widest = self
            .page_sizes
            .iter()
            .map(|size| self.rotation.displayed_size(*size).0)
            .fold(0.0_f32, f32::max);

        if self.viewport.width <= 0.0 || widest <= 0.0 {
            return None;
        }
        Some(self.viewport.width / widest)
    }
}
