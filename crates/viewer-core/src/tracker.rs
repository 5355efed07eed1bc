//! Current-page tracking from scroll position.
//!
//! The current page is the one whose on-screen vertical midpoint is closest
//! to the viewport's vertical midpoint; ties go to the lower page number.
//! Scroll samples arriving faster than the throttle interval are coalesced
//! and evaluated later by [`PageTracker::flush`] or on scroll settle, since
//! only the final value matters.

use crate::layout::{ContinuousLayout, PageSlot};
use pdf_annotator_core::ScreenRect;
use std::time::{Duration, Instant};

/// O(page count) nearest-midpoint scan.
pub fn nearest_page(slots: &[PageSlot], viewport: &ScreenRect) -> Option<u32> {
    let target = viewport.center_y();
    let mut best: Option<(u32, f32)> = None;

    for slot in slots {
        let distance = (slot.bounds.center_y() - target).abs();
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((slot.page, distance)),
        }
    }

    best.map(|(page, _)| page)
}

#[derive(Debug, Clone)]
pub struct PageTracker {
    current: u32,
    throttle: Duration,
    last_evaluated: Option<Instant>,
    pending: bool,
}

impl PageTracker {
    pub fn new(throttle: Duration) -> Self {
        Self { current: 1, throttle, last_evaluated: None, pending: false }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn has_pending_sample(&self) -> bool {
        self.pending
    }

    /// Forget all state, e.g. when a new document is opened.
    pub fn reset(&mut self) {
        self.current = 1;
        self.last_evaluated = None;
        self.pending = false;
    }

    /// Handles one scroll sample. Returns the new current page if it changed.
    pub fn on_scroll(&mut self, layout: &ContinuousLayout, now: Instant) -> Option<u32> {
        if let Some(last) = self.last_evaluated {
            if now.saturating_duration_since(last) < self.throttle {
                log::trace!("coalescing scroll sample at offset {}", layout.scroll_offset_px);
                self.pending = true;
                return None;
            }
        }
        self.evaluate(layout, now)
    }

    /// Evaluates a coalesced sample once the throttle interval has passed.
    pub fn flush(&mut self, layout: &ContinuousLayout, now: Instant) -> Option<u32> {
        if !self.pending {
            return None;
        }
        match self.last_evaluated {
            Some(last) if now.saturating_duration_since(last) < self.throttle => None,
            _ => self.evaluate(layout, now),
        }
    }

    /// Scroll has settled (or layout changed): always evaluate.
    pub fn on_settled(&mut self, layout: &ContinuousLayout, now: Instant) -> Option<u32> {
        self.evaluate(layout, now)
    }

    fn evaluate(&mut self, layout: &ContinuousLayout, now: Instant) -> Option<u32> {
        self.pending = false;
        self.last_evaluated = Some(now);

        let page = nearest_page(&layout.slots(), &layout.viewport)?;
        if page == self.current {
            return None;
        }
        self.current = page;
        Some(page)
    }
}
