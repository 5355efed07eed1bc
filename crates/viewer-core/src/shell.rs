//! The viewer shell.
//!
//! [`Viewer`] owns the document, view and tool state, and the annotation
//! store. Hosts feed it [`ViewerEvent`]s together with the current time and
//! act on the [`ViewerEffect`]s it returns (scroll the page list, clear the
//! native text selection, open the search box). Timers are deadlines checked
//! at the start of every `handle` call, so a host only needs to send `Tick`
//! when nothing else is happening.

use crate::config::ViewerConfig;
use crate::error::{ViewerError, ViewerResult};
use crate::keymap::{Keymap, ViewerAction};
use crate::layout::ContinuousLayout;
use crate::search::{QueryUpdate, SearchController, SearchState};
use crate::tracker::PageTracker;
use crate::view::{ViewState, ZoomLadder};
use pdf_annotator_core::{
    commit_selection, AnnotationError, AnnotationSnapshot, AnnotationStore, Color, DrawingController,
    Eraser, HighlightRegion, PageTransform, Rotation, ScreenPoint, ScreenRect, Stroke, TextSelection,
    Tool, ToolState,
};
use pdf_engine::{DocumentSource, PageSize, PdfEngineError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Input delivered by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ViewerEvent {
    PointerDown {
        x: f32,
        y: f32,
    },
    PointerMove {
        x: f32,
        y: f32,
    },
    PointerUp {
        x: f32,
        y: f32,
        /// Client rectangles of the native text selection, if any.
        #[serde(default)]
        selection: Vec<ScreenRect>,
    },
    PointerLeave,
    Scroll {
        offset_px: f32,
    },
    ScrollSettled,
    /// The scrollable viewport moved or changed size.
    Resize {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    SearchQueryChanged {
        query: String,
    },
    SearchNext,
    SearchPrevious,
    Key {
        chord: String,
    },
    SetTool {
        tool: Tool,
    },
    SetZoom {
        level: f32,
    },
    Rotate {
        delta: i32,
    },
    GoToPage {
        page: u32,
    },
    SetDrawColor {
        color: Color,
    },
    SetDrawWidth {
        width: f32,
    },
    SetHighlightColor {
        color: Color,
    },
    Tick,
}

/// Work the host must carry out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ViewerEffect {
    /// Scroll the page list so `page` starts at the top of the viewport.
    ScrollTo { page: u32, offset_px: f32 },
    ClearTextSelection,
    OpenSearch,
    ClosePopovers,
    CurrentPageChanged { page: u32 },
    SearchResults { query: String, matches: Vec<u32> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Empty,
    Ready,
    /// Blocking error; nothing of the document is shown until a retry succeeds.
    Failed { message: String },
}

/// State read by surrounding toolbar UI.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerState {
    pub view: ViewState,
    pub tools: ToolState,
    pub annotations: AnnotationStore,
}

/// One overlay per visible page, positioned over the page rendering.
#[derive(Debug, Clone)]
pub struct PageOverlay<'a> {
    pub page: u32,
    pub bounds: ScreenRect,
    /// Page-intrinsic to screen mapping for the stored geometry.
    pub transform: PageTransform,
    pub strokes: &'a [Stroke],
    pub highlights: &'a [HighlightRegion],
    pub live_stroke: Option<&'a Stroke>,
}

pub struct Viewer {
    config: ViewerConfig,
    ladder: ZoomLadder,
    keymap: Keymap,
    document: Option<Box<dyn DocumentSource>>,
    last_path: Option<PathBuf>,
    load_state: LoadState,
    layout: ContinuousLayout,
    state: ViewerState,
    drawing: DrawingController,
    eraser: Eraser,
    search: SearchController,
    tracker: PageTracker,
    generation: u64,
}

impl Viewer {
    pub fn new(config: ViewerConfig) -> ViewerResult<Self> {
        config.validate()?;
        let ladder = config.zoom_ladder()?;
        let keymap = config.keymap()?;
        let zoom = ladder.resolve(config.default_zoom)?;

        Ok(Self {
            layout: ContinuousLayout {
                page_sizes: Vec::new(),
                zoom,
                rotation: Rotation::Deg0,
                page_gap_px: config.page_gap_px,
                viewport: ScreenRect::new(0.0, 0.0, 0.0, 0.0),
                scroll_offset_px: 0.0,
            },
            state: ViewerState {
                view: ViewState::new(zoom),
                tools: config.initial_tools(),
                annotations: AnnotationStore::new(),
            },
            drawing: DrawingController::new(),
            eraser: Eraser::new(config.eraser_radius_px),
            search: SearchController::new(config.search_debounce()),
            tracker: PageTracker::new(config.scroll_throttle()),
            document: None,
            last_path: None,
            load_state: LoadState::Empty,
            generation: 0,
            ladder,
            keymap,
            config,
        })
    }

    /// Replaces the current document. All per-document state (annotations,
    /// search, pending timers, scroll position) is dropped first; on failure
    /// the viewer is left in [`LoadState::Failed`] with no document.
    pub fn open(&mut self, source: Box<dyn DocumentSource>) -> ViewerResult<()> {
        self.close();

        let page_sizes = match read_page_sizes(source.as_ref()) {
            Ok(sizes) => sizes,
            Err(err) => return Err(self.fail(err)),
        };

        log::info!(
            "opened {} ({} pages)",
            source.source_url().unwrap_or("<memory>"),
            page_sizes.len()
        );
        self.layout.page_sizes = page_sizes;
        self.document = Some(source);
        self.load_state = LoadState::Ready;
        Ok(())
    }

    pub fn open_path(&mut self, path: &Path) -> ViewerResult<()> {
        self.last_path = Some(path.to_path_buf());
        match pdf_engine::open_path(path) {
            Ok(source) => self.open(source),
            Err(err) => {
                self.close();
                Err(self.fail(err))
            }
        }
    }

    /// Re-opens the last path passed to [`Viewer::open_path`].
    pub fn retry(&mut self) -> ViewerResult<()> {
        let path = self.last_path.clone().ok_or(ViewerError::NoDocument)?;
        self.open_path(&path)
    }

    /// Drops the document and every piece of per-document state.
    pub fn close(&mut self) {
        if self.document.take().is_some() {
            log::info!("closed document");
        }
        self.generation += 1;
        self.load_state = LoadState::Empty;
        self.layout.page_sizes.clear();
        self.layout.scroll_offset_px = 0.0;
        self.layout.rotation = Rotation::Deg0;
        self.layout.zoom = self.ladder.fit(self.config.default_zoom);
        self.state.view = ViewState::new(self.layout.zoom);
        self.state.annotations.clear();
        self.drawing.cancel();
        self.eraser.pointer_up();
        self.search.reset();
        self.tracker.reset();
    }

    fn fail(&mut self, err: PdfEngineError) -> ViewerError {
        log::warn!("failed to load document: {err}");
        self.load_state = LoadState::Failed { message: err.to_string() };
        ViewerError::Load(err)
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    /// Bumped on every document switch.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_ready(&self) -> bool {
        self.load_state == LoadState::Ready
    }

    pub fn page_count(&self) -> u32 {
        self.layout.page_count()
    }

    pub fn source_url(&self) -> Option<&str> {
        self.document.as_ref().and_then(|doc| doc.source_url())
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn view(&self) -> ViewState {
        self.state.view
    }

    pub fn tools(&self) -> ToolState {
        self.state.tools
    }

    pub fn annotations(&self) -> &AnnotationStore {
        &self.state.annotations
    }

    pub fn search_state(&self) -> &SearchState {
        self.search.state()
    }

    /// Current match as `(index + 1, total)`.
    pub fn search_summary(&self) -> Option<(usize, usize)> {
        self.search.summary()
    }

    pub fn scans_started(&self) -> usize {
        self.search.scans_started()
    }

    pub fn layout(&self) -> &ContinuousLayout {
        &self.layout
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing.is_drawing()
    }

    pub fn export_annotations(&self) -> AnnotationSnapshot {
        self.state.annotations.snapshot()
    }

    pub fn export_annotations_json(&self) -> Result<String, AnnotationError> {
        self.state.annotations.to_json()
    }

    pub fn handle(&mut self, event: ViewerEvent, now: Instant) -> Vec<ViewerEffect> {
        let mut effects = self.fire_timers(now);

        match event {
            ViewerEvent::SetTool { tool } => self.set_tool(tool),
            ViewerEvent::SetDrawColor { color } => self.state.tools.stroke.color = color,
            ViewerEvent::SetDrawWidth { width } => {
                if width.is_finite() && width > 0.0 {
                    self.state.tools.stroke.width = width;
                } else {
                    log::debug!("ignoring draw width {width}");
                }
            }
            ViewerEvent::SetHighlightColor { color } => self.state.tools.highlight_color = color,
            ViewerEvent::Resize { x, y, width, height } => {
                self.layout.viewport = ScreenRect::new(x, y, width, height);
                self.clamp_scroll();
                if self.is_ready() {
                    effects.extend(self.settle(now));
                }
            }
            ViewerEvent::Tick => {}
            _ if !self.is_ready() => log::debug!("ignoring {event:?}: no document"),
            ViewerEvent::PointerDown { x, y } => self.pointer_down(ScreenPoint::new(x, y)),
            ViewerEvent::PointerMove { x, y } => self.pointer_move(ScreenPoint::new(x, y)),
            ViewerEvent::PointerUp { x, y, selection } => {
                effects.extend(self.pointer_up(ScreenPoint::new(x, y), selection));
            }
            ViewerEvent::PointerLeave => self.end_gesture(),
            ViewerEvent::Scroll { offset_px } => {
                self.layout.scroll_offset_px = offset_px;
                self.clamp_scroll();
                if let Some(page) = self.tracker.on_scroll(&self.layout, now) {
                    effects.push(self.page_changed(page));
                }
            }
            ViewerEvent::ScrollSettled => effects.extend(self.settle(now)),
            ViewerEvent::SearchQueryChanged { query } => {
                if self.search.query_changed(&query, now) == QueryUpdate::Cleared {
                    effects.push(ViewerEffect::SearchResults { query, matches: Vec::new() });
                }
            }
            ViewerEvent::SearchNext => effects.extend(self.next_match()),
            ViewerEvent::SearchPrevious => effects.extend(self.previous_match()),
            ViewerEvent::Key { chord } => match self.keymap.resolve(&chord) {
                Some(action) => effects.extend(self.perform(action)),
                None => log::debug!("unbound key {chord:?}"),
            },
            ViewerEvent::SetZoom { level } => effects.extend(log_rejected(self.set_zoom(level))),
            ViewerEvent::Rotate { delta } => effects.extend(log_rejected(self.rotate(delta))),
            ViewerEvent::GoToPage { page } => effects.extend(log_rejected(self.go_to_page(page))),
        }

        effects
    }

    /// Runs whatever deadline has passed: a coalesced scroll sample and a
    /// debounced search.
    fn fire_timers(&mut self, now: Instant) -> Vec<ViewerEffect> {
        let mut effects = Vec::new();
        if !self.is_ready() {
            return effects;
        }

        if let Some(page) = self.tracker.flush(&self.layout, now) {
            effects.push(self.page_changed(page));
        }

        let Some(document) = self.document.as_deref() else {
            return effects;
        };
        if let Some(results) = self.search.run_due(document, now) {
            let query = results.query.clone();
            let matches = results.matches.clone();
            let first = matches.first().copied();
            effects.push(ViewerEffect::SearchResults { query, matches });
            if let Some(page) = first {
                effects.extend(log_rejected(self.go_to_page(page)));
            }
        }
        effects
    }

    fn settle(&mut self, now: Instant) -> Option<ViewerEffect> {
        let page = self.tracker.on_settled(&self.layout, now)?;
        Some(self.page_changed(page))
    }

    fn page_changed(&mut self, page: u32) -> ViewerEffect {
        self.state.view.current_page = page;
        ViewerEffect::CurrentPageChanged { page }
    }

    fn clamp_scroll(&mut self) {
        let max = self.layout.max_scroll_offset();
        self.layout.scroll_offset_px = self.layout.scroll_offset_px.clamp(0.0, max);
    }

    /// Switching tools ends any in-progress gesture first.
    pub fn set_tool(&mut self, tool: Tool) {
        if self.drawing.is_drawing() {
            let outcome = self.drawing.finish(&mut self.state.annotations);
            log::debug!("tool switch ended stroke: {outcome:?}");
        }
        self.eraser.pointer_up();
        self.state.tools.active = tool;
    }

    fn pointer_down(&mut self, position: ScreenPoint) {
        let Some(page) = self.layout.page_at(position) else {
            log::debug!("pointer-down outside any page at ({}, {})", position.x, position.y);
            return;
        };
        let transform = self.layout.transform_for(page);

        match self.state.tools.active {
            Tool::Draw => {
                self.drawing.pointer_down(page, position, transform.as_ref(), self.state.tools.stroke);
            }
            Tool::Eraser => {
                let outcome =
                    self.eraser.pointer_down(page, position, transform.as_ref(), &mut self.state.annotations);
                log::debug!("erased on page {page}: {outcome:?}");
            }
            Tool::Select | Tool::Highlight => {}
        }
    }

    fn pointer_move(&mut self, position: ScreenPoint) {
        match self.state.tools.active {
            Tool::Draw => {
                if let Some(page) = self.drawing.active_page() {
                    let transform = self.layout.transform_for(page);
                    self.drawing.pointer_move(position, transform.as_ref());
                }
            }
            Tool::Eraser if self.eraser.is_pressed() => {
                if let Some(page) = self.layout.page_at(position) {
                    let transform = self.layout.transform_for(page);
                    self.eraser.pointer_move(page, position, transform.as_ref(), &mut self.state.annotations);
                }
            }
            _ => {}
        }
    }

    fn pointer_up(&mut self, position: ScreenPoint, selection: Vec<ScreenRect>) -> Option<ViewerEffect> {
        if self.state.tools.active != Tool::Highlight {
            self.end_gesture();
            return None;
        }
        if selection.is_empty() {
            return None;
        }

        // A selection may cross page boundaries; each fragment belongs to the
        // page under its centre and fragments over no page are dropped.
        let mut by_page: BTreeMap<u32, Vec<ScreenRect>> = BTreeMap::new();
        for rect in selection {
            let center = ScreenPoint::new(rect.x + rect.width / 2.0, rect.center_y());
            match self.layout.page_at(center) {
                Some(page) => by_page.entry(page).or_default().push(rect),
                None => log::debug!("dropping selection fragment outside any page at ({}, {})", center.x, center.y),
            }
        }
        if by_page.is_empty() {
            log::debug!("selection ending at ({}, {}) covers no page", position.x, position.y);
            return None;
        }

        let mut committed = false;
        for (page, rects) in by_page {
            let transform = self.layout.transform_for(page);
            let outcome = commit_selection(
                &TextSelection::new(page, rects),
                transform.as_ref(),
                self.state.tools.highlight_color,
                &mut self.state.annotations,
            );
            log::debug!("highlight on page {page}: {outcome:?}");
            committed |= outcome.should_clear_selection();
        }
        committed.then_some(ViewerEffect::ClearTextSelection)
    }

    /// Pointer-up and pointer-leave both end the gesture.
    fn end_gesture(&mut self) {
        match self.state.tools.active {
            Tool::Draw => {
                let outcome = self.drawing.finish(&mut self.state.annotations);
                log::debug!("stroke ended: {outcome:?}");
            }
            Tool::Eraser => self.eraser.pointer_up(),
            Tool::Select | Tool::Highlight => {}
        }
    }

    fn perform(&mut self, action: ViewerAction) -> Vec<ViewerEffect> {
        match action {
            ViewerAction::ZoomIn => self.zoom_in(),
            ViewerAction::ZoomOut => self.zoom_out(),
            ViewerAction::FitWidth => self.fit_width(),
            ViewerAction::OpenSearch => vec![ViewerEffect::OpenSearch],
            ViewerAction::ClosePopovers => vec![ViewerEffect::ClosePopovers],
            ViewerAction::NextMatch => self.next_match().into_iter().collect(),
            ViewerAction::PreviousMatch => self.previous_match().into_iter().collect(),
            ViewerAction::RotateClockwise => log_rejected(self.rotate(90)),
            ViewerAction::RotateCounterClockwise => log_rejected(self.rotate(-90)),
            ViewerAction::NextPage => {
                let page = (self.state.view.current_page + 1).min(self.page_count());
                log_rejected(self.go_to_page(page))
            }
            ViewerAction::PreviousPage => {
                let page = self.state.view.current_page.saturating_sub(1).max(1);
                log_rejected(self.go_to_page(page))
            }
        }
    }

    /// Scrolls `page` into view. The current page is not changed here; the
    /// tracker confirms it once the resulting scroll arrives.
    pub fn go_to_page(&mut self, page: u32) -> ViewerResult<Vec<ViewerEffect>> {
        if !self.is_ready() {
            return Err(ViewerError::NoDocument);
        }
        let page_count = self.page_count();
        if page == 0 || page > page_count {
            return Err(ViewerError::InvalidPage { page, page_count });
        }
        let offset_px = self.layout.scroll_offset_for_page(page);
        Ok(vec![ViewerEffect::ScrollTo { page, offset_px }])
    }

    /// Sets an exact zoom level; it must be one of the configured levels.
    pub fn set_zoom(&mut self, level: f32) -> ViewerResult<Vec<ViewerEffect>> {
        let zoom = self.ladder.resolve(level)?;
        Ok(self.apply_zoom(zoom))
    }

    pub fn zoom_in(&mut self) -> Vec<ViewerEffect> {
        let zoom = self.ladder.step_in(self.state.view.zoom);
        self.apply_zoom(zoom)
    }

    pub fn zoom_out(&mut self) -> Vec<ViewerEffect> {
        let zoom = self.ladder.step_out(self.state.view.zoom);
        self.apply_zoom(zoom)
    }

    /// Largest configured zoom at which the widest page fits the viewport.
    pub fn fit_width(&mut self) -> Vec<ViewerEffect> {
        match self.layout.fit_width_zoom() {
            Some(raw) => {
                let zoom = self.ladder.fit(raw);
                self.apply_zoom(zoom)
            }
            None => Vec::new(),
        }
    }

    /// Rotates by `delta` degrees, which must be a multiple of 90.
    pub fn rotate(&mut self, delta: i32) -> ViewerResult<Vec<ViewerEffect>> {
        let rotation = self.state.view.rotation.rotated(delta)?;
        self.state.view.rotation = rotation;
        self.layout.rotation = rotation;
        Ok(self.reanchor())
    }

    fn apply_zoom(&mut self, zoom: f32) -> Vec<ViewerEffect> {
        if zoom == self.state.view.zoom {
            return Vec::new();
        }
        self.state.view.zoom = zoom;
        self.layout.zoom = zoom;
        self.reanchor()
    }

    /// Keeps the current page at the top after the page geometry changed.
    fn reanchor(&mut self) -> Vec<ViewerEffect> {
        if !self.is_ready() {
            return Vec::new();
        }
        let page = self.state.view.current_page;
        let offset_px = self.layout.scroll_offset_for_page(page);
        self.layout.scroll_offset_px = offset_px;
        vec![ViewerEffect::ScrollTo { page, offset_px }]
    }

    pub fn next_match(&mut self) -> Option<ViewerEffect> {
        let page = self.search.next_match()?;
        self.go_to_page(page).ok()?.pop()
    }

    pub fn previous_match(&mut self) -> Option<ViewerEffect> {
        let page = self.search.previous_match()?;
        self.go_to_page(page).ok()?.pop()
    }

    /// Overlays for every page intersecting the viewport, top to bottom.
    pub fn overlays(&self) -> Vec<PageOverlay<'_>> {
        let live = self.drawing.in_progress();

        self.layout
            .visible_pages()
            .into_iter()
            .filter_map(|page| {
                let transform = self.layout.transform_for(page)?;
                Some(PageOverlay {
                    page,
                    bounds: transform.page_bounds(),
                    transform,
                    strokes: self.state.annotations.strokes(page),
                    highlights: self.state.annotations.highlights(page),
                    live_stroke: live.filter(|(live_page, _)| *live_page == page).map(|(_, stroke)| stroke),
                })
            })
            .collect()
    }
}

fn read_page_sizes(source: &dyn DocumentSource) -> Result<Vec<PageSize>, PdfEngineError> {
    let page_count = source.page_count();
    if page_count == 0 {
        return Err(PdfEngineError::NoPages);
    }
    (1..=page_count).map(|page| source.page_size(page)).collect()
}

fn log_rejected(result: ViewerResult<Vec<ViewerEffect>>) -> Vec<ViewerEffect> {
    result.unwrap_or_else(|err| {
        log::warn!("rejected viewer command: {err}");
        Vec::new()
    })
}
