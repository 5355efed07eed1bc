//! Debounced full-document text search.

use crate::debounce::Debouncer;
use pdf_engine::DocumentSource;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Query, matching pages (ascending) and the selected match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchState {
    pub query: String,
    pub matches: Vec<u32>,
    pub current: usize,
}

impl SearchState {
    pub fn current_page(&self) -> Option<u32> {
        self.matches.get(self.current).copied()
    }

    /// 1-based match position and total, for "3 of 7" style labels.
    pub fn summary(&self) -> Option<(usize, usize)> {
        if self.matches.is_empty() {
            None
        } else {
            Some((self.current + 1, self.matches.len()))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryUpdate {
    /// Empty query: results were cleared and nothing was scheduled.
    Cleared,
    Scheduled { deadline: Instant },
}

/// Case-insensitive substring scan over every page, in page order.
///
/// A page whose text cannot be extracted counts as a non-match.
pub fn scan(source: &dyn DocumentSource, query: &str) -> Vec<u32> {
    let needle = query.to_lowercase();
    let mut matches = Vec::new();

    for page in 1..=source.page_count() {
        match source.page_text(page) {
            Ok(text) => {
                if text.to_lowercase().contains(&needle) {
                    matches.push(page);
                }
            }
            Err(err) => log::warn!("skipping page {page} in search: {err}"),
        }
    }

    matches
}

#[derive(Debug, Clone)]
pub struct SearchController {
    state: SearchState,
    debouncer: Debouncer<String>,
    scans_started: usize,
}

impl SearchController {
    pub fn new(debounce: Duration) -> Self {
        Self { state: SearchState::default(), debouncer: Debouncer::new(debounce), scans_started: 0 }
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    /// Number of scans run since construction.
    pub fn scans_started(&self) -> usize {
        self.scans_started
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Records a new query. A non-empty query replaces any pending one and
    /// restarts the debounce wait; the empty query clears immediately. Either
    /// way the previous query's matches are dropped.
    pub fn query_changed(&mut self, query: &str, now: Instant) -> QueryUpdate {
        if query.is_empty() {
            self.debouncer.cancel();
            self.state = SearchState::default();
            return QueryUpdate::Cleared;
        }
        self.state = SearchState { query: query.to_string(), ..SearchState::default() };
        let deadline = self.debouncer.schedule(query.to_string(), now);
        QueryUpdate::Scheduled { deadline }
    }

    /// Query whose debounce deadline has passed, if any.
    pub fn poll_due(&mut self, now: Instant) -> Option<String> {
        self.debouncer.poll(now)
    }

    /// Runs the due scan, if any. Returns the new matches when a scan ran.
    pub fn run_due(&mut self, source: &dyn DocumentSource, now: Instant) -> Option<&SearchState> {
        let query = self.poll_due(now)?;
        Some(self.search(source, &query))
    }

    /// Scans immediately, bypassing the debounce.
    pub fn search(&mut self, source: &dyn DocumentSource, query: &str) -> &SearchState {
        if query.is_empty() {
            self.debouncer.cancel();
            self.state = SearchState::default();
            return &self.state;
        }
        self.scans_started += 1;
        let matches = scan(source, query);
        log::info!("search {query:?} matched {} page(s)", matches.len());
        self.apply_results(query, matches)
    }

    /// Installs results and resets the match index.
    pub fn apply_results(&mut self, query: &str, matches: Vec<u32>) -> &SearchState {
        self.state = SearchState { query: query.to_string(), matches, current: 0 };
        &self.state
    }

    pub fn current_match_page(&self) -> Option<u32> {
        self.state.current_page()
    }

    pub fn summary(&self) -> Option<(usize, usize)> {
        self.state.summary()
    }

    /// Advances circularly; wraps to the first match after the last.
    pub fn next_match(&mut self) -> Option<u32> {
        let total = self.state.matches.len();
        if total == 0 {
            return None;
        }
        self.state.current = (self.state.current + 1) % total;
        self.current_match_page()
    }

    pub fn previous_match(&mut self) -> Option<u32> {
        let total = self.state.matches.len();
        if total == 0 {
            return None;
        }
        self.state.current = (self.state.current + total - 1) % total;
        self.current_match_page()
    }

    /// Drops results and any pending query, e.g. on document switch.
    pub fn reset(&mut self) {
        self.debouncer.cancel();
        self.state = SearchState::default();
    }
}
