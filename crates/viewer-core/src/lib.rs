//! Headless viewer for paginated documents with ink and highlight annotations.
//!
//! The [`Viewer`] shell drives everything: page layout, current-page
//! tracking, zoom and rotation, debounced search, key bindings and the
//! annotation tools from `pdf-annotator-core`.

pub mod config;
pub mod debounce;
pub mod error;
pub mod keymap;
pub mod layout;
pub mod search;
pub mod shell;
pub mod tracker;
pub mod view;

pub use config::{ConfigError, ViewerConfig};
pub use debounce::Debouncer;
pub use error::{ViewerError, ViewerResult};
pub use keymap::{default_bindings, KeyBinding, KeyChord, Keymap, ViewerAction};
pub use layout::{ContinuousLayout, PageSlot};
pub use search::{scan, QueryUpdate, SearchController, SearchState};
pub use shell::{LoadState, PageOverlay, Viewer, ViewerEffect, ViewerEvent, ViewerState};
pub use tracker::{nearest_page, PageTracker};
pub use view::{ViewState, ZoomLadder};
