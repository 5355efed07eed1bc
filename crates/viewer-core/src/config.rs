//! Viewer configuration.
//!
//! Settings can be loaded from a TOML file, overlaid from environment
//! variables, or built programmatically. Keys missing from a file fall back
//! to their defaults.

use crate::keymap::{default_bindings, KeyBinding, Keymap};
use crate::view::ZoomLadder;
use pdf_annotator_core::{Color, StrokeStyle, ToolState, Tool};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

const ENV_SEARCH_DEBOUNCE_MS: &str = "PDF_ANNOTATOR_SEARCH_DEBOUNCE_MS";
const ENV_SCROLL_THROTTLE_MS: &str = "PDF_ANNOTATOR_SCROLL_THROTTLE_MS";
const ENV_DEFAULT_ZOOM: &str = "PDF_ANNOTATOR_DEFAULT_ZOOM";
const ENV_ERASER_RADIUS_PX: &str = "PDF_ANNOTATOR_ERASER_RADIUS_PX";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid value for configuration key: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Quiet period before a changed search query is scanned.
    pub search_debounce_ms: u64,
    /// Minimum spacing between current-page evaluations while scrolling.
    pub scroll_throttle_ms: u64,
    /// Allowed zoom factors, strictly increasing.
    pub zoom_levels: Vec<f32>,
    pub default_zoom: f32,
    pub page_gap_px: f32,
    /// Eraser reach in screen pixels.
    pub eraser_radius_px: f32,
    pub draw_color: Color,
    /// Stroke width in page units.
    pub draw_width: f32,
    pub highlight_color: Color,
    pub key_bindings: Vec<KeyBinding>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            search_debounce_ms: 300,
            scroll_throttle_ms: 16,
            zoom_levels: vec![0.5, 0.75, 1.0, 1.25, 1.5, 2.0, 3.0],
            default_zoom: 1.0,
            page_gap_px: 16.0,
            eraser_radius_px: 10.0,
            draw_color: Color::RED,
            draw_width: 2.0,
            highlight_color: Color::HIGHLIGHT_YELLOW,
            key_bindings: default_bindings(),
        }
    }
}

impl ViewerConfig {
    pub fn with_search_debounce_ms(mut self, ms: u64) -> Self {
        self.search_debounce_ms = ms;
        self
    }

    pub fn with_scroll_throttle_ms(mut self, ms: u64) -> Self {
        self.scroll_throttle_ms = ms;
        self
    }

    pub fn with_zoom_levels(mut self, levels: Vec<f32>, default_zoom: f32) -> Self {
        self.zoom_levels = levels;
        self.default_zoom = default_zoom;
        self
    }

    pub fn with_page_gap_px(mut self, gap: f32) -> Self {
        self.page_gap_px = gap;
        self
    }

    pub fn with_eraser_radius_px(mut self, radius: f32) -> Self {
        self.eraser_radius_px = radius;
        self
    }

    pub fn with_draw_style(mut self, color: Color, width: f32) -> Self {
        self.draw_color = color;
        self.draw_width = width;
        self
    }

    pub fn with_highlight_color(mut self, color: Color) -> Self {
        self.highlight_color = color;
        self
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn scroll_throttle(&self) -> Duration {
        Duration::from_millis(self.scroll_throttle_ms)
    }

    /// Returns `dirs::config_dir()/pdf-annotator/viewer.toml`.
    ///
    /// - Linux: ~/.config/pdf-annotator/viewer.toml
    /// - macOS: ~/Library/Application Support/pdf-annotator/viewer.toml
    pub fn default_config_path() -> PathBuf {
        match dirs::config_dir() {
            Some(dir) => dir.join("pdf-annotator").join("viewer.toml"),
            None => PathBuf::from("pdf-annotator-viewer.toml"),
        }
    }

    /// Defaults overlaid with environment variables.
    ///
    /// - `PDF_ANNOTATOR_SEARCH_DEBOUNCE_MS`
    /// - `PDF_ANNOTATOR_SCROLL_THROTTLE_MS`
    /// - `PDF_ANNOTATOR_DEFAULT_ZOOM`
    /// - `PDF_ANNOTATOR_ERASER_RADIUS_PX`
    ///
    /// # Errors
    /// Returns an error if any variable holds an unparsable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().overlay_env()
    }

    /// Applies any set environment variables on top of `self`.
    pub fn overlay_env(mut self) -> Result<Self, ConfigError> {
        if let Some(ms) = env_value(ENV_SEARCH_DEBOUNCE_MS)? {
            self.search_debounce_ms = ms;
        }
        if let Some(ms) = env_value(ENV_SCROLL_THROTTLE_MS)? {
            self.scroll_throttle_ms = ms;
        }
        if let Some(zoom) = env_value(ENV_DEFAULT_ZOOM)? {
            self.default_zoom = zoom;
        }
        if let Some(radius) = env_value(ENV_ERASER_RADIUS_PX)? {
            self.eraser_radius_px = radius;
        }
        Ok(self)
    }

    /// Loads a TOML file, e.g.
    ///
    /// ```toml
    /// search_debounce_ms = 250
    /// zoom_levels = [0.5, 1.0, 2.0]
    /// default_zoom = 1.0
    /// draw_color = "#1e88e5"
    ///
    /// [[key_bindings]]
    /// chord = "ctrl-="
    /// action = "zoom-in"
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Writes TOML, creating parent directories as needed.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ladder = self.zoom_ladder()?;
        if !ladder.contains(self.default_zoom) {
            return Err(ConfigError::InvalidValue("default_zoom".to_string()));
        }
        if !(self.page_gap_px.is_finite() && self.page_gap_px >= 0.0) {
            return Err(ConfigError::InvalidValue("page_gap_px".to_string()));
        }
        if !(self.eraser_radius_px.is_finite() && self.eraser_radius_px > 0.0) {
            return Err(ConfigError::InvalidValue("eraser_radius_px".to_string()));
        }
        if !(self.draw_width.is_finite() && self.draw_width > 0.0) {
            return Err(ConfigError::InvalidValue("draw_width".to_string()));
        }
        self.keymap()?;
        Ok(())
    }

    pub fn zoom_ladder(&self) -> Result<ZoomLadder, ConfigError> {
        ZoomLadder::new(self.zoom_levels.clone())
            .map_err(|err| ConfigError::InvalidValue(format!("zoom_levels ({err})")))
    }

    pub fn keymap(&self) -> Result<Keymap, ConfigError> {
        Keymap::from_bindings(&self.key_bindings)
            .map_err(|err| ConfigError::InvalidValue(format!("key_bindings ({err})")))
    }

    /// Tool state a freshly opened viewer starts with.
    pub fn initial_tools(&self) -> ToolState {
        ToolState {
            active: Tool::Select,
            stroke: StrokeStyle { color: self.draw_color, width: self.draw_width },
            highlight_color: self.highlight_color,
        }
    }
}

fn env_value<T: FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(name.to_string())),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    const ALL_VARS: [&str; 4] =
        [ENV_SEARCH_DEBOUNCE_MS, ENV_SCROLL_THROTTLE_MS, ENV_DEFAULT_ZOOM, ENV_ERASER_RADIUS_PX];

    // Saves and restores environment variables around a test.
    struct EnvGuard {
        vars: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new(var_names: &[&str]) -> Self {
            let vars = var_names.iter().map(|name| (name.to_string(), env::var(name).ok())).collect();
            Self { vars }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (name, value) in &self.vars {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    #[test]
    fn defaults_are_valid() {
        let config = ViewerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.search_debounce(), Duration::from_millis(300));
        assert_eq!(config.zoom_ladder().unwrap().levels().len(), 7);
    }

    #[test]
    #[serial]
    fn env_overrides_defaults() {
        let _guard = EnvGuard::new(&ALL_VARS);
        for name in ALL_VARS {
            env::remove_var(name);
        }
        env::set_var(ENV_SEARCH_DEBOUNCE_MS, "120");
        env::set_var(ENV_DEFAULT_ZOOM, "1.5");

        let config = ViewerConfig::from_env().unwrap();
        assert_eq!(config.search_debounce_ms, 120);
        assert_eq!(config.default_zoom, 1.5);
        assert_eq!(config.scroll_throttle_ms, 16);
        assert_eq!(config.eraser_radius_px, 10.0);
    }

    #[test]
    #[serial]
    fn env_rejects_garbage() {
        let _guard = EnvGuard::new(&[ENV_ERASER_RADIUS_PX]);
        env::set_var(ENV_ERASER_RADIUS_PX, "wide");
        assert!(matches!(ViewerConfig::from_env(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config = ViewerConfig::from_toml_str(
            r##"
search_debounce_ms = 50
draw_color = "#1e88e5"

[[key_bindings]]
chord = "ctrl-k"
action = "open-search"
"##,
        )
        .unwrap();

        assert_eq!(config.search_debounce_ms, 50);
        assert_eq!(config.draw_color, Color::BLUE);
        assert_eq!(config.default_zoom, 1.0);
        assert_eq!(config.key_bindings.len(), 1);
    }

    #[test]
    fn validation_catches_bad_values() {
        let off_ladder = ViewerConfig::default().with_zoom_levels(vec![0.5, 1.0], 1.5);
        assert!(off_ladder.validate().is_err());

        let unsorted = ViewerConfig::default().with_zoom_levels(vec![2.0, 1.0], 1.0);
        assert!(unsorted.validate().is_err());

        let no_reach = ViewerConfig::default().with_eraser_radius_px(0.0);
        assert!(no_reach.validate().is_err());

        let mut bad_chord = ViewerConfig::default();
        bad_chord.key_bindings.push(KeyBinding::new("ctrl-", crate::keymap::ViewerAction::ZoomIn));
        assert!(bad_chord.validate().is_err());
    }

    #[test]
    fn file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("viewer.toml");
        let config = ViewerConfig::default()
            .with_search_debounce_ms(75)
            .with_highlight_color(Color::new(0, 200, 0, 96));

        config.save_to_file(&path).unwrap();
        assert_eq!(ViewerConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ViewerConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
