//! Viewer-scoped key bindings.
//!
//! Chords are written the way the desktop app registers them: modifiers
//! joined with `-` in front of the key, e.g. `ctrl-shift-r`, `ctrl--`.

use crate::error::ViewerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewerAction {
    ZoomIn,
    ZoomOut,
    FitWidth,
    OpenSearch,
    NextMatch,
    PreviousMatch,
    RotateClockwise,
    RotateCounterClockwise,
    NextPage,
    PreviousPage,
    ClosePopovers,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct KeyChord {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub cmd: bool,
    pub key: String,
}

impl FromStr for KeyChord {
    type Err = ViewerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        let mut chord = KeyChord::default();
        let mut rest = lowered.as_str();

        // A modifier prefix only counts if something follows it.
        loop {
            let (flag, tail) = if let Some(tail) = rest.strip_prefix("ctrl-") {
                (&mut chord.ctrl, tail)
            } else if let Some(tail) = rest.strip_prefix("alt-") {
                (&mut chord.alt, tail)
            } else if let Some(tail) = rest.strip_prefix("shift-") {
                (&mut chord.shift, tail)
            } else if let Some(tail) = rest.strip_prefix("cmd-").or_else(|| rest.strip_prefix("meta-")) {
                (&mut chord.cmd, tail)
            } else {
                break;
            };
            if tail.is_empty() {
                break;
            }
            *flag = true;
            rest = tail;
        }

        if rest.is_empty() || (rest.ends_with('-') && rest.len() > 1) {
            return Err(ViewerError::InvalidKeyChord(s.to_string()));
        }
        chord.key = rest.to_string();
        Ok(chord)
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            f.write_str("ctrl-")?;
        }
        if self.alt {
            f.write_str("alt-")?;
        }
        if self.shift {
            f.write_str("shift-")?;
        }
        if self.cmd {
            f.write_str("cmd-")?;
        }
        f.write_str(&self.key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBinding {
    pub chord: String,
    pub action: ViewerAction,
}

impl KeyBinding {
    pub fn new(chord: &str, action: ViewerAction) -> Self {
        Self { chord: chord.to_string(), action }
    }
}

pub fn default_bindings() -> Vec<KeyBinding> {
    use ViewerAction::*;
    vec![
        KeyBinding::new("ctrl-=", ZoomIn),
        KeyBinding::new("ctrl-+", ZoomIn),
        KeyBinding::new("ctrl--", ZoomOut),
        KeyBinding::new("ctrl-0", FitWidth),
        KeyBinding::new("ctrl-f", OpenSearch),
        KeyBinding::new("enter", NextMatch),
        KeyBinding::new("shift-enter", PreviousMatch),
        KeyBinding::new("ctrl-r", RotateClockwise),
        KeyBinding::new("ctrl-shift-r", RotateCounterClockwise),
        KeyBinding::new("pagedown", NextPage),
        KeyBinding::new("pageup", PreviousPage),
        KeyBinding::new("escape", ClosePopovers),
    ]
}

/// Parsed chord table. The first binding for a chord wins.
#[derive(Debug, Clone, Default)]
pub struct Keymap {
    bindings: Vec<(KeyChord, ViewerAction)>,
}

impl Keymap {
    pub fn from_bindings(bindings: &[KeyBinding]) -> Result<Self, ViewerError> {
        let bindings = bindings
            .iter()
            .map(|binding| Ok((binding.chord.parse::<KeyChord>()?, binding.action)))
            .collect::<Result<Vec<_>, ViewerError>>()?;
        Ok(Self { bindings })
    }

    pub fn lookup(&self, chord: &KeyChord) -> Option<ViewerAction> {
        self.bindings.iter().find(|(bound, _)| bound == chord).map(|(_, action)| *action)
    }

    /// Parses `chord` and looks it up; malformed or unbound chords give `None`.
    pub fn resolve(&self, chord: &str) -> Option<ViewerAction> {
        match chord.parse::<KeyChord>() {
            Ok(chord) => self.lookup(&chord),
            Err(err) => {
                log::debug!("ignoring key: {err}");
                None
            }
        }
    }
}
