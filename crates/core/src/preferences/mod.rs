//! Persisted display-mode preference.
//!
//! The initial mode is resolved from three tiers: an explicitly stored value,
//! then the environment's light/dark signal, then [`DisplayMode::Light`].

mod storage;
mod store;

pub use storage::{JsonFileStorage, MemoryStorage, PreferenceStorage};
pub use store::PreferenceStore;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage key of the display-mode preference.
pub const DISPLAY_MODE_KEY: &str = "theme";

#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("Invalid display mode: '{0}'")]
    InvalidMode(String),

    #[error("Preference storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Preference file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Light,
    Dark,
}

impl DisplayMode {
    pub fn from_prefers_dark(prefers_dark: bool) -> Self {
        if prefers_dark {
            DisplayMode::Dark
        } else {
            DisplayMode::Light
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            DisplayMode::Light => DisplayMode::Dark,
            DisplayMode::Dark => DisplayMode::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DisplayMode::Light => "light",
            DisplayMode::Dark => "dark",
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayMode {
    type Err = PreferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(DisplayMode::Light),
            "dark" => Ok(DisplayMode::Dark),
            _ => Err(PreferenceError::InvalidMode(s.to_string())),
        }
    }
}

/// Stored value wins over the environment, which wins over the fallback.
pub fn resolve_display_mode(
    stored: Option<DisplayMode>,
    environment: Option<DisplayMode>,
) -> DisplayMode {
    stored.or(environment).unwrap_or_default()
}
