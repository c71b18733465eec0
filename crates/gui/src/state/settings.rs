//! Application settings

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::geometry::FitMode;
use crate::session::SessionConfig;

/// UI language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    Ru,
    En,
}

/// Timing and fitting of the exercise engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Quiet period before a resize burst is applied
    pub resize_debounce_ms: u64,
    /// How long to wait for the backdrop image
    pub image_timeout_secs: u64,
    /// Fit mode for plain window resizes
    pub resize_mode: FitMode,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            resize_debounce_ms: 120,
            image_timeout_secs: 15,
            resize_mode: FitMode::NoUpscaleCentered,
        }
    }
}

impl EngineSettings {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            resize_debounce: Duration::from_millis(self.resize_debounce_ms),
            image_timeout: Duration::from_secs(self.image_timeout_secs.max(1)),
            resize_mode: self.resize_mode,
        }
    }
}

/// UI settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// Font size in points
    pub font_size: f32,
    pub language: Language,
    /// Outline overlay regions on top of the drawing
    pub debug_outlines: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            font_size: 14.0,
            language: Language::default(),
            debug_outlines: false,
        }
    }
}

/// All application settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub ui: UiSettings,
    /// Exercise file opened last
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_exercise: Option<PathBuf>,
}

impl AppSettings {
    fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "blockmatch", "blockmatch")
            .map(|dirs| dirs.config_dir().join("settings.json"))
    }

    /// Load settings from file, or return default if not found
    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Load from an explicit path; missing or corrupt files give defaults
    pub fn load_from(path: &Path) -> Self {
        let Ok(json) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&json).unwrap_or_else(|e| {
            tracing::warn!("Ignoring corrupt settings {}: {e}", path.display());
            Self::default()
        })
    }

    /// Save settings to file
    pub fn save(&self) {
        if let Some(path) = Self::config_path() {
            if let Err(e) = self.save_to(&path) {
                tracing::warn!("Failed to save settings: {e}");
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}
