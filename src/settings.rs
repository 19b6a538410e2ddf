//! Widget settings
//!
//! Persisted in LocalStorage so a host page can tweak the field without a rebuild.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::theme::Theme;

/// Which palette the field draws with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ThemePreference {
    /// Follow the host's `prefers-color-scheme`
    #[default]
    System,
    Light,
    Dark,
}

impl ThemePreference {
    /// Resolve against the host signal; `None` means the host could not tell
    pub fn resolve(&self, prefers_dark: Option<bool>) -> Theme {
        match self {
            ThemePreference::Light => Theme::Light,
            ThemePreference::Dark => Theme::Dark,
            ThemePreference::System => Theme::from_prefers_dark(prefers_dark),
        }
    }
}

/// Field settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Layout ===
    /// Grid columns
    pub columns: u32,
    /// Grid rows
    pub rows: u32,
    /// Surface height in pixels (the host only supplies width)
    pub field_height: f32,
    /// Largest cell size in pixels
    pub max_cell_size: f32,
    /// Width assumed when the container reports zero
    pub default_width: f32,

    // === Look ===
    pub theme: ThemePreference,
    /// Play a wave from the field anchor right after mounting
    pub intro_wave: bool,
    /// Show the hover hint overlay
    pub show_tooltip: bool,

    // === Frame pacing ===
    /// Frames per second once every block has settled
    pub idle_fps: u32,
    /// Frames per second while anything is still moving
    pub active_fps: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            columns: COLUMNS,
            rows: ROWS,
            field_height: FIELD_HEIGHT,
            max_cell_size: MAX_CELL_SIZE,
            default_width: DEFAULT_WIDTH,

            theme: ThemePreference::System,
            intro_wave: false,
            show_tooltip: true,

            idle_fps: IDLE_FPS,
            active_fps: ACTIVE_FPS,
        }
    }
}

impl Settings {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "block_field_settings";

    /// Parse settings from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Option<Self> {
        match serde_json::from_str::<Settings>(json) {
            Ok(settings) => Some(settings.sanitized()),
            Err(e) => {
                log::warn!("Ignoring malformed settings: {}", e);
                None
            }
        }
    }

    /// Replace values the engine cannot work with by their defaults
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.columns == 0 {
            self.columns = defaults.columns;
        }
        if self.rows == 0 {
            self.rows = defaults.rows;
        }
        if !(self.field_height.is_finite() && self.field_height > 0.0) {
            self.field_height = defaults.field_height;
        }
        if !(self.max_cell_size.is_finite() && self.max_cell_size >= MIN_CELL_SIZE) {
            self.max_cell_size = defaults.max_cell_size;
        }
        if !(self.default_width.is_finite() && self.default_width > 0.0) {
            self.default_width = defaults.default_width;
        }
        if self.active_fps == 0 {
            self.active_fps = defaults.active_fps;
        }
        if self.idle_fps == 0 || self.idle_fps > self.active_fps {
            self.idle_fps = self.active_fps.min(defaults.idle_fps);
        }
        self
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Some(settings) = Self::from_json(&json) {
                    log::info!("Loaded block field settings from LocalStorage");
                    return settings;
                }
            }
        }

        log::info!("Using default block field settings");
        Self::default()
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }
}
