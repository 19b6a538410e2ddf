//! Block Field - an interactive isometric block widget
//!
//! Core modules:
//! - `sim`: Pure simulation (layout, block easing, click waves)
//! - `renderer`: Draw lists, software raster and WebGPU presentation
//! - `field`: Mount/resize/click/teardown lifecycle around the simulation
//! - `scheduler`: Frame throttling over display-refresh callbacks
//! - `platform`: Browser embedding (wasm only)

pub mod field;
pub mod platform;
pub mod renderer;
pub mod scheduler;
pub mod settings;
pub mod sim;
pub mod theme;

pub use field::{BlockField, Frame, Tooltip};
pub use scheduler::{FrameScheduler, FrameStats};
pub use sim::TickRate;
pub use settings::{Settings, ThemePreference};
pub use theme::Theme;

/// Engine configuration constants
pub mod consts {
    /// Grid dimensions
    pub const COLUMNS: u32 = 16;
    pub const ROWS: u32 = 6;

    /// Surface height is owned by the engine; the host only supplies width
    pub const FIELD_HEIGHT: f32 = 300.0;
    /// Width used when the host container reports nothing usable
    pub const DEFAULT_WIDTH: f32 = 600.0;

    /// Cell size never grows past this, shrinks to fit narrow hosts
    pub const MAX_CELL_SIZE: f32 = 36.0;
    pub const MIN_CELL_SIZE: f32 = 2.0;
    /// Horizontal spread factor used when fitting cells to the host width
    pub const CELL_SPREAD: f32 = 1.2;
    pub const CELL_MARGIN: f32 = 2.0;

    /// Soft ceiling for block heights
    pub const MAX_HEIGHT: f32 = 80.0;
    /// Fraction of MAX_HEIGHT above which easing slows down
    pub const NEAR_CEILING: f32 = 0.8;
    pub const EASE_FAST: f32 = 0.1;
    pub const EASE_SLOW: f32 = 0.05;
    /// Share of an overshoot kept each frame above the ceiling
    pub const OVERSHOOT_KEEP: f32 = 0.2;

    /// Breathing oscillation
    pub const BREATH_AMPLITUDE: f32 = 1.5;
    pub const BREATH_SPEED: f32 = 0.8;
    pub const BREATH_MIN_FACTOR: f32 = 0.2;

    /// Wave episode timing (ms) and shape (px)
    pub const WAVE_DURATION_MS: f64 = 1500.0;
    /// Wave front speed: radius grows by 1px every WAVE_MS_PER_PX ms
    pub const WAVE_MS_PER_PX: f32 = 4.0;
    pub const WAVE_WIDTH: f32 = 100.0;
    pub const WAVE_AMPLITUDE: f32 = 35.0;
    /// Share of the remaining headroom a wave bump may use
    pub const WAVE_HEADROOM: f32 = 0.8;

    /// Convergence threshold for the idle check
    pub const SETTLE_EPSILON: f32 = 0.5;

    /// Projection
    pub const VERTICAL_OFFSET: f32 = 0.6;
    pub const TOP_PADDING: f32 = 30.0;
    /// Side faces are only drawn above this height
    pub const SIDE_FACE_MIN_HEIGHT: f32 = 3.0;

    /// Layout secondary fill pass
    pub const EDGE_FILL_SAMPLES: u32 = 10;
    pub const EDGE_FILL_OUTER: f32 = 1.2;

    /// Requested tick rates (frames per second)
    pub const IDLE_FPS: u32 = 30;
    pub const ACTIVE_FPS: u32 = 60;
}

/// Linear re-map of `value` from `[in_min, in_max]` onto `[out_min, out_max]` (unclamped)
#[inline]
pub fn map_range(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    if in_max == in_min {
        return out_min;
    }
    out_min + (value - in_min) / (in_max - in_min) * (out_max - out_min)
}

/// Linear interpolation from `a` toward `b` by `t`
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
