//! Click wave episodes
//!
//! A wave is an annulus expanding from the click origin. Its outer radius grows
//! at `elapsed / 4` px and the band is `WAVE_WIDTH` px thick. Blocks inside the
//! band get pushed up, strongest at the inner edge.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// The single live wave (a new click replaces it)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wave {
    /// Clock time of the click (ms since mount)
    pub start_ms: f64,
    /// Click position in surface pixels
    pub origin: Vec2,
}

impl Wave {
    pub fn new(start_ms: f64, origin: Vec2) -> Self {
        Self { start_ms, origin }
    }

    /// Milliseconds since the click, `None` once the episode has expired
    pub fn elapsed(&self, now_ms: f64) -> Option<f32> {
        let elapsed = now_ms - self.start_ms;
        (elapsed >= 0.0 && elapsed < WAVE_DURATION_MS).then_some(elapsed as f32)
    }

    pub fn is_live(&self, now_ms: f64) -> bool {
        self.elapsed(now_ms).is_some()
    }

    /// Raw bump for a point `distance` px from the origin, before headroom capping
    pub fn bump(&self, now_ms: f64, distance: f32) -> f32 {
        match self.elapsed(now_ms) {
            Some(elapsed) => annulus_bump(elapsed, distance),
            None => 0.0,
        }
    }
}

/// Bump height inside the band `(elapsed/4 - WAVE_WIDTH, elapsed/4)`
pub fn annulus_bump(elapsed_ms: f32, distance: f32) -> f32 {
    let outer = elapsed_ms / WAVE_MS_PER_PX;
    let inner = outer - WAVE_WIDTH;
    if distance <= inner || distance >= outer {
        return 0.0;
    }
    // 0 at the inner edge, 1 at the outer edge
    let t = (distance - inner) / WAVE_WIDTH;
    let strength = 1.0 - t;
    WAVE_AMPLITUDE * strength * (t * std::f32::consts::PI).sin()
}

/// Limit a bump to a share of the headroom left under the ceiling
pub fn cap_to_headroom(bump: f32, height: f32) -> f32 {
    let headroom = MAX_HEIGHT - height;
    if headroom > 0.0 {
        bump.min(headroom * WAVE_HEADROOM)
    } else {
        0.0
    }
}
