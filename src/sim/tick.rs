//! Frame step
//!
//! Advances a field by one display frame.

use glam::Vec2;

use super::block::UpdateContext;
use super::state::{FieldState, sort_back_to_front};
use crate::consts::*;

/// Input for a single frame
#[derive(Debug, Clone, Default)]
pub struct StepInput {
    /// Click received since the previous frame (surface pixels)
    pub click: Option<Vec2>,
}

/// Refresh rate the field asks its host for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickRate {
    /// Everything settled
    #[default]
    Low,
    /// Something is still moving
    High,
}

impl TickRate {
    /// Default frames per second for this rate
    pub fn fps(&self) -> u32 {
        match self {
            TickRate::Low => IDLE_FPS,
            TickRate::High => ACTIVE_FPS,
        }
    }
}

/// Advance the field by one frame of `dt_ms` milliseconds
///
/// Order: clock, click (wave + reshuffle), block updates, depth sort, idle check.
/// Clicks outside the surface are dropped.
pub fn step(state: &mut FieldState, input: &StepInput, dt_ms: f64) -> TickRate {
    if dt_ms.is_finite() && dt_ms > 0.0 {
        state.clock_ms += dt_ms;
    }

    if let Some(pos) = input.click {
        if state.contains(pos) {
            state.apply_click(pos);
            log::debug!("Wave started at ({:.0}, {:.0})", pos.x, pos.y);
        }
    }

    // Drop the wave once it can no longer affect anything
    if state.wave.is_some_and(|w| !w.is_live(state.clock_ms)) {
        state.wave = None;
    }

    let ctx = UpdateContext {
        sim_time: state.sim_time(),
        clock_ms: state.clock_ms,
        wave: state.wave,
        cell_size: state.cell_size,
        surface: state.surface(),
    };
    for block in &mut state.blocks {
        block.update(&ctx);
    }

    sort_back_to_front(&mut state.blocks);

    if state.is_animating() {
        TickRate::High
    } else {
        TickRate::Low
    }
}
