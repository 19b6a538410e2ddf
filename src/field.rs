//! Mounted block field
//!
//! Owns one simulation plus its frame pacing and hover overlay. Hosts feed it
//! pointer events, resizes and display-refresh timestamps; it hands back draw
//! lists. After `destroy` every entry point is inert.

use glam::Vec2;

use crate::renderer::{DrawList, draw};
use crate::scheduler::{FrameScheduler, FrameStats};
use crate::settings::Settings;
use crate::sim::{FieldState, StepInput, TickRate, step};
use crate::theme::Theme;

/// Text of the hover hint
pub const TOOLTIP_TITLE: &str = "Interactive blocks";
pub const TOOLTIP_BODY: &str = "click to respond";
/// Offset of the hint from the pointer
pub const TOOLTIP_OFFSET: f32 = 10.0;

/// Hover hint placement in surface pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tooltip {
    pub position: Vec2,
}

impl Tooltip {
    pub fn title(&self) -> &'static str {
        TOOLTIP_TITLE
    }

    pub fn body(&self) -> &'static str {
        TOOLTIP_BODY
    }

    /// Overlay markup: bold title, then the body
    pub fn markup(&self) -> String {
        format!("<b>{}</b> - {}", self.title(), self.body())
    }
}

/// A simulated frame ready to present
#[derive(Debug, Clone)]
pub struct Frame {
    pub draw_list: DrawList,
    /// Rate requested for the following frames
    pub rate: TickRate,
}

/// Everything that exists only while mounted
#[derive(Debug)]
struct Mounted {
    state: FieldState,
    scheduler: FrameScheduler,
    pending_click: Option<Vec2>,
    hover: Option<Vec2>,
}

/// An embeddable block field instance
#[derive(Debug)]
pub struct BlockField {
    settings: Settings,
    mounted: Option<Mounted>,
}

impl BlockField {
    /// Mount with the host's current width (zero or missing widths fall back)
    pub fn mount(width: Option<f32>, settings: Settings, seed: u64) -> Self {
        let settings = settings.sanitized();
        let mut state = FieldState::new(width, &settings, seed);
        if settings.intro_wave {
            let anchor = state.anchor();
            state.start_wave(anchor);
        }
        log::info!(
            "Block field mounted: {}x{} px, {} blocks (seed {})",
            state.width,
            state.height,
            state.blocks.len(),
            seed
        );
        let scheduler = FrameScheduler::new(&settings);
        Self {
            settings,
            mounted: Some(Mounted {
                state,
                scheduler,
                pending_click: None,
                hover: None,
            }),
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    /// Read-only view of the simulation (None once destroyed)
    pub fn state(&self) -> Option<&FieldState> {
        self.mounted.as_ref().map(|m| &m.state)
    }

    pub fn stats(&self) -> Option<&FrameStats> {
        self.mounted.as_ref().map(|m| m.scheduler.stats())
    }

    /// Surface size in pixels
    pub fn size(&self) -> Option<Vec2> {
        self.state().map(FieldState::surface)
    }

    /// Resolve the host colour-scheme signal against the theme setting
    pub fn theme(&self, prefers_dark: Option<bool>) -> Theme {
        self.settings.theme.resolve(prefers_dark)
    }

    /// Queue a click for the next frame. Returns false when it is ignored.
    pub fn click(&mut self, x: f32, y: f32) -> bool {
        let Some(mounted) = self.mounted.as_mut() else {
            return false;
        };
        let pos = Vec2::new(x, y);
        if !mounted.state.contains(pos) {
            return false;
        }
        // A newer click replaces one not yet consumed
        mounted.pending_click = Some(pos);
        mounted.scheduler.wake();
        true
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        if let Some(mounted) = self.mounted.as_mut() {
            mounted.hover = Some(Vec2::new(x, y));
        }
    }

    pub fn pointer_leave(&mut self) {
        if let Some(mounted) = self.mounted.as_mut() {
            mounted.hover = None;
        }
    }

    /// Hover hint to overlay, if the pointer is over the field
    pub fn tooltip(&self) -> Option<Tooltip> {
        if !self.settings.show_tooltip {
            return None;
        }
        let hover = self.mounted.as_ref()?.hover?;
        Some(Tooltip {
            position: hover + Vec2::splat(TOOLTIP_OFFSET),
        })
    }

    /// Rebuild the grid if the effective width changed. Returns true on rebuild.
    pub fn resize(&mut self, width: Option<f32>) -> bool {
        let Some(mounted) = self.mounted.as_mut() else {
            return false;
        };
        let new_width = mounted.state.effective_width(width);
        if new_width == mounted.state.width {
            return false;
        }
        mounted.state.layout(width);
        mounted.scheduler.wake();
        log::info!(
            "Block field resized to {} px, {} blocks",
            mounted.state.width,
            mounted.state.blocks.len()
        );
        true
    }

    /// Display refresh callback; returns a frame when one was due
    pub fn frame(&mut self, now_ms: f64, theme: Theme) -> Option<Frame> {
        let mounted = self.mounted.as_mut()?;
        let dt = mounted.scheduler.poll(now_ms)?;
        let input = StepInput {
            click: mounted.pending_click.take(),
        };
        let rate = step(&mut mounted.state, &input, dt);
        mounted.scheduler.set_rate(rate);
        Some(Frame {
            draw_list: draw(&mounted.state, theme),
            rate,
        })
    }

    /// Simulate one frame of `dt_ms` without pacing (headless drivers, tests)
    pub fn advance(&mut self, dt_ms: f64) -> Option<TickRate> {
        let mounted = self.mounted.as_mut()?;
        let input = StepInput {
            click: mounted.pending_click.take(),
        };
        let rate = step(&mut mounted.state, &input, dt_ms);
        mounted.scheduler.set_rate(rate);
        Some(rate)
    }

    /// Draw the current state without stepping
    pub fn draw(&self, theme: Theme) -> Option<DrawList> {
        self.state().map(|state| draw(state, theme))
    }

    /// Tear down; all later calls are no-ops
    pub fn destroy(&mut self) {
        if self.mounted.take().is_some() {
            log::info!("Block field destroyed");
        }
    }
}
