//! Field state: the block arena plus clock, wave and randomness
//!
//! Everything a frame reads or writes lives here and is passed explicitly
//! into the update, so a state can be stepped without a display.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::block::Block;
use super::layout::{GridSpec, build_blocks, effective_width};
use super::noise::Noise;
use super::wave::Wave;
use crate::consts::*;
use crate::settings::Settings;

/// Complete simulation state for one mounted field
#[derive(Debug, Clone)]
pub struct FieldState {
    pub grid: GridSpec,
    /// Surface size in pixels
    pub width: f32,
    pub height: f32,
    pub cell_size: f32,
    /// Block arena, kept sorted back-to-front after every step
    pub blocks: Vec<Block>,
    /// Milliseconds since mount
    pub clock_ms: f64,
    /// Most recent click, if any
    pub wave: Option<Wave>,
    pub noise: Noise,
    rng: Pcg32,
    default_width: f32,
}

impl FieldState {
    /// Lay out a fresh field for the given host width
    pub fn new(width: Option<f32>, settings: &Settings, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let noise = Noise::new(rng.random());
        let grid = GridSpec {
            columns: settings.columns,
            rows: settings.rows,
            max_cell_size: settings.max_cell_size,
        };
        let mut state = Self {
            grid,
            width: 0.0,
            height: settings.field_height,
            cell_size: 0.0,
            blocks: Vec::new(),
            clock_ms: 0.0,
            wave: None,
            noise,
            rng,
            default_width: settings.default_width,
        };
        state.layout(width);
        state
    }

    /// Seconds since mount
    #[inline]
    pub fn sim_time(&self) -> f32 {
        (self.clock_ms * 0.001) as f32
    }

    pub fn surface(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Where the field is anchored on screen (the intro wave starts here)
    pub fn anchor(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height * VERTICAL_OFFSET)
    }

    /// Effective width this host width would lay out at
    pub fn effective_width(&self, width: Option<f32>) -> f32 {
        effective_width(width, self.default_width)
    }

    /// Rebuild the whole block set for a new width. The live wave is kept.
    ///
    /// Only the random edge fill changes between rebuilds.
    pub fn layout(&mut self, width: Option<f32>) {
        self.width = self.effective_width(width);
        self.cell_size = self.grid.cell_size(self.width);
        // Same noise as before: a cell keeps its colour and base height across rebuilds
        self.blocks = build_blocks(&self.grid, &self.noise, &mut self.rng);
        sort_back_to_front(&mut self.blocks);
        log::debug!(
            "Laid out {} blocks at width {} (cell {:.2})",
            self.blocks.len(),
            self.width,
            self.cell_size
        );
    }

    /// True when a click at `pos` lands strictly inside the surface
    pub fn contains(&self, pos: Vec2) -> bool {
        pos.x > 0.0 && pos.x < self.width && pos.y > 0.0 && pos.y < self.height
    }

    /// Start a wave at `origin` and reshuffle every block's target
    pub fn apply_click(&mut self, origin: Vec2) {
        self.wave = Some(Wave::new(self.clock_ms, origin));
        self.noise = Noise::new(self.rng.random());
        let sim_time = self.sim_time();
        for block in &mut self.blocks {
            block.randomize(&self.noise, sim_time, &mut self.rng);
        }
    }

    /// Start a wave without reshuffling (mount intro)
    pub fn start_wave(&mut self, origin: Vec2) {
        self.wave = Some(Wave::new(self.clock_ms, origin));
    }

    /// True while any block is still easing toward its target
    pub fn is_animating(&self) -> bool {
        self.blocks.iter().any(Block::is_settling)
    }
}

/// Stable sort by depth so nearer blocks are drawn over farther ones
pub fn sort_back_to_front(blocks: &mut [Block]) {
    blocks.sort_by(|a, b| a.depth().total_cmp(&b.depth()));
}
