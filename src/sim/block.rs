//! Block entity and its per-frame update

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::noise::Noise;
use super::wave::{Wave, cap_to_headroom};
use crate::consts::*;
use crate::{lerp, map_range};

/// Everything a block needs to advance one frame
#[derive(Debug, Clone, Copy)]
pub struct UpdateContext {
    /// Seconds since mount
    pub sim_time: f32,
    /// Milliseconds since mount
    pub clock_ms: f64,
    pub wave: Option<Wave>,
    pub cell_size: f32,
    /// Surface size in pixels
    pub surface: Vec2,
}

/// One animated cell of the isometric grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// Logical grid position, centered on the origin
    pub x: f32,
    pub y: f32,
    /// Settled height: eased toward the target, plus wave bumps
    pub height: f32,
    /// Breathing offset layered on top of `height`
    #[serde(default)]
    pub breath: f32,
    pub target_height: f32,
    pub base_height: f32,
    /// Degrees
    pub hue: f32,
    pub color_offset: f32,
    /// Breathing phase (radians)
    pub phase: f32,
}

impl Block {
    /// Create a block at rest with noise-derived height and hue
    pub fn new(x: f32, y: f32, noise: &Noise, rng: &mut Pcg32) -> Self {
        let base_height = map_range(noise.sample2(x * 0.3, y * 0.3), 0.0, 1.0, 5.0, 25.0);
        Self {
            x,
            y,
            height: 0.0,
            breath: 0.0,
            target_height: base_height,
            base_height,
            hue: map_range(noise.sample3(x * 0.1, y * 0.1, 100.0), 0.0, 1.0, 0.0, 360.0),
            color_offset: rng.random_range(0.0..20.0),
            phase: rng.random_range(0.0..std::f32::consts::TAU),
        }
    }

    /// Isometric depth key; smaller is farther back
    #[inline]
    pub fn depth(&self) -> f32 {
        self.x + self.y
    }

    /// Height as drawn: settled height plus breathing, soft-ceiled and floored
    pub fn display_height(&self) -> f32 {
        soft_ceiling(self.height + self.breath).max(0.0)
    }

    /// Screen-space anchor (center of the top face) for a given drawn height
    pub fn screen_anchor(&self, cell_size: f32, surface: Vec2, height: f32) -> Vec2 {
        Vec2::new(
            surface.x / 2.0 + (self.x - self.y) * cell_size,
            (surface.y * VERTICAL_OFFSET + (self.x + self.y) * cell_size / 4.0 - height)
                .max(TOP_PADDING),
        )
    }

    /// True while the settled height is still moving toward the target
    pub fn is_settling(&self) -> bool {
        (self.height - self.target_height).abs() > SETTLE_EPSILON
    }

    /// Advance one frame
    pub fn update(&mut self, ctx: &UpdateContext) {
        // Ease toward target, gentler near the ceiling
        let near_ceiling = MAX_HEIGHT * NEAR_CEILING;
        let rate = if self.target_height > near_ceiling || self.height > near_ceiling {
            EASE_SLOW
        } else {
            EASE_FAST
        };
        self.height = lerp(self.height, self.target_height, rate);

        // Wave bump, measured from the freshly eased height (no breathing)
        if let Some(wave) = ctx.wave {
            let eased = soft_ceiling(self.height).max(0.0);
            let anchor = self.screen_anchor(ctx.cell_size, ctx.surface, eased);
            let bump = wave.bump(ctx.clock_ms, anchor.distance(wave.origin));
            if bump > 0.0 {
                self.height += cap_to_headroom(bump, self.height);
            }
        }

        self.breath = breathing(ctx.sim_time, self.phase, self.height);

        self.height = soft_ceiling(self.height).max(0.0);
    }

    /// Pick a new target from the noise field (click reshuffle)
    pub fn randomize(&mut self, noise: &Noise, sim_time: f32, rng: &mut Pcg32) {
        self.base_height = map_range(
            noise.sample2(self.x * 0.5 + sim_time, self.y * 0.5 + sim_time),
            0.0,
            1.0,
            8.0,
            40.0,
        );
        self.target_height = self.base_height;
        self.color_offset = rng.random_range(0.0..30.0);
    }
}

/// Breathing offset; full amplitude at height 0, a fifth of it at the ceiling
pub fn breathing(sim_time: f32, phase: f32, height: f32) -> f32 {
    let factor = map_range(height, 0.0, MAX_HEIGHT, 1.0, BREATH_MIN_FACTOR)
        .clamp(BREATH_MIN_FACTOR, 1.0);
    (sim_time * BREATH_SPEED + phase).sin() * BREATH_AMPLITUDE * factor
}

/// Damp anything above MAX_HEIGHT to a fifth of the excess
#[inline]
pub fn soft_ceiling(height: f32) -> f32 {
    if height > MAX_HEIGHT {
        MAX_HEIGHT + (height - MAX_HEIGHT) * OVERSHOOT_KEEP
    } else {
        height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::wave::annulus_bump;
    use proptest::prelude::*;
    use rand::SeedableRng;

    fn block_at(x: f32, y: f32, height: f32, target: f32) -> Block {
        Block {
            x,
            y,
            height,
            breath: 0.0,
            target_height: target,
            base_height: target,
            hue: 0.0,
            color_offset: 0.0,
            phase: 0.0,
        }
    }

    fn quiet_ctx() -> UpdateContext {
        UpdateContext {
            sim_time: 0.0,
            clock_ms: 0.0,
            wave: None,
            cell_size: 30.0,
            surface: Vec2::new(600.0, FIELD_HEIGHT),
        }
    }

    #[test]
    fn test_new_block_ranges() {
        let noise = Noise::new(42);
        let mut rng = Pcg32::seed_from_u64(42);
        for i in -8..8 {
            let b = Block::new(i as f32, (i % 3) as f32, &noise, &mut rng);
            assert!((5.0..=25.0).contains(&b.base_height));
            assert!((0.0..=360.0).contains(&b.hue));
            assert!((0.0..20.0).contains(&b.color_offset));
            assert!((0.0..std::f32::consts::TAU).contains(&b.phase));
            assert_eq!(b.height, 0.0);
            assert_eq!(b.target_height, b.base_height);
        }
    }

    #[test]
    fn test_same_coords_same_color() {
        let noise = Noise::new(9);
        let mut rng = Pcg32::seed_from_u64(1);
        let a = Block::new(2.0, -1.0, &noise, &mut rng);
        let b = Block::new(2.0, -1.0, &noise, &mut rng);
        assert_eq!(a.hue, b.hue);
        assert_eq!(a.base_height, b.base_height);
    }

    #[test]
    fn test_easing_rates() {
        let ctx = quiet_ctx();
        let mut low = block_at(0.0, 0.0, 0.0, 20.0);
        low.update(&ctx);
        assert!((low.height - 2.0).abs() < 1e-4);

        // Target near the ceiling uses the slow rate
        let mut high = block_at(0.0, 0.0, 0.0, 70.0);
        high.update(&ctx);
        assert!((high.height - 3.5).abs() < 1e-4);
    }

    #[test]
    fn test_converges_without_wave() {
        let mut block = block_at(0.0, 0.0, 0.0, 25.0);
        let mut ctx = quiet_ctx();
        for frame in 0..100 {
            ctx.sim_time = frame as f32 / 60.0;
            block.update(&ctx);
        }
        assert!(!block.is_settling());
    }

    #[test]
    fn test_wave_pushes_block_up() {
        let mut block = block_at(0.0, 0.0, 10.0, 10.0);
        let mut ctx = quiet_ctx();
        let anchor = block.screen_anchor(ctx.cell_size, ctx.surface, block.display_height());
        // Origin 50px away, observed 300ms after the click: band is (-25, 75)
        ctx.wave = Some(Wave::new(0.0, anchor + Vec2::new(50.0, 0.0)));
        ctx.clock_ms = 300.0;
        block.update(&ctx);
        assert!(block.height > 10.5);
        assert!(block.height < MAX_HEIGHT);
    }

    #[test]
    fn test_wave_distance_ignores_breathing() {
        let mut block = block_at(0.0, 0.0, 10.0, 10.0);
        // Breathing left over from the previous frame
        block.breath = 5.0;
        let mut ctx = quiet_ctx();
        let anchor = block.screen_anchor(ctx.cell_size, ctx.surface, 10.0);
        ctx.wave = Some(Wave::new(0.0, anchor + Vec2::new(50.0, 0.0)));
        ctx.clock_ms = 300.0;
        block.update(&ctx);
        let expected = 10.0 + annulus_bump(300.0, 50.0);
        assert!((block.height - expected).abs() < 1e-4);
    }

    #[test]
    fn test_expired_wave_does_nothing() {
        let mut waved = block_at(0.0, 0.0, 10.0, 10.0);
        let mut still = waved.clone();
        let mut ctx = quiet_ctx();
        let anchor = waved.screen_anchor(ctx.cell_size, ctx.surface, 10.0);
        ctx.clock_ms = WAVE_DURATION_MS + 1.0;
        ctx.wave = Some(Wave::new(0.0, anchor));
        waved.update(&ctx);
        ctx.wave = None;
        still.update(&ctx);
        assert_eq!(waved.height, still.height);
    }

    #[test]
    fn test_breathing_damped_near_ceiling() {
        let t = std::f32::consts::FRAC_PI_2 / BREATH_SPEED;
        assert!((breathing(t, 0.0, 0.0) - BREATH_AMPLITUDE).abs() < 1e-4);
        assert!((breathing(t, 0.0, MAX_HEIGHT) - BREATH_AMPLITUDE * 0.2).abs() < 1e-4);
        assert!(breathing(t, 0.0, MAX_HEIGHT * 3.0).abs() <= BREATH_AMPLITUDE * 0.2 + 1e-4);
    }

    #[test]
    fn test_randomize_range() {
        let noise = Noise::new(3);
        let mut rng = Pcg32::seed_from_u64(3);
        let mut block = block_at(1.0, 2.0, 0.0, 0.0);
        block.randomize(&noise, 12.5, &mut rng);
        assert!((8.0..=40.0).contains(&block.target_height));
        assert_eq!(block.base_height, block.target_height);
        assert!((0.0..30.0).contains(&block.color_offset));
    }

    proptest! {
        #[test]
        fn prop_height_never_negative(
            height in 0.0f32..200.0,
            target in 0.0f32..60.0,
            phase in 0.0f32..6.3,
            frames in 1usize..200,
        ) {
            let mut block = block_at(0.5, -0.5, height, target);
            block.phase = phase;
            let mut ctx = quiet_ctx();
            for frame in 0..frames {
                ctx.sim_time = frame as f32 / 60.0;
                block.update(&ctx);
                prop_assert!(block.height >= 0.0);
                prop_assert!(block.display_height() >= 0.0);
            }
        }

        #[test]
        fn prop_overshoot_strictly_shrinks(
            excess in 0.01f32..500.0,
            target in 0.0f32..=MAX_HEIGHT,
        ) {
            let mut block = block_at(0.0, 0.0, MAX_HEIGHT + excess, target);
            let mut previous = excess;
            let ctx = quiet_ctx();
            for _ in 0..50 {
                block.update(&ctx);
                let now = block.height - MAX_HEIGHT;
                if now <= 0.0 {
                    break;
                }
                prop_assert!(now < previous);
                previous = now;
            }
        }
    }
}
