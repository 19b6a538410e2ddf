//! Isometric block geometry
//!
//! Turns the field into a back-to-front triangle list in surface pixels.

use glam::Vec2;

use super::vertex::Vertex;
use crate::consts::*;
use crate::sim::{Block, FieldState};
use crate::theme::Theme;

/// Brightness of the right and left side faces relative to the top
const RIGHT_SHADE: f32 = 0.8;
const LEFT_SHADE: f32 = 0.6;

/// One frame's worth of geometry
#[derive(Debug, Clone, PartialEq)]
pub struct DrawList {
    /// Surface size in pixels
    pub size: Vec2,
    /// Clear color
    pub background: [f32; 4],
    /// Triangle list, already in painter's order
    pub vertices: Vec<Vertex>,
}

impl DrawList {
    pub fn new(size: Vec2, background: [f32; 4]) -> Self {
        Self {
            size,
            background,
            vertices: Vec::new(),
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Push a convex polygon as a triangle fan
    pub fn polygon(&mut self, points: &[Vec2], color: [f32; 4]) {
        if points.len() < 3 {
            return;
        }
        let first = points[0];
        for pair in points[1..].windows(2) {
            self.vertices.push(Vertex::new(first.x, first.y, color));
            self.vertices.push(Vertex::new(pair[0].x, pair[0].y, color));
            self.vertices.push(Vertex::new(pair[1].x, pair[1].y, color));
        }
    }
}

/// True when an anchor lies within the surface grown by `padding` on each side
pub fn is_visible(anchor: Vec2, surface: Vec2, padding: f32) -> bool {
    anchor.x >= -padding
        && anchor.x <= surface.x + padding
        && anchor.y >= -padding
        && anchor.y <= surface.y + padding
}

/// Faces of a single block, top first then the two sides
pub fn block_faces(
    list: &mut DrawList,
    block: &Block,
    cell_size: f32,
    sim_time: f32,
    theme: Theme,
) {
    let height = block.display_height();
    let anchor = block.screen_anchor(cell_size, list.size, height);
    if !is_visible(anchor, list.size, cell_size * 2.0) {
        return;
    }

    let half_w = cell_size / 2.0;
    let half_h = cell_size / 4.0;
    let top_left = anchor + Vec2::new(-half_w, -half_h);
    let top_right = anchor + Vec2::new(half_w, -half_h);
    let bottom_right = anchor + Vec2::new(half_w, half_h);
    let bottom_left = anchor + Vec2::new(-half_w, half_h);

    // Colors drift slowly with time
    let hue = block.hue + block.color_offset + sim_time * 2.0;
    let base = theme.block_color(hue, height);

    list.polygon(
        &[top_left, top_right, bottom_right, bottom_left],
        base.to_rgba(),
    );

    if height > SIDE_FACE_MIN_HEIGHT {
        let drop = Vec2::new(0.0, height);
        let bottom_mid = anchor + Vec2::new(0.0, half_h);
        list.polygon(
            &[bottom_mid, bottom_right, bottom_right + drop, bottom_mid + drop],
            base.shaded(RIGHT_SHADE).to_rgba(),
        );
        list.polygon(
            &[bottom_left, bottom_mid, bottom_mid + drop, bottom_left + drop],
            base.shaded(LEFT_SHADE).to_rgba(),
        );
    }
}

/// Build the draw list for the current state (blocks are already depth sorted)
pub fn draw(state: &FieldState, theme: Theme) -> DrawList {
    let mut list = DrawList::new(state.surface(), theme.background());
    list.vertices.reserve(state.blocks.len() * 18);
    let sim_time = state.sim_time();
    for block in &state.blocks {
        block_faces(&mut list, block, state.cell_size, sim_time, theme);
    }
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    fn flat_block(x: f32, y: f32, height: f32) -> Block {
        Block {
            x,
            y,
            height,
            breath: 0.0,
            target_height: height,
            base_height: height,
            hue: 120.0,
            color_offset: 0.0,
            phase: 0.0,
        }
    }

    #[test]
    fn test_polygon_fan() {
        let mut list = DrawList::new(Vec2::new(10.0, 10.0), [0.0; 4]);
        list.polygon(&[Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y], [1.0; 4]);
        assert_eq!(list.triangle_count(), 2);
        list.polygon(&[Vec2::ZERO, Vec2::X], [1.0; 4]);
        assert_eq!(list.triangle_count(), 2);
    }

    #[test]
    fn test_flat_block_has_only_top() {
        let mut list = DrawList::new(Vec2::new(600.0, FIELD_HEIGHT), [0.0; 4]);
        block_faces(&mut list, &flat_block(0.0, 0.0, 2.0), 30.0, 0.0, Theme::Light);
        assert_eq!(list.triangle_count(), 2);
    }

    #[test]
    fn test_tall_block_has_sides() {
        let mut list = DrawList::new(Vec2::new(600.0, FIELD_HEIGHT), [0.0; 4]);
        block_faces(&mut list, &flat_block(0.0, 0.0, 20.0), 30.0, 0.0, Theme::Dark);
        assert_eq!(list.triangle_count(), 6);
        // Side faces are darker and opaque
        let top = list.vertices[0].color;
        let right = list.vertices[6].color;
        let left = list.vertices[12].color;
        let luma = |c: [f32; 4]| c[0] + c[1] + c[2];
        assert!(luma(right) < luma(top));
        assert!(luma(left) < luma(right));
        assert_eq!(right[3], 1.0);
    }

    #[test]
    fn test_offscreen_block_culled() {
        let mut list = DrawList::new(Vec2::new(600.0, FIELD_HEIGHT), [0.0; 4]);
        // (x - y) * cell = 40 * 30 px to the right of center: far outside
        block_faces(&mut list, &flat_block(40.0, 0.0, 10.0), 30.0, 0.0, Theme::Light);
        assert_eq!(list.triangle_count(), 0);
    }

    #[test]
    fn test_visibility_margin() {
        let surface = Vec2::new(100.0, 100.0);
        assert!(is_visible(Vec2::new(-10.0, 50.0), surface, 20.0));
        assert!(!is_visible(Vec2::new(-30.0, 50.0), surface, 20.0));
        assert!(!is_visible(Vec2::new(50.0, 121.0), surface, 20.0));
    }

    #[test]
    fn test_draw_uses_theme_background() {
        let state = FieldState::new(Some(600.0), &Settings::default(), 8);
        let light = draw(&state, Theme::Light);
        let dark = draw(&state, Theme::Dark);
        assert_eq!(light.background, Theme::Light.background());
        assert_eq!(dark.background, Theme::Dark.background());
        assert_eq!(light.size, Vec2::new(600.0, FIELD_HEIGHT));
        // Fresh blocks are flat: one top face each, all on screen
        assert_eq!(light.triangle_count(), state.blocks.len() * 2);
    }
}
