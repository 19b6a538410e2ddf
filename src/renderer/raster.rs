//! Software rasteriser
//!
//! Fills a draw list into an RGBA8 buffer laid out like canvas `ImageData`.
//! Used headless and as the canvas fallback when no GPU adapter is available.

use glam::Vec2;

use super::shapes::DrawList;

/// RGBA8 pixel surface
#[derive(Debug, Clone)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Raster {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    /// Rasterise a full frame at the draw list's size
    pub fn render(list: &DrawList) -> Self {
        let width = list.size.x.max(0.0).round() as u32;
        let height = list.size.y.max(0.0).round() as u32;
        let mut raster = Self::new(width, height);
        raster.paint(list);
        raster
    }

    /// Repaint into this buffer, resizing it if the list size changed
    pub fn paint(&mut self, list: &DrawList) {
        let width = list.size.x.max(0.0).round() as u32;
        let height = list.size.y.max(0.0).round() as u32;
        if width != self.width || height != self.height {
            *self = Self::new(width, height);
        }
        self.clear(list.background);
        for tri in list.vertices.chunks_exact(3) {
            self.fill_triangle(
                Vec2::from(tri[0].position),
                Vec2::from(tri[1].position),
                Vec2::from(tri[2].position),
                tri[0].color,
            );
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw pixels, row-major RGBA
    pub fn as_rgba(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    pub fn clear(&mut self, color: [f32; 4]) {
        let rgba = to_u8(color);
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
    }

    /// Fill a triangle with source-over blending
    ///
    /// Samples pixel centers. Edges shared by two triangles are owned by exactly
    /// one of them (top-left rule) so translucent quads do not double-blend.
    pub fn fill_triangle(&mut self, a: Vec2, b: Vec2, mut c: Vec2, color: [f32; 4]) {
        let mut b = b;
        let area = edge(a, b, c);
        if area == 0.0 || !area.is_finite() {
            return;
        }
        if area < 0.0 {
            std::mem::swap(&mut b, &mut c);
        }

        let min = a.min(b).min(c);
        let max = a.max(b).max(c);
        let x0 = min.x.floor().max(0.0) as u32;
        let y0 = min.y.floor().max(0.0) as u32;
        let x1 = (max.x.ceil().max(0.0) as u32).min(self.width);
        let y1 = (max.y.ceil().max(0.0) as u32).min(self.height);

        let edges = [(b, c), (c, a), (a, b)];
        let owns = edges.map(|(from, to)| is_top_left(from, to));

        for y in y0..y1 {
            for x in x0..x1 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let inside = edges.iter().zip(owns).all(|(&(from, to), owned)| {
                    let w = edge(from, to, p);
                    w > 0.0 || (w == 0.0 && owned)
                });
                if inside {
                    self.blend(x, y, color);
                }
            }
        }
    }

    fn blend(&mut self, x: u32, y: u32, color: [f32; 4]) {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let alpha = color[3].clamp(0.0, 1.0);
        let px = &mut self.pixels[i..i + 4];
        for ch in 0..3 {
            let dst = px[ch] as f32 / 255.0;
            let out = color[ch].clamp(0.0, 1.0) * alpha + dst * (1.0 - alpha);
            px[ch] = (out * 255.0).round() as u8;
        }
        let dst_a = px[3] as f32 / 255.0;
        px[3] = ((alpha + dst_a * (1.0 - alpha)) * 255.0).round() as u8;
    }
}

/// Twice the signed area of (a, b, p); positive when p is inside a clockwise-on-screen edge
fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Top edges run rightward, left edges run upward (y grows downward)
fn is_top_left(from: Vec2, to: Vec2) -> bool {
    let d = to - from;
    (d.y == 0.0 && d.x > 0.0) || d.y < 0.0
}

fn to_u8(color: [f32; 4]) -> [u8; 4] {
    color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::shapes::draw;
    use crate::settings::Settings;
    use crate::sim::{FieldState, StepInput, step};
    use crate::theme::Theme;

    #[test]
    fn test_clear() {
        let mut raster = Raster::new(4, 3);
        raster.clear([1.0, 0.0, 0.0, 1.0]);
        assert_eq!(raster.pixel(3, 2), Some([255, 0, 0, 255]));
        assert_eq!(raster.pixel(4, 0), None);
        assert_eq!(raster.as_rgba().len(), 4 * 3 * 4);
    }

    #[test]
    fn test_opaque_quad_fills_exactly() {
        let mut list = DrawList::new(Vec2::new(10.0, 10.0), [0.0, 0.0, 0.0, 1.0]);
        let quad = [
            Vec2::new(2.0, 2.0),
            Vec2::new(6.0, 2.0),
            Vec2::new(6.0, 5.0),
            Vec2::new(2.0, 5.0),
        ];
        list.polygon(&quad, [1.0, 1.0, 1.0, 1.0]);
        let raster = Raster::render(&list);
        let mut filled = 0;
        for y in 0..10 {
            for x in 0..10 {
                if raster.pixel(x, y) == Some([255, 255, 255, 255]) {
                    filled += 1;
                }
            }
        }
        assert_eq!(filled, 4 * 3);
        assert_eq!(raster.pixel(1, 1), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_translucent_quad_blends_once() {
        let mut list = DrawList::new(Vec2::new(8.0, 8.0), [0.0, 0.0, 0.0, 1.0]);
        // Diagonal of the fan passes through pixel centers
        let quad = [
            Vec2::new(0.0, 0.0),
            Vec2::new(8.0, 0.0),
            Vec2::new(8.0, 8.0),
            Vec2::new(0.0, 8.0),
        ];
        list.polygon(&quad, [1.0, 1.0, 1.0, 0.5]);
        let raster = Raster::render(&list);
        let expected = raster.pixel(0, 7);
        for i in 0..8 {
            assert_eq!(raster.pixel(i, i), expected);
        }
        assert_eq!(expected, Some([128, 128, 128, 255]));
    }

    #[test]
    fn test_winding_independent() {
        let mut cw = Raster::new(6, 6);
        let mut ccw = Raster::new(6, 6);
        let (a, b, c) = (Vec2::new(0.0, 0.0), Vec2::new(6.0, 0.0), Vec2::new(0.0, 6.0));
        cw.fill_triangle(a, b, c, [1.0; 4]);
        ccw.fill_triangle(a, c, b, [1.0; 4]);
        assert_eq!(cw.as_rgba(), ccw.as_rgba());
    }

    #[test]
    fn test_field_frame() {
        let mut state = FieldState::new(Some(600.0), &Settings::default(), 21);
        for _ in 0..30 {
            step(&mut state, &StepInput::default(), 16.0);
        }
        let raster = Raster::render(&draw(&state, Theme::Dark));
        assert_eq!((raster.width(), raster.height()), (600, 300));
        // Corner is background, the middle of the field is covered by blocks
        assert_eq!(raster.pixel(0, 0), Some([0x12, 0x12, 0x12, 255]));
        let anchor = state.anchor();
        let center = raster
            .pixel(anchor.x as u32, anchor.y as u32 + 2)
            .unwrap();
        assert_ne!(center, [0x12, 0x12, 0x12, 255]);
    }
}
