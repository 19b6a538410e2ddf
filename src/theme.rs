//! Light/dark palettes and HSB colour math

use serde::{Deserialize, Serialize};

/// Host colour scheme, threaded explicitly into every draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Missing signal defaults to the light palette
    pub fn from_prefers_dark(prefers_dark: Option<bool>) -> Self {
        match prefers_dark {
            Some(true) => Theme::Dark,
            _ => Theme::Light,
        }
    }

    /// Surface clear colour
    pub fn background(&self) -> [f32; 4] {
        match self {
            Theme::Dark => rgb_hex(0x121212),
            Theme::Light => rgb_hex(0xf8f8f8),
        }
    }

    /// Top face colour for a block
    ///
    /// `hue` is in degrees, `height` is the drawn height. Dark mode is more
    /// saturated and brightens with height, light mode is softer and dims.
    pub fn block_color(&self, hue: f32, height: f32) -> Hsba {
        let hue = hue.rem_euclid(360.0);
        match self {
            Theme::Dark => Hsba::new(hue, 70.0, 65.0 + height / 5.0, 0.9),
            Theme::Light => Hsba::new(hue, 45.0, 90.0 - height / 10.0, 0.85),
        }
    }
}

/// Colour in hue (0-360) / saturation (0-100) / brightness (0-100) / alpha (0-1)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsba {
    pub hue: f32,
    pub saturation: f32,
    pub brightness: f32,
    pub alpha: f32,
}

impl Hsba {
    pub fn new(hue: f32, saturation: f32, brightness: f32, alpha: f32) -> Self {
        Self {
            hue,
            saturation: saturation.clamp(0.0, 100.0),
            brightness: brightness.clamp(0.0, 100.0),
            alpha: alpha.clamp(0.0, 1.0),
        }
    }

    /// Same hue/saturation, brightness scaled, fully opaque (side faces)
    pub fn shaded(&self, factor: f32) -> Self {
        Self::new(self.hue, self.saturation, self.brightness * factor, 1.0)
    }

    /// Straight (non-premultiplied) RGBA in 0-1
    pub fn to_rgba(&self) -> [f32; 4] {
        let (r, g, b) = hsv_to_rgb(self.hue, self.saturation / 100.0, self.brightness / 100.0);
        [r, g, b, self.alpha]
    }
}

/// HSV to RGB; `h` in degrees, `s`/`v` in 0-1
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    let h = h.rem_euclid(360.0) / 60.0;
    let c = v * s;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let m = v - c;
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    (r + m, g + m, b + m)
}

fn rgb_hex(hex: u32) -> [f32; 4] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
        1.0,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: (f32, f32, f32), b: (f32, f32, f32)) -> bool {
        (a.0 - b.0).abs() < 1e-4 && (a.1 - b.1).abs() < 1e-4 && (a.2 - b.2).abs() < 1e-4
    }

    #[test]
    fn test_hsv_primaries() {
        assert!(close(hsv_to_rgb(0.0, 1.0, 1.0), (1.0, 0.0, 0.0)));
        assert!(close(hsv_to_rgb(120.0, 1.0, 1.0), (0.0, 1.0, 0.0)));
        assert!(close(hsv_to_rgb(240.0, 1.0, 1.0), (0.0, 0.0, 1.0)));
        assert!(close(hsv_to_rgb(360.0, 1.0, 1.0), (1.0, 0.0, 0.0)));
        assert!(close(hsv_to_rgb(42.0, 0.0, 0.5), (0.5, 0.5, 0.5)));
    }

    #[test]
    fn test_missing_signal_is_light() {
        assert_eq!(Theme::from_prefers_dark(None), Theme::Light);
        assert_eq!(Theme::from_prefers_dark(Some(false)), Theme::Light);
        assert_eq!(Theme::from_prefers_dark(Some(true)), Theme::Dark);
    }

    #[test]
    fn test_block_color_presets() {
        let dark = Theme::Dark.block_color(400.0, 50.0);
        assert!((dark.hue - 40.0).abs() < 1e-4);
        assert_eq!(dark.saturation, 70.0);
        assert_eq!(dark.brightness, 75.0);

        let light = Theme::Light.block_color(10.0, 50.0);
        assert_eq!(light.saturation, 45.0);
        assert_eq!(light.brightness, 85.0);
        assert!((light.alpha - 0.85).abs() < 1e-6);

        // Brightness saturates instead of overflowing
        assert_eq!(Theme::Dark.block_color(0.0, 500.0).brightness, 100.0);
    }

    #[test]
    fn test_shaded_sides() {
        let top = Theme::Light.block_color(200.0, 20.0);
        let right = top.shaded(0.8);
        let left = top.shaded(0.6);
        assert!((right.brightness - top.brightness * 0.8).abs() < 1e-4);
        assert!((left.brightness - top.brightness * 0.6).abs() < 1e-4);
        assert_eq!(left.alpha, 1.0);
    }
}
