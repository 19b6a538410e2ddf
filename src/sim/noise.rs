//! Seeded gradient noise in [0, 1]
//!
//! Layered Perlin octaves (each half the amplitude, double the frequency of
//! the previous one). The same seed and coordinates always give the same value.

use noise::{NoiseFn, Perlin};

/// Octaves summed per sample
const OCTAVES: u32 = 4;
/// Amplitude falloff per octave
const FALLOFF: f64 = 0.5;

/// Multi-octave Perlin source
#[derive(Clone)]
pub struct Noise {
    seed: u32,
    perlin: Perlin,
}

impl std::fmt::Debug for Noise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Noise").field("seed", &self.seed).finish()
    }
}

impl Noise {
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            perlin: Perlin::new(seed),
        }
    }

    /// 2D sample in [0, 1]
    pub fn sample2(&self, x: f32, y: f32) -> f32 {
        self.fractal(|f| self.perlin.get([x as f64 * f, y as f64 * f]))
    }

    /// 3D sample in [0, 1]
    pub fn sample3(&self, x: f32, y: f32, z: f32) -> f32 {
        self.fractal(|f| self.perlin.get([x as f64 * f, y as f64 * f, z as f64 * f]))
    }

    fn fractal(&self, octave: impl Fn(f64) -> f64) -> f32 {
        let mut total = 0.0;
        let mut amplitude = 0.5;
        let mut amplitude_sum = 0.0;
        let mut frequency = 1.0;
        for _ in 0..OCTAVES {
            total += octave(frequency) * amplitude;
            amplitude_sum += amplitude;
            amplitude *= FALLOFF;
            frequency *= 2.0;
        }
        // Perlin output is roughly [-1, 1]
        ((total / amplitude_sum + 1.0) * 0.5).clamp(0.0, 1.0) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range() {
        let noise = Noise::new(7);
        for i in 0..200 {
            let x = i as f32 * 0.37 - 30.0;
            let y = i as f32 * -0.21 + 4.0;
            let v2 = noise.sample2(x, y);
            let v3 = noise.sample3(x, y, 100.0);
            assert!((0.0..=1.0).contains(&v2));
            assert!((0.0..=1.0).contains(&v3));
        }
    }

    #[test]
    fn test_same_seed_same_value() {
        let a = Noise::new(1234);
        let b = Noise::new(1234);
        assert_eq!(a.sample2(1.3, -2.4), b.sample2(1.3, -2.4));
        assert_eq!(a.sample3(0.1, 0.2, 100.0), b.sample3(0.1, 0.2, 100.0));
    }

    #[test]
    fn test_seed_changes_field() {
        let a = Noise::new(1);
        let b = Noise::new(2);
        let differs = (0..50).any(|i| {
            let x = i as f32 * 0.77 + 0.3;
            (a.sample2(x, 1.1) - b.sample2(x, 1.1)).abs() > 1e-6
        });
        assert!(differs);
    }
}
