use noise::{Fbm, MultiFractal, NoiseFn, Perlin};

use crate::config::NoiseConfig;

/// 2D fBm height field used to seed tile heights at world load.
pub struct NoiseField {
    fbm: Fbm<Perlin>,
    amplitude: f32,
    height_offset: f32,
}

impl NoiseField {
    pub fn new(seed: u32, octaves: usize, frequency: f32, amplitude: f32, height_offset: f32) -> Self {
        let fbm = Fbm::<Perlin>::new(seed)
            .set_octaves(octaves)
            .set_frequency(frequency as f64)
            .set_lacunarity(2.0)
            .set_persistence(0.5);

        Self {
            fbm,
            amplitude,
            height_offset,
        }
    }

    pub fn from_config(config: &NoiseConfig) -> Self {
        Self::new(
            config.seed,
            config.octaves,
            config.frequency,
            config.amplitude,
            config.height_offset,
        )
    }

    /// Surface height at world XZ.
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        let n = self.fbm.get([x as f64, z as f64]) as f32;
        let h = self.height_offset + n * self.amplitude;
        if h.is_finite() {
            h
        } else {
            self.height_offset
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_per_seed() {
        let a = NoiseField::new(3, 4, 0.05, 8.0, 1.0);
        let b = NoiseField::new(3, 4, 0.05, 8.0, 1.0);
        for i in 0..16 {
            let x = i as f32 * 3.7;
            assert_eq!(a.height_at(x, -x), b.height_at(x, -x));
        }
    }

    #[test]
    fn test_amplitude_bounds_heights() {
        let field = NoiseField::new(11, 3, 0.1, 2.0, 5.0);
        for i in 0..64 {
            let h = field.height_at(i as f32 * 1.3, i as f32 * 0.7);
            assert!(h.is_finite());
            // fBm output stays within a small multiple of the amplitude
            assert!((h - 5.0).abs() <= 2.0 * 2.0, "height {h}");
        }
    }
}
