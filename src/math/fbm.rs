use noise::{NoiseFn, Perlin};

use super::Point3;

/// Fractal Brownian motion over Perlin noise, normalised to roughly `[-1, 1]`.
#[derive(Debug, Clone)]
pub struct Fbm {
    perlin: Perlin,
    frequency: f64,
    octaves: u32,
    persistence: f64,
}

impl Fbm {
    /// Creates a sampler from a seed and base frequency.
    #[must_use]
    pub fn new(seed: u64, frequency: f64) -> Self {
        // Perlin takes a 32-bit seed; fold the high half in.
        #[allow(clippy::cast_possible_truncation)]
        let folded = (seed ^ (seed >> 32)) as u32;
        Self {
            perlin: Perlin::new(folded),
            frequency,
            octaves: 3,
            persistence: 0.5,
        }
    }

    /// Sets the number of octaves (at least one).
    #[must_use]
    pub fn with_octaves(mut self, octaves: u32) -> Self {
        self.octaves = octaves.max(1);
        self
    }

    /// Sets the amplitude falloff between octaves.
    #[must_use]
    pub fn with_persistence(mut self, persistence: f64) -> Self {
        self.persistence = persistence;
        self
    }

    /// Samples the noise at a point.
    #[must_use]
    pub fn sample(&self, p: &Point3) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = self.frequency;
        let mut max_value = 0.0;
        for _ in 0..self.octaves {
            total += self
                .perlin
                .get([p.x * frequency, p.y * frequency, p.z * frequency])
                * amplitude;
            max_value += amplitude;
            amplitude *= self.persistence;
            frequency *= 2.0;
        }
        total / max_value
    }

    /// Samples the noise remapped to `[0, 1]`.
    #[must_use]
    pub fn sample_unit(&self, p: &Point3) -> f64 {
        (self.sample(p) * 0.5 + 0.5).clamp(0.0, 1.0)
    }
}
