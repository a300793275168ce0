use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::{VertexSample, RAY_EPSILON};
use crate::error::ConfigError;
use crate::math::{mix_seed, Fbm, Vector3};
use crate::spatial::FaceBvh;

/// Vertices whose normal points further down than this get nothing.
const UNDERSIDE_DOT: f64 = -0.4;
/// Weight floor so flat tops still collect some dust.
const SLOPE_BIAS: f64 = 0.2;
/// Horizontal spread of the jittered sky directions.
const JITTER: f64 = 0.35;

/// Gravity dust: settles where the sky above is open.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GravityParams {
    /// Number of sky rays, the first straight up.
    pub samples: usize,
    /// Occluders further than this are ignored.
    pub max_dist: f64,
    /// Overall multiplier.
    pub amount: f64,
    /// Noise frequency in cycles per model unit.
    pub noise_frequency: f64,
}

impl Default for GravityParams {
    fn default() -> Self {
        Self {
            samples: 8,
            max_dist: 2.0,
            amount: 1.0,
            noise_frequency: 4.0,
        }
    }
}

impl GravityParams {
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        #[allow(clippy::cast_precision_loss)]
        let samples = self.samples as f64;
        ConfigError::check_range("gravity.samples", samples, 1.0, f64::MAX)?;
        ConfigError::check_range("gravity.max_dist", self.max_dist, f64::MIN_POSITIVE, f64::MAX)?;
        ConfigError::check_range("gravity.amount", self.amount, 0.0, f64::MAX)
    }

    pub(super) fn scaled(&self, scale: f64) -> Self {
        Self {
            max_dist: self.max_dist * scale,
            noise_frequency: self.noise_frequency / scale,
            ..*self
        }
    }

    /// Straight up plus `samples - 1` seeded near-vertical directions.
    fn sky_directions(&self, seed: u64) -> Vec<Vector3> {
        let mut rng = Pcg64::seed_from_u64(seed);
        let mut directions = Vec::with_capacity(self.samples.max(1));
        directions.push(Vector3::z());
        for _ in 1..self.samples {
            let x = (rng.random::<f64>() * 2.0 - 1.0) * JITTER;
            let y = (rng.random::<f64>() * 2.0 - 1.0) * JITTER;
            directions.push(Vector3::new(x, y, 1.0).normalize());
        }
        directions
    }

    /// `(1 - hits / samples) * ((1 - |n.z|) + 0.2) * noise * amount`.
    #[allow(clippy::cast_precision_loss)]
    pub(super) fn compute(&self, samples: &[VertexSample], bvh: &FaceBvh, seed: u64) -> Vec<f64> {
        let directions = self.sky_directions(seed);
        let fbm = Fbm::new(mix_seed(seed, 1), self.noise_frequency);
        let count = directions.len() as f64;
        samples
            .par_iter()
            .map(|s| {
                let Some(normal) = s.normal.try_normalize(RAY_EPSILON) else {
                    return 0.0;
                };
                if normal.z < UNDERSIDE_DOT {
                    return 0.0;
                }
                let origin = s.point + normal * RAY_EPSILON;
                let hits = directions
                    .iter()
                    .filter(|d| bvh.occluded(&origin, d, self.max_dist, RAY_EPSILON, &s.faces))
                    .count() as f64;
                let open = 1.0 - hits / count;
                let slope = (1.0 - normal.z.abs()) + SLOPE_BIAS;
                (open * slope * fbm.sample_unit(&s.point) * self.amount).clamp(0.0, 1.0)
            })
            .collect()
    }
}
