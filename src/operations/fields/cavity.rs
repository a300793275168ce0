use std::f64::consts::TAU;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::{VertexSample, RAY_EPSILON};
use crate::error::ConfigError;
use crate::math::{mix_seed, Vector3};
use crate::spatial::FaceBvh;

/// Cavity occlusion: share of the outward hemisphere blocked nearby.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CavityParams {
    /// Rays per vertex.
    pub samples: usize,
    /// Occluders further than this are ignored.
    pub max_dist: f64,
    /// Occlusion is raised to `1 / contrast`.
    pub contrast: f64,
}

impl Default for CavityParams {
    fn default() -> Self {
        Self {
            samples: 16,
            max_dist: 0.5,
            contrast: 1.0,
        }
    }
}

impl CavityParams {
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        #[allow(clippy::cast_precision_loss)]
        let samples = self.samples as f64;
        ConfigError::check_range("cavity.samples", samples, 1.0, f64::MAX)?;
        ConfigError::check_range("cavity.max_dist", self.max_dist, f64::MIN_POSITIVE, f64::MAX)?;
        ConfigError::check_range("cavity.contrast", self.contrast, f64::MIN_POSITIVE, f64::MAX)
    }

    pub(super) fn scaled(&self, scale: f64) -> Self {
        Self {
            max_dist: self.max_dist * scale,
            ..*self
        }
    }

    /// Occlusion per vertex; vertex `i` samples from stream `i` of `seed`.
    #[allow(clippy::cast_precision_loss)]
    pub(super) fn compute(&self, samples: &[VertexSample], bvh: &FaceBvh, seed: u64) -> Vec<f64> {
        let count = self.samples.max(1);
        samples
            .par_iter()
            .enumerate()
            .map(|(i, s)| {
                let Some(normal) = s.normal.try_normalize(RAY_EPSILON) else {
                    return 0.0;
                };
                let mut rng = Pcg64::seed_from_u64(mix_seed(seed, i as u64));
                let origin = s.point + normal * RAY_EPSILON;
                let hits = (0..count)
                    .filter(|_| {
                        let mut direction = unit_sphere(&mut rng);
                        if direction.dot(&normal) < 0.0 {
                            direction = -direction;
                        }
                        bvh.occluded(&origin, &direction, self.max_dist, RAY_EPSILON, &s.faces)
                    })
                    .count();
                let occlusion = hits as f64 / count as f64;
                if (self.contrast - 1.0).abs() > f64::EPSILON {
                    occlusion.powf(1.0 / self.contrast)
                } else {
                    occlusion
                }
            })
            .collect()
    }
}

/// Uniform direction on the unit sphere.
fn unit_sphere(rng: &mut Pcg64) -> Vector3 {
    let z: f64 = rng.random::<f64>() * 2.0 - 1.0;
    let phi = rng.random::<f64>() * TAU;
    let r = (1.0 - z * z).max(0.0).sqrt();
    Vector3::new(r * phi.cos(), r * phi.sin(), z)
}
