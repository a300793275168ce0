use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::{VertexSample, RAY_EPSILON};
use crate::error::ConfigError;
use crate::spatial::FaceBvh;

/// Wall thickness: rays cast inward against the vertex normal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThicknessParams {
    /// Longest ray; walls at least this thick read as zero.
    pub max_dist: f64,
    /// Exponent applied to the normalised value.
    pub contrast: f64,
    /// Overall multiplier.
    pub amount: f64,
}

impl Default for ThicknessParams {
    fn default() -> Self {
        Self {
            max_dist: 1.0,
            contrast: 1.0,
            amount: 1.0,
        }
    }
}

impl ThicknessParams {
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_range("thickness.max_dist", self.max_dist, f64::MIN_POSITIVE, f64::MAX)?;
        ConfigError::check_range("thickness.contrast", self.contrast, f64::MIN_POSITIVE, f64::MAX)?;
        ConfigError::check_range("thickness.amount", self.amount, 0.0, f64::MAX)
    }

    pub(super) fn scaled(&self, scale: f64) -> Self {
        Self {
            max_dist: self.max_dist * scale,
            ..*self
        }
    }

    /// `clamp(1 - hit / max_dist)^contrast * amount`, zero without a hit.
    pub(super) fn compute(&self, samples: &[VertexSample], bvh: &FaceBvh) -> Vec<f64> {
        samples
            .par_iter()
            .map(|s| {
                let Some(normal) = s.normal.try_normalize(RAY_EPSILON) else {
                    return 0.0;
                };
                let direction = -normal;
                let origin = s.point + direction * RAY_EPSILON;
                bvh.ray_hit(&origin, &direction, self.max_dist, RAY_EPSILON, &s.faces)
                    .map_or(0.0, |hit| {
                        let d = hit.distance + RAY_EPSILON;
                        ((1.0 - d / self.max_dist).clamp(0.0, 1.0).powf(self.contrast) * self.amount)
                            .clamp(0.0, 1.0)
                    })
            })
            .collect()
    }
}
