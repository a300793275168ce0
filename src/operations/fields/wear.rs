use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::VertexSample;
use crate::error::{ConfigError, OpResult};
use crate::math::polygon_3d::closest_point_on_segment;
use crate::math::{Fbm, Point3};
use crate::topology::{EdgeRole, Mesh};

/// Edge wear: brightens vertices close to sharp convex edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WearParams {
    /// Falloff radius around worn edges.
    pub radius: f64,
    /// Overall multiplier.
    pub amount: f64,
    /// How strongly noise breaks up the wear, in `[0, 1]`.
    pub roughness: f64,
    /// Noise frequency in cycles per model unit.
    pub noise_frequency: f64,
    /// Convex dihedral angle in degrees above which an untagged edge wears.
    pub convex_angle_deg: f64,
}

impl Default for WearParams {
    fn default() -> Self {
        Self {
            radius: 0.05,
            amount: 1.0,
            roughness: 0.5,
            noise_frequency: 8.0,
            convex_angle_deg: 30.0,
        }
    }
}

impl WearParams {
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_range("wear.radius", self.radius, f64::MIN_POSITIVE, f64::MAX)?;
        ConfigError::check_range("wear.amount", self.amount, 0.0, f64::MAX)?;
        ConfigError::check_range("wear.roughness", self.roughness, 0.0, 1.0)?;
        ConfigError::check_range("wear.convex_angle_deg", self.convex_angle_deg, 0.0, 180.0)
    }

    pub(super) fn scaled(&self, scale: f64) -> Self {
        Self {
            radius: self.radius * scale,
            noise_frequency: self.noise_frequency / scale,
            ..*self
        }
    }

    /// Wear per vertex: `(1 - d / radius)^2` from the nearest worn edge,
    /// broken up by noise.
    pub(super) fn compute(&self, mesh: &Mesh, samples: &[VertexSample], seed: u64) -> OpResult<Vec<f64>> {
        let threshold = self.convex_angle_deg.to_radians();
        let segments = mesh
            .edges()
            .filter(|&(id, edge)| {
                edge.role == EdgeRole::Contour || mesh.dihedral_angle(id).is_some_and(|a| a > threshold)
            })
            .map(|(id, _)| mesh.edge_points(id))
            .collect::<Result<Vec<(Point3, Point3)>, _>>()?;
        if segments.is_empty() {
            return Ok(vec![0.0; samples.len()]);
        }
        let fbm = Fbm::new(seed, self.noise_frequency);
        Ok(samples
            .par_iter()
            .map(|s| {
                let d = segments
                    .iter()
                    .map(|(a, b)| (closest_point_on_segment(&s.point, a, b) - s.point).norm())
                    .fold(f64::INFINITY, f64::min);
                if d >= self.radius {
                    return 0.0;
                }
                let base = (1.0 - d / self.radius).powi(2);
                let grain = 1.0 - self.roughness + self.roughness * fbm.sample_unit(&s.point);
                (base * grain * self.amount).clamp(0.0, 1.0)
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Vector3;
    use crate::operations::creation::{MakeBox, MakeGrid};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn sample(point: Point3) -> VertexSample {
        VertexSample {
            point,
            normal: Vector3::z(),
            faces: Vec::new(),
        }
    }

    #[test]
    fn falls_off_with_distance_from_box_edges() {
        let mut mesh = Mesh::new();
        MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))
            .execute(&mut mesh)
            .unwrap();
        let params = WearParams {
            radius: 0.2,
            roughness: 0.0,
            ..WearParams::default()
        };
        let samples = [
            sample(p(0.0, 0.0, 0.0)),
            sample(p(0.5, 0.1, 1.0)),
            sample(p(0.5, 0.5, 1.0)),
        ];
        let wear = params.compute(&mesh, &samples, 0).unwrap();
        assert!((wear[0] - 1.0).abs() < 1e-12);
        assert!((wear[1] - 0.25).abs() < 1e-9);
        assert!(wear[2].abs() < 1e-12);
    }

    #[test]
    fn flat_sheet_has_no_wear() {
        let mut mesh = Mesh::new();
        MakeGrid::new(Point3::origin(), 2.0, 2.0, 2, 2)
            .execute(&mut mesh)
            .unwrap();
        let samples: Vec<_> = mesh.vertices().map(|(_, v)| sample(v.point)).collect();
        let wear = WearParams::default().compute(&mesh, &samples, 0).unwrap();
        assert!(wear.iter().all(|w| w.abs() < 1e-12));
    }
}
