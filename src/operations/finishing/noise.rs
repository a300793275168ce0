use tracing::debug;

use crate::error::{OpResult, OperationError};
use crate::math::Fbm;
use crate::topology::Mesh;

/// Displaces vertices along their normals with coherent noise.
///
/// The offset is `amplitude * fbm(p) * (1 - protection)`; fully protected
/// vertices are not touched.
pub struct SurfaceNoise {
    amplitude: f64,
    frequency: f64,
    octaves: u32,
    seed: u64,
}

impl SurfaceNoise {
    /// Creates a new `SurfaceNoise` operation.
    #[must_use]
    pub fn new(amplitude: f64, frequency: f64) -> Self {
        Self {
            amplitude,
            frequency,
            octaves: 3,
            seed: 0,
        }
    }

    /// Sets the number of fBm octaves.
    #[must_use]
    pub fn with_octaves(mut self, octaves: u32) -> Self {
        self.octaves = octaves;
        self
    }

    /// Sets the noise seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Executes the displacement. Returns the number of moved vertices.
    ///
    /// # Errors
    ///
    /// Returns an error if the frequency is not positive.
    pub fn execute(&self, mesh: &mut Mesh) -> OpResult<usize> {
        if self.frequency <= 0.0 {
            return Err(OperationError::InvalidInput(format!(
                "noise frequency must be positive, got {}",
                self.frequency
            )));
        }
        mesh.recompute_normals();
        let fbm = Fbm::new(self.seed, self.frequency).with_octaves(self.octaves);
        let mut moved = 0;
        for (_, vertex) in mesh.vertices_mut() {
            let freedom = 1.0 - vertex.protection.clamp(0.0, 1.0);
            if freedom <= 0.0 {
                continue;
            }
            let offset = fbm.sample(&vertex.point) * self.amplitude * freedom;
            vertex.point += vertex.normal * offset;
            moved += 1;
        }
        mesh.recompute_normals();
        debug!(vertices = moved, amplitude = self.amplitude, "applied surface noise");
        Ok(moved)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::operations::creation::MakeUvSphere;

    fn sphere() -> Mesh {
        let mut mesh = Mesh::new();
        MakeUvSphere::new(Point3::origin(), 1.0)
            .with_resolution(16, 8)
            .execute(&mut mesh)
            .unwrap();
        mesh
    }

    #[test]
    fn protected_vertices_do_not_move() {
        let mut mesh = sphere();
        for (_, v) in mesh.vertices_mut() {
            if v.point.z > 0.0 {
                v.protection = 1.0;
            }
        }
        let before: Vec<(Point3, f64)> = mesh.vertices().map(|(_, v)| (v.point, v.protection)).collect();
        SurfaceNoise::new(0.2, 3.0).with_seed(9).execute(&mut mesh).unwrap();
        let mut changed = 0;
        for ((_, v), (p, protection)) in mesh.vertices().zip(before) {
            if protection >= 1.0 {
                assert_eq!(v.point, p);
            } else if v.point != p {
                changed += 1;
            }
        }
        assert!(changed > 0);
    }

    #[test]
    fn seed_makes_it_reproducible() {
        let mut a = sphere();
        let mut b = sphere();
        SurfaceNoise::new(0.1, 2.0).with_seed(4).execute(&mut a).unwrap();
        SurfaceNoise::new(0.1, 2.0).with_seed(4).execute(&mut b).unwrap();
        for ((_, va), (_, vb)) in a.vertices().zip(b.vertices()) {
            assert_eq!(va.point, vb.point);
        }
    }
}
