use std::f64::consts::{PI, TAU};

use crate::error::{OperationError, Result};
use crate::math::Point3;
use crate::topology::{FaceId, Mesh, VertexId};

/// Creates a closed UV sphere: triangle fans at the poles, quads elsewhere.
pub struct MakeUvSphere {
    center: Point3,
    radius: f64,
    segments: usize,
    rings: usize,
    slot: u8,
}

impl MakeUvSphere {
    /// Creates a new `MakeUvSphere` operation.
    #[must_use]
    pub fn new(center: Point3, radius: f64) -> Self {
        Self {
            center,
            radius,
            segments: 32,
            rings: 16,
            slot: 0,
        }
    }

    /// Sets the number of longitudinal segments and latitude rings.
    #[must_use]
    pub fn with_resolution(mut self, segments: usize, rings: usize) -> Self {
        self.segments = segments;
        self.rings = rings;
        self
    }

    /// Sets the material slot of every face.
    #[must_use]
    pub fn with_slot(mut self, slot: u8) -> Self {
        self.slot = slot;
        self
    }

    /// Executes the operation, adding the sphere to the mesh.
    ///
    /// # Errors
    ///
    /// Returns an error if the radius is not positive or the resolution is
    /// below 3 segments / 2 rings.
    #[allow(clippy::cast_precision_loss)]
    pub fn execute(&self, mesh: &mut Mesh) -> Result<Vec<FaceId>> {
        if self.radius <= 0.0 || self.segments < 3 || self.rings < 2 {
            return Err(OperationError::InvalidInput("invalid sphere parameters".into()).into());
        }
        let c = self.center;
        let r = self.radius;
        let top = mesh.add_vertex(Point3::new(c.x, c.y, c.z + r));
        let bottom = mesh.add_vertex(Point3::new(c.x, c.y, c.z - r));

        let mut rings: Vec<Vec<VertexId>> = Vec::with_capacity(self.rings - 1);
        for i in 1..self.rings {
            let theta = PI * i as f64 / self.rings as f64;
            let (st, ct) = theta.sin_cos();
            let ring = (0..self.segments)
                .map(|j| {
                    let phi = TAU * j as f64 / self.segments as f64;
                    let (sp, cp) = phi.sin_cos();
                    mesh.add_vertex(Point3::new(c.x + r * st * cp, c.y + r * st * sp, c.z + r * ct))
                })
                .collect();
            rings.push(ring);
        }

        let n = self.segments;
        let mut faces = Vec::new();
        if let (Some(first), Some(last)) = (rings.first(), rings.last()) {
            for j in 0..n {
                let k = (j + 1) % n;
                faces.push(mesh.add_face(&[top, first[j], first[k]], self.slot)?);
                faces.push(mesh.add_face(&[bottom, last[k], last[j]], self.slot)?);
            }
        }
        for pair in rings.windows(2) {
            let (upper, lower) = (&pair[0], &pair[1]);
            for j in 0..n {
                let k = (j + 1) % n;
                faces.push(mesh.add_face(&[upper[j], lower[j], lower[k], upper[k]], self.slot)?);
            }
        }
        Ok(faces)
    }
}
