use std::f64::consts::TAU;

use crate::error::{OperationError, Result};
use crate::math::Point3;
use crate::topology::{FaceId, Mesh, VertexId};

/// Creates a cylinder along +Z, open at both ends unless capped.
pub struct MakeTube {
    base: Point3,
    radius: f64,
    height: f64,
    segments: usize,
    stacks: usize,
    capped: bool,
    slot: u8,
}

impl MakeTube {
    /// Creates a new open `MakeTube` operation with its base centre at `base`.
    #[must_use]
    pub fn new(base: Point3, radius: f64, height: f64) -> Self {
        Self {
            base,
            radius,
            height,
            segments: 16,
            stacks: 1,
            capped: false,
            slot: 0,
        }
    }

    /// Sets the number of segments around and stacks along the axis.
    #[must_use]
    pub fn with_resolution(mut self, segments: usize, stacks: usize) -> Self {
        self.segments = segments;
        self.stacks = stacks;
        self
    }

    /// Closes both ends with n-gon caps.
    #[must_use]
    pub fn with_caps(mut self, capped: bool) -> Self {
        self.capped = capped;
        self
    }

    /// Sets the material slot of every face.
    #[must_use]
    pub fn with_slot(mut self, slot: u8) -> Self {
        self.slot = slot;
        self
    }

    /// Executes the operation, adding the tube to the mesh.
    ///
    /// # Errors
    ///
    /// Returns an error if the radius or height is not positive, or the
    /// resolution is below 3 segments / 1 stack.
    #[allow(clippy::cast_precision_loss)]
    pub fn execute(&self, mesh: &mut Mesh) -> Result<Vec<FaceId>> {
        if self.radius <= 0.0 || self.height <= 0.0 || self.segments < 3 || self.stacks == 0 {
            return Err(OperationError::InvalidInput("invalid tube parameters".into()).into());
        }
        let b = self.base;
        let rings: Vec<Vec<VertexId>> = (0..=self.stacks)
            .map(|i| {
                let z = b.z + self.height * i as f64 / self.stacks as f64;
                (0..self.segments)
                    .map(|j| {
                        let (s, c) = (TAU * j as f64 / self.segments as f64).sin_cos();
                        mesh.add_vertex(Point3::new(b.x + self.radius * c, b.y + self.radius * s, z))
                    })
                    .collect()
            })
            .collect();

        let n = self.segments;
        let mut faces = Vec::with_capacity(n * self.stacks + 2);
        for pair in rings.windows(2) {
            let (lower, upper) = (&pair[0], &pair[1]);
            for j in 0..n {
                let k = (j + 1) % n;
                faces.push(mesh.add_face(&[lower[j], lower[k], upper[k], upper[j]], self.slot)?);
            }
        }
        if self.capped {
            if let (Some(bottom), Some(top)) = (rings.first(), rings.last()) {
                let mut reversed = bottom.clone();
                reversed.reverse();
                faces.push(mesh.add_face(&reversed, self.slot)?);
                faces.push(mesh.add_face(top, self.slot)?);
            }
        }
        Ok(faces)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn open_tube_has_two_boundary_rings() {
        let mut mesh = Mesh::new();
        MakeTube::new(Point3::origin(), 1.0, 2.0)
            .with_resolution(8, 2)
            .execute(&mut mesh)
            .unwrap();
        assert_eq!(mesh.face_count(), 16);
        let boundary = mesh.edges().filter(|(_, e)| e.is_boundary()).count();
        assert_eq!(boundary, 16);
    }

    #[test]
    fn capped_tube_is_closed() {
        let mut mesh = Mesh::new();
        MakeTube::new(Point3::origin(), 1.0, 2.0)
            .with_resolution(8, 1)
            .with_caps(true)
            .execute(&mut mesh)
            .unwrap();
        assert!(mesh.edges().all(|(_, e)| e.is_manifold()));
    }
}
