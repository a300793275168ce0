use crate::error::{OperationError, Result};
use crate::math::Point3;
use crate::topology::{FaceId, Mesh};

/// Creates a flat grid of quads in the XY plane, facing +Z.
pub struct MakeGrid {
    origin: Point3,
    size_x: f64,
    size_y: f64,
    cells_x: usize,
    cells_y: usize,
    slot: u8,
}

impl MakeGrid {
    /// Creates a new `MakeGrid` operation with its minimum corner at `origin`.
    #[must_use]
    pub fn new(origin: Point3, size_x: f64, size_y: f64, cells_x: usize, cells_y: usize) -> Self {
        Self {
            origin,
            size_x,
            size_y,
            cells_x,
            cells_y,
            slot: 0,
        }
    }

    /// Sets the material slot of every face.
    #[must_use]
    pub fn with_slot(mut self, slot: u8) -> Self {
        self.slot = slot;
        self
    }

    /// Executes the operation, returning the faces row by row.
    ///
    /// # Errors
    ///
    /// Returns an error if either cell count is zero.
    #[allow(clippy::cast_precision_loss)]
    pub fn execute(&self, mesh: &mut Mesh) -> Result<Vec<FaceId>> {
        if self.cells_x == 0 || self.cells_y == 0 {
            return Err(OperationError::InvalidInput("grid needs at least one cell".into()).into());
        }
        let (nx, ny) = (self.cells_x, self.cells_y);
        let mut v = Vec::with_capacity((nx + 1) * (ny + 1));
        for j in 0..=ny {
            for i in 0..=nx {
                let x = self.origin.x + self.size_x * i as f64 / nx as f64;
                let y = self.origin.y + self.size_y * j as f64 / ny as f64;
                v.push(mesh.add_vertex(Point3::new(x, y, self.origin.z)));
            }
        }
        let at = |i: usize, j: usize| v[j * (nx + 1) + i];

        let mut faces = Vec::with_capacity(nx * ny);
        for j in 0..ny {
            for i in 0..nx {
                let ring = [at(i, j), at(i + 1, j), at(i + 1, j + 1), at(i, j + 1)];
                faces.push(mesh.add_face(&ring, self.slot)?);
            }
        }
        Ok(faces)
    }
}
