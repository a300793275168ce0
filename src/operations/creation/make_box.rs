use crate::error::Result;
use crate::math::Point3;
use crate::topology::{FaceId, Mesh};

/// Creates an axis-aligned box from two corner points.
///
/// The six quads are wound counter-clockwise seen from outside, in the order
/// -Z, +Z, -Y, +Y, -X, +X.
pub struct MakeBox {
    min_corner: Point3,
    max_corner: Point3,
    slot: u8,
}

impl MakeBox {
    /// Creates a new `MakeBox` operation.
    #[must_use]
    pub fn new(min_corner: Point3, max_corner: Point3) -> Self {
        Self {
            min_corner,
            max_corner,
            slot: 0,
        }
    }

    /// Sets the material slot of every face.
    #[must_use]
    pub fn with_slot(mut self, slot: u8) -> Self {
        self.slot = slot;
        self
    }

    /// Executes the operation, adding the box to the mesh.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot is out of range.
    pub fn execute(&self, mesh: &mut Mesh) -> Result<Vec<FaceId>> {
        let (a, b) = (self.min_corner, self.max_corner);
        let mut v = Vec::with_capacity(8);
        for i in 0..8u8 {
            let x = if i & 1 == 0 { a.x } else { b.x };
            let y = if i & 2 == 0 { a.y } else { b.y };
            let z = if i & 4 == 0 { a.z } else { b.z };
            v.push(mesh.add_vertex(Point3::new(x, y, z)));
        }

        let rings: [[usize; 4]; 6] = [
            [0, 2, 3, 1],
            [4, 5, 7, 6],
            [0, 1, 5, 4],
            [2, 6, 7, 3],
            [0, 4, 6, 2],
            [1, 3, 7, 5],
        ];
        let mut faces = Vec::with_capacity(6);
        for ring in rings {
            faces.push(mesh.add_face(&ring.map(|i| v[i]), self.slot)?);
        }
        Ok(faces)
    }
}
