use serde::{Deserialize, Serialize};

use crate::math::Vector3;
use crate::topology::Mesh;

/// Where the mesh pivot ends up after alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Pivot {
    /// Keep coordinates as built.
    #[default]
    Origin,
    /// Bounding box centre at the origin.
    Center,
    /// XY centre at the origin, lowest point at z = 0.
    ZMin,
    /// XY centre at the origin, highest point at z = 0.
    ZMax,
}

/// Uniformly scales a mesh about the origin, then moves it to its pivot.
pub struct Align {
    scale: f64,
    pivot: Pivot,
}

impl Align {
    /// Creates a new `Align` operation.
    #[must_use]
    pub fn new(scale: f64, pivot: Pivot) -> Self {
        Self { scale, pivot }
    }

    /// Executes the alignment in place and returns the applied translation.
    pub fn execute(&self, mesh: &mut Mesh) -> Vector3 {
        for (_, v) in mesh.vertices_mut() {
            v.point.coords *= self.scale;
        }
        let Some(bounds) = mesh.bounding_box() else {
            return Vector3::zeros();
        };
        let c = bounds.center();
        let offset = match self.pivot {
            Pivot::Origin => Vector3::zeros(),
            Pivot::Center => -c.coords,
            Pivot::ZMin => Vector3::new(-c.x, -c.y, -bounds.min.z),
            Pivot::ZMax => Vector3::new(-c.x, -c.y, -bounds.max.z),
        };
        for (_, v) in mesh.vertices_mut() {
            v.point += offset;
        }
        mesh.recompute_normals();
        offset
    }
}
