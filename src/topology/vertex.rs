use crate::math::{Point3, Vector3};

slotmap::new_key_type! {
    /// Unique identifier for a vertex in the mesh arena.
    pub struct VertexId;
}

/// Data associated with a mesh vertex.
#[derive(Debug, Clone)]
pub struct VertexData {
    /// The 3D position of the vertex.
    pub point: Point3,
    /// Area-weighted vertex normal (zero until normals are recomputed).
    pub normal: Vector3,
    /// Protection weight in `[0, 1]`; `1.0` freezes the vertex against
    /// noise, smoothing and decay.
    pub protection: f64,
}

impl VertexData {
    /// Creates a new, unprotected vertex at the given point.
    #[must_use]
    pub fn new(point: Point3) -> Self {
        Self {
            point,
            normal: Vector3::zeros(),
            protection: 0.0,
        }
    }

    /// Copy of this vertex moved to another position.
    ///
    /// The protection weight is inherited so derived geometry never gains
    /// protection its source did not have.
    #[must_use]
    pub fn moved_to(&self, point: Point3) -> Self {
        Self {
            point,
            normal: self.normal,
            protection: self.protection,
        }
    }
}
