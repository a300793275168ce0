use crate::math::polygon_3d::polygon_centroid;
use crate::math::Point3;
use crate::operations::cleanup::{component_signed_volume, oriented_components};
use crate::topology::Mesh;

/// Signed volume contribution of one polygon (divergence theorem).
///
/// The polygon is fanned around its centroid and each triangle contributes
/// the signed volume of the tetrahedron it forms with the origin.
#[must_use]
pub fn ring_signed_volume(points: &[Point3]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let c = polygon_centroid(points).coords;
    let n = points.len();
    let mut sum = 0.0;
    for i in 0..n {
        let a = points[i].coords;
        let b = points[(i + 1) % n].coords;
        sum += c.dot(&a.cross(&b));
    }
    sum / 6.0
}

/// Computes the enclosed volume of a mesh.
///
/// Every component is oriented first (cavity walls inward), then the signed
/// volumes are summed and the absolute value taken once, so hollow shells
/// subtract their cavity and the result does not depend on how the faces
/// were wound. Open components count by magnitude.
pub struct Volume;

impl Volume {
    /// Creates a new `Volume` query.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Executes the query, returning the volume (absolute value).
    #[must_use]
    pub fn execute(&self, mesh: &Mesh) -> f64 {
        oriented_components(mesh)
            .iter()
            .map(|c| {
                let volume = component_signed_volume(mesh, &c.faces, &c.flips);
                if c.closed {
                    volume
                } else {
                    volume.abs()
                }
            })
            .sum::<f64>()
            .abs()
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new()
    }
}
