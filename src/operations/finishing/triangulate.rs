use std::collections::HashMap;

use spade::{ConstrainedDelaunayTriangulation, InsertionError, Point2 as SpadePoint2, Triangulation};
use tracing::{debug, warn};

use crate::error::{OpResult, OperationError};
use crate::math::polygon_3d::{newell_vector, plane_basis, winding_number_2d};
use crate::math::{Point2, AREA_EPSILON};
use crate::topology::{FaceId, Mesh, VertexId};

/// Splits every polygon with more than three corners into triangles.
///
/// Each polygon is projected onto its own plane and triangulated with a
/// constrained Delaunay triangulation bounded by the polygon outline, so
/// concave polygons are handled. If the triangulation fails or does not
/// cover every corner, the polygon is fanned from its first corner.
/// Corner UVs and colours follow their vertices.
#[derive(Debug, Default)]
pub struct Triangulate;

impl Triangulate {
    /// Creates a new `Triangulate` operation.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Executes the triangulation. Returns the number of split polygons.
    ///
    /// # Errors
    ///
    /// Returns an error if a triangle cannot be added.
    pub fn execute(&self, mesh: &mut Mesh) -> OpResult<usize> {
        let polygons: Vec<FaceId> = mesh
            .faces()
            .filter(|(_, f)| f.corners.len() > 3)
            .map(|(id, _)| id)
            .collect();

        for &face in &polygons {
            let ring = mesh.face_vertices(face)?;
            let triangles = match cdt_triangles(mesh, &ring) {
                Ok(t) => t,
                Err(e) => {
                    warn!(error = %e, corners = ring.len(), "falling back to fan");
                    (1..ring.len() - 1).map(|i| [0, i, i + 1]).collect()
                }
            };
            let snapshot = mesh.remove_face(face)?;
            for [a, b, c] in triangles {
                let tri = mesh.add_face(&[ring[a], ring[b], ring[c]], snapshot.material_slot)?;
                let corners = {
                    let data = mesh.face_mut(tri)?;
                    data.smooth = snapshot.smooth;
                    data.part_id = snapshot.part_id;
                    data.corners.clone()
                };
                for (corner, source) in corners.into_iter().zip([a, b, c]) {
                    let corner = mesh.corner_mut(corner)?;
                    corner.uv = snapshot.uvs[source];
                    corner.color = snapshot.colors[source];
                }
            }
        }
        debug!(polygons = polygons.len(), "triangulated");
        Ok(polygons.len())
    }
}

/// Triangles of a polygon as index triples into its ring, wound like the ring.
fn cdt_triangles(mesh: &Mesh, ring: &[VertexId]) -> OpResult<Vec<[usize; 3]>> {
    let points = ring
        .iter()
        .map(|&v| mesh.point(v))
        .collect::<Result<Vec<_>, _>>()?;
    let normal = newell_vector(&points)
        .try_normalize(AREA_EPSILON)
        .ok_or_else(|| OperationError::Degenerate("polygon has no area".into()))?;
    let (u, v) = plane_basis(&normal);
    let origin = points[0];
    let flat: Vec<Point2> = points
        .iter()
        .map(|p| {
            let d = p - origin;
            Point2::new(d.dot(&u), d.dot(&v))
        })
        .collect();

    let mut cdt = ConstrainedDelaunayTriangulation::<SpadePoint2<f64>>::new();
    let mut handles = Vec::with_capacity(flat.len());
    let mut index_of: HashMap<usize, usize> = HashMap::new();
    for (i, p) in flat.iter().enumerate() {
        let h = cdt
            .insert(SpadePoint2::new(p.x, p.y))
            .map_err(|e: InsertionError| OperationError::Failed(format!("CDT insert: {e}")))?;
        if index_of.insert(h.index(), i).is_some() {
            return Err(OperationError::Degenerate("polygon has coincident corners".into()));
        }
        handles.push(h);
    }
    for i in 0..handles.len() {
        let (from, to) = (handles[i], handles[(i + 1) % handles.len()]);
        if from == to {
            continue;
        }
        if !cdt.can_add_constraint(from, to) {
            return Err(OperationError::Failed("polygon outline self-intersects".into()));
        }
        cdt.add_constraint(from, to);
    }

    let mut triangles = Vec::with_capacity(ring.len() - 2);
    for face in cdt.inner_faces() {
        let corners = face.vertices();
        let (sx, sy) = corners
            .iter()
            .map(|vh| vh.position())
            .fold((0.0, 0.0), |(x, y), q| (x + q.x, y + q.y));
        if winding_number_2d(&Point2::new(sx / 3.0, sy / 3.0), &flat) == 0 {
            continue;
        }
        let mut tri = [0usize; 3];
        for (slot, vertex) in tri.iter_mut().zip(corners) {
            *slot = *index_of
                .get(&vertex.fix().index())
                .ok_or_else(|| OperationError::Failed("unknown CDT vertex".into()))?;
        }
        triangles.push(tri);
    }
    if triangles.len() != ring.len() - 2 {
        return Err(OperationError::Failed(format!(
            "expected {} triangles, got {}",
            ring.len() - 2,
            triangles.len()
        )));
    }
    Ok(triangles)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::operations::creation::{MakeBox, MakeTube};
    use crate::operations::query::Volume;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn box_becomes_twelve_triangles() {
        let mut mesh = Mesh::new();
        MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 2.0, 3.0))
            .execute(&mut mesh)
            .unwrap();
        assert_eq!(Triangulate::new().execute(&mut mesh).unwrap(), 6);
        assert_eq!(mesh.face_count(), 12);
        assert!(mesh.faces().all(|(_, f)| f.corners.len() == 3));
        assert!(mesh.edges().all(|(_, e)| e.is_manifold()));
        assert!((Volume::new().execute(&mesh) - 6.0).abs() < 1e-9);
    }

    #[test]
    fn concave_polygon_stays_inside_outline() {
        let mut mesh = Mesh::new();
        // L shape, counter-clockwise seen from +Z.
        let ring: Vec<VertexId> = [
            p(0.0, 0.0, 0.0),
            p(2.0, 0.0, 0.0),
            p(2.0, 1.0, 0.0),
            p(1.0, 1.0, 0.0),
            p(1.0, 2.0, 0.0),
            p(0.0, 2.0, 0.0),
        ]
        .into_iter()
        .map(|q| mesh.add_vertex(q))
        .collect();
        let face = mesh.add_face(&ring, 4).unwrap();
        let before = mesh.face_area(face).unwrap();
        Triangulate::new().execute(&mut mesh).unwrap();
        assert_eq!(mesh.face_count(), 4);
        let total: f64 = mesh.face_ids().iter().map(|&f| mesh.face_area(f).unwrap()).sum();
        assert!((total - before).abs() < 1e-12);
        for (id, f) in mesh.faces() {
            assert_eq!(f.material_slot, 4);
            assert!(mesh.face_normal(id).unwrap().z > 0.0);
        }
    }

    #[test]
    fn corner_attributes_follow_vertices() {
        let mut mesh = Mesh::new();
        MakeTube::new(p(0.0, 0.0, 0.0), 1.0, 1.0)
            .with_resolution(6, 1)
            .with_caps(true)
            .execute(&mut mesh)
            .unwrap();
        for (_, c) in mesh.corners_mut() {
            c.color = [0.25, 0.5, 0.75, 1.0];
        }
        Triangulate::new().execute(&mut mesh).unwrap();
        assert!(mesh.corners().all(|(_, c)| c.color == [0.25, 0.5, 0.75, 1.0]));
    }
}
