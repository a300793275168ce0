use std::collections::HashMap;

use tracing::warn;

use crate::error::OpResult;
use crate::math::{polygon_3d::vertex_mean, Point3};
use crate::topology::{ring_walks, Mesh, VertexId};

/// An open boundary loop.
///
/// `vertices` run opposite to the faces along the boundary, so the ring
/// can be used directly as a cap face.
#[derive(Debug, Clone)]
pub struct BoundaryLoop {
    /// Vertex ring in cap winding order.
    pub vertices: Vec<VertexId>,
    /// Material slot of the face along the first boundary edge.
    pub material_slot: u8,
}

impl BoundaryLoop {
    /// Mean of the loop vertex positions.
    ///
    /// # Errors
    ///
    /// Returns an error if a vertex is missing.
    pub fn centroid(&self, mesh: &Mesh) -> OpResult<Point3> {
        let points = self
            .vertices
            .iter()
            .map(|&v| mesh.point(v))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(vertex_mean(&points))
    }
}

/// Collects every open boundary loop of the mesh.
///
/// Boundary edges are chained head to tail; where a vertex has several
/// outgoing boundary edges the first unused one is taken. Chains that do
/// not close are dropped with a warning.
///
/// # Errors
///
/// Returns an error if the mesh references missing elements.
pub fn boundary_loops(mesh: &Mesh) -> OpResult<Vec<BoundaryLoop>> {
    // Directed in cap order: from -> (to, slot).
    let mut outgoing: HashMap<VertexId, Vec<(VertexId, u8)>> = HashMap::new();
    let mut order = Vec::new();
    for (_, edge) in mesh.edges() {
        if !edge.is_boundary() {
            continue;
        }
        let face = edge.faces[0];
        let [a, b] = edge.vertices;
        let ring = mesh.face_vertices(face)?;
        let slot = mesh.face(face)?.material_slot;
        let (from, to) = if ring_walks(&ring, &a, &b) { (b, a) } else { (a, b) };
        outgoing.entry(from).or_default().push((to, slot));
        order.push(from);
    }

    let mut loops = Vec::new();
    for start in order {
        let Some((first, slot)) = outgoing.get_mut(&start).and_then(Vec::pop) else {
            continue;
        };
        let mut ring = vec![start];
        let mut current = first;
        let mut closed = false;
        while ring.len() <= mesh.vertex_count() {
            if current == start {
                closed = true;
                break;
            }
            ring.push(current);
            match outgoing.get_mut(&current).and_then(Vec::pop) {
                Some((next, _)) => current = next,
                None => break,
            }
        }
        if closed && ring.len() >= 3 {
            loops.push(BoundaryLoop {
                vertices: ring,
                material_slot: slot,
            });
        } else {
            warn!(vertices = ring.len(), "dropping open boundary chain");
        }
    }
    Ok(loops)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::creation::{MakeBox, MakeGrid, MakeTube};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn closed_box_has_no_loops() {
        let mut mesh = Mesh::new();
        MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))
            .execute(&mut mesh)
            .unwrap();
        assert!(boundary_loops(&mesh).unwrap().is_empty());
    }

    #[test]
    fn grid_loop_caps_against_winding() {
        let mut mesh = Mesh::new();
        MakeGrid::new(p(0.0, 0.0, 0.0), 2.0, 2.0, 2, 2)
            .execute(&mut mesh)
            .unwrap();
        let loops = boundary_loops(&mesh).unwrap();
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].vertices.len(), 8);
        let points: Vec<Point3> = loops[0]
            .vertices
            .iter()
            .map(|&v| mesh.point(v).unwrap())
            .collect();
        // The grid faces +Z, so its cap faces -Z.
        let n = crate::math::polygon_3d::newell_vector(&points);
        assert!(n.z < 0.0);
        let c = loops[0].centroid(&mesh).unwrap();
        assert!((c - p(1.0, 1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn open_tube_has_two_loops() {
        let mut mesh = Mesh::new();
        MakeTube::new(p(0.0, 0.0, 0.0), 1.0, 2.0)
            .with_resolution(6, 2)
            .with_caps(false)
            .execute(&mut mesh)
            .unwrap();
        let loops = boundary_loops(&mesh).unwrap();
        assert_eq!(loops.len(), 2);
        assert!(loops.iter().all(|l| l.vertices.len() == 6));
    }
}
