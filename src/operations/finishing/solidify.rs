use slotmap::SecondaryMap;
use tracing::debug;

use crate::error::{OpResult, OperationError};
use crate::topology::{ring_walks, Mesh, VertexData, VertexId};

/// Extrudes the whole surface against its normals, doubling the shell.
///
/// Every vertex gets an inner copy offset by `-normal * thickness`, every
/// face a reversed copy on the inner vertices, and every open boundary edge
/// a rim quad joining the two shells. A negative thickness grows outward.
pub struct Solidify {
    thickness: f64,
}

impl Solidify {
    /// Creates a new `Solidify` operation.
    #[must_use]
    pub fn new(thickness: f64) -> Self {
        Self { thickness }
    }

    /// Executes the operation. Returns the number of faces added.
    ///
    /// # Errors
    ///
    /// Returns an error if the thickness is zero or a face cannot be built.
    pub fn execute(&self, mesh: &mut Mesh) -> OpResult<usize> {
        if self.thickness.abs() < f64::EPSILON {
            return Err(OperationError::InvalidInput("solidify thickness is zero".into()));
        }
        mesh.recompute_normals();

        let mut inner: SecondaryMap<VertexId, VertexId> = SecondaryMap::new();
        for id in mesh.vertex_ids() {
            let data = mesh.vertex(id)?.clone();
            let offset = data.point - data.normal * self.thickness;
            inner.insert(id, mesh.add_vertex_data(VertexData::moved_to(&data, offset)));
        }
        let copy = |v: VertexId| inner.get(v).copied().unwrap_or(v);

        let mut rims = Vec::new();
        for (_, edge) in mesh.edges() {
            if !edge.is_boundary() {
                continue;
            }
            let face = edge.faces[0];
            let [a, b] = edge.vertices;
            let (a, b) = if ring_walks(&mesh.face_vertices(face)?, &a, &b) { (a, b) } else { (b, a) };
            rims.push(([b, a, copy(a), copy(b)], mesh.face(face)?.material_slot));
        }

        let mut added = 0;
        for face in mesh.face_ids() {
            let mut ring: Vec<VertexId> = mesh.face_vertices(face)?.into_iter().map(copy).collect();
            ring.reverse();
            let (slot, smooth, part) = {
                let data = mesh.face(face)?;
                (data.material_slot, data.smooth, data.part_id)
            };
            let shell = mesh.add_face(&ring, slot)?;
            let data = mesh.face_mut(shell)?;
            data.smooth = smooth;
            data.part_id = part;
            added += 1;
        }
        for (ring, slot) in rims {
            mesh.add_face(&ring, slot)?;
            added += 1;
        }
        mesh.recompute_normals();
        debug!(faces = added, thickness = self.thickness, "solidified shell");
        Ok(added)
    }
}
