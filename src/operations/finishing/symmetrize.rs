use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;
use tracing::debug;

use crate::error::OpResult;
use crate::topology::{Mesh, VertexData, VertexId};

/// Distance below which a vertex counts as lying on the mirror plane.
const PLANE_EPSILON: f64 = 1e-6;

/// Mirror plane and the side that is kept.
///
/// `PosX` keeps the `+X` half and mirrors it onto `-X`, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MirrorPlane {
    #[default]
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

impl MirrorPlane {
    fn axis(self) -> usize {
        match self {
            Self::PosX | Self::NegX => 0,
            Self::PosY | Self::NegY => 1,
            Self::PosZ | Self::NegZ => 2,
        }
    }

    fn sign(self) -> f64 {
        match self {
            Self::PosX | Self::PosY | Self::PosZ => 1.0,
            Self::NegX | Self::NegY | Self::NegZ => -1.0,
        }
    }
}

/// Replaces one half of the mesh with a mirror image of the other half.
///
/// Faces entirely on the discarded side are deleted; vertices of straddling
/// faces that sit on the discarded side are clamped onto the plane. The
/// kept half is then mirrored, sharing the vertices on the plane so the two
/// halves stay connected. `offset` moves the plane along its axis.
pub struct Symmetrize {
    plane: MirrorPlane,
    offset: f64,
}

impl Symmetrize {
    /// Creates a new `Symmetrize` operation about the plane through the origin.
    #[must_use]
    pub fn new(plane: MirrorPlane) -> Self {
        Self { plane, offset: 0.0 }
    }

    /// Moves the mirror plane along its axis.
    #[must_use]
    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    fn side(&self, value: f64) -> f64 {
        (value - self.offset) * self.plane.sign()
    }

    /// Executes the operation. Returns the number of mirrored faces.
    ///
    /// # Errors
    ///
    /// Returns an error if a face cannot be rebuilt.
    pub fn execute(&self, mesh: &mut Mesh) -> OpResult<usize> {
        let axis = self.plane.axis();

        for face in mesh.face_ids() {
            let points = mesh.face_points(face)?;
            if points.iter().all(|p| self.side(p[axis]) < PLANE_EPSILON)
                && points.iter().any(|p| self.side(p[axis]) < -PLANE_EPSILON)
            {
                mesh.remove_face(face)?;
            }
        }
        mesh.remove_loose_edges();
        mesh.remove_loose_vertices();

        // Clamp onto the plane; remember which vertices are shared.
        let mut on_plane: SecondaryMap<VertexId, ()> = SecondaryMap::new();
        for (id, vertex) in mesh.vertices_mut() {
            if self.side(vertex.point[axis]) < PLANE_EPSILON {
                vertex.point[axis] = self.offset;
                on_plane.insert(id, ());
            }
        }

        let mut mirrored: SecondaryMap<VertexId, VertexId> = SecondaryMap::new();
        for id in mesh.vertex_ids() {
            if on_plane.contains_key(id) {
                continue;
            }
            let data = mesh.vertex(id)?.clone();
            let mut point = data.point;
            point[axis] = 2.0 * self.offset - point[axis];
            mirrored.insert(id, mesh.add_vertex_data(VertexData::moved_to(&data, point)));
        }
        let image = |v: VertexId| mirrored.get(v).copied().unwrap_or(v);

        let mut added = 0;
        for face in mesh.face_ids() {
            let ring = mesh.face_vertices(face)?;
            if ring.iter().all(|&v| on_plane.contains_key(v)) {
                // Lies in the plane; its mirror would coincide with it.
                mesh.remove_face(face)?;
                continue;
            }
            let mut mirror_ring: Vec<VertexId> = ring.iter().map(|&v| image(v)).collect();
            mirror_ring.reverse();
            let (slot, smooth, part) = {
                let data = mesh.face(face)?;
                (data.material_slot, data.smooth, data.part_id)
            };
            let copy = mesh.add_face(&mirror_ring, slot)?;
            let data = mesh.face_mut(copy)?;
            data.smooth = smooth;
            data.part_id = part;
            added += 1;
        }

        // Mirrored edges carry the authored attributes of their source.
        let sources: Vec<_> = mesh
            .edges()
            .filter_map(|(id, edge)| {
                let [a, b] = edge.vertices;
                (mirrored.contains_key(a) || mirrored.contains_key(b))
                    .then(|| mesh.edge_between(image(a), image(b)).map(|m| (id, m)))
                    .flatten()
            })
            .collect();
        for (source, target) in sources {
            let data = mesh.edge(source)?.clone();
            mesh.edge_mut(target)?.merge_attributes(&data);
        }

        mesh.remove_loose_edges();
        mesh.remove_loose_vertices();
        mesh.recompute_normals();
        debug!(plane = ?self.plane, offset = self.offset, faces = added, "symmetrized");
        Ok(added)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::operations::creation::MakeBox;
    use crate::operations::query::Volume;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn box_is_rebuilt_from_positive_half() {
        let mut mesh = Mesh::new();
        MakeBox::new(p(-1.0, -1.0, -1.0), p(1.0, 1.0, 1.0))
            .execute(&mut mesh)
            .unwrap();
        let added = Symmetrize::new(MirrorPlane::PosX).execute(&mut mesh).unwrap();
        assert_eq!(added, 5);
        assert_eq!(mesh.face_count(), 10);
        assert_eq!(mesh.vertex_count(), 12);
        assert!(mesh.edges().all(|(_, e)| e.is_manifold()));
        assert!((Volume::new().execute(&mesh) - 8.0).abs() < 1e-9);
    }

    #[test]
    fn offset_moves_the_plane() {
        let mut mesh = Mesh::new();
        MakeBox::new(p(0.0, 0.0, 0.0), p(4.0, 1.0, 1.0))
            .execute(&mut mesh)
            .unwrap();
        Symmetrize::new(MirrorPlane::NegX)
            .with_offset(1.0)
            .execute(&mut mesh)
            .unwrap();
        let bounds = mesh.bounding_box().unwrap();
        assert!((bounds.min.x - 0.0).abs() < 1e-12);
        assert!((bounds.max.x - 2.0).abs() < 1e-12);
        assert!((Volume::new().execute(&mesh) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn mirrored_edges_keep_attributes() {
        let mut mesh = Mesh::new();
        MakeBox::new(p(-1.0, -1.0, -1.0), p(1.0, 1.0, 1.0))
            .execute(&mut mesh)
            .unwrap();
        for (_, e) in mesh.edges_mut() {
            e.seam = true;
        }
        Symmetrize::new(MirrorPlane::PosX).execute(&mut mesh).unwrap();
        assert_eq!(mesh.edge_count(), 20);
        assert!(mesh.edges().all(|(_, e)| e.seam));
    }
}
