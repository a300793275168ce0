use tracing::debug;

use crate::error::{OpResult, OperationError};
use crate::manifest::SlotManifest;
use crate::math::Vector3;
use crate::topology::{Mesh, VertexData, VertexId};

/// Largest fraction of a corner-to-centroid distance an inset may use.
const MAX_INSET_RATIO: f64 = 0.9;

/// Insets every face and recesses the inner copy, giving a panelled look.
///
/// Each face is replaced by a ring of border quads plus an inner face whose
/// corners moved `inset` toward the centroid and `depth` against the face
/// normal. Faces on protected slots are left untouched.
pub struct Plating<'a> {
    manifest: &'a SlotManifest,
    inset: f64,
    depth: f64,
}

impl<'a> Plating<'a> {
    /// Creates a new `Plating` operation.
    #[must_use]
    pub fn new(manifest: &'a SlotManifest, inset: f64, depth: f64) -> Self {
        Self {
            manifest,
            inset,
            depth,
        }
    }

    /// Executes the operation. Returns the number of plated faces.
    ///
    /// # Errors
    ///
    /// Returns an error if the inset is not positive or a face cannot be
    /// rebuilt.
    pub fn execute(&self, mesh: &mut Mesh) -> OpResult<usize> {
        if self.inset <= 0.0 {
            return Err(OperationError::InvalidInput(format!(
                "plating inset must be positive, got {}",
                self.inset
            )));
        }
        let targets: Vec<_> = mesh
            .faces()
            .filter(|(_, f)| !self.manifest.is_protected(f.material_slot))
            .map(|(id, _)| id)
            .collect();

        let mut plated = 0;
        for face in targets {
            let ring = mesh.face_vertices(face)?;
            let centroid = mesh.face_centroid(face)?;
            let normal = mesh.face_normal(face)?;

            let mut inner: Vec<VertexId> = Vec::with_capacity(ring.len());
            for &v in &ring {
                let data = mesh.vertex(v)?.clone();
                let to_centre = centroid - data.point;
                let step = self.inset.min(to_centre.norm() * MAX_INSET_RATIO);
                let moved = data.point
                    + to_centre.try_normalize(f64::EPSILON).unwrap_or_else(Vector3::zeros) * step
                    - normal * self.depth;
                inner.push(mesh.add_vertex_data(VertexData::moved_to(&data, moved)));
            }

            let snapshot = mesh.remove_face(face)?;
            let n = ring.len();
            for i in 0..n {
                let k = (i + 1) % n;
                let border = mesh.add_face(&[ring[i], ring[k], inner[k], inner[i]], snapshot.material_slot)?;
                let data = mesh.face_mut(border)?;
                data.smooth = snapshot.smooth;
                data.part_id = snapshot.part_id;
            }
            mesh.restore_face(&snapshot, &inner)?;
            plated += 1;
        }
        mesh.recompute_normals();
        debug!(faces = plated, inset = self.inset, depth = self.depth, "plated faces");
        Ok(plated)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::manifest::SlotMeta;
    use crate::math::Point3;
    use crate::operations::creation::{MakeBox, MakeGrid};
    use std::collections::BTreeMap;

    #[test]
    fn quad_gets_border_and_recessed_centre() {
        let mut mesh = Mesh::new();
        MakeGrid::new(Point3::origin(), 1.0, 1.0, 1, 1)
            .execute(&mut mesh)
            .unwrap();
        let manifest = SlotManifest::default();
        assert_eq!(Plating::new(&manifest, 0.1, 0.05).execute(&mut mesh).unwrap(), 1);
        assert_eq!(mesh.face_count(), 5);
        assert_eq!(mesh.vertex_count(), 8);
        let low = mesh.vertices().filter(|(_, v)| (v.point.z + 0.05).abs() < 1e-12).count();
        assert_eq!(low, 4);
    }

    #[test]
    fn protected_slots_are_skipped() {
        let mut mesh = Mesh::new();
        MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
            .with_slot(2)
            .execute(&mut mesh)
            .unwrap();
        let mut meta = BTreeMap::new();
        meta.insert(2, SlotMeta { protect: true, ..SlotMeta::default() });
        let manifest = SlotManifest::resolve(&meta);
        assert_eq!(Plating::new(&manifest, 0.1, 0.05).execute(&mut mesh).unwrap(), 0);
        assert_eq!(mesh.face_count(), 6);
    }

    #[test]
    fn plated_box_stays_closed() {
        let mut mesh = Mesh::new();
        MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
            .execute(&mut mesh)
            .unwrap();
        let manifest = SlotManifest::default();
        Plating::new(&manifest, 0.1, 0.02).execute(&mut mesh).unwrap();
        assert_eq!(mesh.face_count(), 30);
        assert!(mesh.edges().all(|(_, e)| e.is_manifold()));
    }
}
