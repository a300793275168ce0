use slotmap::SecondaryMap;
use tracing::debug;

use crate::manifest::SlotManifest;
use crate::topology::{Mesh, VertexId};

/// Writes the per-vertex protection mask from slot `protect` flags.
///
/// A vertex gets the fraction of its incident faces that belong to a
/// protected slot, so a vertex surrounded by protected faces reads 1.0.
pub struct WriteProtectionMask<'a> {
    manifest: &'a SlotManifest,
}

impl<'a> WriteProtectionMask<'a> {
    /// Creates a new `WriteProtectionMask` operation.
    #[must_use]
    pub fn new(manifest: &'a SlotManifest) -> Self {
        Self { manifest }
    }

    /// Executes the operation. Returns the number of fully protected vertices.
    pub fn execute(&self, mesh: &mut Mesh) -> usize {
        let mut counts: SecondaryMap<VertexId, (u32, u32)> = SecondaryMap::new();
        for (_, corner) in mesh.corners() {
            let protected = mesh
                .face(corner.face)
                .is_ok_and(|f| self.manifest.is_protected(f.material_slot));
            let entry = counts.entry(corner.vertex).map(|e| e.or_insert((0, 0)));
            if let Some((hits, total)) = entry {
                *hits += u32::from(protected);
                *total += 1;
            }
        }

        let mut full = 0;
        for (id, vertex) in mesh.vertices_mut() {
            vertex.protection = match counts.get(id) {
                Some(&(hits, total)) if total > 0 => f64::from(hits) / f64::from(total),
                _ => 0.0,
            };
            if vertex.protection >= 1.0 {
                full += 1;
            }
        }
        debug!(protected = full, "wrote protection mask");
        full
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::manifest::SlotMeta;
    use crate::math::Point3;
    use crate::operations::creation::MakeGrid;
    use std::collections::BTreeMap;

    #[test]
    fn mask_is_fraction_of_protected_faces() {
        let mut mesh = Mesh::new();
        let faces = MakeGrid::new(Point3::origin(), 2.0, 1.0, 2, 1)
            .execute(&mut mesh)
            .unwrap();
        mesh.face_mut(faces[1]).unwrap().material_slot = 1;
        let mut meta = BTreeMap::new();
        meta.insert(1, SlotMeta { protect: true, ..SlotMeta::default() });
        let manifest = SlotManifest::resolve(&meta);

        let full = WriteProtectionMask::new(&manifest).execute(&mut mesh);
        assert_eq!(full, 2);

        let left = mesh.face_vertices(faces[0]).unwrap();
        assert!(mesh.vertex(left[0]).unwrap().protection.abs() < f64::EPSILON);
        // Shared vertex on the slot boundary.
        assert!((mesh.vertex(left[1]).unwrap().protection - 0.5).abs() < 1e-12);
    }
}
