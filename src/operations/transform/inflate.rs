use slotmap::SecondaryMap;
use tracing::debug;

use crate::manifest::SlotManifest;
use crate::topology::{Mesh, VertexId};

/// Pushes vertices along their normals by the inflation offset of their slots.
///
/// A vertex shared by several slots moves by the mean offset of its incident
/// faces. Offsets are multiplied by `scale` so they follow global alignment.
pub struct Inflate<'a> {
    manifest: &'a SlotManifest,
    scale: f64,
}

impl<'a> Inflate<'a> {
    /// Creates a new `Inflate` operation.
    #[must_use]
    pub fn new(manifest: &'a SlotManifest, scale: f64) -> Self {
        Self { manifest, scale }
    }

    /// Executes the inflation. Returns the number of moved vertices.
    pub fn execute(&self, mesh: &mut Mesh) -> usize {
        if self
            .manifest
            .iter()
            .all(|(_, c)| c.inflate_offset.abs() < f64::EPSILON)
        {
            return 0;
        }
        mesh.recompute_normals();

        let mut sums: SecondaryMap<VertexId, (f64, u32)> = SecondaryMap::new();
        for (_, corner) in mesh.corners() {
            let Ok(face) = mesh.face(corner.face) else {
                continue;
            };
            let offset = self.manifest.entry(face.material_slot).inflate_offset;
            match sums.get_mut(corner.vertex) {
                Some(acc) => {
                    acc.0 += offset;
                    acc.1 += 1;
                }
                None => {
                    sums.insert(corner.vertex, (offset, 1));
                }
            }
        }

        let mut moved = 0;
        for (id, vertex) in mesh.vertices_mut() {
            let Some(&(sum, count)) = sums.get(id) else {
                continue;
            };
            let offset = sum / f64::from(count) * self.scale;
            if offset.abs() > f64::EPSILON {
                vertex.point += vertex.normal * offset;
                moved += 1;
            }
        }
        mesh.recompute_normals();
        debug!(vertices = moved, "inflated slots");
        moved
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::manifest::SlotMeta;
    use crate::math::Point3;
    use crate::operations::creation::MakeBox;
    use std::collections::BTreeMap;

    #[test]
    fn inflating_grows_the_box() {
        let mut mesh = Mesh::new();
        MakeBox::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0))
            .execute(&mut mesh)
            .unwrap();
        let mut meta = BTreeMap::new();
        meta.insert(
            0,
            SlotMeta {
                inflate_offset: 0.1,
                ..SlotMeta::default()
            },
        );
        let manifest = SlotManifest::resolve(&meta);
        let moved = Inflate::new(&manifest, 2.0).execute(&mut mesh);
        assert_eq!(moved, 8);
        // Corner normals point along the diagonal.
        let expected = 1.0 + 0.2 / 3f64.sqrt();
        let b = mesh.bounding_box().unwrap();
        assert!((b.max.x - expected).abs() < 1e-9);
    }

    #[test]
    fn zero_offsets_leave_mesh() {
        let mut mesh = Mesh::new();
        MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
            .execute(&mut mesh)
            .unwrap();
        let manifest = SlotManifest::default();
        assert_eq!(Inflate::new(&manifest, 1.0).execute(&mut mesh), 0);
    }
}
