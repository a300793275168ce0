use tracing::debug;

use crate::error::{OpResult, OperationError};
use crate::math::{Matrix3, Point3, Vector3, AREA_EPSILON};
use crate::operations::query::face_islands;
use crate::topology::{FaceId, Mesh};

/// Cosine of the angle under which a normal counts as vertical (18°).
const VERTICAL_COS: f64 = 0.951_056_516_295_153_5;

/// Attachment frame derived from one island of socket faces.
#[derive(Debug, Clone, PartialEq)]
pub struct SocketRecord {
    pub slot_id: u8,
    /// Area-weighted centre of the island.
    pub centroid: Point3,
    /// Columns are the X, Y and Z axes; Z is the dominant face normal.
    pub orientation: Matrix3,
}

/// Turns islands of socket-slot faces into attachment frames.
///
/// Faces of each socket slot are grouped by shared edges. The largest face
/// of an island supplies the frame normal; the tangent axes are fixed by
/// world +Z, or +Y when the normal is within 18° of vertical, so parallel
/// faces always get the same spin.
pub struct ExtractSockets {
    slots: Vec<u8>,
}

impl ExtractSockets {
    /// Creates a new `ExtractSockets` operation for the given slots.
    #[must_use]
    pub fn new(slots: &[u8]) -> Self {
        let mut slots = slots.to_vec();
        slots.sort_unstable();
        slots.dedup();
        Self { slots }
    }

    /// Executes the extraction. Records are ordered by slot, then by island.
    ///
    /// # Errors
    ///
    /// Returns an error if the largest face of an island has no area.
    pub fn execute(&self, mesh: &Mesh) -> OpResult<Vec<SocketRecord>> {
        let mut records = Vec::new();
        for &slot in &self.slots {
            let faces: Vec<FaceId> = mesh
                .faces()
                .filter(|(_, f)| f.material_slot == slot)
                .map(|(id, _)| id)
                .collect();
            for island in face_islands(mesh, &faces, |_, _, _| true) {
                records.push(Self::frame(mesh, slot, &island)?);
            }
        }
        debug!(slots = self.slots.len(), sockets = records.len(), "sockets extracted");
        Ok(records)
    }

    fn frame(mesh: &Mesh, slot: u8, island: &[FaceId]) -> OpResult<SocketRecord> {
        let mut dominant: Option<(FaceId, f64)> = None;
        let mut weighted = Vector3::zeros();
        let mut total_area = 0.0;
        for &face in island {
            let area = mesh.face_area(face)?;
            weighted += mesh.face_centroid(face)?.coords * area;
            total_area += area;
            if dominant.is_none_or(|(_, best)| area > best) {
                dominant = Some((face, area));
            }
        }
        let (dominant, _) =
            dominant.ok_or_else(|| OperationError::InvalidInput("empty socket island".into()))?;
        let centroid = if total_area > AREA_EPSILON {
            Point3::from(weighted / total_area)
        } else {
            mesh.face_centroid(dominant)?
        };

        let z = mesh.face_normal(dominant)?;
        let up = if z.z.abs() > VERTICAL_COS {
            Vector3::y()
        } else {
            Vector3::z()
        };
        let x = up.cross(&z).normalize();
        let y = z.cross(&x).normalize();
        Ok(SocketRecord {
            slot_id: slot,
            centroid,
            orientation: Matrix3::from_columns(&[x, y, z]),
        })
    }
}
