use crate::math::Point2;

use super::edge::EdgeId;
use super::face::FaceId;
use super::vertex::VertexId;

slotmap::new_key_type! {
    /// Unique identifier for a face corner (loop) in the mesh arena.
    pub struct CornerId;
}

/// One face corner: the pairing of a face with one of its vertices.
///
/// Corners own the per-corner attribute layers (UV and the 4-channel
/// surface field).
#[derive(Debug, Clone)]
pub struct CornerData {
    /// Vertex at this corner.
    pub vertex: VertexId,
    /// Edge leaving this corner towards the next corner of the face.
    pub edge: EdgeId,
    /// Owning face.
    pub face: FaceId,
    /// Texture coordinate.
    pub uv: Point2,
    /// Surface field `(wear, thickness_or_flow, gravity, cavity)`.
    pub color: [f64; 4],
}
