use crate::math::Vector3;

use super::corner::CornerId;

slotmap::new_key_type! {
    /// Unique identifier for a face in the mesh arena.
    pub struct FaceId;
}

/// Highest material slot index a face may carry.
pub const MAX_SLOT: u8 = 9;

/// Number of material slots.
pub const SLOT_COUNT: usize = MAX_SLOT as usize + 1;

/// Data associated with a polygon face.
#[derive(Debug, Clone)]
pub struct FaceData {
    /// Corners in winding order.
    pub corners: Vec<CornerId>,
    /// Material slot in `0..=9`.
    pub material_slot: u8,
    /// Smooth shading flag. Flat faces make their edges shading-sharp.
    pub smooth: bool,
    /// Unit face normal (cached, see [`super::Mesh::recompute_normals`]).
    pub normal: Vector3,
    /// Connected-component index assigned by the identity pass.
    pub part_id: u32,
}

/// Returns `true` if the vertex ring steps from `a` directly to `b`.
#[must_use]
pub fn ring_walks<T: PartialEq>(ring: &[T], a: &T, b: &T) -> bool {
    let n = ring.len();
    (0..n).any(|i| ring[i] == *a && ring[(i + 1) % n] == *b)
}
