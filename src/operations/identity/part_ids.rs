use tracing::debug;

use crate::error::Result;
use crate::operations::query::connected_components;
use crate::topology::Mesh;

/// Tags every face with the index of its connected component.
pub struct AssignPartIds;

impl AssignPartIds {
    /// Creates a new `AssignPartIds` operation.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Executes the operation. Returns the number of parts.
    ///
    /// # Errors
    ///
    /// Returns an error if a face disappears while tagging.
    pub fn execute(&self, mesh: &mut Mesh) -> Result<usize> {
        let parts = connected_components(mesh);
        for (index, part) in (0u32..).zip(parts.iter()) {
            for &face in part {
                mesh.face_mut(face)?.part_id = index;
            }
        }
        debug!(parts = parts.len(), "assigned part ids");
        Ok(parts.len())
    }
}

impl Default for AssignPartIds {
    fn default() -> Self {
        Self::new()
    }
}
