use tracing::{debug, warn};

use crate::error::OpResult;
use crate::topology::Mesh;

use super::boundary::boundary_loops;

/// Caps open boundary loops with a single n-gon each.
///
/// Loops with more than `max_sides` edges are left open; `0` caps any loop.
#[derive(Debug, Default)]
pub struct FillHoles {
    max_sides: usize,
}

impl FillHoles {
    /// Creates a new `FillHoles` operation that caps every loop.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits capping to loops with at most `sides` edges.
    #[must_use]
    pub fn with_max_sides(mut self, sides: usize) -> Self {
        self.max_sides = sides;
        self
    }

    /// Executes the operation. Returns the number of holes capped.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh references missing elements.
    pub fn execute(&self, mesh: &mut Mesh) -> OpResult<usize> {
        let mut filled = 0;
        for hole in boundary_loops(mesh)? {
            let sides = hole.vertices.len();
            if self.max_sides != 0 && sides > self.max_sides {
                debug!(sides, max_sides = self.max_sides, "hole too large, left open");
                continue;
            }
            match mesh.add_face(&hole.vertices, hole.material_slot) {
                Ok(_) => filled += 1,
                Err(e) => warn!(error = %e, sides, "could not cap hole"),
            }
        }
        Ok(filled)
    }
}
