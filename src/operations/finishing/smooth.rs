use tracing::debug;

use crate::error::{OpResult, OperationError};
use crate::math::{polygon_3d::vertex_mean, Point3};
use crate::topology::{Adjacency, Mesh};

/// Iterative Laplacian relaxation.
///
/// Each iteration moves every vertex toward the mean of its neighbours by
/// `factor * (1 - protection)`.
pub struct Smooth {
    iterations: usize,
    factor: f64,
}

impl Smooth {
    /// Creates a new `Smooth` operation.
    #[must_use]
    pub fn new(iterations: usize, factor: f64) -> Self {
        Self { iterations, factor }
    }

    /// Executes the smoothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the factor is outside `[0, 1]`.
    pub fn execute(&self, mesh: &mut Mesh) -> OpResult<()> {
        if !(0.0..=1.0).contains(&self.factor) {
            return Err(OperationError::InvalidInput(format!(
                "smoothing factor {} outside [0, 1]",
                self.factor
            )));
        }
        let adjacency = Adjacency::build(mesh);
        let ids = mesh.vertex_ids();
        for _ in 0..self.iterations {
            let mut targets: Vec<Point3> = Vec::with_capacity(ids.len());
            for &id in &ids {
                let neighbours = adjacency
                    .neighbors_of(id)
                    .iter()
                    .map(|&n| mesh.point(n))
                    .collect::<Result<Vec<_>, _>>()?;
                let own = mesh.point(id)?;
                targets.push(if neighbours.is_empty() { own } else { vertex_mean(&neighbours) });
            }
            for (&id, target) in ids.iter().zip(targets) {
                let vertex = mesh.vertex_mut(id)?;
                let weight = self.factor * (1.0 - vertex.protection.clamp(0.0, 1.0));
                if weight > 0.0 {
                    vertex.point += (target - vertex.point) * weight;
                }
            }
        }
        mesh.recompute_normals();
        debug!(iterations = self.iterations, factor = self.factor, "smoothed");
        Ok(())
    }
}
