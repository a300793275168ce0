use tracing::debug;

use crate::error::Result;
use crate::math::AREA_EPSILON;
use crate::topology::Mesh;

/// What [`RemoveDegenerate`] removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DegenerateReport {
    pub faces: usize,
    pub edges: usize,
    pub vertices: usize,
}

/// Removes zero-area faces, then edges and vertices no face uses.
pub struct RemoveDegenerate {
    area_epsilon: f64,
}

impl Default for RemoveDegenerate {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoveDegenerate {
    /// Creates a new `RemoveDegenerate` operation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            area_epsilon: AREA_EPSILON,
        }
    }

    /// Sets the area below which a face is degenerate.
    #[must_use]
    pub fn with_area_epsilon(mut self, epsilon: f64) -> Self {
        self.area_epsilon = epsilon;
        self
    }

    /// Executes the cleanup.
    ///
    /// # Errors
    ///
    /// Returns an error if a face cannot be removed.
    pub fn execute(&self, mesh: &mut Mesh) -> Result<DegenerateReport> {
        let degenerate: Vec<_> = mesh
            .face_ids()
            .into_iter()
            .filter(|&f| !mesh.face_area(f).is_ok_and(|a| a > self.area_epsilon))
            .collect();
        for &face in &degenerate {
            mesh.remove_face(face)?;
        }
        let report = DegenerateReport {
            faces: degenerate.len(),
            edges: mesh.remove_loose_edges(),
            vertices: mesh.remove_loose_vertices(),
        };
        debug!(
            faces = report.faces,
            edges = report.edges,
            vertices = report.vertices,
            "removed degenerate geometry"
        );
        Ok(report)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::operations::creation::MakeGrid;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn sliver_and_loose_elements_go() {
        let mut mesh = Mesh::new();
        MakeGrid::new(p(0.0, 0.0, 0.0), 1.0, 1.0, 1, 1)
            .execute(&mut mesh)
            .unwrap();
        let a = mesh.add_vertex(p(5.0, 0.0, 0.0));
        let b = mesh.add_vertex(p(6.0, 0.0, 0.0));
        let c = mesh.add_vertex(p(7.0, 0.0, 0.0));
        mesh.add_face(&[a, b, c], 0).unwrap();
        mesh.add_vertex(p(9.0, 9.0, 9.0));

        let report = RemoveDegenerate::new().execute(&mut mesh).unwrap();
        assert_eq!(report.faces, 1);
        assert_eq!(report.edges, 3);
        assert_eq!(report.vertices, 4);
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.vertex_count(), 4);
    }
}
