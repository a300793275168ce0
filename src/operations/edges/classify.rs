use tracing::debug;

use crate::error::Result;
use crate::topology::{EdgeId, EdgeRole, Mesh};

/// Default dihedral threshold above which an edge counts as shading-sharp.
pub const SHADING_THRESHOLD: f64 = 0.01;

/// Number of edges tagged per rule by one classification pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifyReport {
    pub perimeter: usize,
    pub material: usize,
    pub contour: usize,
    /// Edges that already carried a role and were left alone.
    pub preserved: usize,
}

/// Infers roles for untagged edges.
///
/// Rules, in priority order, for every edge whose role is `None`:
/// 1. one adjacent face: `Perimeter`;
/// 2. two faces with different slots: `clamp(max(slot_a, slot_b), 1, 4)`;
/// 3. two faces meeting at a shading-sharp angle: `Contour`.
///
/// Rule 2 overrides a `Contour` candidate from rule 3 on the same edge.
/// Edges that already carry a role are never touched.
pub struct ClassifyEdgeRoles {
    shading_threshold: f64,
}

impl Default for ClassifyEdgeRoles {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassifyEdgeRoles {
    /// Creates a classifier with the default shading threshold.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shading_threshold: SHADING_THRESHOLD,
        }
    }

    /// Sets the dihedral angle (radians) above which an edge is shading-sharp.
    #[must_use]
    pub fn with_shading_threshold(mut self, radians: f64) -> Self {
        self.shading_threshold = radians;
        self
    }

    /// Executes the classification in place.
    ///
    /// # Errors
    ///
    /// Returns an error if an edge references a missing face.
    pub fn execute(&self, mesh: &mut Mesh) -> Result<ClassifyReport> {
        let mut report = ClassifyReport::default();
        let mut assignments: Vec<(EdgeId, EdgeRole)> = Vec::new();

        for (id, edge) in mesh.edges() {
            if edge.role.is_tagged() {
                report.preserved += 1;
                continue;
            }
            match edge.faces.as_slice() {
                [_] => {
                    assignments.push((id, EdgeRole::Perimeter));
                    report.perimeter += 1;
                }
                &[fa, fb] => {
                    let (a, b) = (mesh.face(fa)?, mesh.face(fb)?);
                    let flat_side = !a.smooth || !b.smooth || edge.sharp;
                    let sharp_angle = mesh
                        .dihedral_angle(id)
                        .is_some_and(|angle| angle.abs() > self.shading_threshold);

                    let role = if a.material_slot != b.material_slot {
                        report.material += 1;
                        EdgeRole::from_index(a.material_slot.max(b.material_slot).clamp(1, 4))
                    } else if flat_side && sharp_angle {
                        report.contour += 1;
                        EdgeRole::Contour
                    } else {
                        continue;
                    };
                    assignments.push((id, role));
                }
                _ => {}
            }
        }

        for (id, role) in assignments {
            mesh.edge_mut(id)?.role = role;
        }
        debug!(
            perimeter = report.perimeter,
            material = report.material,
            contour = report.contour,
            preserved = report.preserved,
            "classified edge roles"
        );
        Ok(report)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::operations::creation::{MakeBox, MakeGrid};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn two_quads(slot_a: u8, slot_b: u8) -> Mesh {
        let mut mesh = Mesh::new();
        let faces = MakeGrid::new(p(0.0, 0.0, 0.0), 2.0, 1.0, 2, 1)
            .execute(&mut mesh)
            .unwrap();
        mesh.face_mut(faces[0]).unwrap().material_slot = slot_a;
        mesh.face_mut(faces[1]).unwrap().material_slot = slot_b;
        mesh
    }

    fn shared_edge(mesh: &Mesh) -> EdgeId {
        mesh.edges()
            .find(|(_, e)| e.is_manifold())
            .map(|(id, _)| id)
            .unwrap()
    }

    #[test]
    fn cube_edges_become_contour() {
        let mut mesh = Mesh::new();
        MakeBox::new(p(0.0, 0.0, 0.0), p(2.0, 2.0, 2.0))
            .execute(&mut mesh)
            .unwrap();
        let report = ClassifyEdgeRoles::new().execute(&mut mesh).unwrap();
        assert_eq!(report.contour, 12);
        assert_eq!(report.perimeter, 0);
        assert!(mesh.edges().all(|(_, e)| e.role == EdgeRole::Contour));
    }

    #[test]
    fn material_boundary_fires_on_flat_edge() {
        let mut mesh = two_quads(0, 2);
        let report = ClassifyEdgeRoles::new().execute(&mut mesh).unwrap();
        let e = shared_edge(&mesh);
        assert_eq!(mesh.edge(e).unwrap().role, EdgeRole::Contour);
        assert_eq!(mesh.edge(e).unwrap().role.index(), 2);
        // Counted by the rule that fired, not by the resulting role.
        assert_eq!(report.material, 1);
        assert_eq!(report.contour, 0);
    }

    #[test]
    fn material_tag_is_clamped() {
        let mut mesh = two_quads(9, 7);
        ClassifyEdgeRoles::new().execute(&mut mesh).unwrap();
        let e = shared_edge(&mesh);
        assert_eq!(mesh.edge(e).unwrap().role, EdgeRole::Detail);
    }

    #[test]
    fn boundary_edges_are_perimeter() {
        let mut mesh = two_quads(0, 3);
        let report = ClassifyEdgeRoles::new().execute(&mut mesh).unwrap();
        assert_eq!(report.perimeter, 6);
        for (_, e) in mesh.edges() {
            if e.is_boundary() {
                assert_eq!(e.role, EdgeRole::Perimeter);
            }
        }
    }

    #[test]
    fn material_overrides_contour_on_sharp_edge() {
        let mut mesh = Mesh::new();
        let faces = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))
            .execute(&mut mesh)
            .unwrap();
        mesh.face_mut(faces[1]).unwrap().material_slot = 3;
        let report = ClassifyEdgeRoles::new().execute(&mut mesh).unwrap();
        assert_eq!(report.material, 4);
        assert_eq!(report.contour, 8);
        let top_edges = mesh.face_edges(faces[1]).unwrap();
        for e in top_edges {
            assert_eq!(mesh.edge(e).unwrap().role, EdgeRole::Guide);
        }
    }

    #[test]
    fn preset_roles_are_kept() {
        let mut mesh = two_quads(0, 2);
        let e = shared_edge(&mesh);
        mesh.edge_mut(e).unwrap().role = EdgeRole::Fold;
        let report = ClassifyEdgeRoles::new().execute(&mut mesh).unwrap();
        assert_eq!(report.preserved, 1);
        assert_eq!(mesh.edge(e).unwrap().role, EdgeRole::Fold);
    }

    #[test]
    fn smooth_faces_are_not_contour() {
        let mut mesh = Mesh::new();
        MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))
            .execute(&mut mesh)
            .unwrap();
        for (_, f) in mesh.faces_mut() {
            f.smooth = true;
        }
        let report = ClassifyEdgeRoles::new().execute(&mut mesh).unwrap();
        assert_eq!(report.contour, 0);
    }
}
