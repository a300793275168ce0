use super::{AngleBias, CutSet};
use crate::error::OpResult;
use crate::topology::{EdgeRole, Mesh};

/// Edges whose signed dihedral angle passes the threshold for `bias`.
pub(super) fn angle_cuts(mesh: &Mesh, threshold: f64, bias: AngleBias) -> CutSet {
    let mut cuts = CutSet::new();
    for (id, _) in mesh.edges() {
        let Some(angle) = mesh.dihedral_angle(id) else {
            continue;
        };
        let hit = match bias {
            AngleBias::Any => angle.abs() > threshold,
            AngleBias::ConvexOnly => angle > threshold,
            AngleBias::ConcaveOnly => angle < -threshold,
        };
        if hit {
            cuts.insert(id, ());
        }
    }
    cuts
}

/// Edges between faces of different slots.
pub(super) fn material_cuts(mesh: &Mesh) -> OpResult<CutSet> {
    let mut cuts = CutSet::new();
    for (id, edge) in mesh.edges() {
        let Some((&first, rest)) = edge.faces.split_first() else {
            continue;
        };
        let slot = mesh.face(first)?.material_slot;
        for &other in rest {
            if mesh.face(other)?.material_slot != slot {
                cuts.insert(id, ());
                break;
            }
        }
    }
    Ok(cuts)
}

/// Edges whose role is one of `roles`.
pub(super) fn role_cuts(mesh: &Mesh, roles: &[EdgeRole]) -> CutSet {
    mesh.edges()
        .filter(|(_, e)| e.role.is_tagged() && roles.contains(&e.role))
        .map(|(id, _)| (id, ()))
        .collect()
}
