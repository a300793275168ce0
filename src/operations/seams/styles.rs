use std::f64::consts::FRAC_PI_2;

use slotmap::SecondaryMap;

use super::charts::{chart_borders, planar_charts};
use super::{Axis, CutSet};
use crate::error::{OpResult, OperationError};
use crate::topology::{EdgeRole, FaceId, Mesh};

/// Faces whose normal is within 45° of the axis count as caps.
const CAP_COS: f64 = std::f64::consts::FRAC_1_SQRT_2;
/// Edges within 45° of the axis count as lengthwise.
const LENGTHWISE_COS: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// Cylindrical unroll: cut caps from the wall, and the wall once along
/// the half-plane opposite the first perpendicular axis.
pub(super) fn tube_cuts(mesh: &Mesh, axis: Axis) -> OpResult<CutSet> {
    let center = mesh
        .bounding_box()
        .ok_or_else(|| OperationError::InvalidInput("mesh has no vertices".into()))?
        .center();
    let a = axis.index();
    let (u, v) = ((a + 1) % 3, (a + 2) % 3);

    // (is_cap, angle around the axis)
    let mut class: SecondaryMap<FaceId, (bool, f64)> = SecondaryMap::new();
    for (id, _) in mesh.faces() {
        let cap = mesh.face_normal(id).is_ok_and(|n| n[a].abs() > CAP_COS);
        let d = mesh.face_centroid(id)? - center;
        class.insert(id, (cap, d[v].atan2(d[u])));
    }

    let mut cuts = CutSet::new();
    for (id, edge) in mesh.edges() {
        let &[fa, fb] = edge.faces.as_slice() else {
            continue;
        };
        let (Some(&(cap_a, theta_a)), Some(&(cap_b, theta_b))) = (class.get(fa), class.get(fb)) else {
            continue;
        };
        let wraps = (theta_a > FRAC_PI_2 && theta_b < -FRAC_PI_2) || (theta_b > FRAC_PI_2 && theta_a < -FRAC_PI_2);
        if cap_a != cap_b || (!cap_a && wraps) {
            cuts.insert(id, ());
        }
    }
    Ok(cuts)
}

/// Curvature charts plus every open or perimeter edge.
pub(super) fn organic_cuts(mesh: &Mesh, max_angle: f64) -> OpResult<CutSet> {
    let charts = planar_charts(mesh, max_angle)?;
    let mut cuts = chart_borders(mesh, &charts);
    for (id, edge) in mesh.edges() {
        if edge.is_boundary() || edge.role == EdgeRole::Perimeter {
            cuts.insert(id, ());
        }
    }
    Ok(cuts)
}

/// Cuts every interior edge running along the axis, leaving strips that
/// are joined only across the axis.
pub(super) fn strip_cuts(mesh: &Mesh, axis: Axis) -> OpResult<CutSet> {
    let a = axis.index();
    let mut cuts = CutSet::new();
    for (id, edge) in mesh.edges() {
        if edge.faces.len() < 2 {
            continue;
        }
        let (p0, p1) = mesh.edge_points(id)?;
        let Some(dir) = (p1 - p0).try_normalize(f64::EPSILON) else {
            continue;
        };
        if dir[a].abs() > LENGTHWISE_COS {
            cuts.insert(id, ());
        }
    }
    Ok(cuts)
}
