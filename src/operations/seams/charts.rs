use std::collections::VecDeque;

use slotmap::SecondaryMap;

use super::CutSet;
use crate::error::OpResult;
use crate::math::Vector3;
use crate::topology::{FaceId, Mesh};

/// Grows near-planar charts over the faces of a mesh.
///
/// Faces are taken as seeds in arena order. A chart grows across shared
/// edges to faces whose normal is within `max_angle` of its seed's normal.
/// Faces without a normal form single-face charts.
///
/// # Errors
///
/// Returns an error if an edge or face lookup fails.
pub fn planar_charts(mesh: &Mesh, max_angle: f64) -> OpResult<Vec<Vec<FaceId>>> {
    let min_cos = max_angle.cos();
    let mut normals: SecondaryMap<FaceId, Vector3> = SecondaryMap::new();
    for (id, _) in mesh.faces() {
        if let Ok(n) = mesh.face_normal(id) {
            normals.insert(id, n);
        }
    }
    let mut assigned: SecondaryMap<FaceId, ()> = SecondaryMap::new();
    let mut charts = Vec::new();
    for seed in mesh.face_ids() {
        if assigned.contains_key(seed) {
            continue;
        }
        assigned.insert(seed, ());
        let mut chart = vec![seed];
        if let Some(&seed_normal) = normals.get(seed) {
            let mut queue = VecDeque::from([seed]);
            while let Some(face) = queue.pop_front() {
                for e in mesh.face_edges(face)? {
                    for &other in &mesh.edge(e)?.faces {
                        if assigned.contains_key(other) {
                            continue;
                        }
                        if normals.get(other).is_some_and(|n| n.dot(&seed_normal) >= min_cos) {
                            assigned.insert(other, ());
                            chart.push(other);
                            queue.push_back(other);
                        }
                    }
                }
            }
        }
        charts.push(chart);
    }
    Ok(charts)
}

/// Edges separating two charts.
pub(super) fn chart_cuts(mesh: &Mesh, max_angle: f64) -> OpResult<CutSet> {
    let charts = planar_charts(mesh, max_angle)?;
    Ok(chart_borders(mesh, &charts))
}

/// Edges whose faces belong to different groups.
pub(super) fn chart_borders(mesh: &Mesh, charts: &[Vec<FaceId>]) -> CutSet {
    let mut chart_of: SecondaryMap<FaceId, usize> = SecondaryMap::new();
    for (i, chart) in charts.iter().enumerate() {
        for &f in chart {
            chart_of.insert(f, i);
        }
    }
    let mut cuts = CutSet::new();
    for (id, edge) in mesh.edges() {
        let mut groups = edge.faces.iter().filter_map(|&f| chart_of.get(f));
        if let Some(first) = groups.next() {
            if groups.any(|g| g != first) {
                cuts.insert(id, ());
            }
        }
    }
    cuts
}
