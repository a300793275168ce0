use std::collections::HashMap;

use slotmap::SecondaryMap;
use tracing::{debug, warn};

use crate::error::Result;
use crate::topology::{EdgeData, Mesh, VertexId};

/// Merges vertices closer than a distance.
///
/// Each vertex collapses onto the first earlier vertex (arena order) within
/// range. Faces are rebuilt over the surviving vertices; faces left with
/// fewer than three distinct corners are dropped. Edge attributes of merged
/// edges are combined and the surviving vertex keeps the lowest protection.
pub struct WeldByDistance {
    distance: f64,
}

impl WeldByDistance {
    /// Creates a new `WeldByDistance` operation.
    #[must_use]
    pub fn new(distance: f64) -> Self {
        Self { distance }
    }

    /// Executes the weld. Returns the number of removed vertices.
    ///
    /// # Errors
    ///
    /// Returns an error if a face cannot be rebuilt.
    pub fn execute(&self, mesh: &mut Mesh) -> Result<usize> {
        if self.distance <= 0.0 || mesh.vertex_count() < 2 {
            return Ok(0);
        }
        let remap = self.collapse_map(mesh);
        if remap.is_empty() {
            return Ok(0);
        }
        let target = |v: VertexId| remap.get(v).copied().unwrap_or(v);

        // Protection: keep the minimum.
        for (from, &to) in &remap {
            let p = mesh.vertex(from)?.protection;
            let survivor = mesh.vertex_mut(to)?;
            survivor.protection = survivor.protection.min(p);
        }

        // Edge attributes, keyed by the welded endpoint pair.
        let mut merged_edges: HashMap<(VertexId, VertexId), EdgeData> = HashMap::new();
        for (_, edge) in mesh.edges() {
            let [a, b] = edge.vertices;
            if !remap.contains_key(a) && !remap.contains_key(b) {
                continue;
            }
            let (ta, tb) = (target(a), target(b));
            if ta == tb {
                continue;
            }
            let key = if ta < tb { (ta, tb) } else { (tb, ta) };
            merged_edges
                .entry(key)
                .and_modify(|e| e.merge_attributes(edge))
                .or_insert_with(|| edge.clone());
        }

        let affected: Vec<_> = mesh
            .faces()
            .filter(|(id, _)| {
                mesh.face_vertices(*id)
                    .is_ok_and(|r| r.iter().any(|&v| remap.contains_key(v)))
            })
            .map(|(id, _)| id)
            .collect();
        let mut snapshots = Vec::with_capacity(affected.len());
        for face in affected {
            snapshots.push(mesh.remove_face(face)?);
        }
        for from in remap.keys() {
            mesh.remove_vertex(from)?;
        }

        let mut dropped = 0;
        for snapshot in &snapshots {
            let mut ring: Vec<VertexId> = Vec::with_capacity(snapshot.vertices.len());
            let mut keep = Vec::with_capacity(snapshot.vertices.len());
            for (i, &v) in snapshot.vertices.iter().enumerate() {
                let t = target(v);
                if ring.last() != Some(&t) {
                    ring.push(t);
                    keep.push(i);
                }
            }
            if ring.len() > 1 && ring.first() == ring.last() {
                ring.pop();
                keep.pop();
            }
            let mut distinct = ring.clone();
            distinct.sort_unstable();
            distinct.dedup();
            if ring.len() < 3 || distinct.len() != ring.len() {
                dropped += 1;
                continue;
            }
            let mut trimmed = snapshot.clone();
            trimmed.vertices.clone_from(&ring);
            trimmed.uvs = keep.iter().map(|&i| snapshot.uvs[i]).collect();
            trimmed.colors = keep.iter().map(|&i| snapshot.colors[i]).collect();
            mesh.restore_face(&trimmed, &ring)?;
        }

        for ((a, b), data) in merged_edges {
            if let Some(id) = mesh.edge_between(a, b) {
                mesh.edge_mut(id)?.merge_attributes(&data);
            }
        }
        mesh.remove_loose_edges();
        mesh.recompute_normals();

        if dropped > 0 {
            warn!(faces = dropped, "weld collapsed faces");
        }
        debug!(vertices = remap.len(), "welded vertices");
        Ok(remap.len())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn collapse_map(&self, mesh: &Mesh) -> SecondaryMap<VertexId, VertexId> {
        let cell = |x: f64| (x / self.distance).floor() as i64;
        let mut grid: HashMap<(i64, i64, i64), Vec<VertexId>> = HashMap::new();
        let mut remap = SecondaryMap::new();
        let dist_sq = self.distance * self.distance;

        for (id, vertex) in mesh.vertices() {
            let p = vertex.point;
            let key = (cell(p.x), cell(p.y), cell(p.z));
            let mut found = None;
            'search: for dx in -1..=1 {
                for dy in -1..=1 {
                    for dz in -1..=1 {
                        let Some(bucket) = grid.get(&(key.0 + dx, key.1 + dy, key.2 + dz)) else {
                            continue;
                        };
                        for &other in bucket {
                            let Ok(q) = mesh.point(other) else {
                                continue;
                            };
                            if (q - p).norm_squared() <= dist_sq {
                                found = Some(other);
                                break 'search;
                            }
                        }
                    }
                }
            }
            match found {
                Some(other) => {
                    remap.insert(id, other);
                }
                None => grid.entry(key).or_default().push(id),
            }
        }
        remap
    }
}
