use tracing::{debug, warn};

use crate::error::OpResult;
use crate::math::Point3;
use crate::topology::{Mesh, VertexId};

use super::boundary::{boundary_loops, BoundaryLoop};

/// Connects pairs of open boundary loops with a band of faces.
///
/// Loops are paired greedily by nearest centroid. Loops with equal vertex
/// counts are joined by quads, others by a zipper of triangles that always
/// takes the shorter diagonal. With fewer than two loops nothing happens.
#[derive(Debug, Default)]
pub struct BridgeLoops;

impl BridgeLoops {
    /// Creates a new `BridgeLoops` operation.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Executes the operation. Returns the number of loop pairs bridged.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh references missing elements.
    pub fn execute(&self, mesh: &mut Mesh) -> OpResult<usize> {
        let loops = boundary_loops(mesh)?;
        if loops.len() < 2 {
            return Ok(0);
        }
        let centroids = loops
            .iter()
            .map(|l| l.centroid(mesh))
            .collect::<OpResult<Vec<_>>>()?;

        let mut used = vec![false; loops.len()];
        let mut bridged = 0;
        for i in 0..loops.len() {
            if used[i] {
                continue;
            }
            let partner = (i + 1..loops.len())
                .filter(|&j| !used[j])
                .min_by(|&a, &b| {
                    let da = (centroids[a] - centroids[i]).norm_squared();
                    let db = (centroids[b] - centroids[i]).norm_squared();
                    da.total_cmp(&db)
                });
            let Some(j) = partner else {
                continue;
            };
            used[i] = true;
            used[j] = true;
            match Self::bridge_pair(mesh, &loops[i], &loops[j]) {
                Ok(faces) => {
                    bridged += 1;
                    debug!(faces, "bridged boundary loops");
                }
                Err(e) => warn!(error = %e, "skipping boundary loop pair"),
            }
        }
        Ok(bridged)
    }

    fn bridge_pair(mesh: &mut Mesh, first: &BoundaryLoop, second: &BoundaryLoop) -> OpResult<usize> {
        let a = &first.vertices;
        // The second loop runs against the first once reversed.
        let mut b: Vec<VertexId> = second.vertices.iter().rev().copied().collect();
        let pa = points(mesh, a)?;
        let pb = points(mesh, &b)?;
        let start = (0..pb.len())
            .min_by(|&x, &y| (pb[x] - pa[0]).norm_squared().total_cmp(&(pb[y] - pa[0]).norm_squared()))
            .unwrap_or(0);
        b.rotate_left(start);
        let mut pb = pb;
        pb.rotate_left(start);

        let (n, m) = (a.len(), b.len());
        let slot = first.material_slot;
        let mut rings: Vec<Vec<VertexId>> = Vec::with_capacity(n + m);
        if n == m {
            for i in 0..n {
                let k = (i + 1) % n;
                rings.push(vec![a[i], a[k], b[k], b[i]]);
            }
        } else {
            let (mut i, mut j) = (0, 0);
            while i < n || j < m {
                let advance_first = if i == n {
                    false
                } else if j == m {
                    true
                } else {
                    let d_first = (pa[(i + 1) % n] - pb[j]).norm_squared();
                    let d_second = (pb[(j + 1) % m] - pa[i]).norm_squared();
                    d_first <= d_second
                };
                if advance_first {
                    rings.push(vec![a[i % n], a[(i + 1) % n], b[j % m]]);
                    i += 1;
                } else {
                    rings.push(vec![a[i % n], b[(j + 1) % m], b[j % m]]);
                    j += 1;
                }
            }
        }

        let mut added = Vec::with_capacity(rings.len());
        for ring in &rings {
            match mesh.add_face(ring, slot) {
                Ok(face) => added.push(face),
                Err(e) => {
                    for face in added {
                        mesh.remove_face(face)?;
                    }
                    return Err(e.into());
                }
            }
        }
        Ok(added.len())
    }
}

fn points(mesh: &Mesh, ring: &[VertexId]) -> OpResult<Vec<Point3>> {
    Ok(ring.iter().map(|&v| mesh.point(v)).collect::<Result<Vec<_>, _>>()?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::creation::{MakeBox, MakeGrid, MakeTube};
    use crate::operations::query::Volume;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn box_without_sides_is_closed_again() {
        let mut mesh = Mesh::new();
        let faces = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))
            .execute(&mut mesh)
            .unwrap();
        for &f in &faces[2..] {
            mesh.remove_face(f).unwrap();
        }
        assert_eq!(BridgeLoops::new().execute(&mut mesh).unwrap(), 1);
        assert_eq!(mesh.face_count(), 6);
        assert!(mesh.edges().all(|(_, e)| e.is_manifold()));
        assert!((Volume::new().execute(&mesh) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn unequal_loops_are_zipped() {
        let mut mesh = Mesh::new();
        MakeTube::new(p(0.0, 0.0, 0.0), 1.0, 1.0)
            .with_resolution(8, 1)
            .execute(&mut mesh)
            .unwrap();
        MakeTube::new(p(0.0, 0.0, 2.0), 1.0, 1.0)
            .with_resolution(6, 1)
            .execute(&mut mesh)
            .unwrap();
        let before = mesh.face_count();
        // Four loops, so every loop finds a partner.
        let bridged = BridgeLoops::new().execute(&mut mesh).unwrap();
        assert_eq!(bridged, 2);
        assert!(mesh.face_count() >= before + 14);
    }

    #[test]
    fn single_loop_is_left_alone() {
        let mut mesh = Mesh::new();
        MakeGrid::new(p(0.0, 0.0, 0.0), 1.0, 1.0, 1, 1)
            .execute(&mut mesh)
            .unwrap();
        assert_eq!(BridgeLoops::new().execute(&mut mesh).unwrap(), 0);
        assert_eq!(mesh.face_count(), 1);
    }
}
