use std::collections::VecDeque;

use slotmap::SecondaryMap;
use tracing::debug;

use crate::error::Result;
use crate::math::polygon_3d::{plane_basis, polygon_normal, project_to_plane, winding_number_2d};
use crate::math::{Point3, Vector3};
use crate::operations::query::{connected_components, ring_signed_volume};
use crate::topology::{ring_walks, FaceId, Mesh, VertexId};

/// Decides, per face of one component, whether its winding must be reversed
/// to agree with the first face of the component.
///
/// Propagates across manifold edges only. Faces reached through a
/// conflicting (non-orientable) path keep the first decision made.
fn orientation_flips(mesh: &Mesh, component: &[FaceId]) -> SecondaryMap<FaceId, bool> {
    let mut flips: SecondaryMap<FaceId, bool> = SecondaryMap::new();
    let rings: SecondaryMap<FaceId, Vec<VertexId>> = component
        .iter()
        .filter_map(|&f| mesh.face_vertices(f).ok().map(|r| (f, r)))
        .collect();

    for &start in component {
        if flips.contains_key(start) {
            continue;
        }
        flips.insert(start, false);
        let mut queue = VecDeque::from([start]);
        while let Some(face) = queue.pop_front() {
            let (Some(ring), Some(&flipped)) = (rings.get(face), flips.get(face)) else {
                continue;
            };
            let n = ring.len();
            for i in 0..n {
                let (mut a, mut b) = (ring[i], ring[(i + 1) % n]);
                if flipped {
                    std::mem::swap(&mut a, &mut b);
                }
                let Some(edge) = mesh.edge_between(a, b).and_then(|e| mesh.edge(e).ok()) else {
                    continue;
                };
                if !edge.is_manifold() {
                    continue;
                }
                for &other in &edge.faces {
                    if other == face || flips.contains_key(other) {
                        continue;
                    }
                    let Some(other_ring) = rings.get(other) else {
                        continue;
                    };
                    flips.insert(other, ring_walks(other_ring, &a, &b));
                    queue.push_back(other);
                }
            }
        }
    }
    flips
}

/// Signed volume of one component with the given winding decisions applied.
pub(crate) fn component_signed_volume(
    mesh: &Mesh,
    component: &[FaceId],
    flips: &SecondaryMap<FaceId, bool>,
) -> f64 {
    component
        .iter()
        .filter_map(|&f| {
            let points = mesh.face_points(f).ok()?;
            let v = ring_signed_volume(&points);
            Some(if flips.get(f).copied().unwrap_or(false) { -v } else { v })
        })
        .sum()
}

/// A connected component with the winding decisions that orient it.
pub(crate) struct OrientedComponent {
    pub faces: Vec<FaceId>,
    pub flips: SecondaryMap<FaceId, bool>,
    /// Every edge of the component is shared by exactly two faces.
    pub closed: bool,
}

/// Consistent winding for every component of the mesh.
///
/// Closed components face away from the material they bound: a shell
/// nested inside an even number of other closed shells gets a positive
/// signed volume, one nested inside an odd number (a cavity wall) a
/// negative one. Open components keep the winding of their first face.
pub(crate) fn oriented_components(mesh: &Mesh) -> Vec<OrientedComponent> {
    let mut components: Vec<OrientedComponent> = connected_components(mesh)
        .into_iter()
        .map(|faces| {
            let flips = orientation_flips(mesh, &faces);
            let closed = faces.iter().all(|&f| {
                mesh.face_edges(f).is_ok_and(|edges| {
                    edges
                        .iter()
                        .all(|&e| mesh.edge(e).is_ok_and(|d| d.is_manifold()))
                })
            });
            OrientedComponent { faces, flips, closed }
        })
        .collect();

    let closed: Vec<usize> = (0..components.len())
        .filter(|&i| components[i].closed)
        .collect();
    let depths: Vec<(usize, usize)> = closed
        .iter()
        .filter_map(|&i| {
            let origin = anchor_point(mesh, &components[i].faces)?;
            let depth = closed
                .iter()
                .filter(|&&j| j != i && ray_crossings(mesh, &components[j].faces, &origin) % 2 == 1)
                .count();
            Some((i, depth))
        })
        .collect();

    for (i, depth) in depths {
        let component = &mut components[i];
        let volume = component_signed_volume(mesh, &component.faces, &component.flips);
        let want_positive = depth % 2 == 0;
        if (want_positive && volume < 0.0) || (!want_positive && volume > 0.0) {
            for (_, flip) in &mut component.flips {
                *flip = !*flip;
            }
        }
    }
    components
}

/// Centroid of the largest face of a component.
fn anchor_point(mesh: &Mesh, faces: &[FaceId]) -> Option<Point3> {
    let largest = faces
        .iter()
        .filter_map(|&f| mesh.face_area(f).ok().map(|a| (f, a)))
        .max_by(|a, b| a.1.total_cmp(&b.1))?;
    mesh.face_centroid(largest.0).ok()
}

/// Number of faces crossed by a fixed oblique ray from `origin`.
fn ray_crossings(mesh: &Mesh, faces: &[FaceId], origin: &Point3) -> usize {
    let dir = Vector3::new(0.577_215_664_9, 0.618_033_988_7, 0.533_141_373_2).normalize();
    faces
        .iter()
        .filter(|&&f| {
            let Ok(points) = mesh.face_points(f) else {
                return false;
            };
            let Some(normal) = polygon_normal(&points) else {
                return false;
            };
            let denom = normal.dot(&dir);
            if denom.abs() < 1e-12 {
                return false;
            }
            let t = normal.dot(&(points[0] - origin)) / denom;
            if t <= 1e-9 {
                return false;
            }
            let hit = origin + dir * t;
            let (u, v) = plane_basis(&normal);
            let ring = project_to_plane(&points, &points[0], &u, &v);
            let at = project_to_plane(&[hit], &points[0], &u, &v);
            winding_number_2d(&at[0], &ring) != 0
        })
        .count()
}

/// Makes face winding consistent per component and orients closed
/// components away from the material they enclose.
pub struct OrientFaces;

impl OrientFaces {
    /// Creates a new `OrientFaces` operation.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Executes the operation. Returns the number of flipped faces.
    ///
    /// # Errors
    ///
    /// Returns an error if a face cannot be rebuilt.
    pub fn execute(&self, mesh: &mut Mesh) -> Result<usize> {
        let to_flip: Vec<FaceId> = oriented_components(mesh)
            .iter()
            .flat_map(|c| c.flips.iter().filter(|(_, f)| **f).map(|(id, _)| id))
            .collect();

        for &face in &to_flip {
            mesh.flip_face(face)?;
        }
        mesh.recompute_normals();
        debug!(flipped = to_flip.len(), "oriented faces");
        Ok(to_flip.len())
    }
}

impl Default for OrientFaces {
    fn default() -> Self {
        Self::new()
    }
}
