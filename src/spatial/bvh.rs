use crate::math::{ray_triangle_intersect, Aabb, Point3, Triangle, Vector3};
use crate::topology::{FaceId, Mesh};

/// Padding applied to node bounds for numerical robustness.
const BOX_PADDING: f64 = 1e-9;

/// Closest intersection found by [`FaceBvh::ray_hit`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Distance along the (unit) ray direction.
    pub distance: f64,
    /// Face that was hit.
    pub face: FaceId,
}

#[derive(Debug)]
enum BvhNode {
    Leaf {
        aabb: Aabb,
        index: usize,
    },
    Internal {
        aabb: Aabb,
        left: Box<BvhNode>,
        right: Box<BvhNode>,
    },
}

impl BvhNode {
    fn build(triangles: &[(Triangle, FaceId)], indices: &mut [usize]) -> Option<Self> {
        match indices {
            [] => return None,
            [index] => {
                return Some(Self::Leaf {
                    aabb: triangles[*index].0.aabb().padded(BOX_PADDING),
                    index: *index,
                })
            }
            _ => {}
        }

        let mut aabb = Aabb::empty();
        for &i in indices.iter() {
            aabb.expand(&triangles[i].0.aabb());
        }
        let aabb = aabb.padded(BOX_PADDING);
        let axis = aabb.longest_axis();

        indices.sort_by(|&a, &b| {
            let ca = triangles[a].0.centroid()[axis];
            let cb = triangles[b].0.centroid()[axis];
            ca.partial_cmp(&cb).unwrap_or(std::cmp::Ordering::Equal)
        });

        let mid = indices.len() / 2;
        let (left, right) = indices.split_at_mut(mid);
        match (Self::build(triangles, left), Self::build(triangles, right)) {
            (Some(l), Some(r)) => Some(Self::Internal {
                aabb,
                left: Box::new(l),
                right: Box::new(r),
            }),
            (Some(n), None) | (None, Some(n)) => Some(n),
            (None, None) => None,
        }
    }

    fn aabb(&self) -> &Aabb {
        match self {
            Self::Leaf { aabb, .. } | Self::Internal { aabb, .. } => aabb,
        }
    }
}

/// Bounding volume hierarchy over the faces of a mesh.
///
/// Polygons are fanned into triangles; every triangle remembers its source
/// face. Built once and read-only afterwards, so it can be shared across
/// threads.
#[derive(Debug)]
pub struct FaceBvh {
    triangles: Vec<(Triangle, FaceId)>,
    root: Option<BvhNode>,
}

struct Ray<'a> {
    origin: Point3,
    direction: Vector3,
    dir_inv: Vector3,
    epsilon: f64,
    skip: &'a [FaceId],
}

impl FaceBvh {
    /// Builds the hierarchy over all faces of `mesh`.
    #[must_use]
    pub fn build(mesh: &Mesh) -> Self {
        let mut triangles = Vec::with_capacity(mesh.face_count() * 2);
        for (id, _) in mesh.faces() {
            let Ok(points) = mesh.face_points(id) else {
                continue;
            };
            for i in 1..points.len().saturating_sub(1) {
                triangles.push((Triangle::new(points[0], points[i], points[i + 1]), id));
            }
        }
        let mut indices: Vec<usize> = (0..triangles.len()).collect();
        let root = BvhNode::build(&triangles, &mut indices);
        Self { triangles, root }
    }

    /// Number of triangles in the hierarchy.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Closest hit along a unit `direction` within `max_dist`, ignoring the
    /// faces in `skip`.
    #[must_use]
    pub fn ray_hit(
        &self,
        origin: &Point3,
        direction: &Vector3,
        max_dist: f64,
        epsilon: f64,
        skip: &[FaceId],
    ) -> Option<RayHit> {
        let root = self.root.as_ref()?;
        let ray = Self::ray(origin, direction, epsilon, skip);
        self.closest(root, &ray, max_dist)
            .map(|(distance, index)| RayHit {
                distance,
                face: self.triangles[index].1,
            })
    }

    /// Returns `true` if anything lies along the ray within `max_dist`.
    #[must_use]
    pub fn occluded(
        &self,
        origin: &Point3,
        direction: &Vector3,
        max_dist: f64,
        epsilon: f64,
        skip: &[FaceId],
    ) -> bool {
        let Some(root) = self.root.as_ref() else {
            return false;
        };
        let ray = Self::ray(origin, direction, epsilon, skip);
        self.any(root, &ray, max_dist)
    }

    fn ray<'a>(origin: &Point3, direction: &Vector3, epsilon: f64, skip: &'a [FaceId]) -> Ray<'a> {
        Ray {
            origin: *origin,
            direction: *direction,
            dir_inv: Vector3::new(1.0 / direction.x, 1.0 / direction.y, 1.0 / direction.z),
            epsilon,
            skip,
        }
    }

    fn leaf_hit(&self, index: usize, ray: &Ray<'_>, max_dist: f64) -> Option<f64> {
        let (tri, face) = &self.triangles[index];
        if ray.skip.contains(face) {
            return None;
        }
        ray_triangle_intersect(&ray.origin, &ray.direction, tri, ray.epsilon)
            .filter(|&t| t <= max_dist)
    }

    fn closest(&self, node: &BvhNode, ray: &Ray<'_>, max_dist: f64) -> Option<(f64, usize)> {
        let (t_near, _) = node.aabb().ray_intersect(&ray.origin, &ray.dir_inv)?;
        if t_near > max_dist {
            return None;
        }
        match node {
            BvhNode::Leaf { index, .. } => self.leaf_hit(*index, ray, max_dist).map(|t| (t, *index)),
            BvhNode::Internal { left, right, .. } => {
                let hit_left = self.closest(left, ray, max_dist);
                let limit = hit_left.map_or(max_dist, |(t, _)| t);
                let hit_right = self.closest(right, ray, limit);
                match (hit_left, hit_right) {
                    (Some(l), Some(r)) => Some(if l.0 <= r.0 { l } else { r }),
                    (Some(h), None) | (None, Some(h)) => Some(h),
                    (None, None) => None,
                }
            }
        }
    }

    fn any(&self, node: &BvhNode, ray: &Ray<'_>, max_dist: f64) -> bool {
        match node.aabb().ray_intersect(&ray.origin, &ray.dir_inv) {
            Some((t_near, _)) if t_near <= max_dist => {}
            _ => return false,
        }
        match node {
            BvhNode::Leaf { index, .. } => self.leaf_hit(*index, ray, max_dist).is_some(),
            BvhNode::Internal { left, right, .. } => {
                self.any(left, ray, max_dist) || self.any(right, ray, max_dist)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::creation::{MakeBox, MakeUvSphere};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn ray_inside_box_hits_opposite_wall() {
        let mut mesh = Mesh::new();
        let faces = MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 2.0))
            .execute(&mut mesh)
            .unwrap();
        let bvh = FaceBvh::build(&mesh);
        assert_eq!(bvh.triangle_count(), 12);

        let hit = bvh
            .ray_hit(&p(0.5, 0.5, 1.99), &-Vector3::z(), 10.0, 1e-9, &[faces[1]])
            .unwrap();
        assert!((hit.distance - 1.99).abs() < 1e-9);
        assert_eq!(hit.face, faces[0]);
    }

    #[test]
    fn max_distance_limits_hits() {
        let mut mesh = Mesh::new();
        MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))
            .execute(&mut mesh)
            .unwrap();
        let bvh = FaceBvh::build(&mesh);
        let origin = p(0.5, 0.5, 3.0);
        assert!(!bvh.occluded(&origin, &-Vector3::z(), 1.0, 1e-9, &[]));
        assert!(bvh.occluded(&origin, &-Vector3::z(), 2.5, 1e-9, &[]));
        assert!(!bvh.occluded(&origin, &Vector3::z(), 100.0, 1e-9, &[]));
    }

    #[test]
    fn closest_hit_on_sphere() {
        let mut mesh = Mesh::new();
        MakeUvSphere::new(p(0.0, 0.0, 0.0), 1.0)
            .with_resolution(24, 12)
            .execute(&mut mesh)
            .unwrap();
        let bvh = FaceBvh::build(&mesh);
        let dir = Vector3::new(1.0, 0.3, 0.2).normalize();
        let hit = bvh.ray_hit(&p(-5.0, -1.5, -1.0), &dir, 100.0, 1e-9, &[]).unwrap();
        let q = p(-5.0, -1.5, -1.0) + dir * hit.distance;
        assert!((q.coords.norm() - 1.0).abs() < 0.05);
        assert!(q.x < 0.0);
    }

    #[test]
    fn empty_mesh_never_hits() {
        let bvh = FaceBvh::build(&Mesh::new());
        assert!(bvh.ray_hit(&p(0.0, 0.0, 0.0), &Vector3::x(), 1.0, 1e-9, &[]).is_none());
    }
}
