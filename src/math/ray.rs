use super::{Aabb, Point3, Vector3};

/// A triangle in 3D space.
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub v0: Point3,
    pub v1: Point3,
    pub v2: Point3,
}

impl Triangle {
    /// Creates a triangle from three corners.
    #[must_use]
    pub fn new(v0: Point3, v1: Point3, v2: Point3) -> Self {
        Self { v0, v1, v2 }
    }

    /// Centroid of the three corners.
    #[must_use]
    pub fn centroid(&self) -> Point3 {
        Point3::from((self.v0.coords + self.v1.coords + self.v2.coords) / 3.0)
    }

    /// Bounding box of the triangle.
    #[must_use]
    pub fn aabb(&self) -> Aabb {
        Aabb::from_points([&self.v0, &self.v1, &self.v2])
    }
}

/// Barycentric slack so rays through shared edges and vertices still register.
const BARY_SLACK: f64 = 1e-9;

/// Möller–Trumbore ray-triangle intersection.
///
/// Returns the ray parameter `t > epsilon` of the hit, if any. Both faces
/// of the triangle are hit (no back-face culling).
#[must_use]
#[allow(clippy::many_single_char_names)]
pub fn ray_triangle_intersect(
    origin: &Point3,
    direction: &Vector3,
    tri: &Triangle,
    epsilon: f64,
) -> Option<f64> {
    let edge1 = tri.v1 - tri.v0;
    let edge2 = tri.v2 - tri.v0;

    let h = direction.cross(&edge2);
    let a = edge1.dot(&h);

    // Ray is parallel to triangle
    if a.abs() < 1e-14 {
        return None;
    }

    let f = 1.0 / a;
    let s = origin - tri.v0;
    let u = f * s.dot(&h);
    if !(-BARY_SLACK..=1.0 + BARY_SLACK).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = f * direction.dot(&q);
    if v < -BARY_SLACK || u + v > 1.0 + BARY_SLACK {
        return None;
    }

    let t = f * edge2.dot(&q);
    if t > epsilon {
        Some(t)
    } else {
        None
    }
}
