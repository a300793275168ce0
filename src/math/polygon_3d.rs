use super::{Point2, Point3, Vector3, AREA_EPSILON};

/// Newell area vector of a polygon.
///
/// The direction is the polygon normal (right-hand rule on the winding) and
/// the length is twice the polygon area. Robust for slightly non-planar rings.
#[must_use]
pub fn newell_vector(points: &[Point3]) -> Vector3 {
    let n = points.len();
    let mut normal = Vector3::zeros();
    for i in 0..n {
        let a = &points[i];
        let b = &points[(i + 1) % n];
        normal.x += (a.y - b.y) * (a.z + b.z);
        normal.y += (a.z - b.z) * (a.x + b.x);
        normal.z += (a.x - b.x) * (a.y + b.y);
    }
    normal
}

/// Unit normal of a polygon, or `None` when the polygon has no area.
#[must_use]
pub fn polygon_normal(points: &[Point3]) -> Option<Vector3> {
    if points.len() < 3 {
        return None;
    }
    newell_vector(points).try_normalize(AREA_EPSILON)
}

/// Area of a 3D polygon.
#[must_use]
pub fn polygon_area(points: &[Point3]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    newell_vector(points).norm() * 0.5
}

/// Area-weighted centroid of a 3D polygon.
///
/// Falls back to the vertex average when the polygon has no area.
#[must_use]
pub fn polygon_centroid(points: &[Point3]) -> Point3 {
    if points.is_empty() {
        return Point3::origin();
    }
    let mean = vertex_mean(points);
    if points.len() < 3 {
        return mean;
    }

    let mut weighted = Vector3::zeros();
    let mut total = 0.0;
    let n = points.len();
    for i in 0..n {
        let a = &points[i];
        let b = &points[(i + 1) % n];
        let area = (a - mean).cross(&(b - mean)).norm() * 0.5;
        weighted += (mean.coords + a.coords + b.coords) / 3.0 * area;
        total += area;
    }

    if total < AREA_EPSILON {
        mean
    } else {
        Point3::from(weighted / total)
    }
}

/// Arithmetic mean of a set of points.
#[must_use]
pub fn vertex_mean(points: &[Point3]) -> Point3 {
    if points.is_empty() {
        return Point3::origin();
    }
    #[allow(clippy::cast_precision_loss)]
    let inv = 1.0 / points.len() as f64;
    Point3::from(points.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords) * inv)
}

/// Closest point to `point` on the segment `a`-`b`.
#[must_use]
pub fn closest_point_on_segment(point: &Point3, a: &Point3, b: &Point3) -> Point3 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq < AREA_EPSILON {
        return *a;
    }
    let t = ((point - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Builds an orthonormal `(u, v)` basis spanning the plane with the given normal.
#[must_use]
pub fn plane_basis(normal: &Vector3) -> (Vector3, Vector3) {
    let helper = if normal.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let u = helper.cross(normal).normalize();
    let v = normal.cross(&u);
    (u, v)
}

/// Projects points onto the plane through `origin` spanned by `(u, v)`.
#[must_use]
pub fn project_to_plane(points: &[Point3], origin: &Point3, u: &Vector3, v: &Vector3) -> Vec<Point2> {
    points
        .iter()
        .map(|p| {
            let d = p - origin;
            Point2::new(d.dot(u), d.dot(v))
        })
        .collect()
}

/// Signed area of a 2D polygon (positive when counter-clockwise).
#[must_use]
pub fn signed_area_2d(points: &[Point2]) -> f64 {
    let n = points.len();
    let mut sum = 0.0;
    for i in 0..n {
        let a = &points[i];
        let b = &points[(i + 1) % n];
        sum += a.x * b.y - b.x * a.y;
    }
    sum * 0.5
}

/// Winding number of `point` with respect to a 2D polygon.
///
/// Non-zero => inside, zero => outside.
#[must_use]
pub fn winding_number_2d(point: &Point2, verts: &[Point2]) -> i32 {
    let n = verts.len();
    let mut winding = 0i32;
    for i in 0..n {
        let a = &verts[i];
        let b = &verts[(i + 1) % n];
        let cross = (b.x - a.x) * (point.y - a.y) - (b.y - a.y) * (point.x - a.x);
        if a.y <= point.y {
            if b.y > point.y && cross > 0.0 {
                winding += 1;
            }
        } else if b.y <= point.y && cross < 0.0 {
            winding -= 1;
        }
    }
    winding
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn unit_square() -> Vec<Point3> {
        vec![
            p(0.0, 0.0, 0.0),
            p(1.0, 0.0, 0.0),
            p(1.0, 1.0, 0.0),
            p(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn square_normal_follows_winding() {
        let n = polygon_normal(&unit_square()).unwrap_or_else(Vector3::zeros);
        assert!((n - Vector3::z()).norm() < 1e-12);

        let mut reversed = unit_square();
        reversed.reverse();
        let n = polygon_normal(&reversed).unwrap_or_else(Vector3::zeros);
        assert!((n + Vector3::z()).norm() < 1e-12);
    }

    #[test]
    fn square_area_and_centroid() {
        assert!((polygon_area(&unit_square()) - 1.0).abs() < 1e-12);
        let c = polygon_centroid(&unit_square());
        assert!((c - p(0.5, 0.5, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn centroid_is_area_weighted() {
        // Extra collinear vertex shifts the plain mean but not the area centroid.
        let pts = vec![
            p(0.0, 0.0, 0.0),
            p(0.5, 0.0, 0.0),
            p(1.0, 0.0, 0.0),
            p(1.0, 1.0, 0.0),
            p(0.0, 1.0, 0.0),
        ];
        let c = polygon_centroid(&pts);
        assert!((c - p(0.5, 0.5, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn degenerate_polygon_has_no_normal() {
        let line = vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(2.0, 0.0, 0.0)];
        assert!(polygon_normal(&line).is_none());
        assert!(polygon_area(&line) < 1e-12);
    }

    #[test]
    fn closest_point_clamps_to_segment() {
        let a = p(0.0, 0.0, 0.0);
        let b = p(2.0, 0.0, 0.0);
        assert_eq!(closest_point_on_segment(&p(1.0, 1.0, 0.0), &a, &b), p(1.0, 0.0, 0.0));
        assert_eq!(closest_point_on_segment(&p(-3.0, 1.0, 0.0), &a, &b), a);
        assert_eq!(closest_point_on_segment(&p(5.0, 1.0, 0.0), &a, &b), b);
    }

    #[test]
    fn plane_basis_is_orthonormal() {
        let n = Vector3::new(0.3, -0.4, 0.8).normalize();
        let (u, v) = plane_basis(&n);
        assert!(u.dot(&v).abs() < 1e-12);
        assert!(u.dot(&n).abs() < 1e-12);
        assert!((u.norm() - 1.0).abs() < 1e-12);
        assert!((v.norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn winding_number_inside_outside() {
        let sq = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        assert_ne!(winding_number_2d(&Point2::new(0.5, 0.5), &sq), 0);
        assert_eq!(winding_number_2d(&Point2::new(1.5, 0.5), &sq), 0);
        assert!(signed_area_2d(&sq) > 0.0);
    }
}
