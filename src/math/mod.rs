pub mod aabb;
pub mod fbm;
pub mod polygon_3d;
pub mod ray;
pub mod seed;

pub use aabb::Aabb;
pub use fbm::Fbm;
pub use ray::{ray_triangle_intersect, Triangle};
pub use seed::mix_seed;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// 3x3 matrix, used for orthonormal frames (columns are the X, Y, Z axes).
pub type Matrix3 = nalgebra::Matrix3<f64>;

/// Tolerance for areas and lengths below which elements are treated as degenerate.
pub const AREA_EPSILON: f64 = 1e-12;
