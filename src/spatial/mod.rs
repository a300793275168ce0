mod bvh;

pub use bvh::{FaceBvh, RayHit};
