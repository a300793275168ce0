mod area;
mod components;
mod stats;
mod volume;

pub use area::{Area, SlotAreas};
pub use components::{connected_components, face_islands};
pub use stats::{CalculatePhysicalStats, DensityTable, PhysicalStats, VOLUME_EPSILON};
pub use volume::{ring_signed_volume, Volume};
