mod degenerate;
mod orient;
mod weld;

pub use degenerate::{DegenerateReport, RemoveDegenerate};
pub(crate) use orient::{component_signed_volume, oriented_components};
pub use orient::OrientFaces;
pub use weld::WeldByDistance;
