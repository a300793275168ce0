mod align;
mod inflate;

pub use align::{Align, Pivot};
pub use inflate::Inflate;
