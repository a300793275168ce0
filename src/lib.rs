pub mod error;
pub mod manifest;
pub mod math;
pub mod operations;
pub mod pipeline;
pub mod spatial;
pub mod topology;

pub use error::{PolishError, Result};
pub use pipeline::{Pipeline, PipelineConfig, PipelineOutput, PrebuiltShape, ShapeBuilder};
