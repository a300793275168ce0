use thiserror::Error;

/// Top-level error type for the finishing pipeline.
#[derive(Debug, Error)]
pub enum PolishError {
    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

/// Errors related to the mesh arena.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("invalid topology: {0}")]
    InvalidTopology(String),
}

/// Errors raised by a single mesh operation.
///
/// Inside the finishing stack these are recoverable: the step is skipped
/// and the mesh is restored to its state before the step.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("operation failed: {0}")]
    Failed(String),

    #[error(transparent)]
    Topology(#[from] TopologyError),
}

/// Errors related to run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("parameter {parameter} = {value} is out of range [{min}, {max}]")]
    OutOfRange {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    /// Checks that `value` lies in `[min, max]`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] otherwise (including for NaN).
    pub fn check_range(parameter: &'static str, value: f64, min: f64, max: f64) -> std::result::Result<(), Self> {
        if (min..=max).contains(&value) {
            Ok(())
        } else {
            Err(Self::OutOfRange {
                parameter,
                value,
                min,
                max,
            })
        }
    }
}

/// Errors reported by external collaborators (shape builders).
///
/// These abort the whole run.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("shape builder failed: {0}")]
    BuildFailed(String),

    #[error("slot metadata unavailable: {0}")]
    MetadataUnavailable(String),
}

/// Convenience type alias for results using [`PolishError`].
pub type Result<T> = std::result::Result<T, PolishError>;

/// Result of a single mesh operation.
pub type OpResult<T> = std::result::Result<T, OperationError>;
