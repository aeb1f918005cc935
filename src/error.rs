//! Error type of the verification pipeline
use thiserror::Error;

/// Result type alias of this crate
pub type Result<T> = std::result::Result<T, VerifyError>;

/// Errors raised by the reference generator, the error
/// norm calculator, the order estimator and run loaders.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VerifyError {
    /// Malformed coordinates, non-positive viscosity, negative time, ...
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Simulated and reference arrays disagree in shape
    #[error("shape mismatch for field {field}: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        /// Field name
        field: String,
        /// Shape of the reference array
        expected: Vec<usize>,
        /// Shape of the simulated array
        found: Vec<usize>,
    },

    /// Shapes agree, but the coordinates the field is sampled on do not
    #[error("coordinate mismatch for field {field} along axis {axis}")]
    CoordinateMismatch {
        /// Field name
        field: String,
        /// Axis name (x, y or z)
        axis: &'static str,
    },

    /// Not enough (spacing, error) pairs for an order estimate
    #[error("insufficient data: need at least {required} points, found {found}")]
    InsufficientData {
        /// Minimum number of points
        required: usize,
        /// Supplied number of points
        found: usize,
    },

    /// Zero error, non-monotonic spacing, ...
    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    /// Run loader could not produce a run
    #[error("failed to load run {label}: {reason}")]
    LoadFailure {
        /// Run label
        label: String,
        /// Opaque reason reported by the loader
        reason: String,
    },
}

impl VerifyError {
    /// Shorthand for [`VerifyError::LoadFailure`]
    pub fn load_failure<L: Into<String>, R: ToString>(label: L, reason: R) -> Self {
        Self::LoadFailure {
            label: label.into(),
            reason: reason.to_string(),
        }
    }
}
