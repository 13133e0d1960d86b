//! Error types shared by the modeling algorithms.

use crate::distributions::DistributionError;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors raised by evaluation, forecasting, regression and estimation models.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    /// The input slice or matrix has no elements.
    #[error("empty input: {0}")]
    EmptyInput(&'static str),

    /// Two inputs that must agree in length or shape do not.
    #[error("{context}: expected {expected}, got {got}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        got: usize,
    },

    /// Fewer observations than the model needs.
    #[error("{context}: need at least {required} observations, got {got}")]
    InsufficientData {
        context: &'static str,
        required: usize,
        got: usize,
    },

    /// A scalar argument is outside its admissible range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// A matrix that must be square is not.
    #[error("matrix must be square, got {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },

    /// A pairwise comparison matrix failed the consistency check.
    #[error("consistency ratio {cr:.4} is not below {threshold}")]
    Inconsistent { cr: f64, threshold: f64 },

    /// A linear system could not be solved.
    #[error("singular system: {0}")]
    Singular(String),

    /// An iterative method hit its iteration cap.
    #[error("{context} did not converge after {iterations} iterations")]
    NoConvergence {
        context: &'static str,
        iterations: usize,
    },

    /// A configuration file could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Distribution(#[from] DistributionError),
}

impl ModelError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        ModelError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    pub(crate) fn mismatch(context: &'static str, expected: usize, got: usize) -> Self {
        ModelError::DimensionMismatch {
            context,
            expected,
            got,
        }
    }

    pub(crate) fn insufficient(context: &'static str, required: usize, got: usize) -> Self {
        ModelError::InsufficientData {
            context,
            required,
            got,
        }
    }
}
