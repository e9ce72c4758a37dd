use nalgebra::RealField;
use thiserror::Error;

use crate::expr::EvalError;

/// The base trait for [`Function`](super::function::Function).
pub trait Problem {
    /// Type of the scalar, usually f32 or f64.
    type Field: RealField + Copy;

    /// Number of variables of the problem.
    fn dim(&self) -> usize;
}

/// Error encountered while applying variables to the function.
#[derive(Debug, Error)]
pub enum ProblemError {
    /// The number of variables does not match the dimensionality
    /// ([`Problem::dim`]) of the problem.
    #[error("invalid dimensionality: expected {expected}, got {actual}")]
    InvalidDimensionality {
        /// Dimension of the problem.
        expected: usize,
        /// Length of the passed point.
        actual: usize,
    },
    /// Evaluation of the underlying expression failed.
    #[error("evaluation failed: {0}")]
    Evaluation(#[from] EvalError),
}
