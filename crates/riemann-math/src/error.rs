//! Error types for riemann-math.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MathError {
    #[error("matrix is singular")]
    SingularMatrix,

    #[error("matrix is not positive definite")]
    NotPositiveDefinite,

    #[error("transformation is not loxodromic")]
    NotLoxodromic,

    #[error("iteration did not converge after {iterations} steps")]
    NoConvergence { iterations: usize },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, MathError>;
