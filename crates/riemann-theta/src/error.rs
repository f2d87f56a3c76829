//! Error types for riemann-theta.

use riemann_math::MathError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ThetaError {
    #[error("period matrix is not square")]
    NotSquare,

    #[error("period matrix is not symmetric")]
    NotSymmetric,

    #[error("real part of the period matrix is not negative definite")]
    NotNegativeDefinite,

    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("period matrix is empty")]
    Empty,

    #[error("transformation is not symplectic")]
    NotSymplectic,

    #[error(transparent)]
    Math(#[from] MathError),
}

pub type Result<T> = std::result::Result<T, ThetaError>;
