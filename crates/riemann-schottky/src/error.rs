//! Error types for riemann-schottky.

use riemann_math::MathError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchottkyError {
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("isometric circles of the generators intersect")]
    NotClassical,

    #[error("cannot guarantee convergence of the group series (q = {q})")]
    ConvergenceNotGuaranteed { q: f64 },

    #[error("stopped after computing more than {limit} group elements")]
    TooManyElements { limit: usize },

    #[error("requested accuracy not reached before word length {word_length}")]
    AccuracyNotReached { word_length: usize },

    #[error("series could not be evaluated because of numerical instabilities")]
    NumericalInstability,

    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid word: {0}")]
    InvalidWord(String),

    #[error(transparent)]
    Math(#[from] MathError),
}

pub type Result<T> = std::result::Result<T, SchottkyError>;
