//! Numeric primitives for Schottky uniformization and theta functions.
//!
//! Everything here is plain, allocation-light arithmetic that the group and
//! theta crates call into:
//!
//! - [`complex`]: complex scalar helpers (cross-ratio, L1 norm, reduction mod 2πi)
//! - [`moebius`]: SL(2,C) Möbius transformations with the stable difference
//!   formulas used by the series estimators
//! - [`linalg`]: Cholesky factors, symmetry checks and complex matrix helpers
//! - [`lll`]: LLL lattice reduction tracking the unimodular transform
//! - [`special`]: Gamma, upper incomplete Gamma, safeguarded Newton iteration

pub mod complex;
pub mod error;
pub mod linalg;
pub mod lll;
pub mod moebius;
pub mod special;

pub use complex::{cross_ratio, l1_norm, Complex};
pub use error::{MathError, Result};
pub use lll::{LllParams, LllReducer};
pub use moebius::Moebius;

use nalgebra as na;

/// Dynamic real vector.
pub type DVec = na::DVector<f64>;
/// Dynamic real matrix.
pub type DMat = na::DMatrix<f64>;
/// Dynamic complex vector.
pub type CVec = na::DVector<Complex>;
/// Dynamic complex matrix.
pub type CMat = na::DMatrix<Complex>;
/// Dynamic integer matrix.
pub type IMat = na::DMatrix<i64>;

/// 2π.
pub const TWO_PI: f64 = 2.0 * std::f64::consts::PI;

/// 2πi.
#[inline]
pub fn two_pi_i() -> Complex {
    Complex::new(0.0, TWO_PI)
}
