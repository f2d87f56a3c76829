//! Small dense linear-algebra helpers over nalgebra's dynamic matrices.

use nalgebra as na;

use crate::complex::Complex;
use crate::error::{MathError, Result};
use crate::{CMat, CVec, DMat, DVec, IMat};

/// Lower Cholesky factor `L` with `L Lᵀ = a`.
pub fn cholesky_lower(a: &DMat) -> Result<DMat> {
    na::Cholesky::new(a.clone())
        .map(|c| c.l())
        .ok_or(MathError::NotPositiveDefinite)
}

/// Upper Cholesky factor `T` with `Tᵀ T = a`.
pub fn cholesky_upper(a: &DMat) -> Result<DMat> {
    Ok(cholesky_lower(a)?.transpose())
}

pub fn inverse(a: &DMat) -> Result<DMat> {
    a.clone().try_inverse().ok_or(MathError::SingularMatrix)
}

pub fn inverse_complex(a: &CMat) -> Result<CMat> {
    a.clone().try_inverse().ok_or(MathError::SingularMatrix)
}

pub fn re(a: &CMat) -> DMat {
    a.map(|z| z.re)
}

pub fn im(a: &CMat) -> DMat {
    a.map(|z| z.im)
}

pub fn re_vec(v: &CVec) -> DVec {
    v.map(|z| z.re)
}

pub fn im_vec(v: &CVec) -> DVec {
    v.map(|z| z.im)
}

/// `re + i·im`.
pub fn from_parts(re: &DMat, im: &DMat) -> CMat {
    re.zip_map(im, Complex::new)
}

pub fn to_complex(a: &DMat) -> CMat {
    a.map(|x| Complex::new(x, 0.0))
}

pub fn int_to_real(a: &IMat) -> DMat {
    a.map(|x| x as f64)
}

pub fn int_to_complex(a: &IMat) -> CMat {
    a.map(|x| Complex::new(x as f64, 0.0))
}

/// Componentwise round-half-up, matching `floor(x + 0.5)`.
pub fn round_vec(v: &DVec) -> DVec {
    v.map(|x| (x + 0.5).floor())
}

pub fn is_symmetric(a: &CMat, tol: f64) -> bool {
    if !a.is_square() {
        return false;
    }
    let n = a.nrows();
    (0..n).all(|i| (i + 1..n).all(|j| (a[(i, j)] - a[(j, i)]).norm() <= tol))
}

pub fn is_identity_int(a: &IMat) -> bool {
    let n = a.nrows();
    a.is_square() && (0..n).all(|i| (0..n).all(|j| a[(i, j)] == i64::from(i == j)))
}

/// Inverse of a unimodular integer matrix, rounded back to integers.
pub fn unimodular_inverse(a: &IMat) -> Result<IMat> {
    let inv = inverse(&int_to_real(a))?;
    Ok(inv.map(|x| x.round() as i64))
}

/// Quadratic form `xᵀ A y` for complex operands.
pub fn bilinear(x: &CVec, a: &CMat, y: &CVec) -> Complex {
    x.dot(&(a * y))
}
