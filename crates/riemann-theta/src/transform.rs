//! Quasi-periodic reduction of the theta argument.
//!
//! With `M = −round(ReB⁻¹ Re z)` and `N = round((ImB·M + Im z)/(−2π))`,
//! `θ(z) = exp(½ MᵀBM + Mᵀz) θ(z + BM + 2πiN)`, and the real part of the
//! shifted argument lies in the box where `ReB⁻¹ Re z` is at most ½ in
//! every coordinate.

use riemann_math::linalg;
use riemann_math::{CMat, CVec, Complex, DMat, DVec, TWO_PI};

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct QuasiPeriodicShift {
    re_b: DMat,
    im_b: DMat,
    re_b_inv: DMat,
}

/// Result of [`QuasiPeriodicShift::apply`].
#[derive(Debug, Clone)]
pub struct ShiftedArgument {
    /// `z + BM + 2πiN`.
    pub z: CVec,
    pub m: DVec,
    pub n: DVec,
    /// `½ MᵀBM + Mᵀz`.
    pub factor: Complex,
    /// `−½ (Re z)ᵀ ReB⁻¹ (Re z)`, the part of the factor that varies
    /// continuously with `z`.
    pub continuous: f64,
}

impl QuasiPeriodicShift {
    pub fn new(period: &CMat) -> Result<Self> {
        let re_b = linalg::re(period);
        let re_b_inv = linalg::inverse(&re_b)?;
        Ok(Self {
            re_b,
            im_b: linalg::im(period),
            re_b_inv,
        })
    }

    pub fn dim(&self) -> usize {
        self.re_b.nrows()
    }

    pub fn re_b_inv(&self) -> &DMat {
        &self.re_b_inv
    }

    pub fn apply(&self, z: &CVec) -> ShiftedArgument {
        let x = linalg::re_vec(z);
        let y = linalg::im_vec(z);
        let b_inv_x = &self.re_b_inv * &x;
        let m = -linalg::round_vec(&b_inv_x);
        let n = linalg::round_vec(&((&self.im_b * &m + &y) / -TWO_PI));

        let re_bm = &self.re_b * &m;
        let im_bm = &self.im_b * &m;
        let shifted_re = &x + &re_bm;
        let shifted_im = &y + &im_bm + &n * TWO_PI;
        let factor = Complex::new(
            re_bm.dot(&m) / 2.0 + x.dot(&m),
            im_bm.dot(&m) / 2.0 + y.dot(&m),
        );
        ShiftedArgument {
            z: CVec::from_fn(z.len(), |i, _| Complex::new(shifted_re[i], shifted_im[i])),
            m,
            n,
            factor,
            continuous: -0.5 * x.dot(&b_inv_x),
        }
    }
}
