//! LLL lattice reduction of the rows of a real basis matrix.
//!
//! The reducer owns its Gram–Schmidt scratch (coefficients and squared
//! norms), so independent reductions never share state. Besides reducing the
//! basis in place it returns the unimodular matrix `U` with
//! `reduced = U · original`, which the Siegel reduction lifts to a modular
//! transformation.

use serde::{Deserialize, Serialize};

use crate::{DMat, IMat};

/// Slack in the Lovász test so that round-off never triggers an endless swap.
const LOVASZ_SLACK: f64 = 1e-13;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LllParams {
    /// Lovász constant in (1/4, 1).
    pub delta: f64,
}

impl Default for LllParams {
    fn default() -> Self {
        Self { delta: 0.75 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LllReducer {
    params: LllParams,
    mu: DMat,
    norms: Vec<f64>,
    swaps: usize,
}

impl LllReducer {
    pub fn new(params: LllParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    pub fn params(&self) -> LllParams {
        self.params
    }

    /// Number of swaps performed by the last call to [`reduce`](Self::reduce).
    pub fn swaps(&self) -> usize {
        self.swaps
    }

    /// Reduce the rows of `basis` in place; returns `U` with `reduced = U · original`.
    pub fn reduce(&mut self, basis: &mut DMat) -> IMat {
        let n = basis.nrows();
        let mut u = IMat::identity(n, n);
        self.swaps = 0;
        if n < 2 {
            return u;
        }
        self.gram_schmidt(basis);

        let delta = self.params.delta;
        let mut k = 1;
        while k < n {
            self.size_reduce(basis, &mut u, k, k - 1);
            let m = self.mu[(k, k - 1)];
            if self.norms[k] + LOVASZ_SLACK < (delta - m * m) * self.norms[k - 1] {
                self.swap(basis, &mut u, k);
                k = (k - 1).max(1);
            } else {
                for l in (0..k - 1).rev() {
                    self.size_reduce(basis, &mut u, k, l);
                }
                k += 1;
            }
        }
        tracing::trace!(dim = n, swaps = self.swaps, "lll reduction finished");
        u
    }

    fn gram_schmidt(&mut self, basis: &DMat) {
        let n = basis.nrows();
        self.mu = DMat::zeros(n, n);
        self.norms = vec![0.0; n];
        let mut ortho = basis.clone();
        for i in 0..n {
            for j in 0..i {
                let proj = basis.row(i).dot(&ortho.row(j));
                let m = if self.norms[j] > 0.0 { proj / self.norms[j] } else { 0.0 };
                self.mu[(i, j)] = m;
                for c in 0..basis.ncols() {
                    ortho[(i, c)] -= m * ortho[(j, c)];
                }
            }
            self.norms[i] = ortho.row(i).norm_squared();
        }
    }

    fn size_reduce(&mut self, basis: &mut DMat, u: &mut IMat, k: usize, l: usize) {
        if self.mu[(k, l)].abs() <= 0.5 {
            return;
        }
        let r = (self.mu[(k, l)] + 0.5).floor();
        let ri = r as i64;
        for c in 0..basis.ncols() {
            basis[(k, c)] -= r * basis[(l, c)];
        }
        for c in 0..u.ncols() {
            u[(k, c)] -= ri * u[(l, c)];
        }
        for j in 0..l {
            self.mu[(k, j)] -= r * self.mu[(l, j)];
        }
        self.mu[(k, l)] -= r;
    }

    fn swap(&mut self, basis: &mut DMat, u: &mut IMat, k: usize) {
        self.swaps += 1;
        let n = basis.nrows();
        let m = self.mu[(k, k - 1)];
        let b = self.norms[k] + m * m * self.norms[k - 1];
        self.mu[(k, k - 1)] = m * self.norms[k - 1] / b;
        self.norms[k] *= self.norms[k - 1] / b;
        self.norms[k - 1] = b;

        basis.swap_rows(k, k - 1);
        u.swap_rows(k, k - 1);
        for j in 0..k - 1 {
            let t = self.mu[(k - 1, j)];
            self.mu[(k - 1, j)] = self.mu[(k, j)];
            self.mu[(k, j)] = t;
        }
        for i in k + 1..n {
            let t = self.mu[(i, k)];
            self.mu[(i, k)] = self.mu[(i, k - 1)] - m * t;
            self.mu[(i, k - 1)] = t + self.mu[(k, k - 1)] * self.mu[(i, k)];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::int_to_real;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn check_reduced(original: &DMat, reduced: &DMat, u: &IMat, delta: f64) {
        let back = int_to_real(u) * original;
        for (x, y) in back.iter().zip(reduced.iter()) {
            assert!((x - y).abs() < 1e-9, "U·B differs from reduced basis");
        }
        let det = int_to_real(u).determinant();
        assert!((det.abs() - 1.0).abs() < 1e-9, "U not unimodular: det = {det}");

        // Recompute Gram–Schmidt on the result and test both LLL conditions.
        let mut r = LllReducer::new(LllParams { delta });
        r.gram_schmidt(reduced);
        let n = reduced.nrows();
        for i in 1..n {
            for j in 0..i {
                assert!(r.mu[(i, j)].abs() <= 0.5 + 1e-9);
            }
            let m = r.mu[(i, i - 1)];
            assert!(r.norms[i] + 1e-9 >= (delta - m * m) * r.norms[i - 1]);
        }
    }

    #[test]
    fn test_reduce_skewed_2d() {
        let original = DMat::from_row_slice(2, 2, &[1.0, 0.0, 7.3, 0.2]);
        let mut basis = original.clone();
        let mut reducer = LllReducer::new(LllParams::default());
        let u = reducer.reduce(&mut basis);
        check_reduced(&original, &basis, &u, 0.75);
        assert!(basis.row(1).norm() < 1.0);
    }

    #[test]
    fn test_reduce_random_bases() {
        let mut rng = StdRng::seed_from_u64(42);
        for dim in 2..6 {
            let original = DMat::from_fn(dim, dim, |_, _| rng.gen_range(-20.0..20.0));
            let mut basis = original.clone();
            let mut reducer = LllReducer::new(LllParams::default());
            let u = reducer.reduce(&mut basis);
            check_reduced(&original, &basis, &u, 0.75);
        }
    }

    #[test]
    fn test_reduced_basis_is_fixed() {
        let original = DMat::identity(3, 3);
        let mut basis = original.clone();
        let mut reducer = LllReducer::new(LllParams::default());
        let u = reducer.reduce(&mut basis);
        assert_eq!(u, IMat::identity(3, 3));
        assert_eq!(reducer.swaps(), 0);
    }
}
