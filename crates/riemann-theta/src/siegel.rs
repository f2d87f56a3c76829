//! Siegel reduction of a period matrix.
//!
//! Works on `P = −B`, whose real part is positive definite, and repeats
//! three steps until none of them changes anything:
//!
//! 1. LLL-reduce the rows of the Cholesky factor of `Re P` and apply the
//!    unimodular change of basis,
//! 2. invert the first coordinate when `|P₀₀| < 2π`,
//! 3. shift the entries of `Im P` into `[−π, π)`.
//!
//! Each step is recorded both as an integral symplectic matrix and as an
//! exact transformation law for the theta function.

use riemann_math::linalg::{self, int_to_complex};
use riemann_math::{two_pi_i, CMat, DMat, IMat, LllParams, LllReducer, MathError, TWO_PI};

use crate::error::{Result, ThetaError};
use crate::modular::{check_period_matrix, ModularSupport, ModularTransformation};

const MAX_ITERATIONS: usize = 1000;

/// Slack on the `|P₀₀| ≥ 2π` test.
const SPECIAL_SLACK: f64 = 1e-13;

#[derive(Debug, Clone)]
pub struct SiegelReduction {
    transformation: ModularTransformation,
    law: ModularSupport,
    reduced: CMat,
    cholesky: DMat,
    iterations: usize,
}

impl SiegelReduction {
    pub fn new(period: &CMat) -> Result<Self> {
        Self::with_params(period, LllParams::default())
    }

    pub fn with_params(period: &CMat, params: LllParams) -> Result<Self> {
        let dim = check_period_matrix(period)?;
        let p = -period.clone();
        let mut reducer = LllReducer::new(params);
        let mut modular = ModularTransformation::identity(dim);
        let mut law = ModularSupport::identity(period);
        let mut tpm = p.clone();
        let mut iterations = 0;

        loop {
            if iterations == MAX_ITERATIONS {
                return Err(MathError::NoConvergence { iterations }.into());
            }
            iterations += 1;
            let mut changed = false;

            let mut basis = linalg::cholesky_lower(&linalg::re(&tpm))
                .map_err(|_| ThetaError::NotNegativeDefinite)?;
            let u = reducer.reduce(&mut basis);
            if !linalg::is_identity_int(&u) {
                modular = push(ModularTransformation::lattice_change(&u)?, &modular)?;
                law = law.then(&ModularSupport::lattice_change(&u, &-tpm.clone())?);
                let uc = int_to_complex(&u);
                tpm = &uc * &tpm * uc.transpose();
                changed = true;
            }

            if tpm[(0, 0)].norm_sqr() + SPECIAL_SLACK <= TWO_PI * TWO_PI {
                modular = push(ModularTransformation::special(dim), &modular)?;
                law = law.then(&ModularSupport::special(&-tpm.clone())?);
                tpm = modular.transform_period_matrix(&p)?;
                changed = true;
            }

            let mut s = IMat::zeros(dim, dim);
            for i in 0..dim {
                for j in i..dim {
                    let k = -((tpm[(i, j)].im / TWO_PI + 0.5).floor() as i64);
                    s[(i, j)] = k;
                    s[(j, i)] = k;
                }
            }
            if s.iter().any(|&k| k != 0) {
                modular = push(ModularTransformation::shift(&s), &modular)?;
                law = law.then(&ModularSupport::shift(&-s.clone(), &-tpm.clone())?);
                tpm += int_to_complex(&s) * two_pi_i();
                changed = true;
            }

            tracing::trace!(iteration = iterations, changed, "siegel step");
            if !changed {
                break;
            }
        }

        let transformation = modular.for_negated();
        let reduced = transformation.transform_period_matrix(period)?;
        let cholesky = linalg::cholesky_lower(&-linalg::re(&reduced))
            .map_err(|_| ThetaError::NotNegativeDefinite)?;
        tracing::debug!(
            dim,
            iterations,
            identity = transformation.is_identity(),
            "siegel reduction finished"
        );
        Ok(Self {
            transformation,
            law,
            reduced,
            cholesky,
            iterations,
        })
    }

    /// The transformation taking the input to the reduced matrix.
    pub fn transformation(&self) -> &ModularTransformation {
        &self.transformation
    }

    /// Exact theta transformation law from the input to the reduced matrix.
    pub fn law(&self) -> &ModularSupport {
        &self.law
    }

    pub fn reduced_period_matrix(&self) -> &CMat {
        &self.reduced
    }

    /// Lower Cholesky factor `L` of `−Re B'`; its rows form a reduced basis.
    pub fn cholesky(&self) -> &DMat {
        &self.cholesky
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

fn push(step: ModularTransformation, modular: &ModularTransformation) -> Result<ModularTransformation> {
    let next = step.compose(modular);
    if !next.is_symplectic() {
        return Err(ThetaError::NotSymplectic);
    }
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use riemann_math::Complex;
    use std::f64::consts::PI;

    fn random_period_matrix(rng: &mut StdRng, dim: usize, scale: f64) -> CMat {
        let m = DMat::from_fn(dim, dim, |_, _| rng.gen_range(-1.0..1.0));
        let re = -(&m * m.transpose() + DMat::identity(dim, dim) * 0.2) * scale;
        let mut im = DMat::from_fn(dim, dim, |_, _| rng.gen_range(-10.0..10.0));
        im = (&im + im.transpose()) * 0.5;
        linalg::from_parts(&re, &im)
    }

    #[test]
    fn test_reduced_matrix_is_unchanged() {
        let b = CMat::from_row_slice(
            2,
            2,
            &[
                Complex::new(-8.0, 1.0),
                Complex::new(0.5, 0.0),
                Complex::new(0.5, 0.0),
                Complex::new(-9.0, 0.0),
            ],
        );
        let siegel = SiegelReduction::new(&b).unwrap();
        assert!(siegel.transformation().is_identity());
        assert_eq!(siegel.iterations(), 1);
        for (x, y) in siegel.reduced_period_matrix().iter().zip(b.iter()) {
            assert!((x - y).norm() < 1e-12);
        }
    }

    #[test]
    fn test_genus_one_inversion() {
        let b = CMat::from_element(1, 1, Complex::new(-0.5, 0.0));
        let siegel = SiegelReduction::new(&b).unwrap();
        let reduced = siegel.reduced_period_matrix()[(0, 0)];
        assert!((reduced - Complex::new(-8.0 * PI * PI, 0.0)).norm() < 1e-9);
        let t = siegel.transformation();
        assert_eq!(t.b()[(0, 0)], 1);
        assert_eq!(t.c()[(0, 0)], -1);
    }

    #[test]
    fn test_random_matrices_are_reduced() {
        let mut rng = StdRng::seed_from_u64(11);
        for dim in 1..5 {
            for &scale in &[0.3, 3.0, 30.0] {
                let b = random_period_matrix(&mut rng, dim, scale);
                let siegel = SiegelReduction::new(&b).unwrap();
                let t = siegel.transformation();
                assert!(t.is_symplectic());

                let reduced = siegel.reduced_period_matrix();
                assert!(check_period_matrix(reduced).is_ok());
                assert!(reduced[(0, 0)].norm() >= TWO_PI - 1e-6);
                for z in reduced.iter() {
                    assert!(z.im.abs() <= PI + 1e-6, "Im entry {} not reduced", z.im);
                }

                assert_eq!(siegel.law().transformation(), t);
                for (x, y) in siegel
                    .law()
                    .transformed_period_matrix()
                    .iter()
                    .zip(reduced.iter())
                {
                    assert!((x - y).norm() < 1e-6 * (1.0 + y.norm()));
                }
            }
        }
    }

    #[test]
    fn test_rejects_invalid_input() {
        let b = CMat::from_element(1, 1, Complex::new(1.0, 0.0));
        assert!(matches!(SiegelReduction::new(&b), Err(ThetaError::NotNegativeDefinite)));
    }
}
