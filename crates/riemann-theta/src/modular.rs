//! Integral symplectic transformations of period matrices and the
//! transformation law of the theta function under them.
//!
//! A transformation `(a, b; c, d)` acts on `B = 2πiτ` by
//! `B' = 2πi (aB + 2πi b)(cB + 2πi d)⁻¹`, the usual action
//! `τ' = (aτ + b)(cτ + d)⁻¹` written for `B`.

use std::f64::consts::PI;

use riemann_math::linalg::{self, int_to_complex};
use riemann_math::{two_pi_i, CMat, CVec, Complex, IMat, MathError};

use crate::error::{Result, ThetaError};

const SYMMETRY_TOLERANCE: f64 = 1e-10;

/// Check that `b` is a non-empty symmetric square matrix with negative
/// definite real part. Returns the genus.
pub fn check_period_matrix(b: &CMat) -> Result<usize> {
    if b.nrows() == 0 || b.ncols() == 0 {
        return Err(ThetaError::Empty);
    }
    if !b.is_square() {
        return Err(ThetaError::NotSquare);
    }
    if b.iter().any(|z| !z.re.is_finite() || !z.im.is_finite()) {
        return Err(MathError::InvalidArgument("period matrix has non-finite entries".into()).into());
    }
    let scale = b.iter().fold(1.0_f64, |m, z| m.max(z.norm()));
    if !linalg::is_symmetric(b, SYMMETRY_TOLERANCE * scale) {
        return Err(ThetaError::NotSymmetric);
    }
    linalg::cholesky_lower(&-linalg::re(b)).map_err(|_| ThetaError::NotNegativeDefinite)?;
    Ok(b.nrows())
}

fn check_dim(expected: usize, found: usize) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(ThetaError::DimensionMismatch { expected, found })
    }
}

/// Integer symplectic matrix `(a, b; c, d)` of size `2g`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModularTransformation {
    a: IMat,
    b: IMat,
    c: IMat,
    d: IMat,
}

impl ModularTransformation {
    pub fn identity(dim: usize) -> Self {
        Self {
            a: IMat::identity(dim, dim),
            b: IMat::zeros(dim, dim),
            c: IMat::zeros(dim, dim),
            d: IMat::identity(dim, dim),
        }
    }

    /// Build from blocks, which must be square, of one size and symplectic.
    pub fn from_blocks(a: IMat, b: IMat, c: IMat, d: IMat) -> Result<Self> {
        let dim = a.nrows();
        for block in [&a, &b, &c, &d] {
            if !block.is_square() {
                return Err(ThetaError::NotSquare);
            }
            check_dim(dim, block.nrows())?;
        }
        let transformation = Self { a, b, c, d };
        if !transformation.is_symplectic() {
            return Err(ThetaError::NotSymplectic);
        }
        Ok(transformation)
    }

    /// Inversion in the first coordinate: `a₀₀ = d₀₀ = 0`, `b₀₀ = −1`,
    /// `c₀₀ = 1`, identity elsewhere.
    pub fn special(dim: usize) -> Self {
        let mut t = Self::identity(dim);
        if dim > 0 {
            t.a[(0, 0)] = 0;
            t.d[(0, 0)] = 0;
            t.b[(0, 0)] = -1;
            t.c[(0, 0)] = 1;
        }
        t
    }

    /// `(I, s; 0, I)`, i.e. `B ↦ B + 2πi s`. `s` must be symmetric for the
    /// result to be symplectic.
    pub fn shift(s: &IMat) -> Self {
        let mut t = Self::identity(s.nrows());
        t.b = s.clone();
        t
    }

    /// `(u, 0; 0, u⁻ᵀ)`, i.e. `B ↦ u B uᵀ`, for a unimodular `u`.
    pub fn lattice_change(u: &IMat) -> Result<Self> {
        if !u.is_square() {
            return Err(ThetaError::NotSquare);
        }
        let dim = u.nrows();
        let inverse = linalg::unimodular_inverse(u)?;
        let t = Self {
            a: u.clone(),
            b: IMat::zeros(dim, dim),
            c: IMat::zeros(dim, dim),
            d: inverse.transpose(),
        };
        if !t.is_symplectic() {
            return Err(ThetaError::NotSymplectic);
        }
        Ok(t)
    }

    pub fn dim(&self) -> usize {
        self.a.nrows()
    }

    pub fn a(&self) -> &IMat {
        &self.a
    }

    pub fn b(&self) -> &IMat {
        &self.b
    }

    pub fn c(&self) -> &IMat {
        &self.c
    }

    pub fn d(&self) -> &IMat {
        &self.d
    }

    pub fn is_identity(&self) -> bool {
        linalg::is_identity_int(&self.a)
            && linalg::is_identity_int(&self.d)
            && self.b.iter().all(|&x| x == 0)
            && self.c.iter().all(|&x| x == 0)
    }

    /// Matrix product `self · other`: acts by `other` first.
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            a: &self.a * &other.a + &self.b * &other.c,
            b: &self.a * &other.b + &self.b * &other.d,
            c: &self.c * &other.a + &self.d * &other.c,
            d: &self.c * &other.b + &self.d * &other.d,
        }
    }

    /// Inverse `(dᵀ, −bᵀ; −cᵀ, aᵀ)` of a symplectic matrix.
    pub fn invert(&self) -> Self {
        Self {
            a: self.d.transpose(),
            b: -self.b.transpose(),
            c: -self.c.transpose(),
            d: self.a.transpose(),
        }
    }

    /// Largest entry of the four symplectic relations
    /// `abᵀ = baᵀ`, `adᵀ − bcᵀ = I`, `cbᵀ − daᵀ = −I`, `cdᵀ = dcᵀ`.
    pub fn symplectic_defect(&self) -> i64 {
        let dim = self.dim();
        let id = IMat::identity(dim, dim);
        let (a, b, c, d) = (&self.a, &self.b, &self.c, &self.d);
        let relations = [
            a * b.transpose() - b * a.transpose(),
            a * d.transpose() - b * c.transpose() - &id,
            c * b.transpose() - d * a.transpose() + &id,
            c * d.transpose() - d * c.transpose(),
        ];
        relations
            .iter()
            .flat_map(|m| m.iter())
            .map(|x| x.abs())
            .max()
            .unwrap_or(0)
    }

    pub fn is_symplectic(&self) -> bool {
        self.symplectic_defect() == 0
    }

    /// The same transformation acting on `−B`: `(a, −b; −c, d)`.
    pub fn for_negated(&self) -> Self {
        Self {
            a: self.a.clone(),
            b: -self.b.clone(),
            c: -self.c.clone(),
            d: self.d.clone(),
        }
    }

    /// `2πi (aB + 2πi b)(cB + 2πi d)⁻¹`, symmetrized.
    pub fn transform_period_matrix(&self, period: &CMat) -> Result<CMat> {
        check_dim(self.dim(), period.nrows())?;
        let i2pi = two_pi_i();
        let e = int_to_complex(&self.a) * period + int_to_complex(&self.b) * i2pi;
        let f = int_to_complex(&self.c) * period + int_to_complex(&self.d) * i2pi;
        let transformed = e * linalg::inverse_complex(&f)? * i2pi;
        Ok(symmetrize(&transformed))
    }

    fn diag_of_product(x: &IMat, y: &IMat) -> CVec {
        let dim = x.nrows();
        CVec::from_fn(dim, |i, _| {
            let s: i64 = (0..dim).map(|j| x[(i, j)] * y[(i, j)]).sum();
            Complex::new(s as f64, 0.0)
        })
    }
}

fn symmetrize(m: &CMat) -> CMat {
    (m + m.transpose()) * Complex::new(0.5, 0.0)
}

/// Transformation law `θ(Z | B) = exp(factor(Z)) · θ(HZ + S | B')` for one
/// transformation and period matrix, with
/// `factor(Z) = RᵀZ − ZᵀAZ + δ`.
///
/// [`new`](Self::new) evaluates the closed formula, whose constant `δ` is
/// only determined up to an eighth root of unity in `exp(δ)`. The step
/// constructors ([`lattice_change`](Self::lattice_change),
/// [`shift`](Self::shift), [`special`](Self::special)) carry the exact
/// constants, and laws compose with [`then`](Self::then).
#[derive(Debug, Clone)]
pub struct ModularSupport {
    transformation: ModularTransformation,
    transformed: CMat,
    quadratic: CMat,
    h: CMat,
    s: CVec,
    r: CVec,
    delta: Complex,
}

impl ModularSupport {
    /// Closed transformation law of `transformation` at `period`.
    pub fn new(transformation: ModularTransformation, period: &CMat) -> Result<Self> {
        let dim = transformation.dim();
        check_dim(dim, period.nrows())?;
        let i2pi = two_pi_i();
        let half = Complex::new(0.5, 0.0);
        let a = int_to_complex(&transformation.a);
        let b = int_to_complex(&transformation.b);
        let c = int_to_complex(&transformation.c);
        let d = int_to_complex(&transformation.d);

        let e = &a * period + &b * i2pi;
        let f = &c * period + &d * i2pi;
        let g = linalg::inverse_complex(&f)?;
        let transformed = symmetrize(&(&e * &g * i2pi));
        let quadratic = &g * &c * half;
        let h = (&g * i2pi).transpose();

        let alpha = ModularTransformation::diag_of_product(&transformation.c, &transformation.d);
        let beta = ModularTransformation::diag_of_product(&transformation.a, &transformation.b);
        let w = &transformed * &alpha * half;
        let s = beta * Complex::new(0.0, PI) + &w;
        let r = h.transpose() * &alpha * half;
        let delta = w.dot(&alpha) / 4.0 + i2pi.ln() * (dim as f64 / 2.0) - f.determinant().ln() * 0.5;

        Ok(Self {
            transformation,
            transformed,
            quadratic,
            h,
            s,
            r,
            delta,
        })
    }

    /// `θ(Z | B) = θ(Z | B)`.
    pub fn identity(period: &CMat) -> Self {
        let dim = period.nrows();
        Self {
            transformation: ModularTransformation::identity(dim),
            transformed: period.clone(),
            quadratic: CMat::zeros(dim, dim),
            h: CMat::identity(dim, dim),
            s: CVec::zeros(dim),
            r: CVec::zeros(dim),
            delta: Complex::new(0.0, 0.0),
        }
    }

    /// `θ(Z | B) = θ(uZ | u B uᵀ)`.
    pub fn lattice_change(u: &IMat, period: &CMat) -> Result<Self> {
        let transformation = ModularTransformation::lattice_change(u)?;
        check_dim(transformation.dim(), period.nrows())?;
        let uc = int_to_complex(u);
        let transformed = symmetrize(&(&uc * period * uc.transpose()));
        Ok(Self {
            transformed,
            h: uc,
            ..Self::identity_with(transformation, period.nrows())
        })
    }

    /// `θ(Z | B) = θ(Z + πi diag(s) | B + 2πi s)` for a symmetric integer `s`.
    pub fn shift(s: &IMat, period: &CMat) -> Result<Self> {
        let transformation = ModularTransformation::shift(s);
        if !transformation.is_symplectic() {
            return Err(ThetaError::NotSymplectic);
        }
        let dim = transformation.dim();
        check_dim(dim, period.nrows())?;
        let transformed = period + int_to_complex(s) * two_pi_i();
        let shift = CVec::from_fn(dim, |i, _| Complex::new(0.0, PI * s[(i, i)] as f64));
        Ok(Self {
            transformed,
            s: shift,
            ..Self::identity_with(transformation, dim)
        })
    }

    /// Poisson summation in the first coordinate: the transformation
    /// `a₀₀ = d₀₀ = 0`, `b₀₀ = 1`, `c₀₀ = −1` with the constant
    /// `½ ln 2π − ½ Log(−B₀₀)` taken on the principal branch.
    pub fn special(period: &CMat) -> Result<Self> {
        let dim = period.nrows();
        if dim == 0 {
            return Err(ThetaError::Empty);
        }
        let mut law = Self::new(ModularTransformation::special(dim).for_negated(), period)?;
        law.delta = Complex::new(0.5 * (2.0 * PI).ln(), 0.0) - (-period[(0, 0)]).ln() * 0.5;
        Ok(law)
    }

    fn identity_with(transformation: ModularTransformation, dim: usize) -> Self {
        Self {
            transformation,
            transformed: CMat::zeros(dim, dim),
            quadratic: CMat::zeros(dim, dim),
            h: CMat::identity(dim, dim),
            s: CVec::zeros(dim),
            r: CVec::zeros(dim),
            delta: Complex::new(0.0, 0.0),
        }
    }

    /// Law of `next ∘ self`: `next` must start at this law's transformed
    /// period matrix.
    pub fn then(&self, next: &Self) -> Self {
        let h_tr = self.h.transpose();
        let sym2 = &next.quadratic + next.quadratic.transpose();
        let a2s = &next.quadratic * &self.s;
        Self {
            transformation: next.transformation.compose(&self.transformation),
            transformed: next.transformed.clone(),
            quadratic: &self.quadratic + &h_tr * &next.quadratic * &self.h,
            h: &next.h * &self.h,
            s: &next.h * &self.s + &next.s,
            r: &self.r + &h_tr * &next.r - &h_tr * sym2 * &self.s,
            delta: self.delta + next.delta + next.r.dot(&self.s) - self.s.dot(&a2s),
        }
    }

    pub fn transformation(&self) -> &ModularTransformation {
        &self.transformation
    }

    /// `B'`.
    pub fn transformed_period_matrix(&self) -> &CMat {
        &self.transformed
    }

    /// Linear part `H` of the argument map.
    pub fn h(&self) -> &CMat {
        &self.h
    }

    /// Constant part `S` of the argument map.
    pub fn s(&self) -> &CVec {
        &self.s
    }

    /// Quadratic part `A` of the factor.
    pub fn quadratic(&self) -> &CMat {
        &self.quadratic
    }

    pub fn r(&self) -> &CVec {
        &self.r
    }

    pub fn delta(&self) -> Complex {
        self.delta
    }

    /// `(HZ + S, RᵀZ − ZᵀAZ + δ)`.
    pub fn apply(&self, z: &CVec) -> (CVec, Complex) {
        let tz = &self.h * z + &self.s;
        let az = &self.quadratic * z;
        let factor = self.r.dot(z) - az.dot(z) + self.delta;
        (tz, factor)
    }

    /// Gradient at `z` of `factor(Z) + mᵀ(HZ + S)`: `Hᵀm + R − AᵀZ − AZ`.
    pub fn factor_gradient(&self, z: &CVec, m: &CVec) -> CVec {
        self.h.transpose() * m + &self.r - self.quadratic.transpose() * z - &self.quadratic * z
    }

    /// Second derivative of the factor in directions `x`, `y`:
    /// `−(xᵀAy + yᵀAx)`.
    pub fn factor_hessian(&self, x: &CVec, y: &CVec) -> Complex {
        -(linalg::bilinear(x, &self.quadratic, y) + linalg::bilinear(y, &self.quadratic, x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn genus2() -> CMat {
        CMat::from_row_slice(
            2,
            2,
            &[
                Complex::new(-2.0, 0.7),
                Complex::new(0.4, -0.3),
                Complex::new(0.4, -0.3),
                Complex::new(-3.0, 1.1),
            ],
        )
    }

    #[test]
    fn test_generators_are_symplectic() {
        assert!(ModularTransformation::identity(3).is_symplectic());
        assert!(ModularTransformation::special(3).is_symplectic());
        let s = IMat::from_row_slice(2, 2, &[1, -2, -2, 3]);
        assert!(ModularTransformation::shift(&s).is_symplectic());
        let u = IMat::from_row_slice(2, 2, &[2, 1, 1, 1]);
        assert!(ModularTransformation::lattice_change(&u).unwrap().is_symplectic());
        let bad = IMat::from_row_slice(2, 2, &[1, 2, 0, 1]);
        assert!(!ModularTransformation::shift(&bad).is_symplectic());
    }

    #[test]
    fn test_compose_and_invert() {
        let u = IMat::from_row_slice(2, 2, &[2, 1, 1, 1]);
        let s = IMat::from_row_slice(2, 2, &[1, 1, 1, 0]);
        let t = ModularTransformation::special(2)
            .compose(&ModularTransformation::lattice_change(&u).unwrap())
            .compose(&ModularTransformation::shift(&s));
        assert!(t.is_symplectic());
        assert!(t.compose(&t.invert()).is_identity());
        assert!(t.invert().compose(&t).is_identity());
        assert!(t.for_negated().is_symplectic());
    }

    #[test]
    fn test_from_blocks_rejects_non_symplectic() {
        let id = IMat::identity(2, 2);
        let zero = IMat::zeros(2, 2);
        let result = ModularTransformation::from_blocks(id.clone() * 2, zero.clone(), zero, id);
        assert!(matches!(result, Err(ThetaError::NotSymplectic)));
    }

    #[test]
    fn test_action_is_compatible_with_composition() {
        let b = genus2();
        let u = IMat::from_row_slice(2, 2, &[1, 1, 0, 1]);
        let first = ModularTransformation::lattice_change(&u).unwrap();
        let second = ModularTransformation::special(2);
        let stepwise = second
            .transform_period_matrix(&first.transform_period_matrix(&b).unwrap())
            .unwrap();
        let at_once = second.compose(&first).transform_period_matrix(&b).unwrap();
        for (x, y) in stepwise.iter().zip(at_once.iter()) {
            assert!((x - y).norm() < 1e-12, "{x} vs {y}");
        }
    }

    #[test]
    fn test_shift_adds_multiple_of_two_pi_i() {
        let b = genus2();
        let s = IMat::from_row_slice(2, 2, &[1, -1, -1, 2]);
        let t = ModularTransformation::shift(&s).transform_period_matrix(&b).unwrap();
        assert_relative_eq!(t[(0, 1)].im, b[(0, 1)].im - 2.0 * PI, epsilon = 1e-12);
        assert_relative_eq!(t[(1, 1)].im, b[(1, 1)].im + 4.0 * PI, epsilon = 1e-12);
    }

    #[test]
    fn test_chained_laws_match_formula() {
        let b = genus2();
        let u = IMat::from_row_slice(2, 2, &[1, 1, 0, 1]);
        let s = IMat::from_row_slice(2, 2, &[1, 0, 0, -1]);
        let first = ModularSupport::lattice_change(&u, &b).unwrap();
        let second = ModularSupport::shift(&s, first.transformed_period_matrix()).unwrap();
        let third = ModularSupport::special(second.transformed_period_matrix()).unwrap();
        let chained = first.then(&second).then(&third);
        let formula = ModularSupport::new(chained.transformation().clone(), &b).unwrap();

        for (x, y) in chained
            .transformed_period_matrix()
            .iter()
            .zip(formula.transformed_period_matrix().iter())
        {
            assert!((x - y).norm() < 1e-10);
        }
        for (x, y) in chained.h().iter().zip(formula.h().iter()) {
            assert!((x - y).norm() < 1e-10);
        }
        let sym = |a: &CMat| a + a.transpose();
        for (x, y) in sym(chained.quadratic()).iter().zip(sym(formula.quadratic()).iter()) {
            assert!((x - y).norm() < 1e-10);
        }
    }

    #[test]
    fn test_period_matrix_checks() {
        assert!(matches!(check_period_matrix(&CMat::zeros(0, 0)), Err(ThetaError::Empty)));
        assert!(matches!(check_period_matrix(&CMat::zeros(2, 3)), Err(ThetaError::NotSquare)));
        let mut b = genus2();
        b[(0, 1)] += Complex::new(0.1, 0.0);
        assert!(matches!(check_period_matrix(&b), Err(ThetaError::NotSymmetric)));
        let positive = -genus2();
        assert!(matches!(
            check_period_matrix(&positive),
            Err(ThetaError::NotNegativeDefinite)
        ));
        assert_eq!(check_period_matrix(&genus2()).unwrap(), 2);
    }
}
