//! Möbius transformations z ↦ (az + b)/(cz + d) in SL(2,C).
//!
//! The group series of a Schottky group are dominated by differences of
//! images, so besides evaluation this module provides the closed forms
//! σ(z) − σ(w) = (z − w)/((cz + d)(cw + d)) and σ(z)^k − σ(w)^k that avoid
//! the cancellation of subtracting two nearly equal quotients.

use crate::complex::Complex;
use crate::error::{MathError, Result};

const EPS: f64 = 1e-14;

/// A Möbius transformation stored as its 2×2 complex matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moebius {
    pub a: Complex,
    pub b: Complex,
    pub c: Complex,
    pub d: Complex,
}

impl Default for Moebius {
    fn default() -> Self {
        Self::identity()
    }
}

impl Moebius {
    pub fn new(a: Complex, b: Complex, c: Complex, d: Complex) -> Self {
        Self { a, b, c, d }
    }

    pub fn identity() -> Self {
        let one = Complex::new(1.0, 0.0);
        let zero = Complex::new(0.0, 0.0);
        Self::new(one, zero, zero, one)
    }

    /// Loxodromic map σ with repelling fixed point `fix_a`, attracting fixed
    /// point `fix_b` and multiplier `mu`, i.e.
    /// (σ(z) − B)/(σ(z) − A) = μ (z − B)/(z − A), normalized to determinant 1.
    pub fn from_fixed_points(fix_a: Complex, fix_b: Complex, mu: Complex) -> Result<Self> {
        let one = Complex::new(1.0, 0.0);
        let ab = fix_a * fix_b;
        Self::new(fix_a * mu - fix_b, ab - ab * mu, mu - one, fix_a - fix_b * mu).normalized()
    }

    pub fn determinant(&self) -> Complex {
        self.a * self.d - self.b * self.c
    }

    /// Scale the matrix by the principal square root of its determinant.
    pub fn normalized(self) -> Result<Self> {
        let det = self.determinant();
        if det.im.abs() <= EPS && (det.re - 1.0).abs() <= EPS {
            return Ok(self);
        }
        let s = det.sqrt();
        if s.norm_sqr() == 0.0 {
            return Err(MathError::SingularMatrix);
        }
        Ok(Self::new(self.a / s, self.b / s, self.c / s, self.d / s))
    }

    /// Matrix product `self · other`, the map z ↦ self(other(z)).
    pub fn compose(&self, other: &Moebius) -> Moebius {
        Moebius::new(
            self.a * other.a + self.b * other.c,
            self.a * other.b + self.b * other.d,
            self.c * other.a + self.d * other.c,
            self.c * other.b + self.d * other.d,
        )
    }

    pub fn adjugate(&self) -> Moebius {
        Moebius::new(self.d, -self.b, -self.c, self.a)
    }

    /// Inverse map. Equals the adjugate for normalized matrices.
    pub fn inverse(&self) -> Result<Moebius> {
        let det = self.determinant();
        if det.norm_sqr() == 0.0 {
            return Err(MathError::SingularMatrix);
        }
        let adj = self.adjugate();
        Ok(Moebius::new(adj.a / det, adj.b / det, adj.c / det, adj.d / det))
    }

    #[inline]
    pub fn apply(&self, z: Complex) -> Complex {
        (self.a * z + self.b) / (self.c * z + self.d)
    }

    /// σ(z) − σ(w).
    #[inline]
    pub fn diff(&self, z: Complex, w: Complex) -> Complex {
        (z - w) / ((self.c * z + self.d) * (self.c * w + self.d))
    }

    /// σ(z)^k − σ(w)^k.
    pub fn diff_pow(&self, z: Complex, w: Complex, k: u32) -> Complex {
        self.diff_pow_with(z, w, k, self.diff(z, w))
    }

    /// σ(z)^k − σ(w)^k reusing a precomputed `d = σ(z) − σ(w)`.
    ///
    /// Uses x^k − y^k = (x − y) Q_k with Q_1 = 1, Q_2 = x + y and
    /// Q_{i+1} = (x + y) Q_i − xy Q_{i−1}.
    pub fn diff_pow_with(&self, z: Complex, w: Complex, k: u32, d: Complex) -> Complex {
        let sz = self.apply(z);
        let sw = self.apply(w);
        let prod = sz * sw;
        let sum = sz + sw;
        let mut p = Complex::new(0.0, 0.0);
        let mut q = Complex::new(1.0, 0.0);
        for _ in 1..k {
            let last_q = q;
            q = q * sum - p * prod;
            p = last_q;
        }
        d * q
    }

    /// 1/c².
    #[inline]
    pub fn inverse_of_c_sqr(&self) -> Complex {
        (self.c * self.c).inv()
    }

    /// (1 − 2bc)/d⁴.
    pub fn chi(&self) -> Complex {
        let d2 = self.d * self.d;
        (Complex::new(1.0, 0.0) - 2.0 * self.b * self.c) / (d2 * d2)
    }

    pub fn trace(&self) -> Complex {
        self.a + self.d
    }

    /// True unless the squared trace (of the normalized matrix) is real and in [0, 4].
    pub fn is_loxodromic(&self) -> bool {
        let Ok(m) = self.normalized() else {
            return false;
        };
        let t = m.trace() * m.trace();
        !(t.im.abs() <= EPS && t.re >= -EPS && t.re <= 4.0 + EPS)
    }

    /// Isometric circles `(center, center', radius)`: σ maps the circle about
    /// `−d/c` onto the circle about `a/c`, both of radius `1/|c|`.
    pub fn isometric_circles(&self) -> Result<(Complex, Complex, f64)> {
        if !self.is_loxodromic() || self.c.norm_sqr() == 0.0 {
            return Err(MathError::NotLoxodromic);
        }
        Ok((-self.d / self.c, self.a / self.c, 1.0 / self.c.norm()))
    }

    /// Image of the circle `|z − center| = radius`, as `(center', radius')`.
    pub fn map_circle(&self, center: Complex, radius: f64) -> (Complex, f64) {
        if self.c.norm_sqr() == 0.0 {
            let scale = self.a / self.d;
            let shift = self.b / self.d;
            return (center * scale + shift, radius * scale.norm());
        }
        // σ = h ∘ g ∘ f with f(z) = cz + d, g(z) = 1/z, h(z) = −z/c + a/c.
        let w = self.c * center + self.d;
        let c_abs = self.c.norm();
        let r = radius * c_abs;
        let factor = w.norm_sqr() - r * r;
        let w = (w / factor).conj();
        let r = r / factor.abs();
        (self.a / self.c - w / self.c, r / c_abs)
    }
}
