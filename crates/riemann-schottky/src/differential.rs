//! Abelian differentials and the Poincaré series `Σ 1/c²`, `Σ χ(σ)`.
//!
//! The differential series converge more slowly than the integral ones;
//! their bounds use `κ₂`, a lower bound for `|σ'|^{-1/2}` on the
//! fundamental domain, instead of the contraction constant.

use riemann_math::{CVec, Complex};

use crate::element::{ElementId, GroupElement, Letter, Visit};
use crate::error::{Result, SchottkyError};
use crate::estimate;
use crate::geometry::{dist, Geometry};
use crate::group::{check_accuracy, SchottkyGroup};
use crate::integral::fancy_rho;
use crate::series::{weight, Range};

/// Data-dependent constants of the differential series.
#[derive(Debug, Clone, PartialEq)]
pub struct DifferentialConstants {
    kappa2: f64,
    q2: f64,
    l1: Vec<f64>,
}

impl DifferentialConstants {
    pub fn kappa2(&self) -> f64 {
        self.kappa2
    }

    /// `(2N − 1)/κ₂²`, below one.
    pub fn q2(&self) -> f64 {
        self.q2
    }

    /// `1/(1 − q₂)`.
    pub fn f2(&self) -> f64 {
        1.0 / (1.0 - self.q2)
    }

    /// Largest `|A_n − B_n| / (k(σ, A_n) k(σ, B_n))` over the letters σ of
    /// index ≠ n.
    pub fn l1(&self, n: usize) -> f64 {
        self.l1[n]
    }
}

/// `|a − b| / (k(σ, a) k(σ, b))`.
fn l_of(geometry: &Geometry, sigma: &GroupElement, a: Complex, b: Complex) -> f64 {
    dist(a, b) / estimate::k(geometry, sigma, a) / estimate::k(geometry, sigma, b)
}

impl SchottkyGroup {
    /// Minimal `κ̄` over the pairs of letters `σ(j, m) σ(i, n)` with
    /// `σ(j, m) ≠ σ(i, n)⁻¹`.
    pub fn kappa2(&self) -> f64 {
        let num_generators = self.num_generators();
        let mut min = f64::MAX;
        for i in 0..2 {
            for j in 0..2 {
                for m in 0..num_generators {
                    for n in 0..num_generators {
                        if n != m || i == j {
                            min = min.min(estimate::kappa_r_bar(&self.geometry, j, m, i, n));
                        }
                    }
                }
            }
        }
        min
    }

    /// Constants of the differential series, computed once per data set.
    pub fn differential_constants(&mut self) -> Result<DifferentialConstants> {
        if let Some(constants) = &self.differential {
            return Ok(constants.clone());
        }
        let branching = (2 * self.num_generators() - 1) as f64;
        let mut kappa2 = self.kappa2();
        let mut q2 = branching / kappa2 / kappa2;
        if kappa2 <= 0.0 || q2 >= 1.0 {
            let kappa3 = self.kappa(3)?;
            tracing::debug!(kappa2, kappa3, "falling back to word length three for kappa");
            kappa2 = kappa3;
            q2 = branching / kappa2 / kappa2;
            if kappa2 <= 0.0 || q2 >= 1.0 {
                return Err(SchottkyError::ConvergenceNotGuaranteed { q: q2 });
            }
        }
        let l1 = (0..self.num_generators())
            .map(|n| {
                let (a, b) = (self.geometry.a(n), self.geometry.b(n));
                (0..self.num_generators())
                    .filter(|&i| i != n)
                    .flat_map(|i| [Letter::new(i, false), Letter::new(i, true)])
                    .map(|letter| l_of(&self.geometry, self.tree.get(ElementId::root(letter)), a, b))
                    .fold(0.0, f64::max)
            })
            .collect();
        let constants = DifferentialConstants { kappa2, q2, l1 };
        tracing::debug!(kappa2, q2, "differential constants");
        self.differential = Some(constants.clone());
        Ok(constants)
    }

    /// Normalized holomorphic differential `ω_n` at `z`, the derivative of
    /// [`Self::abelian_integral_of_1st_kind`].
    pub fn abelian_differential_of_1st_kind(&mut self, z: Complex, n: usize, accuracy: f64) -> Result<Complex> {
        check_accuracy(accuracy)?;
        let (a, b) = self.fixpoints(n)?;
        let mut s = (b - a) / (z - b) / (z - a);
        if self.num_generators() == 1 {
            return Ok(s);
        }
        let constants = self.differential_constants()?;
        let rho = self.differential_rho(z, &constants)?;
        let l1 = constants.l1(n);
        self.adaptive_series(
            Range::Coset(n),
            accuracy,
            s.norm(),
            |e| l1 * e.norm() * weight(&rho, e),
            |e| {
                let h = e.moebius().diff(b, a) / (z - e.image_of_b(n)) / (z - e.image_of_a(n));
                s += h;
                h.norm()
            },
        )?;
        Ok(s)
    }

    /// All differentials of the first kind at the group's accuracy.
    pub fn abel_map_differential(&mut self, z: Complex) -> Result<CVec> {
        let accuracy = self.accuracy();
        let values = (0..self.num_generators())
            .map(|n| self.abelian_differential_of_1st_kind(z, n, accuracy))
            .collect::<Result<Vec<_>>>()?;
        Ok(CVec::from_vec(values))
    }

    /// Differential of the third kind with simple poles of residue `+1` at
    /// `b` and `−1` at `a`.
    pub fn abelian_differential_of_3rd_kind(
        &mut self,
        z: Complex,
        a: Complex,
        b: Complex,
        accuracy: f64,
    ) -> Result<Complex> {
        let constants = self.differential_constants()?;
        let rho = self.differential_rho(z, &constants)?;
        let l = (0..self.num_generators())
            .flat_map(|i| [Letter::new(i, false), Letter::new(i, true)])
            .map(|letter| l_of(&self.geometry, self.tree.get(ElementId::root(letter)), a, b))
            .fold(0.0, f64::max);
        let mut s = Complex::new(0.0, 0.0);
        self.adaptive_series(
            Range::GroupWithIdentity,
            accuracy,
            0.0,
            |e| {
                if e.is_identity() {
                    f64::INFINITY
                } else {
                    l * e.norm() * weight(&rho, e)
                }
            },
            |e| {
                let m = e.moebius();
                let h = m.diff(b, a) / (z - m.apply(b)) / (z - m.apply(a));
                s += h;
                h.norm()
            },
        )?;
        Ok(s)
    }

    /// `Σ_{σ ∈ G, σ ≠ id} 1/c(σ)²`.
    pub fn gamma(&mut self, accuracy: f64) -> Result<Complex> {
        let f2 = self.differential_constants()?.f2();
        let mut s = Complex::new(0.0, 0.0);
        self.adaptive_series(
            Range::Group,
            accuracy,
            0.0,
            |e| f2 * e.norm(),
            |e| {
                let h = e.moebius().inverse_of_c_sqr();
                s += h;
                h.norm()
            },
        )?;
        Ok(s)
    }

    /// `Σ χ(σ)` over all words of length at most `max_word_length`,
    /// identity included.
    pub fn chi(&mut self, max_word_length: usize) -> Result<Complex> {
        let roots = self.tree.all_roots();
        let mut s = self.tree.get(ElementId::IDENTITY).moebius().chi();
        let geometry = &self.geometry;
        self.tree.descend(geometry, &roots, |tree, id| {
            let element = tree.get(id);
            if element.word_length() > max_word_length {
                return Ok(Visit::Prune);
            }
            s += element.moebius().chi();
            Ok(Visit::Descend)
        })?;
        Ok(s)
    }

    fn differential_rho(&mut self, z: Complex, constants: &DifferentialConstants) -> Result<[Vec<f64>; 2]> {
        let num_generators = self.num_generators();
        if self.config.fancy_error {
            let q = 1.0 / (constants.kappa2 * constants.kappa2);
            let r2 = self.geometry.r(q);
            let k2 = self.k_indexed(z, 3)?;
            Ok(fancy_rho(num_generators, r2, q, |i, n| k2[i][n] * k2[i][n]))
        } else {
            let k = self.k(z, 3)?;
            let value = 1.0 / (k * k) * constants.f2();
            Ok([vec![value; num_generators], vec![value; num_generators]])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(re: f64, im: f64) -> Complex {
        Complex::new(re, im)
    }

    #[test]
    fn test_constants_are_cached() {
        let mut g = SchottkyGroup::default_for_genus(2).unwrap();
        let first = g.differential_constants().unwrap();
        assert!(first.q2() < 1.0);
        assert!(first.kappa2() > 0.0);
        assert!(first.l1(0) > 0.0 && first.l1(1) > 0.0);
        let second = g.differential_constants().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_differential_is_derivative_of_integral() {
        let mut g = SchottkyGroup::default_for_genus(2).unwrap();
        let z = c(0.2, 0.8);
        let h = 1e-4;
        for n in 0..2 {
            let plus = g.abelian_integral_of_1st_kind(z + h, n, 1e-13).unwrap();
            let minus = g.abelian_integral_of_1st_kind(z - h, n, 1e-13).unwrap();
            let numeric = (plus - minus) / (2.0 * h);
            let exact = g.abelian_differential_of_1st_kind(z, n, 1e-12).unwrap();
            assert!((numeric - exact).norm() < 1e-6, "n = {n}: {numeric} vs {exact}");
        }
    }

    #[test]
    fn test_third_kind_differential_is_derivative_of_integral() {
        let mut g = SchottkyGroup::default_for_genus(2).unwrap();
        let z = c(0.0, 1.2);
        let (a, b) = (c(0.3, -0.4), c(-0.2, 0.1));
        let h = 1e-4;
        let plus = g.abelian_integral_of_3rd_kind(z + h, a, b, 1e-13).unwrap();
        let minus = g.abelian_integral_of_3rd_kind(z - h, a, b, 1e-13).unwrap();
        let numeric = (plus - minus) / (2.0 * h);
        let exact = g.abelian_differential_of_3rd_kind(z, a, b, 1e-12).unwrap();
        assert!((numeric - exact).norm() < 1e-6, "{numeric} vs {exact}");
    }

    #[test]
    fn test_abel_map_differential() {
        let mut g = SchottkyGroup::default_for_genus(2).unwrap();
        let v = g.abel_map_differential(c(0.5, 0.5)).unwrap();
        assert_eq!(v.len(), 2);
    }

    #[test]
    fn test_gamma_converges() {
        let mut g = SchottkyGroup::default_for_genus(2).unwrap();
        let coarse = g.gamma(1e-4).unwrap();
        let fine = g.gamma(1e-10).unwrap();
        assert!((coarse - fine).norm() < 1e-4);
    }

    #[test]
    fn test_chi_of_identity_only() {
        let mut g = SchottkyGroup::default_for_genus(2).unwrap();
        assert_eq!(g.chi(0).unwrap(), c(1.0, 0.0));
        let one = g.chi(1).unwrap();
        let mut expected = c(1.0, 0.0);
        for n in 0..2 {
            for inverse in [false, true] {
                expected += g.geometry().letter(Letter::new(n, inverse)).chi();
            }
        }
        assert!((one - expected).norm() < 1e-12);
    }
}
