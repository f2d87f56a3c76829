//! Abelian integrals as logarithms of convergent Poincaré products.

use riemann_math::{l1_norm, CVec, Complex};

use crate::error::Result;
use crate::geometry::Geometry;
use crate::group::{check_accuracy, SchottkyGroup};
use crate::series::{weight, Range, SeriesReport};

impl SchottkyGroup {
    /// Normalized Abelian integral of the first kind,
    /// `log Π_{σ ∈ G/<σ_n>} (z − σ(B_n)) / (z − σ(A_n))`.
    pub fn abelian_integral_of_1st_kind(&mut self, z: Complex, n: usize, accuracy: f64) -> Result<Complex> {
        Ok(self.integral_of_1st_kind(z, n, accuracy)?.0)
    }

    pub fn abelian_integral_of_1st_kind_report(
        &mut self,
        z: Complex,
        n: usize,
        accuracy: f64,
    ) -> Result<SeriesReport> {
        Ok(self.integral_of_1st_kind(z, n, accuracy)?.1)
    }

    /// All integrals of the first kind at the group's accuracy.
    pub fn abel_map(&mut self, z: Complex) -> Result<CVec> {
        let accuracy = self.accuracy();
        let values = (0..self.num_generators())
            .map(|n| self.abelian_integral_of_1st_kind(z, n, accuracy))
            .collect::<Result<Vec<_>>>()?;
        Ok(CVec::from_vec(values))
    }

    /// Abelian integral of the third kind with logarithmic poles at `a`
    /// and `b`, `log Π_{σ ∈ G} (z − σ(b)) / (z − σ(a))`.
    pub fn abelian_integral_of_3rd_kind(
        &mut self,
        z: Complex,
        a: Complex,
        b: Complex,
        accuracy: f64,
    ) -> Result<Complex> {
        let rho = self.integral_rho(z)?;
        let mut p = Complex::new(1.0, 0.0);
        self.adaptive_series(
            Range::GroupWithIdentity,
            accuracy,
            0.0,
            |e| l1_norm(e.moebius().diff(b, a)) * weight(&rho, e),
            |e| {
                let m = e.moebius();
                let h = (z - m.apply(b)) / (z - m.apply(a));
                p *= h;
                h.ln().norm()
            },
        )?;
        Ok(p.ln())
    }

    fn integral_of_1st_kind(&mut self, z: Complex, n: usize, accuracy: f64) -> Result<(Complex, SeriesReport)> {
        let (a, b) = self.fixpoints(n)?;
        let mut p = (z - b) / (z - a);
        let leading_abs = p.ln().norm();
        if self.num_generators() == 1 {
            check_accuracy(accuracy)?;
            return Ok((p.ln(), SeriesReport::start(leading_abs)));
        }
        let rho = self.integral_rho(z)?;
        let report = self.adaptive_series(
            Range::Coset(n),
            accuracy,
            leading_abs,
            |e| l1_norm(e.moebius().diff(b, a)) * weight(&rho, e),
            |e| {
                let h = (z - e.image_of_b(n)) / (z - e.image_of_a(n));
                p *= h;
                h.ln().norm()
            },
        )?;
        Ok((p.ln(), report))
    }

    /// Error weights of the integrand at `z`, indexed by the leftmost letter.
    fn integral_rho(&mut self, z: Complex) -> Result<[Vec<f64>; 2]> {
        let num_generators = self.num_generators();
        if self.config.fancy_error {
            let q = self.theta1 * self.theta1;
            let r2 = self.geometry.r(q);
            let k2 = self.k_indexed(z, 3)?;
            Ok(fancy_rho(num_generators, r2, q, |i, n| k2[i][n]))
        } else {
            let value = 1.0 / self.k(z, 3)? / (1.0 - self.q1);
            Ok([vec![value; num_generators], vec![value; num_generators]])
        }
    }
}

/// `ρ[j][m] = Σ_{i,n} w(i, n, j, m) / k(i, n)` with weight `r⁺` on the
/// letter itself, `r⁻` on its inverse and `r` elsewhere.
pub(crate) fn fancy_rho<K>(num_generators: usize, r: f64, q: f64, k: K) -> [Vec<f64>; 2]
where
    K: Fn(usize, usize) -> f64,
{
    let r_minus = Geometry::r_minus(r, q);
    let r_plus = Geometry::r_plus(r, q);
    let mut rho = [vec![0.0; num_generators], vec![0.0; num_generators]];
    for (j, row) in rho.iter_mut().enumerate() {
        for (m, value) in row.iter_mut().enumerate() {
            for i in 0..2 {
                for n in 0..num_generators {
                    let w = match (n == m, i == j) {
                        (true, true) => r_plus,
                        (true, false) => r_minus,
                        (false, _) => r,
                    };
                    *value += w / k(i, n);
                }
            }
        }
    }
    rho
}
