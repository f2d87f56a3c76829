//! Period matrix `B = 2πiτ` as a product of cross-ratios over coset trees.

use riemann_math::{cross_ratio, l1_norm, CMat, Complex};

use crate::element::Visit;
use crate::error::Result;
use crate::geometry::Geometry;
use crate::group::{check_accuracy, SchottkyGroup};

impl SchottkyGroup {
    /// Period matrix at the group's accuracy.
    pub fn period_matrix(&mut self) -> Result<CMat> {
        self.period_matrix_with_accuracy(self.accuracy())
    }

    /// Symmetric period matrix with every entry accurate to `accuracy`
    /// modulo 2πi.
    pub fn period_matrix_with_accuracy(&mut self, accuracy: f64) -> Result<CMat> {
        check_accuracy(accuracy)?;
        let num_generators = self.num_generators();
        if num_generators == 1 {
            return Ok(CMat::from_element(1, 1, self.geometry.mu(0).ln()));
        }

        let v = self.theta1 * self.theta1;
        let r = self.geometry.r(v);
        let sum_left_is_m = (2 * num_generators - 2) as f64 * r;
        let sum_left_is_not_m = (2 * num_generators - 4) as f64 * r
            + Geometry::r_plus(r, v)
            + Geometry::r_minus(r, v);

        let mut b = CMat::zeros(num_generators, num_generators);
        for m in 0..num_generators {
            let (am, bm) = (self.geometry.a(m), self.geometry.b(m));
            let base = 1.0 / self.geometry.k1(m, am) + 1.0 / self.geometry.k1(m, bm);
            let factors = (base * sum_left_is_m, base * sum_left_is_not_m);
            for n in m..num_generators {
                let start = if m < n {
                    cross_ratio(am, self.geometry.b(n), bm, self.geometry.a(n))
                } else {
                    self.geometry.mu(n)
                };
                let product = self.cross_ratio_product(m, n, start, factors, accuracy)?;
                b[(m, n)] = product.ln();
                b[(n, m)] = b[(m, n)];
            }
        }
        tracing::debug!(elements = self.num_elements(), "period matrix evaluated");
        Ok(b)
    }

    /// Multiply `start` by `crossRatio(A_m, σ(B_n), B_m, σ(A_n))` over the
    /// coset tree of `n`, skipping words whose leftmost letter has index `m`.
    fn cross_ratio_product(
        &mut self,
        m: usize,
        n: usize,
        start: Complex,
        (factor_left_is_m, factor_left_is_not_m): (f64, f64),
        accuracy: f64,
    ) -> Result<Complex> {
        let (am, bm) = (self.geometry.a(m), self.geometry.b(m));
        let (an, bn) = (self.geometry.a(n), self.geometry.b(n));
        let roots = self.tree.coset_roots(n);
        let counts = &self.counts;
        let geometry = &self.geometry;
        let mut product = start;
        self.tree.descend(geometry, &roots, |tree, id| {
            let element = tree.get(id);
            let noe = counts.coset(element.word_length())? as f64;
            let dist = l1_norm(element.moebius().diff(bn, an));
            let left_is_m = element.left().is_some_and(|l| l.index == m);
            let factor = if left_is_m {
                factor_left_is_m
            } else {
                factor_left_is_not_m
            };
            if factor * dist * noe < accuracy {
                return Ok(Visit::Prune);
            }
            if !left_is_m {
                product *= cross_ratio(am, element.image_of_b(n), bm, element.image_of_a(n));
            }
            Ok(Visit::Descend)
        })?;
        Ok(product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SchottkyData;
    use riemann_math::complex::dist_mod_2pi_i;

    #[test]
    fn test_genus_one_is_log_mu() {
        let mut g = SchottkyGroup::default_for_genus(1).unwrap();
        let b = g.period_matrix().unwrap();
        assert_eq!(b.shape(), (1, 1));
        assert!((b[(0, 0)] - Complex::new(0.01_f64.ln(), 0.0)).norm() < 1e-15);
    }

    #[test]
    fn test_period_matrix_is_symmetric_with_negative_real_diagonal() {
        let mut g = SchottkyGroup::default_for_genus(3).unwrap();
        let b = g.period_matrix_with_accuracy(1e-10).unwrap();
        for i in 0..3 {
            assert!(b[(i, i)].re < 0.0);
            for j in 0..3 {
                assert_eq!(b[(i, j)], b[(j, i)]);
            }
        }
    }

    #[test]
    fn test_diagonal_close_to_log_mu_for_small_mu() {
        let data = SchottkyData::default_for_genus(2);
        let mut g = SchottkyGroup::new(data.clone(), Default::default()).unwrap();
        let b = g.period_matrix_with_accuracy(1e-12).unwrap();
        for n in 0..2 {
            let log_mu = data.generators()[n].mu.ln();
            assert!(dist_mod_2pi_i(b[(n, n)], log_mu) < 0.1, "n = {n}");
        }
    }
}
