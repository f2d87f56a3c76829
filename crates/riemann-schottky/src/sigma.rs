//! Sums of `σ(z)^k − σ(w)^k` over the group or over the coset of one
//! generator. With `(z, w) = (A_n, B_n)` these are the normalized
//! holomorphic differentials evaluated through their Laurent data.

use riemann_math::{l1_norm, CVec, Complex};

use crate::element::{ElementId, Visit};
use crate::error::{Result, SchottkyError};
use crate::group::{check_accuracy, SchottkyGroup};
use crate::series::{Range, SeriesReport};

impl SchottkyGroup {
    /// `Σ_{σ ∈ G/<σ_n>} σ(A_n) − σ(B_n)`.
    pub fn v(&mut self, n: usize, accuracy: f64) -> Result<Complex> {
        let (a, b) = self.fixpoints(n)?;
        Ok(self.diff_series(a, b, 1, Range::Coset(n), accuracy)?.0)
    }

    /// `[v(0), …, v(N − 1)]`.
    pub fn v_vector(&mut self, accuracy: f64) -> Result<CVec> {
        let values = (0..self.num_generators())
            .map(|n| self.v(n, accuracy))
            .collect::<Result<Vec<_>>>()?;
        Ok(CVec::from_vec(values))
    }

    /// Statistics of the evaluation of [`Self::v`].
    pub fn v_report(&mut self, n: usize, accuracy: f64) -> Result<SeriesReport> {
        let (a, b) = self.fixpoints(n)?;
        Ok(self.diff_series(a, b, 1, Range::Coset(n), accuracy)?.1)
    }

    /// `Σ_{σ ∈ G/<σ_n>} σ(A_n)^k − σ(B_n)^k`.
    pub fn v_pow(&mut self, n: usize, k: u32, accuracy: f64) -> Result<Complex> {
        let (a, b) = self.fixpoints(n)?;
        Ok(self.diff_series(a, b, k, Range::Coset(n), accuracy)?.0)
    }

    pub fn v_pow_vector(&mut self, k: u32, accuracy: f64) -> Result<CVec> {
        let values = (0..self.num_generators())
            .map(|n| self.v_pow(n, k, accuracy))
            .collect::<Result<Vec<_>>>()?;
        Ok(CVec::from_vec(values))
    }

    /// `Σ_{σ ∈ G} σ(z) − σ(w)`.
    pub fn sigma(&mut self, z: Complex, w: Complex, accuracy: f64) -> Result<Complex> {
        Ok(self.diff_series(z, w, 1, Range::Group, accuracy)?.0)
    }

    /// `Σ_{σ ∈ G} σ(z)^k − σ(w)^k`.
    pub fn sigma_pow(&mut self, z: Complex, w: Complex, k: u32, accuracy: f64) -> Result<Complex> {
        Ok(self.diff_series(z, w, k, Range::Group, accuracy)?.0)
    }

    pub fn sigma_report(&mut self, z: Complex, w: Complex, accuracy: f64) -> Result<SeriesReport> {
        Ok(self.diff_series(z, w, 1, Range::Group, accuracy)?.1)
    }

    pub(crate) fn fixpoints(&self, n: usize) -> Result<(Complex, Complex)> {
        let g = self.data.generator(n)?;
        Ok((g.a, g.b))
    }

    fn diff_series(
        &mut self,
        z: Complex,
        w: Complex,
        k: u32,
        range: Range,
        accuracy: f64,
    ) -> Result<(Complex, SeriesReport)> {
        check_accuracy(accuracy)?;
        let k = k.max(1);
        let factor = if k == 1 {
            1.0 / (1.0 - self.q1)
        } else {
            f64::from(k) * self.geometry.max_in_isometric_circles() / (1.0 - self.q1)
        };
        let roots = range.roots(self);
        let counts: Vec<i64> = (0..self.counts.len())
            .map(|l| range.count(self, l))
            .collect::<Result<_>>()?;
        let contraction = (!self.uses_theta2() && k == 1 && matches!(range, Range::Coset(_)))
            .then_some(self.theta1 * self.theta1);

        let mut sum = z.powu(k) - w.powu(k);
        let mut report = SeriesReport::start(sum.norm());
        let geometry = &self.geometry;
        self.tree.descend(geometry, &roots, |tree, id| {
            let element = tree.get(id);
            let word_length = element.word_length();
            let d = element.moebius().diff(z, w);
            let noe = counts.get(word_length).copied().ok_or(SchottkyError::IndexOutOfRange {
                index: word_length,
                len: counts.len(),
            })? as f64;
            if factor * noe * l1_norm(d) < accuracy {
                report.record_drop(word_length, factor * l1_norm(d));
                return Ok(Visit::Prune);
            }
            if let (Some(q), Some(parent)) = (contraction, element.parent()) {
                if parent != ElementId::IDENTITY {
                    let d_parent = tree.get(parent).moebius().diff(z, w);
                    debug_assert!(
                        d.norm() <= q * d_parent.norm() * (1.0 + 1e-9),
                        "contraction bound violated at word {}",
                        tree.word(id)
                    );
                }
            }
            let term = if k == 1 {
                d
            } else {
                element.moebius().diff_pow_with(z, w, k, d)
            };
            sum += term;
            report.record_term(term.norm());
            Ok(Visit::Descend)
        })?;
        tracing::trace!(terms = report.terms, error = report.error_bound, "diff series");
        Ok((sum, report))
    }
}
