//! Bookkeeping shared by the truncated group series.

use crate::element::{ElementId, GroupElement, Visit};
use crate::error::{Result, SchottkyError};
use crate::group::{check_accuracy, SchottkyGroup};

/// Which part of the group a series runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Range {
    /// Cosets of `<σ_n>`: words whose rightmost letter has index ≠ n.
    Coset(usize),
    /// The group without the identity.
    Group,
    /// The whole group, identity first.
    GroupWithIdentity,
}

impl Range {
    pub(crate) fn roots(self, group: &SchottkyGroup) -> Vec<ElementId> {
        match self {
            Range::Coset(n) => group.tree.coset_roots(n),
            Range::Group => group.tree.all_roots(),
            Range::GroupWithIdentity => vec![ElementId::IDENTITY],
        }
    }

    /// Number of words of length `l` in the range.
    pub(crate) fn count(self, group: &SchottkyGroup, l: usize) -> Result<i64> {
        match self {
            Range::Coset(_) => group.counts.coset(l),
            Range::Group | Range::GroupWithIdentity => group.counts.all(l),
        }
    }
}

/// Per-letter error weight of σ, indexed by its leftmost letter.
/// The identity is never dropped.
pub(crate) fn weight(rho: &[Vec<f64>; 2], element: &GroupElement) -> f64 {
    element
        .left()
        .map_or(f64::INFINITY, |l| rho[l.side()][l.index])
}

/// Error budget of an adaptively truncated series.
///
/// A subtree whose bound times the number of words of its length falls below
/// the budget is dropped, and the unused share is passed on to later terms.
/// Bounds below `eps = accuracy / max_elements` are dropped unconditionally,
/// which may overdraw the budget.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Budget {
    acc: f64,
    eps: f64,
}

impl Budget {
    pub(crate) fn new(accuracy: f64, max_elements: usize) -> Self {
        Self {
            acc: accuracy,
            eps: accuracy / max_elements as f64,
        }
    }

    /// Try to drop a subtree with bound `error` at a word length with `noe` words.
    pub(crate) fn try_drop(&mut self, error: f64, noe: i64) -> bool {
        let noe = noe.max(1) as f64;
        if error * noe < self.acc || error < self.eps {
            self.acc += self.acc / noe - error;
            true
        } else {
            false
        }
    }

    pub(crate) fn finish(self) -> Result<()> {
        if self.acc < 0.0 {
            Err(SchottkyError::NumericalInstability)
        } else {
            Ok(())
        }
    }
}

impl SchottkyGroup {
    /// Sum a series over `range` with an adaptive error budget.
    ///
    /// `error` bounds the contribution of the subtree below an element;
    /// `term` accumulates the element's term and returns its modulus.
    pub(crate) fn adaptive_series<E, T>(
        &mut self,
        range: Range,
        accuracy: f64,
        leading_abs: f64,
        mut error: E,
        mut term: T,
    ) -> Result<SeriesReport>
    where
        E: FnMut(&GroupElement) -> f64,
        T: FnMut(&GroupElement) -> f64,
    {
        check_accuracy(accuracy)?;
        let roots = range.roots(self);
        let counts: Vec<i64> = (0..self.counts.len())
            .map(|l| range.count(self, l))
            .collect::<Result<_>>()?;
        let mut budget = Budget::new(accuracy, self.config.max_elements);
        let mut report = SeriesReport::start(leading_abs);
        let geometry = &self.geometry;
        self.tree.descend(geometry, &roots, |tree, id| {
            let element = tree.get(id);
            let word_length = element.word_length();
            let noe = counts.get(word_length).copied().ok_or(SchottkyError::IndexOutOfRange {
                index: word_length,
                len: counts.len(),
            })?;
            let e = error(element);
            if budget.try_drop(e, noe) {
                report.record_drop(word_length, e);
                return Ok(Visit::Prune);
            }
            report.record_term(term(element));
            Ok(Visit::Descend)
        })?;
        budget.finish()?;
        tracing::trace!(terms = report.terms, error = report.error_bound, "adaptive series");
        Ok(report)
    }
}

/// Statistics of one evaluation of a group series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesReport {
    /// Terms summed, including the closed-form leading term.
    pub terms: usize,
    /// Shortest word of a dropped subtree.
    pub min_word_length: usize,
    /// Longest word of a dropped subtree.
    pub max_word_length: usize,
    /// Sum of the bounds of all dropped subtrees.
    pub error_bound: f64,
    /// Sum of the moduli of the summed terms.
    pub abs_series: f64,
}

impl SeriesReport {
    pub(crate) fn start(leading_abs: f64) -> Self {
        Self {
            terms: 1,
            min_word_length: usize::MAX,
            max_word_length: 0,
            error_bound: 0.0,
            abs_series: leading_abs,
        }
    }

    pub(crate) fn record_term(&mut self, abs: f64) {
        self.terms += 1;
        self.abs_series += abs;
    }

    pub(crate) fn record_drop(&mut self, word_length: usize, error: f64) {
        self.error_bound += error;
        self.min_word_length = self.min_word_length.min(word_length);
        self.max_word_length = self.max_word_length.max(word_length);
    }

    pub fn report(&self) -> String {
        let mut s = String::new();
        s.push_str("=== Series Evaluation ===\n");
        s.push_str(&format!("Terms:        {}\n", self.terms));
        if self.min_word_length <= self.max_word_length {
            s.push_str(&format!(
                "Cut at words: {}..={}\n",
                self.min_word_length, self.max_word_length
            ));
        } else {
            s.push_str("Cut at words: none\n");
        }
        s.push_str(&format!("Error bound:  {:.3e}\n", self.error_bound));
        s.push_str(&format!("Sum |term|:   {:.6}\n", self.abs_series));
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_passes_on_unused_share() {
        let mut b = Budget::new(1e-6, 1000);
        assert!(b.try_drop(1e-9, 10));
        // 1e-6 + 1e-7 - 1e-9
        assert!((b.acc - (1.1e-6 - 1e-9)).abs() < 1e-18);
        assert!(!b.try_drop(1.0, 10));
        assert!(b.finish().is_ok());
    }

    #[test]
    fn test_budget_overdrawn() {
        let mut b = Budget::new(1e-6, 1);
        // Bounds below eps but far above the per-word share.
        assert!(b.try_drop(9e-7, 1_000_000_000));
        assert!(b.try_drop(9e-7, 1_000_000_000));
        assert!(b.acc < 0.0);
        assert!(matches!(b.finish(), Err(SchottkyError::NumericalInstability)));
    }

    #[test]
    fn test_report_text() {
        let mut r = SeriesReport::start(1.0);
        r.record_term(0.5);
        r.record_drop(4, 1e-9);
        r.record_drop(6, 1e-9);
        let text = r.report();
        assert!(text.contains("Terms:        2"));
        assert!(text.contains("4..=6"));
    }
}
