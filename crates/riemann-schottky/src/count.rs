//! Closed-form counts of reduced words by word length.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchottkyError};

/// Number of reduced words of each length, for the whole group and for the
/// coset `G/<σ_n>` (words whose rightmost letter is not `σ_n^{±1}`).
///
/// Tables stop at the last length whose count fits in an `i64`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCounts {
    all: Vec<i64>,
    coset: Vec<i64>,
}

impl WordCounts {
    pub fn new(num_generators: usize) -> Self {
        let n = num_generators.max(1) as i64;
        Self {
            all: table(n, 2 * n),
            coset: table(n, 2 * n - 2),
        }
    }

    /// Number of elements of word length `k` in the group.
    pub fn all(&self, k: usize) -> Result<i64> {
        lookup(&self.all, k)
    }

    /// Number of elements of word length `k` in a coset of one generator.
    pub fn coset(&self, k: usize) -> Result<i64> {
        lookup(&self.coset, k)
    }

    pub fn len(&self) -> usize {
        self.all.len().min(self.coset.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn table(n: i64, first: i64) -> Vec<i64> {
    let branching = 2 * n - 1;
    let len = if n == 1 {
        101
    } else {
        2 + ((i64::MAX as f64 / first as f64).ln() / (branching as f64).ln()) as usize
    };
    let mut t = Vec::with_capacity(len);
    t.push(1);
    t.push(first);
    while t.len() < len {
        let last = t[t.len() - 1];
        t.push(last.saturating_mul(branching));
    }
    t
}

fn lookup(table: &[i64], k: usize) -> Result<i64> {
    table.get(k).copied().ok_or(SchottkyError::IndexOutOfRange {
        index: k,
        len: table.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genus_two_counts() {
        let c = WordCounts::new(2);
        assert_eq!(c.all(0).unwrap(), 1);
        assert_eq!(c.all(1).unwrap(), 4);
        assert_eq!(c.all(2).unwrap(), 12);
        assert_eq!(c.all(3).unwrap(), 36);
        assert_eq!(c.coset(1).unwrap(), 2);
        assert_eq!(c.coset(2).unwrap(), 6);
    }

    #[test]
    fn test_genus_one_has_trivial_coset() {
        let c = WordCounts::new(1);
        assert_eq!(c.len(), 101);
        assert_eq!(c.coset(0).unwrap(), 1);
        assert_eq!(c.coset(5).unwrap(), 0);
        assert_eq!(c.all(7).unwrap(), 2);
    }

    #[test]
    fn test_tables_do_not_overflow() {
        for n in 2..6 {
            let c = WordCounts::new(n);
            let last = c.len() - 1;
            assert!(c.all(last).unwrap() > 0);
            assert!(c.coset(last).unwrap() > 0);
            assert!(c.all(c.len() + 10).is_err());
        }
    }
}
