//! Tunables of the truncated group series.

use serde::{Deserialize, Serialize};

/// Configuration of a [`SchottkyGroup`](crate::SchottkyGroup).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SchottkyConfig {
    /// Default absolute accuracy of every series.
    pub accuracy: f64,
    /// Upper bound on the number of group elements computed per data set.
    pub max_elements: usize,
    /// Word length at which a descent gives up.
    pub max_word_length: usize,
    /// Use the per-circle error weights instead of the global distance bound.
    pub fancy_error: bool,
    /// Word length `l` of the evaluability tests.
    pub evaluable_word_length: usize,
    /// Bound `C` in (0, 1) of the evaluability tests.
    pub evaluable_bound: f64,
}

impl Default for SchottkyConfig {
    fn default() -> Self {
        Self {
            accuracy: 1e-7,
            max_elements: 200_000,
            max_word_length: 50,
            fancy_error: true,
            evaluable_word_length: 2,
            evaluable_bound: 0.75,
        }
    }
}

impl SchottkyConfig {
    pub fn with_accuracy(accuracy: f64) -> Self {
        Self {
            accuracy,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serde_roundtrip() {
        let config = SchottkyConfig {
            fancy_error: false,
            ..SchottkyConfig::with_accuracy(1e-12)
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: SchottkyConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_partial_config_is_rejected() {
        assert!(serde_json::from_str::<SchottkyConfig>(r#"{"accuracy": 1e-9}"#).is_err());
    }
}
