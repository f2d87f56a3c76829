//! Tunables of the theta evaluator.

use serde::{Deserialize, Serialize};

/// Configuration of a [`Theta`](crate::Theta).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThetaConfig {
    /// Absolute bound on the neglected tail of the lattice sum.
    pub tolerance: f64,
    /// Evaluate through the Siegel reduced period matrix.
    pub siegel_reduction: bool,
    /// Sharpen the tail bound by the fill factor of the lattice.
    pub fill_factor_error: bool,
    /// Use one point set valid for every `z` instead of re-centering the
    /// ellipsoid at each evaluation.
    pub uniform_approximation: bool,
}

impl Default for ThetaConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-7,
            siegel_reduction: true,
            fill_factor_error: true,
            uniform_approximation: true,
        }
    }
}

impl ThetaConfig {
    pub fn with_tolerance(tolerance: f64) -> Self {
        Self {
            tolerance,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serde_roundtrip() {
        let config = ThetaConfig {
            tolerance: 1e-12,
            uniform_approximation: false,
            ..ThetaConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: ThetaConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
