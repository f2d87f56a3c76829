//! Uniformization data: fixed points and multipliers of the generators.

use riemann_math::Complex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchottkyError};

/// One loxodromic generator, given by its repelling fixed point `a`, its
/// attracting fixed point `b` and its multiplier `mu` (0 < |mu| < 1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeneratorData {
    pub a: Complex,
    pub b: Complex,
    pub mu: Complex,
}

impl GeneratorData {
    pub fn new(a: Complex, b: Complex, mu: Complex) -> Self {
        Self { a, b, mu }
    }

    fn validate(&self, index: usize) -> Result<()> {
        let finite = [self.a, self.b, self.mu]
            .iter()
            .all(|z| z.re.is_finite() && z.im.is_finite());
        if !finite {
            return Err(SchottkyError::InvalidData(format!(
                "generator {index} has non-finite entries"
            )));
        }
        if self.a == self.b {
            return Err(SchottkyError::InvalidData(format!(
                "generator {index} has coinciding fixed points"
            )));
        }
        let abs = self.mu.norm();
        if abs == 0.0 || abs >= 1.0 {
            return Err(SchottkyError::InvalidData(format!(
                "generator {index} has multiplier of modulus {abs}, expected 0 < |mu| < 1"
            )));
        }
        Ok(())
    }
}

/// Validated generator data of a Schottky group of genus `num_generators()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchottkyData {
    generators: Vec<GeneratorData>,
}

impl SchottkyData {
    pub fn new(generators: Vec<GeneratorData>) -> Result<Self> {
        if generators.is_empty() {
            return Err(SchottkyError::InvalidData("no generators".into()));
        }
        for (i, g) in generators.iter().enumerate() {
            g.validate(i)?;
        }
        Ok(Self { generators })
    }

    /// Parse the flat layout `[A.re, A.im, B.re, B.im, mu.re, mu.im]` per generator.
    pub fn from_uniformization_data(data: &[f64]) -> Result<Self> {
        if data.is_empty() || data.len() % 6 != 0 {
            return Err(SchottkyError::InvalidData(format!(
                "length {} is not a positive multiple of 6",
                data.len()
            )));
        }
        let generators = data
            .chunks_exact(6)
            .map(|c| {
                GeneratorData::new(
                    Complex::new(c[0], c[1]),
                    Complex::new(c[2], c[3]),
                    Complex::new(c[4], c[5]),
                )
            })
            .collect();
        Self::new(generators)
    }

    /// Real data with `A_i = i + 1`, `B_i = −(i + 1)`, `mu_i = 0.01 / 5^i`.
    pub fn default_for_genus(genus: usize) -> Self {
        let mut mu = 0.01;
        let generators = (0..genus.max(1))
            .map(|i| {
                let x = (i + 1) as f64;
                let g = GeneratorData::new(
                    Complex::new(x, 0.0),
                    Complex::new(-x, 0.0),
                    Complex::new(mu, 0.0),
                );
                mu /= 5.0;
                g
            })
            .collect();
        Self { generators }
    }

    pub fn to_uniformization_data(&self) -> Vec<f64> {
        self.generators
            .iter()
            .flat_map(|g| [g.a.re, g.a.im, g.b.re, g.b.im, g.mu.re, g.mu.im])
            .collect()
    }

    pub fn num_generators(&self) -> usize {
        self.generators.len()
    }

    pub fn generators(&self) -> &[GeneratorData] {
        &self.generators
    }

    pub fn generator(&self, index: usize) -> Result<&GeneratorData> {
        self.generators
            .get(index)
            .ok_or(SchottkyError::IndexOutOfRange {
                index,
                len: self.generators.len(),
            })
    }
}
