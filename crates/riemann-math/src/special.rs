//! Gamma functions and a safeguarded Newton iteration.
//!
//! Only what the theta error radius needs: Γ(a), ln Γ(a), the upper
//! incomplete Γ(a, x) (series for x < a + 1, Lentz continued fraction
//! otherwise) and a scalar root finder.

use std::f64::consts::PI;

use crate::error::{MathError, Result};

const MAX_ITERATIONS: usize = 200;
const EPS: f64 = 1e-16;
const TINY: f64 = 1e-30;

// Lanczos coefficients (γ = 5, six terms), pre-multiplied by √(2π).
const SQRT_2PI: f64 = 2.506_628_274_631_000_7;
const LANCZOS: [f64; 7] = [
    1.000_000_000_190_015,
    76.180_091_729_471_46,
    -86.505_320_329_416_77,
    24.014_098_240_830_91,
    -1.231_739_572_450_155,
    0.120_865_097_386_617_9e-2,
    -0.539_523_938_495_3e-5,
];

fn lanczos_series(z: f64) -> f64 {
    let mut s = LANCZOS[0];
    for (i, c) in LANCZOS.iter().enumerate().skip(1) {
        s += c / (z + i as f64);
    }
    SQRT_2PI * s / z
}

fn ln_gamma_lanczos(z: f64) -> f64 {
    (z + 5.5).ln() * (z + 0.5) - (z + 5.5) + lanczos_series(z).ln()
}

/// Γ(x), using the reflection formula for x ≤ ½.
pub fn gamma(x: f64) -> f64 {
    if x <= 0.5 {
        PI / ((PI * x).sin() * ln_gamma_lanczos(1.0 - x).exp())
    } else {
        ln_gamma_lanczos(x).exp()
    }
}

/// ln Γ(x) for x > 0.
pub fn ln_gamma(x: f64) -> f64 {
    if x <= 0.5 {
        (PI / (PI * x).sin()).ln() - ln_gamma_lanczos(1.0 - x)
    } else {
        ln_gamma_lanczos(x)
    }
}

/// Upper incomplete gamma function Γ(a, x) = ∫ₓ^∞ t^{a−1} e^{−t} dt.
pub fn upper_incomplete_gamma(a: f64, x: f64) -> Result<f64> {
    upper_incomplete_gamma_with(a, x, gamma(a))
}

/// Γ(a, x) reusing a precomputed `gamma_of_a = Γ(a)`.
pub fn upper_incomplete_gamma_with(a: f64, x: f64, gamma_of_a: f64) -> Result<f64> {
    if a <= 0.0 {
        return Err(MathError::InvalidArgument(format!("a = {a} is not positive")));
    }
    if x < 0.0 {
        return Err(MathError::InvalidArgument(format!("x = {x} is negative")));
    }
    if x < a + 1.0 {
        via_series(a, x, gamma_of_a)
    } else {
        via_continued_fraction(a, x)
    }
}

fn via_series(a: f64, x: f64, gamma_of_a: f64) -> Result<f64> {
    let mut factor = a;
    let mut delta = 1.0 / a;
    let mut sum = delta;
    let mut iterations = 0;
    while delta.abs() > sum.abs() * EPS {
        factor += 1.0;
        delta *= x / factor;
        sum += delta;
        iterations += 1;
        if iterations > MAX_ITERATIONS {
            return Err(MathError::NoConvergence { iterations });
        }
    }
    Ok(gamma_of_a - sum * (a * x.ln() - x).exp())
}

fn via_continued_fraction(a: f64, x: f64) -> Result<f64> {
    let mut b = x + 1.0 - a;
    let mut c = 1.0 / TINY;
    let mut d = 1.0 / b;
    let mut h = d;
    for i in 1..MAX_ITERATIONS {
        let an = -(i as f64) * (i as f64 - a);
        b += 2.0;
        d = an * d + b;
        c = an / c + b;
        if c.abs() < TINY {
            c = TINY;
        }
        if d.abs() < TINY {
            d = TINY;
        }
        d = 1.0 / d;
        let delta = c * d;
        h *= delta;
        if (delta - 1.0).abs() < EPS {
            return Ok(h * (a * x.ln() - x).exp());
        }
    }
    Err(MathError::NoConvergence {
        iterations: MAX_ITERATIONS,
    })
}

/// Settings for [`newton`].
#[derive(Debug, Clone, Copy)]
pub struct NewtonParams {
    /// Relative step size at which the iteration stops.
    pub tol: f64,
    pub max_iter: usize,
    /// Iterates are kept strictly above this value by halving the distance.
    pub lower_bound: f64,
}

impl Default for NewtonParams {
    fn default() -> Self {
        Self {
            tol: 1e-12,
            max_iter: 100,
            lower_bound: f64::NEG_INFINITY,
        }
    }
}

/// Newton–Raphson for a scalar root. `f` returns `(value, derivative)`.
pub fn newton<F>(mut f: F, x0: f64, params: NewtonParams) -> Result<f64>
where
    F: FnMut(f64) -> Result<(f64, f64)>,
{
    let mut x = x0;
    for _ in 0..params.max_iter {
        let (value, slope) = f(x)?;
        if value == 0.0 {
            return Ok(x);
        }
        if slope == 0.0 || !slope.is_finite() {
            break;
        }
        let mut next = x - value / slope;
        if next <= params.lower_bound {
            next = 0.5 * (x + params.lower_bound);
        }
        if !next.is_finite() {
            break;
        }
        let step = (next - x).abs();
        x = next;
        if step <= params.tol * x.abs().max(1.0) {
            return Ok(x);
        }
    }
    Err(MathError::NoConvergence {
        iterations: params.max_iter,
    })
}
