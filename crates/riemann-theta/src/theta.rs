//! Riemann theta function `θ(z | B) = Σ_{n∈ℤᵍ} exp(½ nᵀBn + nᵀz)`.
//!
//! The evaluator Siegel-reduces `B`, maps `z` through the transformation
//! law and the quasi-periodic shift, and sums over the integer points of an
//! ellipsoid whose radius bounds the neglected tail by the tolerance.
//! Every result comes split as `exp(factor) · sum`: the factor carries the
//! exponential growth in `z`, the sum stays of moderate size.

use std::f64::consts::{PI, SQRT_2};

use riemann_math::special::{self, NewtonParams};
use riemann_math::{linalg, CMat, CVec, Complex, DVec, LllParams, LllReducer, MathError};

use crate::config::ThetaConfig;
use crate::error::{Result, ThetaError};
use crate::lattice::{half_of_symmetric, LatticeEllipsoid};
use crate::modular::{check_period_matrix, ModularSupport, ModularTransformation};
use crate::siegel::SiegelReduction;
use crate::transform::QuasiPeriodicShift;

/// Value and directional derivatives of θ, each equal to `exp(factor) · x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThetaSum {
    pub factor: Complex,
    pub value: Complex,
    pub dx: Complex,
    pub dy: Complex,
    pub dxy: Complex,
    /// Lattice points summed over.
    pub lattice_points: usize,
}

impl ThetaSum {
    pub fn theta(&self) -> Complex {
        self.factor.exp() * self.value
    }

    pub fn dx_theta(&self) -> Complex {
        self.factor.exp() * self.dx
    }

    pub fn dy_theta(&self) -> Complex {
        self.factor.exp() * self.dy
    }

    pub fn dxy_theta(&self) -> Complex {
        self.factor.exp() * self.dxy
    }

    pub fn dx_log_theta(&self) -> Complex {
        self.dx / self.value
    }

    pub fn dxy_log_theta(&self) -> Complex {
        self.dxy / self.value - self.dx * self.dy / (self.value * self.value)
    }
}

/// Lattice sums before the factor corrections.
#[derive(Debug, Clone, Copy)]
struct RawSums {
    value: Complex,
    dx: Complex,
    dy: Complex,
    dxy: Complex,
    count: usize,
}

/// Half of the symmetric point set of the uniform approximation, `0`
/// first, with `exp(½ nᵀBn)` precomputed.
#[derive(Debug, Clone)]
struct UniformPoints {
    points: Vec<DVec>,
    weights: Vec<Complex>,
}

#[derive(Debug, Clone)]
pub struct Theta {
    config: ThetaConfig,
    period_matrix: CMat,
    reduced: CMat,
    /// `None` when the reduction is the identity.
    law: Option<ModularSupport>,
    transformation: ModularTransformation,
    shift: QuasiPeriodicShift,
    ellipsoid: LatticeEllipsoid,
    shortest: f64,
    fill_factor: f64,
    radius: f64,
    uniform: Option<UniformPoints>,
}

impl Theta {
    pub fn new(period_matrix: CMat, config: ThetaConfig) -> Result<Self> {
        let dim = check_period_matrix(&period_matrix)?;
        check_tolerance(config.tolerance)?;

        let (transformation, law, reduced, lower) = if config.siegel_reduction {
            let siegel = SiegelReduction::new(&period_matrix)?;
            let law = (!siegel.transformation().is_identity()).then(|| siegel.law().clone());
            (
                siegel.transformation().clone(),
                law,
                siegel.reduced_period_matrix().clone(),
                siegel.cholesky().clone(),
            )
        } else {
            let lower = linalg::cholesky_lower(&-linalg::re(&period_matrix))
                .map_err(|_| ThetaError::NotNegativeDefinite)?;
            (
                ModularTransformation::identity(dim),
                None,
                period_matrix.clone(),
                lower,
            )
        };

        let g = dim as f64;
        let det = lower.diagonal().product() / 2.0_f64.powf(g).sqrt();
        let shortest = if config.siegel_reduction {
            lower[(0, 0)] / SQRT_2
        } else {
            let mut basis = lower.clone();
            LllReducer::new(LllParams::default()).reduce(&mut basis);
            basis.row(0).norm() / SQRT_2
        };
        let fill_factor = 2.0 * PI.powf(g / 2.0) * shortest.powf(g)
            / 2.0_f64.powf(g)
            / g
            / special::gamma(g / 2.0)
            / det;

        let shift = QuasiPeriodicShift::new(&reduced)?;
        let ellipsoid = LatticeEllipsoid::new(&(linalg::re(&reduced) * -0.5))?;
        let mut theta = Self {
            config,
            period_matrix,
            reduced,
            law,
            transformation,
            shift,
            ellipsoid,
            shortest,
            fill_factor,
            radius: 0.0,
            uniform: None,
        };
        theta.update_lattice();
        Ok(theta)
    }

    pub fn with_tolerance(period_matrix: CMat, tolerance: f64) -> Result<Self> {
        Self::new(period_matrix, ThetaConfig::with_tolerance(tolerance))
    }

    pub fn set_period_matrix(&mut self, period_matrix: CMat) -> Result<()> {
        if period_matrix == self.period_matrix {
            return Ok(());
        }
        *self = Self::new(period_matrix, self.config)?;
        Ok(())
    }

    pub fn set_tolerance(&mut self, tolerance: f64) -> Result<()> {
        check_tolerance(tolerance)?;
        if tolerance != self.config.tolerance {
            self.config.tolerance = tolerance;
            self.update_lattice();
        }
        Ok(())
    }

    pub fn set_config(&mut self, config: ThetaConfig) -> Result<()> {
        check_tolerance(config.tolerance)?;
        if config.siegel_reduction != self.config.siegel_reduction {
            *self = Self::new(self.period_matrix.clone(), config)?;
        } else if config != self.config {
            self.config = config;
            self.update_lattice();
        }
        Ok(())
    }

    fn update_lattice(&mut self) {
        self.radius = self.error_radius();
        self.uniform = self.config.uniform_approximation.then(|| self.uniform_points());
        tracing::debug!(
            dim = self.dim(),
            radius = self.radius,
            shortest = self.shortest,
            points = ?self.num_lattice_points(),
            "theta lattice updated"
        );
    }

    /// Radius `R` with `f Γ(g/2, (R − ρ/2)²) = tolerance`, bounded below by
    /// `(√(2g) + ρ)/2`.
    fn error_radius(&self) -> f64 {
        let g = self.dim() as f64;
        let rho = self.shortest;
        let threshold = ((2.0 * g).sqrt() + rho) / 2.0;
        let mut f = g * 2.0_f64.powf(g) / rho.powf(g) / 2.0;
        if self.config.fill_factor_error {
            f *= self.fill_factor;
        }
        let a = g / 2.0;
        let gamma_of_a = special::gamma(a);
        let tolerance = self.config.tolerance;
        let root = special::newton(
            |x| {
                let value = f * special::upper_incomplete_gamma_with(a, x, gamma_of_a)? - tolerance;
                let slope = -f * ((a - 1.0) * x.ln() - x).exp();
                Ok((value, slope))
            },
            a,
            NewtonParams {
                lower_bound: 0.0,
                ..NewtonParams::default()
            },
        );
        match root {
            Ok(x) => (rho / 2.0 + x.sqrt()).max(threshold),
            Err(err) => {
                tracing::debug!(%err, "error radius solver failed, using threshold radius");
                threshold
            }
        }
    }

    fn uniform_points(&self) -> UniformPoints {
        let dim = self.dim();
        let all = self.ellipsoid.points_near_box(
            self.radius,
            &DVec::zeros(dim),
            &DVec::from_element(dim, 0.5),
        );
        let points = half_of_symmetric(all);
        let weights = points
            .iter()
            .map(|n| half_form(&self.reduced, n).exp())
            .collect();
        UniformPoints { points, weights }
    }

    pub fn dim(&self) -> usize {
        self.period_matrix.nrows()
    }

    pub fn config(&self) -> &ThetaConfig {
        &self.config
    }

    pub fn tolerance(&self) -> f64 {
        self.config.tolerance
    }

    pub fn period_matrix(&self) -> &CMat {
        &self.period_matrix
    }

    /// The matrix the lattice sums run over.
    pub fn reduced_period_matrix(&self) -> &CMat {
        &self.reduced
    }

    pub fn modular_transformation(&self) -> &ModularTransformation {
        &self.transformation
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn shortest_lattice_vector(&self) -> f64 {
        self.shortest
    }

    pub fn fill_factor(&self) -> f64 {
        self.fill_factor
    }

    /// Size of the uniform point set; `None` in pointwise mode, where the
    /// count is reported per evaluation in [`ThetaSum::lattice_points`].
    pub fn num_lattice_points(&self) -> Option<usize> {
        self.uniform.as_ref().map(|u| 2 * u.points.len() - 1)
    }

    pub fn theta_sum(&self, z: &CVec) -> Result<ThetaSum> {
        let zero = CVec::zeros(self.dim());
        self.evaluate(z, &zero, &zero)
    }

    pub fn d_theta_sum(&self, z: &CVec, x: &CVec) -> Result<ThetaSum> {
        self.evaluate(z, x, &CVec::zeros(self.dim()))
    }

    pub fn dd_theta_sum(&self, z: &CVec, x: &CVec, y: &CVec) -> Result<ThetaSum> {
        self.evaluate(z, x, y)
    }

    pub fn theta(&self, z: &CVec) -> Result<Complex> {
        Ok(self.theta_sum(z)?.theta())
    }

    /// Derivative of θ at `z` in direction `x`.
    pub fn d_theta(&self, z: &CVec, x: &CVec) -> Result<Complex> {
        Ok(self.d_theta_sum(z, x)?.dx_theta())
    }

    pub fn dd_theta(&self, z: &CVec, x: &CVec, y: &CVec) -> Result<Complex> {
        Ok(self.dd_theta_sum(z, x, y)?.dxy_theta())
    }

    pub fn d_log_theta(&self, z: &CVec, x: &CVec) -> Result<Complex> {
        Ok(self.d_theta_sum(z, x)?.dx_log_theta())
    }

    pub fn dd_log_theta(&self, z: &CVec, x: &CVec, y: &CVec) -> Result<Complex> {
        Ok(self.dd_theta_sum(z, x, y)?.dxy_log_theta())
    }

    fn check_len(&self, v: &CVec) -> Result<()> {
        if v.len() == self.dim() {
            Ok(())
        } else {
            Err(ThetaError::DimensionMismatch {
                expected: self.dim(),
                found: v.len(),
            })
        }
    }

    fn evaluate(&self, z: &CVec, x: &CVec, y: &CVec) -> Result<ThetaSum> {
        self.check_len(z)?;
        self.check_len(x)?;
        self.check_len(y)?;

        let (w, law_factor, wx, wy) = match &self.law {
            Some(law) => {
                let (tz, factor) = law.apply(z);
                (tz, factor, law.h() * x, law.h() * y)
            }
            None => (z.clone(), Complex::new(0.0, 0.0), x.clone(), y.clone()),
        };
        let shifted = self.shift.apply(&w);
        let sums = match &self.uniform {
            Some(uniform) => uniform_sums(uniform, &shifted.z, &wx, &wy),
            None => self.pointwise_sums(&shifted.z, &wx, &wy),
        };

        let m = shifted.m.map(|v| Complex::new(v, 0.0));
        let (fx, fy, fxy) = match &self.law {
            Some(law) => {
                let gradient = law.factor_gradient(z, &m);
                (gradient.dot(x), gradient.dot(y), law.factor_hessian(x, y))
            }
            None => (m.dot(x), m.dot(y), Complex::new(0.0, 0.0)),
        };

        let scale = (shifted.factor - shifted.continuous).exp();
        Ok(ThetaSum {
            factor: law_factor + shifted.continuous,
            value: sums.value * scale,
            dx: (sums.dx + fx * sums.value) * scale,
            dy: (sums.dy + fy * sums.value) * scale,
            dxy: (sums.dxy + fx * sums.dy + fy * sums.dx + (fx * fy + fxy) * sums.value) * scale,
            lattice_points: sums.count,
        })
    }

    /// Sum over the ellipsoid centred at the minimum of `−Re(½ nᵀBn + nᵀz)`.
    fn pointwise_sums(&self, z: &CVec, x: &CVec, y: &CVec) -> RawSums {
        let center = -(self.shift.re_b_inv() * linalg::re_vec(z));
        let mut sums = RawSums {
            value: Complex::new(0.0, 0.0),
            dx: Complex::new(0.0, 0.0),
            dy: Complex::new(0.0, 0.0),
            dxy: Complex::new(0.0, 0.0),
            count: 0,
        };
        for n in self.ellipsoid.points(self.radius, &center) {
            let term = (half_form(&self.reduced, &n) + dot_real(&n, z)).exp();
            let nx = dot_real(&n, x);
            let ny = dot_real(&n, y);
            sums.value += term;
            sums.dx += term * nx;
            sums.dy += term * ny;
            sums.dxy += term * nx * ny;
            sums.count += 1;
        }
        sums
    }

    pub fn report(&self) -> String {
        let mut s = String::new();
        s.push_str("=== Theta ===\n");
        s.push_str(&format!("Genus:            {}\n", self.dim()));
        s.push_str(&format!("Tolerance:        {:.3e}\n", self.config.tolerance));
        s.push_str(&format!(
            "Siegel reduced:   {}\n",
            if self.law.is_some() { "yes" } else { "no" }
        ));
        s.push_str(&format!("Radius:           {:.6}\n", self.radius));
        s.push_str(&format!("Shortest vector:  {:.6}\n", self.shortest));
        s.push_str(&format!("Fill factor:      {:.6}\n", self.fill_factor));
        match self.num_lattice_points() {
            Some(count) => s.push_str(&format!("Lattice points:   {count}\n")),
            None => s.push_str("Lattice points:   per evaluation\n"),
        }
        s
    }
}

fn check_tolerance(tolerance: f64) -> Result<()> {
    if tolerance > 0.0 && tolerance.is_finite() {
        Ok(())
    } else {
        Err(MathError::InvalidArgument(format!("tolerance {tolerance} is not positive")).into())
    }
}

/// `½ nᵀBn` for an integer vector stored as reals.
fn half_form(b: &CMat, n: &DVec) -> Complex {
    let mut sum = Complex::new(0.0, 0.0);
    for i in 0..n.len() {
        sum += b[(i, i)] * (0.5 * n[i] * n[i]);
        for j in i + 1..n.len() {
            sum += b[(i, j)] * (n[i] * n[j]);
        }
    }
    sum
}

fn dot_real(n: &DVec, v: &CVec) -> Complex {
    n.iter().zip(v.iter()).map(|(&a, &b)| b * a).sum()
}

/// Pairs `±n` into `w (e^{nz} + e^{−nz})` and the odd part for the
/// first derivatives.
fn uniform_sums(uniform: &UniformPoints, z: &CVec, x: &CVec, y: &CVec) -> RawSums {
    let mut sums = RawSums {
        value: Complex::new(1.0, 0.0),
        dx: Complex::new(0.0, 0.0),
        dy: Complex::new(0.0, 0.0),
        dxy: Complex::new(0.0, 0.0),
        count: 2 * uniform.points.len() - 1,
    };
    for (n, weight) in uniform.points.iter().zip(&uniform.weights).skip(1) {
        let e = dot_real(n, z).exp();
        let e_inv = e.inv();
        let even = (e + e_inv) * weight;
        let odd = (e - e_inv) * weight;
        let nx = dot_real(n, x);
        let ny = dot_real(n, y);
        sums.value += even;
        sums.dx += odd * nx;
        sums.dy += odd * ny;
        sums.dxy += even * nx * ny;
    }
    sums
}
