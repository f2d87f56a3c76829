//! riemann: Schottky uniformization and Riemann theta functions.
//!
//! This is the umbrella crate. It re-exports the workspace crates and
//! provides [`SchottkySurface`], which ties a Schottky group to the theta
//! function of its period matrix.

pub use riemann_math::{self, CMat, CVec, Complex};
pub use riemann_schottky::{
    self, SchottkyConfig, SchottkyData, SchottkyError, SchottkyGroup, SeriesReport,
};
pub use riemann_theta::{
    self, ModularTransformation, SiegelReduction, Theta, ThetaConfig, ThetaError, ThetaSum,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RiemannError {
    #[error(transparent)]
    Schottky(#[from] SchottkyError),

    #[error(transparent)]
    Theta(#[from] ThetaError),
}

pub type Result<T> = std::result::Result<T, RiemannError>;

/// The Riemann surface uniformized by a Schottky group, with its period
/// matrix and theta function.
#[derive(Debug)]
pub struct SchottkySurface {
    group: SchottkyGroup,
    period_matrix: CMat,
    theta: Theta,
}

impl SchottkySurface {
    pub fn new(data: SchottkyData, config: SchottkyConfig, theta_config: ThetaConfig) -> Result<Self> {
        let mut group = SchottkyGroup::new(data, config)?;
        let period_matrix = group.period_matrix()?;
        let theta = Theta::new(period_matrix.clone(), theta_config)?;
        tracing::debug!(
            genus = group.num_generators(),
            elements = group.num_elements(),
            "schottky surface built"
        );
        Ok(Self {
            group,
            period_matrix,
            theta,
        })
    }

    /// Replace the uniformization data, recomputing the period matrix.
    ///
    /// On error the surface is left untouched.
    pub fn set_data(&mut self, data: SchottkyData) -> Result<()> {
        let mut group = self.group.clone();
        group.set_data(data)?;
        let period_matrix = group.period_matrix()?;
        let mut theta = self.theta.clone();
        theta.set_period_matrix(period_matrix.clone())?;
        self.group = group;
        self.period_matrix = period_matrix;
        self.theta = theta;
        Ok(())
    }

    pub fn genus(&self) -> usize {
        self.group.num_generators()
    }

    pub fn group(&self) -> &SchottkyGroup {
        &self.group
    }

    pub fn period_matrix(&self) -> &CMat {
        &self.period_matrix
    }

    pub fn theta(&self) -> &Theta {
        &self.theta
    }

    /// `∫_base^p ω`, the vector of normalized integrals of the first kind.
    pub fn abel_map(&mut self, p: Complex, base: Complex) -> Result<CVec> {
        let at_p = self.group.abel_map(p)?;
        let at_base = self.group.abel_map(base)?;
        Ok(at_p - at_base)
    }

    /// `θ(∫_base^p ω + e | B)`.
    pub fn theta_on_surface(&mut self, p: Complex, base: Complex, e: &CVec) -> Result<Complex> {
        let u = self.abel_map(p, base)? + e;
        Ok(self.theta.theta(&u)?)
    }

    pub fn report(&self) -> String {
        let mut s = String::new();
        s.push_str("=== Schottky Surface ===\n");
        s.push_str(&format!("Genus:            {}\n", self.genus()));
        s.push_str(&format!("Group elements:   {}\n", self.group.num_elements()));
        s.push_str(&format!("theta1:           {:.6}\n", self.group.theta1()));
        s.push_str(&format!("q1:               {:.6}\n", self.group.q1()));
        s.push('\n');
        s.push_str(&self.theta.report());
        s
    }
}
