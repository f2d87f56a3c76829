//! Riemann theta functions of period matrices `B = 2πiτ` with negative
//! definite real part.
//!
//! - [`Theta`]: `θ(z | B)` and its first and second directional
//!   derivatives, evaluated to a prescribed absolute tolerance
//! - [`SiegelReduction`]: reduction of `B` by integral symplectic
//!   transformations, used by [`Theta`] to keep the lattice sums short
//! - [`ModularTransformation`], [`ModularSupport`]: the symplectic action on
//!   period matrices and the theta transformation law
//!
//! ```
//! use riemann_math::{CMat, CVec, Complex};
//! use riemann_theta::{Theta, ThetaConfig};
//!
//! let b = CMat::from_element(1, 1, Complex::new(-3.0, 0.5));
//! let theta = Theta::new(b, ThetaConfig::default())?;
//! let value = theta.theta(&CVec::from_element(1, Complex::new(0.1, 0.2)))?;
//! assert!(value.norm() > 0.0);
//! # Ok::<(), riemann_theta::ThetaError>(())
//! ```

pub mod config;
pub mod error;
pub mod lattice;
pub mod modular;
pub mod siegel;
pub mod theta;
pub mod transform;

pub use config::ThetaConfig;
pub use error::{Result, ThetaError};
pub use lattice::LatticeEllipsoid;
pub use modular::{check_period_matrix, ModularSupport, ModularTransformation};
pub use siegel::SiegelReduction;
pub use theta::{Theta, ThetaSum};
pub use transform::{QuasiPeriodicShift, ShiftedArgument};
