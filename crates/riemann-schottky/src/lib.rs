//! Classical Schottky groups and the quantities of the Riemann surface they
//! uniformize.
//!
//! A [`SchottkyGroup`] is built from `N` loxodromic generators given by
//! their fixed points and multipliers. Its reduced words are enumerated
//! lazily as a tree, and every series over the group is truncated with an
//! a-priori error bound:
//!
//! - [`period_matrix`](SchottkyGroup::period_matrix): `B = 2πiτ`
//! - [`v`](SchottkyGroup::v), [`sigma`](SchottkyGroup::sigma): difference series
//! - [`abelian_integral_of_1st_kind`](SchottkyGroup::abelian_integral_of_1st_kind),
//!   [`abel_map`](SchottkyGroup::abel_map) and the third kind
//! - [`abelian_differential_of_1st_kind`](SchottkyGroup::abelian_differential_of_1st_kind),
//!   [`gamma`](SchottkyGroup::gamma), [`chi`](SchottkyGroup::chi)
//!
//! ```no_run
//! use riemann_schottky::SchottkyGroup;
//!
//! let mut group = SchottkyGroup::from_uniformization_data(
//!     &[1.0, 0.0, -1.0, 0.0, 0.01, 0.0, 2.0, 0.0, -2.0, 0.0, 0.002, 0.0],
//!     1e-10,
//! )?;
//! let b = group.period_matrix()?;
//! println!("{b}");
//! # Ok::<(), riemann_schottky::SchottkyError>(())
//! ```

pub mod config;
pub mod count;
pub mod data;
pub mod differential;
pub mod element;
pub mod error;
mod estimate;
pub mod geometry;
pub mod group;
pub mod integral;
pub mod period;
pub mod series;
pub mod sigma;

pub use config::SchottkyConfig;
pub use count::WordCounts;
pub use data::{GeneratorData, SchottkyData};
pub use differential::DifferentialConstants;
pub use element::{inverse_word, ElementId, GroupElement, Letter};
pub use error::{Result, SchottkyError};
pub use geometry::Geometry;
pub use group::SchottkyGroup;
pub use series::SeriesReport;
