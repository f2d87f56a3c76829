//! Genus-two helicoid: period matrix, Siegel reduction and theta values.
//!
//! Builds the Schottky group of the genus-two helicoid, computes its period
//! matrix, reduces it and evaluates theta along the Abel image of a short
//! segment on the surface.
//!
//! Configuration via env vars (all optional):
//!   HEL_ACCURACY   Schottky series accuracy   (default 1e-10)
//!   HEL_TOL        theta truncation tolerance (default 1e-8)
//!   HEL_STEPS      points along the segment   (default 5)
//!   HEL_SIEGEL     Siegel reduction on/off    (default true)
//!   RUST_LOG       tracing filter             (default "info")
//!
//! Example:
//!   cargo run --example helicoid -p riemann --release
//!   HEL_TOL=1e-12 RUST_LOG=riemann_theta=debug cargo run --example helicoid -p riemann

use std::env;
use std::time::Instant;

use riemann::{
    CVec, Complex, SchottkyConfig, SchottkyData, SchottkySurface, SiegelReduction, ThetaConfig,
};
use tracing_subscriber::EnvFilter;

const HE2: [f64; 12] = [
    1.899744838484059,
    1.3383276978981307,
    -1.899744838484059,
    -1.3383276978981307,
    8.776111981589E-5,
    -1.0564238051974E-4,
    1.899744838484059,
    -1.3383276978981307,
    -1.899744838484059,
    1.3383276978981307,
    8.776111981589E-5,
    1.0564238051974E-4,
];

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let accuracy: f64 = env_or("HEL_ACCURACY", 1e-10);
    let tolerance: f64 = env_or("HEL_TOL", 1e-8);
    let steps: usize = env_or("HEL_STEPS", 5);
    let siegel: bool = env_or("HEL_SIEGEL", true);

    let start = Instant::now();
    let data = SchottkyData::from_uniformization_data(&HE2)?;
    let theta_config = ThetaConfig {
        siegel_reduction: siegel,
        ..ThetaConfig::with_tolerance(tolerance)
    };
    let mut surface =
        SchottkySurface::new(data, SchottkyConfig::with_accuracy(accuracy), theta_config)?;
    println!("Built surface in {:.2?}", start.elapsed());
    println!("{}", surface.report());

    let b = surface.period_matrix().clone();
    println!("Period matrix:");
    for i in 0..b.nrows() {
        let row: Vec<String> = (0..b.ncols())
            .map(|j| format!("{:>12.8} {:+.8}i", b[(i, j)].re, b[(i, j)].im))
            .collect();
        println!("  {}", row.join("   "));
    }

    let reduction = SiegelReduction::new(&b)?;
    println!(
        "\nSiegel reduction: {} iterations, identity = {}",
        reduction.iterations(),
        reduction.transformation().is_identity()
    );
    let reduced = reduction.reduced_period_matrix();
    for i in 0..reduced.nrows() {
        let row: Vec<String> = (0..reduced.ncols())
            .map(|j| format!("{:>12.8} {:+.8}i", reduced[(i, j)].re, reduced[(i, j)].im))
            .collect();
        println!("  {}", row.join("   "));
    }

    let base = Complex::new(0.0, 0.0);
    let e = CVec::from_element(surface.genus(), Complex::new(0.0, std::f64::consts::PI));
    println!("\n{:>6} {:>26} {:>26}", "t", "p", "theta(A(p) + e)");
    for k in 0..steps {
        let t = k as f64 / steps.max(2).saturating_sub(1) as f64;
        let p = Complex::new(0.5 * t, 0.3 + 0.4 * t);
        let value = surface.theta_on_surface(p, base, &e)?;
        println!(
            "{:>6.3} {:>12.6} {:+12.6}i {:>12.6e} {:+12.6e}i",
            t, p.re, p.im, value.re, value.im
        );
    }
    println!("\nTotal time: {:.2?}", start.elapsed());
    Ok(())
}
