//! End-to-end checks from Schottky data to theta values.

use riemann::{
    riemann_math::complex::dist_mod_2pi_i, CVec, Complex, RiemannError, SchottkyConfig,
    SchottkyData, SchottkyError, SchottkyGroup, SchottkySurface, ThetaConfig,
};

fn surface(genus: usize) -> SchottkySurface {
    SchottkySurface::new(
        SchottkyData::default_for_genus(genus),
        SchottkyConfig::with_accuracy(1e-12),
        ThetaConfig::with_tolerance(1e-12),
    )
    .unwrap()
}

#[test]
fn theta_is_quasi_periodic_along_b_cycles() {
    let mut surface = surface(2);
    let b = surface.period_matrix().clone();
    let base = Complex::new(0.0, 0.5);
    let p = Complex::new(0.1, 0.8);
    let e = CVec::from_vec(vec![Complex::new(0.2, 0.3), Complex::new(-0.1, 0.7)]);
    for n in 0..2 {
        let sigma_p = surface.group().geometry().generator(n).apply(p);
        let u = surface.abel_map(p, base).unwrap() + &e;
        let value = surface.theta_on_surface(p, base, &e).unwrap();
        let moved = surface.theta_on_surface(sigma_p, base, &e).unwrap();
        let expected = value * (-(b[(n, n)] * 0.5) - u[n]).exp();
        assert!(
            (moved - expected).norm() < 1e-5 * (1.0 + expected.norm()),
            "n = {n}: {moved} vs {expected}"
        );
    }
}

#[test]
fn abel_map_is_additive() {
    let mut surface = surface(3);
    let (a, b, c) = (Complex::new(0.0, 0.5), Complex::new(0.3, -0.4), Complex::new(-0.2, 0.1));
    let ab = surface.abel_map(a, b).unwrap();
    let bc = surface.abel_map(b, c).unwrap();
    let ac = surface.abel_map(a, c).unwrap();
    for k in 0..3 {
        assert!(dist_mod_2pi_i(ab[k] + bc[k], ac[k]) < 1e-9);
    }
}

#[test]
fn set_data_recomputes_period_matrix() {
    let mut surface = surface(2);
    assert_eq!(surface.period_matrix().nrows(), 2);
    surface.set_data(SchottkyData::default_for_genus(3)).unwrap();
    assert_eq!(surface.genus(), 3);
    assert_eq!(surface.period_matrix().nrows(), 3);
    assert_eq!(surface.theta().dim(), 3);
    assert!(surface.report().starts_with("=== Schottky Surface ==="));
}

#[test]
fn failed_set_data_keeps_the_surface() {
    let data = SchottkyData::default_for_genus(2);
    // Cap the arena at exactly what the initial data needs.
    let mut sizing = SchottkyGroup::new(data.clone(), SchottkyConfig::default()).unwrap();
    sizing.period_matrix().unwrap();
    let config = SchottkyConfig {
        max_elements: sizing.num_elements(),
        ..SchottkyConfig::default()
    };
    let mut surface = SchottkySurface::new(data.clone(), config, ThetaConfig::default()).unwrap();
    let period_matrix = surface.period_matrix().clone();
    let z = CVec::from_element(2, Complex::new(0.1, 0.2));
    let value = surface.theta().theta(&z).unwrap();

    // Larger circles need more group elements than the cap allows.
    let mut flat = data.to_uniformization_data();
    flat[4] = 0.02;
    let err = surface.set_data(SchottkyData::from_uniformization_data(&flat).unwrap());
    assert!(
        matches!(err, Err(RiemannError::Schottky(SchottkyError::TooManyElements { .. }))),
        "{err:?}"
    );

    assert_eq!(surface.group().data(), &data);
    assert_eq!(surface.period_matrix(), &period_matrix);
    assert_eq!(surface.theta().period_matrix(), &period_matrix);
    let again = surface.theta().theta(&z).unwrap();
    assert!((again - value).norm() < 1e-12 * (1.0 + value.norm()));
    assert_eq!(surface.group().num_elements(), sizing.num_elements());
}
