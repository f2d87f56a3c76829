//! Integration tests for Schottky group series.

use approx::assert_abs_diff_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use riemann_math::complex::dist_mod_2pi_i;
use riemann_math::{CMat, Complex, TWO_PI};
use riemann_schottky::{Letter, SchottkyConfig, SchottkyData, SchottkyError, SchottkyGroup};

const HE1: [f64; 6] = [1.47361, 0.0, -1.47361, 0.0, -0.0265972, 0.0];

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

fn he2_period_matrix() -> CMat {
    let re = [
        [-8.893841400451032, -0.7005977257529801],
        [-0.7005977257529801, -8.893841400451029],
    ];
    let im = [
        [-0.8785450734734299, 3.1415926535897927],
        [3.1415926535897927, 0.8785450734734307],
    ];
    CMat::from_fn(2, 2, |i, j| Complex::new(re[i][j], im[i][j]))
}

fn max_dist_mod_2pi_i(a: &CMat, b: &CMat) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| dist_mod_2pi_i(*x, *y))
        .fold(0.0, f64::max)
}

/// All reduced words of length `k` over `n` generators, leftmost letter first.
fn reduced_words(n: usize, k: usize) -> Vec<String> {
    let letters: Vec<Letter> = (0..n)
        .flat_map(|i| [Letter::new(i, false), Letter::new(i, true)])
        .collect();
    let mut words: Vec<Vec<Letter>> = vec![Vec::new()];
    for _ in 0..k {
        let mut next = Vec::new();
        for w in &words {
            for &l in &letters {
                if w.last().is_some_and(|&last| last == l.inverse()) {
                    continue;
                }
                let mut longer = w.clone();
                longer.push(l);
                next.push(longer);
            }
        }
        words = next;
    }
    words
        .into_iter()
        .map(|w| w.iter().map(|l| l.to_string()).collect())
        .collect()
}

#[test]
fn coset_counts_match_brute_force() {
    for n in 2..=4 {
        let group = SchottkyGroup::default_for_genus(n).unwrap();
        for k in 0..=6 {
            let words = reduced_words(n, k);
            assert_eq!(group.counts().all(k).unwrap(), words.len() as i64, "N = {n}, k = {k}");
            let coset = words
                .iter()
                .filter(|w| w.chars().last().map_or(true, |c| Letter::from_char(c).unwrap().index != 0))
                .count();
            assert_eq!(group.counts().coset(k).unwrap(), coset as i64, "N = {n}, k = {k}");
        }
    }
}

#[test]
fn arena_enumerates_every_reduced_word() {
    for n in 2..=4 {
        let mut group = SchottkyGroup::default_for_genus(n).unwrap();
        let max_k = if n == 4 { 4 } else { 5 };
        for k in 1..=max_k {
            for word in reduced_words(n, k) {
                let id = group.element_by_word(&word).unwrap();
                assert_eq!(group.word(id), word);
                assert_eq!(group.element(id).word_length(), k);
            }
        }
        let expected: usize = (0..=max_k).map(|k| reduced_words(n, k).len()).sum();
        assert_eq!(group.num_elements(), expected);
    }
}

fn random_classical_group(rng: &mut StdRng, genus: usize) -> SchottkyGroup {
    loop {
        let mut data = Vec::with_capacity(6 * genus);
        for _ in 0..genus {
            let a = Complex::new(rng.gen_range(-3.0..3.0), rng.gen_range(-3.0..3.0));
            let b = Complex::new(rng.gen_range(-3.0..3.0), rng.gen_range(-3.0..3.0));
            let mu = Complex::from_polar(rng.gen_range(1e-5..1e-3), rng.gen_range(0.0..TWO_PI));
            data.extend_from_slice(&[a.re, a.im, b.re, b.im, mu.re, mu.im]);
        }
        match SchottkyGroup::from_uniformization_data(&data, 1e-8) {
            Ok(group) if !group.uses_theta2() => return group,
            _ => continue,
        }
    }
}

#[test]
fn contraction_invariant_on_random_configurations() {
    let mut rng = StdRng::seed_from_u64(7);
    for genus in [2, 3] {
        for _ in 0..5 {
            let mut group = random_classical_group(&mut rng, genus);
            let q = group.theta1() * group.theta1();
            for n in 0..genus {
                let (a, b) = (group.geometry().a(n), group.geometry().b(n));
                for k in 2..=4 {
                    for word in reduced_words(genus, k) {
                        let last = word.chars().last().and_then(Letter::from_char).unwrap();
                        if last.index == n {
                            continue;
                        }
                        let id = group.element_by_word(&word).unwrap();
                        let parent = group.element_by_word(&word[1..]).unwrap();
                        let d = group.element(id).moebius().diff(a, b).norm();
                        let d_parent = group.element(parent).moebius().diff(a, b).norm();
                        assert!(
                            d <= q * d_parent * (1.0 + 1e-9),
                            "word {word}: {d} > {q} * {d_parent}"
                        );
                    }
                }
                group.v(n, 1e-10).unwrap();
            }
        }
    }
}

#[test]
fn period_matrix_is_symmetric() {
    let mut rng = StdRng::seed_from_u64(11);
    for genus in [2, 3, 4] {
        let mut group = random_classical_group(&mut rng, genus);
        let b = group.period_matrix().unwrap();
        for i in 0..genus {
            assert!(b[(i, i)].re < 0.0);
            for j in 0..genus {
                assert_eq!(b[(i, j)], b[(j, i)]);
            }
        }
    }
}

#[test]
fn genus_one_helicoid() {
    let mut group = SchottkyGroup::from_uniformization_data(&HE1, 1e-10).unwrap();
    let b = group.period_matrix().unwrap();
    assert_abs_diff_eq!(b[(0, 0)].re, -3.6269493318929333, epsilon = 1e-12);
    assert_abs_diff_eq!(b[(0, 0)].im, std::f64::consts::PI, epsilon = 1e-12);
}

#[test]
fn genus_two_helicoid() {
    let mut group = SchottkyGroup::from_uniformization_data(&HE2, 1e-10).unwrap();
    let b = group.period_matrix().unwrap();
    let dist = max_dist_mod_2pi_i(&b, &he2_period_matrix());
    assert!(dist < 1e-8, "distance to reference {dist}");
}

#[test]
fn accuracy_is_monotone() {
    let mut group = SchottkyGroup::from_uniformization_data(&HE2, 1e-10).unwrap();
    let reference = group.period_matrix_with_accuracy(1e-10).unwrap();
    for acc in [1e-4, 1e-6, 1e-8] {
        let b = group.period_matrix_with_accuracy(acc).unwrap();
        let dist = max_dist_mod_2pi_i(&b, &reference);
        assert!(dist < acc, "accuracy {acc}: off by {dist}");
    }
    for n in 0..2 {
        let coarse = group.v(n, 1e-6).unwrap();
        let fine = group.v(n, 1e-8).unwrap();
        assert!((coarse - fine).norm() < 1e-6, "V({n})");
    }
}

#[test]
fn truncation_error_stays_below_requested_accuracy() {
    let mut rng = StdRng::seed_from_u64(23);
    for genus in [2, 3] {
        for _ in 0..4 {
            let mut group = random_classical_group(&mut rng, genus);
            while group.q1() > 0.5 {
                group = random_classical_group(&mut rng, genus);
            }
            group
                .set_config(SchottkyConfig {
                    max_elements: 1_000_000,
                    ..*group.config()
                })
                .unwrap();
            let reference_b = group.period_matrix_with_accuracy(1e-12).unwrap();
            let reference_v = group.v_vector(1e-12).unwrap();
            for acc in [1e-4, 1e-6, 1e-8, 1e-10] {
                let b = group.period_matrix_with_accuracy(acc).unwrap();
                let dist = max_dist_mod_2pi_i(&b, &reference_b);
                assert!(dist < acc, "genus {genus}, q1 {}: B off by {dist} at {acc}", group.q1());
                let v = group.v_vector(acc).unwrap();
                for n in 0..genus {
                    let err = (v[n] - reference_v[n]).norm();
                    assert!(err < acc, "genus {genus}, q1 {}: V({n}) off by {err} at {acc}", group.q1());
                }
            }
        }
    }
}

/// `∮ ω_k` over the circle of radius `1.2 r` around circle `(i, j)`, by the
/// trapezoidal rule.
fn circle_integral(group: &mut SchottkyGroup, k: usize, i: usize, j: usize, acc: f64) -> Complex {
    const POINTS: usize = 256;
    let center = group.geometry().center(i, j);
    let radius = 1.2 * group.geometry().radius(i);
    let mut sum = Complex::new(0.0, 0.0);
    for p in 0..POINTS {
        let t = TWO_PI * p as f64 / POINTS as f64;
        let e = Complex::from_polar(1.0, t);
        let z = center + e * radius;
        let omega = group.abelian_differential_of_1st_kind(z, k, acc).unwrap();
        sum += omega * Complex::new(0.0, radius) * e;
    }
    sum * (TWO_PI / POINTS as f64)
}

#[test]
fn differentials_are_normalized() {
    for data in [SchottkyData::default_for_genus(3), SchottkyData::from_uniformization_data(&HE2).unwrap()] {
        let mut group = SchottkyGroup::new(data, SchottkyConfig::default()).unwrap();
        let acc = 1e-9;
        let n = group.num_generators();
        for i in 0..n {
            for j in 0..2 {
                for k in 0..n {
                    let value = circle_integral(&mut group, k, i, j, acc);
                    let expected = match (k == i, j) {
                        (false, _) => 0.0,
                        (true, 0) => -TWO_PI,
                        (true, _) => TWO_PI,
                    };
                    assert_abs_diff_eq!(value.re, 0.0, epsilon = acc * 10.0);
                    assert_abs_diff_eq!(value.im, expected, epsilon = acc * 10.0);
                }
            }
        }
    }
}

#[test]
fn abel_map_jumps_by_periods() {
    // Crossing from circle (n, 0) to its image (n, 1) adds the n-th column of B.
    let mut group = SchottkyGroup::default_for_genus(2).unwrap();
    let b = group.period_matrix_with_accuracy(1e-12).unwrap();
    let z = Complex::new(0.0, 0.8);
    let n = 1;
    let sigma_z = group.geometry().generator(n).apply(z);
    let a = group.abel_map(z).unwrap();
    let a_sigma = group.abel_map(sigma_z).unwrap();
    for k in 0..2 {
        let jump = a_sigma[k] - a[k];
        assert!(dist_mod_2pi_i(jump, b[(k, n)]) < 1e-6, "k = {k}: {jump} vs {}", b[(k, n)]);
    }
}

#[test]
fn rejects_invalid_data() {
    assert!(matches!(
        SchottkyGroup::from_uniformization_data(&[1.0, 0.0, -1.0, 0.0, 0.1], 1e-6),
        Err(SchottkyError::InvalidData(_))
    ));
    assert!(matches!(
        SchottkyGroup::from_uniformization_data(
            &[1.0, 0.0, -1.0, 0.0, 0.5, 0.0, 1.2, 0.0, -1.2, 0.0, 0.5, 0.0],
            1e-6
        ),
        Err(SchottkyError::NotClassical)
    ));
    assert!(matches!(
        SchottkyGroup::from_uniformization_data(&HE1, 0.0),
        Err(SchottkyError::InvalidData(_))
    ));
}

#[test]
fn word_length_cap_is_reported() {
    let config = SchottkyConfig {
        max_word_length: 2,
        ..SchottkyConfig::default()
    };
    let mut group = SchottkyGroup::new(SchottkyData::default_for_genus(2), config).unwrap();
    let err = group.period_matrix_with_accuracy(1e-14).unwrap_err();
    assert!(matches!(err, SchottkyError::AccuracyNotReached { word_length: 3 }));
}
