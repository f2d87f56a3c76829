//! Complex scalar helpers.

use crate::TWO_PI;

/// Double precision complex number used throughout the workspace.
pub type Complex = num_complex::Complex64;

/// Cross-ratio `(c - b)(a - d) / ((b - a)(d - c))`.
#[inline]
pub fn cross_ratio(a: Complex, b: Complex, c: Complex, d: Complex) -> Complex {
    (c - b) * (a - d) / ((b - a) * (d - c))
}

/// `|Re z| + |Im z|`, the cheap majorant of `|z|` used by all series bounds.
#[inline]
pub fn l1_norm(z: Complex) -> f64 {
    z.re.abs() + z.im.abs()
}

/// Distance between `u` and `v` after reducing the imaginary part of the
/// difference modulo 2π.
pub fn dist_mod_2pi_i(u: Complex, v: Complex) -> f64 {
    let re = u.re - v.re;
    let im = u.im - v.im;
    let im = im - (im / TWO_PI + 0.5).floor() * TWO_PI;
    re.hypot(im)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_cross_ratio_of_standard_points() {
        // (0, ∞-ish, 1, z) reduces to a Möbius invariant; check a value by hand.
        let a = Complex::new(0.0, 0.0);
        let b = Complex::new(1.0, 0.0);
        let c = Complex::new(2.0, 0.0);
        let d = Complex::new(3.0, 0.0);
        // (2-1)(0-3) / ((1-0)(3-2)) = -3
        let r = cross_ratio(a, b, c, d);
        assert!((r - Complex::new(-3.0, 0.0)).norm() < 1e-15);
    }

    #[test]
    fn test_cross_ratio_is_moebius_invariant() {
        let m = crate::Moebius::new(
            Complex::new(1.0, 0.5),
            Complex::new(0.3, -0.2),
            Complex::new(0.1, 0.4),
            Complex::new(1.2, 0.0),
        );
        let pts = [
            Complex::new(0.2, 0.1),
            Complex::new(-1.0, 0.7),
            Complex::new(2.0, -0.3),
            Complex::new(0.5, 1.5),
        ];
        let r0 = cross_ratio(pts[0], pts[1], pts[2], pts[3]);
        let r1 = cross_ratio(m.apply(pts[0]), m.apply(pts[1]), m.apply(pts[2]), m.apply(pts[3]));
        assert!((r0 - r1).norm() < 1e-12, "{r0} vs {r1}");
    }

    #[test]
    fn test_dist_mod_2pi_i() {
        let u = Complex::new(1.0, PI);
        let v = Complex::new(1.0, -PI);
        assert!(dist_mod_2pi_i(u, v) < 1e-14);
        assert!((dist_mod_2pi_i(Complex::new(0.0, 1.0), Complex::new(0.0, 0.0)) - 1.0).abs() < 1e-15);
    }
}
