//! Element-dependent distance and contraction bounds.
//!
//! For an element σ with rightmost letter `r`, the whole fundamental domain
//! is mapped into the image under `σ r⁻¹` of the circle that `r` maps into;
//! this is the target circle of σ. The identity uses the depth of a point
//! inside the isometric circles instead.

use riemann_math::Complex;

use crate::element::{ElementTree, GroupElement};
use crate::geometry::{dist, Geometry};

/// Tolerance below which a point counts as lying on the target circle.
const ON_CIRCLE: f64 = -1e-12;

/// Center and radius of the circle containing σ(F).
pub(crate) fn target_circle(geo: &Geometry, sigma: &GroupElement) -> (Complex, f64) {
    let Some(right) = sigma.right() else {
        return (Complex::new(0.0, 0.0), 0.0);
    };
    let center = geo.center(right.index, 1 - right.side());
    let radius = geo.radius(right.index);
    if sigma.word_length() == 1 {
        return (center, radius);
    }
    sigma
        .moebius()
        .compose(geo.letter(right.inverse()))
        .map_circle(center, radius)
}

/// Distance of `p` to the target circle of σ.
pub(crate) fn k(geo: &Geometry, sigma: &GroupElement, p: Complex) -> f64 {
    if sigma.is_identity() {
        return geo.dist_identity(p);
    }
    let (center, radius) = target_circle(geo, sigma);
    let d = dist(center, p) - radius;
    if d > ON_CIRCLE {
        return d.max(0.0);
    }
    // p lies inside σ(F)'s circle; measure its depth in an image circle.
    tracing::trace!(?p, "point inside target circle");
    for j in 0..2 {
        for i in 0..geo.num_generators() {
            let (c, r) = sigma.moebius().map_circle(geo.center(i, j), geo.radius(i));
            let depth = r - dist(c, p);
            if depth > 0.0 {
                return depth;
            }
        }
    }
    0.0
}

/// Largest distance from `p` to the target circle of σ.
pub(crate) fn big_k(geo: &Geometry, sigma: &GroupElement, p: Complex) -> f64 {
    if sigma.is_identity() {
        return geo.dist_identity(p);
    }
    let (center, radius) = target_circle(geo, sigma);
    dist(center, p) + radius
}

/// Contraction of the last letter of τ relative to its parent.
pub(crate) fn theta(geo: &Geometry, tree: &ElementTree, tau: &GroupElement) -> f64 {
    let (Some(left), Some(parent)) = (tau.left(), tau.parent()) else {
        return 1.0;
    };
    let center = geo.center(left.index, left.side());
    geo.radius(left.index) / k(geo, tree.get(parent), center)
}

fn sqrt_of_abs_mu(geo: &Geometry, n: usize, inverse: bool) -> f64 {
    let s = geo.mu(n).norm().sqrt();
    if inverse {
        1.0 / s
    } else {
        s
    }
}

/// Lower bound for `|σ'|^{-1/2}` on the fundamental domain relative to the
/// parent of σ.
pub(crate) fn kappa_l_bar(geo: &Geometry, tree: &ElementTree, sigma: &GroupElement) -> f64 {
    let (Some(left), Some(parent)) = (sigma.left(), sigma.parent()) else {
        return f64::MAX;
    };
    let tau = tree.get(parent);
    let l = left.index;
    let (a, b) = (geo.a(l), geo.b(l));
    let s = sqrt_of_abs_mu(geo, l, left.inverse);
    let v1 = k(geo, tau, a) / s - big_k(geo, tau, b) * s;
    let v2 = k(geo, tau, b) * s - big_k(geo, tau, a) / s;
    v1.max(v2) / dist(a, b)
}

/// Word-length-one version of [`kappa_l_bar`] for letter `(r, i)` acting on
/// points of circle `(m, j)`.
pub(crate) fn kappa_r_bar(geo: &Geometry, j: usize, m: usize, i: usize, r: usize) -> f64 {
    let (a, b) = (geo.a(r), geo.b(r));
    let s = sqrt_of_abs_mu(geo, r, i == 1);
    let j_inv = 1 - j;
    let v1 = geo.k(j_inv, m, a) * s - geo.big_k(j_inv, m, b) / s;
    let v2 = geo.k(j_inv, m, b) / s - geo.big_k(j_inv, m, a) * s;
    v1.max(v2) / dist(a, b)
}

/// Distance of the images of the 2N − 1 admissible circles under σ to the
/// boundary of the circle σ's last letter maps into.
pub(crate) fn d(geo: &Geometry, sigma: &GroupElement) -> f64 {
    let Some(left) = sigma.left() else {
        return f64::MAX;
    };
    let n = left.index;
    let i = 1 - left.side();
    let mut min = f64::MAX;
    for m in 0..geo.num_generators() {
        for j in 0..2 {
            if m != n || i == j {
                let (c, r) = sigma.moebius().map_circle(geo.center(m, j), geo.radius(m));
                let aside = geo.radius(n) - dist(geo.center(n, i), c) - r;
                if aside < 0.0 {
                    tracing::warn!(n, i, m, j, "image circle leaves its target circle");
                }
                min = min.min(aside);
            }
        }
    }
    min
}
