//! Integer points of ellipsoids `(n − c)ᵀ Q (n − c) ≤ r²`.
//!
//! With `Q = TᵀT`, `T` upper triangular, the last coordinate is bounded by
//! `|n_g − c_g| ≤ r / T_gg`; fixing it leaves an ellipsoid of one dimension
//! less with a shifted centre and a smaller radius. A box of centres
//! `c ± d` is handled by widening each range by the deviation and measuring
//! the consumed radius from the nearest centre.

use riemann_math::{linalg, DMat, DVec, MathError};

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct LatticeEllipsoid {
    t: DMat,
    /// `T[..h, ..h]⁻¹ T[..h, h]`, indexed by `h`.
    offsets: Vec<DVec>,
}

impl LatticeEllipsoid {
    /// Ellipsoids of the positive definite form `q`.
    pub fn new(q: &DMat) -> Result<Self> {
        let t = linalg::cholesky_upper(q)?;
        let dim = t.nrows();
        let mut offsets = Vec::with_capacity(dim);
        offsets.push(DVec::zeros(0));
        for h in 1..dim {
            let block = DMat::from_fn(h, h, |i, j| t[(i, j)]);
            let column = DVec::from_fn(h, |i, _| t[(i, h)]);
            let offset = block
                .solve_upper_triangular(&column)
                .ok_or(MathError::SingularMatrix)?;
            offsets.push(offset);
        }
        Ok(Self { t, offsets })
    }

    pub fn dim(&self) -> usize {
        self.t.nrows()
    }

    /// Points within `radius` of the centre `center`.
    pub fn points(&self, radius: f64, center: &DVec) -> Vec<DVec> {
        self.points_near_box(radius, center, &DVec::zeros(self.dim()))
    }

    /// Points within `radius` of some centre in the box `center ± deviation`.
    pub fn points_near_box(&self, radius: f64, center: &DVec, deviation: &DVec) -> Vec<DVec> {
        let dim = self.dim();
        let mut out = Vec::new();
        if dim == 0 || radius < 0.0 {
            return out;
        }
        let mut n = DVec::zeros(dim);
        self.search(dim, radius, center.clone(), deviation.clone(), &mut n, &mut out);
        out
    }

    fn search(&self, g: usize, r: f64, c: DVec, d: DVec, n: &mut DVec, out: &mut Vec<DVec>) {
        let h = g - 1;
        let tgg = self.t[(h, h)];
        let lower = (c[h] - d[h] - r / tgg).ceil() as i64;
        let upper = (c[h] + d[h] + r / tgg).floor() as i64;
        if h == 0 {
            for i in lower..=upper {
                n[0] = i as f64;
                out.push(n.clone());
            }
            return;
        }

        let offset = &self.offsets[h];
        let deviation = DVec::from_fn(h, |j, _| d[j] + offset[j].abs() * d[h]);
        for i in lower..=upper {
            let ni = i as f64;
            n[h] = ni;
            let step = ni - c[h];
            let gap = if step < -d[h] {
                step + d[h]
            } else if step > d[h] {
                step - d[h]
            } else {
                0.0
            };
            let rest = r * r - tgg * tgg * gap * gap;
            if rest < 0.0 {
                continue;
            }
            let center = DVec::from_fn(h, |j, _| c[j] - offset[j] * step);
            self.search(h, rest.sqrt(), center, deviation.clone(), n, out);
        }
    }
}

/// Keeps one point of each pair `±n`, with `0` first.
pub fn half_of_symmetric(points: Vec<DVec>) -> Vec<DVec> {
    let dim = points.first().map_or(0, |p| p.len());
    let mut half = vec![DVec::zeros(dim)];
    half.extend(points.into_iter().filter(|n| {
        n.iter()
            .rev()
            .find(|&&x| x != 0.0)
            .is_some_and(|&x| x > 0.0)
    }));
    half
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force(q: &DMat, radius: f64, center: &DVec, bound: i64) -> usize {
        let dim = q.nrows();
        let mut count = 0;
        let total = (2 * bound + 1).pow(dim as u32);
        for index in 0..total {
            let mut rest = index;
            let n = DVec::from_fn(dim, |_, _| {
                let v = rest % (2 * bound + 1) - bound;
                rest /= 2 * bound + 1;
                v as f64
            });
            let v = &n - center;
            if v.dot(&(q * &v)) <= radius * radius {
                count += 1;
            }
        }
        count
    }

    #[test]
    fn test_points_match_brute_force() {
        let q = DMat::from_row_slice(3, 3, &[2.0, 0.7, -0.3, 0.7, 1.5, 0.2, -0.3, 0.2, 1.0]);
        let ellipsoid = LatticeEllipsoid::new(&q).unwrap();
        let center = DVec::from_vec(vec![0.3, -0.2, 0.45]);
        for &radius in &[0.5, 1.7, 3.2] {
            let points = ellipsoid.points(radius, &center);
            for n in &points {
                let v = n - &center;
                assert!(v.dot(&(&q * &v)) <= radius * radius + 1e-9);
            }
            assert_eq!(points.len(), brute_force(&q, radius, &center, 8));
        }
    }

    #[test]
    fn test_box_covers_every_centre() {
        let q = DMat::from_row_slice(2, 2, &[1.0, 0.4, 0.4, 0.8]);
        let ellipsoid = LatticeEllipsoid::new(&q).unwrap();
        let deviation = DVec::from_element(2, 0.5);
        let uniform = ellipsoid.points_near_box(2.5, &DVec::zeros(2), &deviation);
        for &(a, b) in &[(0.5, 0.5), (-0.5, 0.3), (0.1, -0.5), (0.0, 0.0)] {
            let center = DVec::from_vec(vec![a, b]);
            for n in ellipsoid.points(2.5, &center) {
                assert!(uniform.contains(&n), "missing {n}");
            }
        }
    }

    #[test]
    fn test_half_of_symmetric_set() {
        let q = DMat::from_row_slice(2, 2, &[1.0, 0.3, 0.3, 2.0]);
        let ellipsoid = LatticeEllipsoid::new(&q).unwrap();
        let all = ellipsoid.points_near_box(3.0, &DVec::zeros(2), &DVec::from_element(2, 0.5));
        let count = all.len();
        let half = half_of_symmetric(all);
        assert_eq!(2 * half.len() - 1, count);
        assert!(half[0].iter().all(|&x| x == 0.0));
    }
}
