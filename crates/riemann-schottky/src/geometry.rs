//! Generators, isometric circles and the data-dependent contraction constants.
//!
//! Circle `(n, 0)` is the isometric circle of `σ_n` and contains the
//! repelling fixed point `A_n`; circle `(n, 1)` contains `B_n`. `σ_n` maps the
//! exterior of `(n, 0)` onto the interior of `(n, 1)`. All distances below
//! are Euclidean distances in the plane.

use riemann_math::{Complex, Moebius};

use crate::data::SchottkyData;
use crate::element::Letter;
use crate::error::{Result, SchottkyError};

#[derive(Debug, Clone)]
pub struct Geometry {
    num_generators: usize,
    fixpoints: Vec<[Complex; 2]>,
    mu: Vec<Complex>,
    /// Indexed by [`Letter::slot`].
    letters: Vec<Moebius>,
    center: Vec<[Complex; 2]>,
    radius: Vec<f64>,
    /// Images of the 2N − 1 circles that `σ_n^{∓1}` maps into circle `(n, i)`.
    inner_center: Vec<[Vec<Complex>; 2]>,
    inner_radius: Vec<[Vec<f64>; 2]>,
}

impl Geometry {
    pub fn new(data: &SchottkyData) -> Result<Self> {
        let num_generators = data.num_generators();
        let mut fixpoints = Vec::with_capacity(num_generators);
        let mut mu = Vec::with_capacity(num_generators);
        let mut letters = Vec::with_capacity(2 * num_generators);
        let mut center = Vec::with_capacity(num_generators);
        let mut radius = Vec::with_capacity(num_generators);

        for g in data.generators() {
            let sigma = Moebius::from_fixed_points(g.a, g.b, g.mu)?;
            let (c0, c1, r) = sigma.isometric_circles()?;
            fixpoints.push([g.a, g.b]);
            mu.push(g.mu);
            letters.push(sigma);
            letters.push(sigma.adjugate());
            center.push([c0, c1]);
            radius.push(r);
        }

        let mut geometry = Self {
            num_generators,
            fixpoints,
            mu,
            letters,
            center,
            radius,
            inner_center: Vec::new(),
            inner_radius: Vec::new(),
        };
        if num_generators > 1 && !geometry.is_classical() {
            return Err(SchottkyError::NotClassical);
        }
        geometry.update_inner_circles();
        Ok(geometry)
    }

    fn update_inner_circles(&mut self) {
        let n_gen = self.num_generators;
        self.inner_center = Vec::with_capacity(n_gen);
        self.inner_radius = Vec::with_capacity(n_gen);
        for n in 0..n_gen {
            let mut centers: [Vec<Complex>; 2] = [Vec::new(), Vec::new()];
            let mut radii: [Vec<f64>; 2] = [Vec::new(), Vec::new()];
            for i in 0..2 {
                // σ_n^{-1} maps into circle (n, 0), σ_n into circle (n, 1).
                let sigma = self.letter(Letter::new(n, i == 0));
                for m in 0..n_gen {
                    for j in 0..2 {
                        if m != n || i == j {
                            let (c, r) = sigma.map_circle(self.center[m][j], self.radius[m]);
                            if dist(self.center[n][i], c) + r > self.radius[n] {
                                tracing::warn!(n, i, m, j, "inner circle leaves its target circle");
                            }
                            centers[i].push(c);
                            radii[i].push(r);
                        }
                    }
                }
            }
            self.inner_center.push(centers);
            self.inner_radius.push(radii);
        }
    }

    pub fn num_generators(&self) -> usize {
        self.num_generators
    }

    /// Repelling fixed point `A_n`.
    pub fn a(&self, n: usize) -> Complex {
        self.fixpoints[n][0]
    }

    /// Attracting fixed point `B_n`.
    pub fn b(&self, n: usize) -> Complex {
        self.fixpoints[n][1]
    }

    pub fn mu(&self, n: usize) -> Complex {
        self.mu[n]
    }

    pub fn center(&self, n: usize, j: usize) -> Complex {
        self.center[n][j]
    }

    pub fn radius(&self, n: usize) -> f64 {
        self.radius[n]
    }

    pub fn letter(&self, letter: Letter) -> &Moebius {
        &self.letters[letter.slot()]
    }

    pub fn generator(&self, n: usize) -> &Moebius {
        &self.letters[2 * n]
    }

    /// Distinct isometric circles do not overlap (touching is allowed).
    pub fn is_classical(&self) -> bool {
        let circles: Vec<(Complex, f64)> = (0..2)
            .flat_map(|j| (0..self.num_generators).map(move |n| (j, n)))
            .map(|(j, n)| (self.center[n][j], self.radius[n]))
            .collect();
        circles.iter().enumerate().all(|(k, &(c1, r1))| {
            circles[..k]
                .iter()
                .all(|&(c2, r2)| (c1 - c2).norm_sqr() >= (r1 + r2) * (r1 + r2))
        })
    }

    /// True if `p` lies outside every isometric circle, shrunk by `rel_tol`.
    pub fn is_in_fundamental_domain(&self, p: Complex, rel_tol: f64) -> bool {
        (0..self.num_generators).all(|i| {
            let thresh = self.radius[i] * self.radius[i] * (1.0 - 2.0 * rel_tol);
            (0..2).all(|j| (self.center[i][j] - p).norm_sqr() >= thresh)
        })
    }

    /// Distance of `p` to the boundary of the fundamental domain; for points
    /// inside a circle the depth inside that circle.
    pub fn dist_to_boundary_of_fundamental_domain(&self, p: Complex) -> f64 {
        let mut min = f64::MAX;
        for j in 0..2 {
            for i in 0..self.num_generators {
                let d = self.radius[i] - dist(self.center[i][j], p);
                if d > 0.0 {
                    return d;
                }
                min = min.min(-d);
            }
        }
        min
    }

    /// Distance from `p` to circle `(n, 1 − j)`, clamped at zero.
    pub fn k(&self, j: usize, n: usize, p: Complex) -> f64 {
        (dist(self.center[n][1 - j], p) - self.radius[n]).max(0.0)
    }

    /// Largest distance from `p` to a point of circle `(n, 1 − j)`.
    pub fn big_k(&self, j: usize, n: usize, p: Complex) -> f64 {
        dist(self.center[n][1 - j], p) + self.radius[n]
    }

    /// Depth of `p` inside the first circle containing it, zero if none does.
    pub(crate) fn dist_identity(&self, p: Complex) -> f64 {
        for j in 0..2 {
            for i in 0..self.num_generators {
                let d = self.radius[i] - dist(self.center[i][j], p);
                if d >= 0.0 {
                    return d;
                }
            }
        }
        0.0
    }

    /// `min_{n≠m} min(k(0,n,p), k(1,n,p))`.
    pub(crate) fn k1(&self, m: usize, p: Complex) -> f64 {
        (0..self.num_generators)
            .filter(|&n| n != m)
            .map(|n| self.k(0, n, p).min(self.k(1, n, p)))
            .fold(f64::MAX, f64::min)
    }

    fn theta1_of(&self, i: usize, n: usize) -> f64 {
        let mut max = self.radius[n] / self.k(i, n, self.center[n][i]);
        for l in (0..self.num_generators).filter(|&l| l != n) {
            let t = (self.radius[l] / self.k(i, n, self.center[l][0]))
                .max(self.radius[l] / self.k(i, n, self.center[l][1]));
            max = max.max(t);
        }
        max
    }

    /// Contraction constant from the isometric circles alone.
    pub fn theta1(&self) -> f64 {
        let mut max = 0.0_f64;
        for i in 0..2 {
            for n in 0..self.num_generators {
                max = max.max(self.theta1_of(i, n));
            }
        }
        max
    }

    /// Sharper contraction constant using the inner circles.
    pub fn theta2(&self) -> f64 {
        let mut max = 0.0_f64;
        for i in 0..2 {
            for n in 0..self.num_generators {
                let centers = &self.inner_center[n][i];
                let radii = &self.inner_radius[n][i];
                for j in 0..2 {
                    for m in 0..self.num_generators {
                        if n == m && i == j {
                            continue;
                        }
                        for (c, r) in centers.iter().zip(radii) {
                            max = max.max(self.radius[m] / (dist(*c, self.center[m][j]) - r));
                        }
                    }
                }
            }
        }
        max
    }

    /// Minimal distance between the images of the fundamental domain under
    /// words of length two and the boundary of their circle.
    pub fn d2(&self) -> f64 {
        let mut d2 = f64::MAX;
        for n in 0..self.num_generators {
            for i in 0..2 {
                for (c, r) in self.inner_center[n][i].iter().zip(&self.inner_radius[n][i]) {
                    d2 = d2.min(self.radius[n] - dist(*c, self.center[n][i]) - r);
                }
            }
        }
        d2
    }

    /// `max(radius + |center|)` over all isometric circles.
    pub fn max_in_isometric_circles(&self) -> f64 {
        let mut max = 0.0_f64;
        for n in 0..self.num_generators {
            for j in 0..2 {
                max = max.max(self.radius[n] + self.center[n][j].norm());
            }
        }
        max
    }

    /// `r(q) = q / (1 + q) / (1 − (2N − 1) q)`.
    pub fn r(&self, q: f64) -> f64 {
        let big_q = (2 * self.num_generators - 1) as f64 * q;
        q / (1.0 + q) / (1.0 - big_q)
    }

    pub fn r_minus(r: f64, q: f64) -> f64 {
        r - q / (1.0 - q * q)
    }

    pub fn r_plus(r: f64, q: f64) -> f64 {
        r + 1.0 / (1.0 - q * q)
    }
}

/// Euclidean distance of two points.
#[inline]
pub(crate) fn dist(z: Complex, w: Complex) -> f64 {
    (z - w).norm()
}
