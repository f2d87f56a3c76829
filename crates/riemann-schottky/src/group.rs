//! The Schottky group: generator data, its element arena and the
//! word-length-indexed estimates shared by all series.

use riemann_math::Complex;

use crate::config::SchottkyConfig;
use crate::count::WordCounts;
use crate::data::SchottkyData;
use crate::differential::DifferentialConstants;
use crate::element::{ElementId, ElementTree, GroupElement, Letter, Visit};
use crate::error::{Result, SchottkyError};
use crate::estimate;
use crate::geometry::Geometry;

/// Per-letter minimal distances of one point, keyed by the point and the
/// word length they were computed for.
#[derive(Debug, Clone)]
struct KCache {
    z: Complex,
    word_length: usize,
    k: [Vec<f64>; 2],
}

/// A classical Schottky group together with the lazily grown tree of its
/// reduced words.
///
/// All series evaluations take `&mut self`: they extend the element arena on
/// demand and refresh elements left over from earlier generator data.
#[derive(Debug, Clone)]
pub struct SchottkyGroup {
    pub(crate) data: SchottkyData,
    pub(crate) config: SchottkyConfig,
    pub(crate) geometry: Geometry,
    pub(crate) tree: ElementTree,
    pub(crate) counts: WordCounts,
    pub(crate) theta1: f64,
    pub(crate) q1: f64,
    uses_theta2: bool,
    k_cache: Option<KCache>,
    pub(crate) differential: Option<DifferentialConstants>,
}

/// Contraction constant and `q = θ²(2N − 1)`, falling back to the sharper
/// inner-circle constant when the first one does not contract.
fn contraction(geometry: &Geometry) -> Result<(f64, f64, bool)> {
    let branching = (2 * geometry.num_generators() - 1) as f64;
    let theta1 = geometry.theta1();
    let q1 = theta1 * theta1 * branching;
    if q1 < 1.0 {
        return Ok((theta1, q1, false));
    }
    let theta2 = geometry.theta2();
    let q2 = theta2 * theta2 * branching;
    tracing::debug!(q1, q2, "falling back to inner-circle contraction constant");
    if q2 < 1.0 {
        Ok((theta2, q2, true))
    } else {
        Err(SchottkyError::ConvergenceNotGuaranteed { q: q2 })
    }
}

pub(crate) fn check_accuracy(accuracy: f64) -> Result<()> {
    if accuracy > 0.0 && accuracy.is_finite() {
        Ok(())
    } else {
        Err(SchottkyError::InvalidData(format!(
            "accuracy must be positive, got {accuracy}"
        )))
    }
}

fn check_config(config: &SchottkyConfig) -> Result<()> {
    check_accuracy(config.accuracy)?;
    if config.evaluable_bound > 0.0 && config.evaluable_bound < 1.0 {
        Ok(())
    } else {
        Err(SchottkyError::InvalidData(format!(
            "evaluable bound must lie in (0, 1), got {}",
            config.evaluable_bound
        )))
    }
}

impl SchottkyGroup {
    pub fn new(data: SchottkyData, config: SchottkyConfig) -> Result<Self> {
        check_config(&config)?;
        let geometry = Geometry::new(&data)?;
        let (theta1, q1, uses_theta2) = contraction(&geometry)?;
        let tree = ElementTree::new(&geometry, &config)?;
        let counts = WordCounts::new(data.num_generators());
        tracing::debug!(
            genus = data.num_generators(),
            theta1,
            q1,
            uses_theta2,
            "Schottky group initialised"
        );
        Ok(Self {
            data,
            config,
            geometry,
            tree,
            counts,
            theta1,
            q1,
            uses_theta2,
            k_cache: None,
            differential: None,
        })
    }

    /// Build from the flat `[A.re, A.im, B.re, B.im, mu.re, mu.im, …]` layout.
    pub fn from_uniformization_data(data: &[f64], accuracy: f64) -> Result<Self> {
        Self::new(
            SchottkyData::from_uniformization_data(data)?,
            SchottkyConfig::with_accuracy(accuracy),
        )
    }

    pub fn default_for_genus(genus: usize) -> Result<Self> {
        Self::new(SchottkyData::default_for_genus(genus), SchottkyConfig::default())
    }

    /// Replace the generators. Elements already in the arena are kept and
    /// recomputed lazily unless the genus changes.
    pub fn set_data(&mut self, data: SchottkyData) -> Result<()> {
        if data.num_generators() != self.num_generators() {
            *self = Self::new(data, self.config)?;
            return Ok(());
        }
        let geometry = Geometry::new(&data)?;
        let (theta1, q1, uses_theta2) = contraction(&geometry)?;
        self.tree.rebuild(&geometry)?;
        self.geometry = geometry;
        self.data = data;
        self.theta1 = theta1;
        self.q1 = q1;
        self.uses_theta2 = uses_theta2;
        self.k_cache = None;
        self.differential = None;
        tracing::debug!(theta1, q1, uses_theta2, "generator data replaced");
        Ok(())
    }

    pub fn set_uniformization_data(&mut self, data: &[f64]) -> Result<()> {
        self.set_data(SchottkyData::from_uniformization_data(data)?)
    }

    pub fn uniformization_data(&self) -> Vec<f64> {
        self.data.to_uniformization_data()
    }

    pub fn data(&self) -> &SchottkyData {
        &self.data
    }

    pub fn config(&self) -> &SchottkyConfig {
        &self.config
    }

    /// Replace the tunables; takes effect on the next evaluation.
    pub fn set_config(&mut self, config: SchottkyConfig) -> Result<()> {
        check_config(&config)?;
        self.tree.set_limits(&config);
        if config.fancy_error != self.config.fancy_error {
            self.differential = None;
        }
        self.config = config;
        Ok(())
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn num_generators(&self) -> usize {
        self.geometry.num_generators()
    }

    /// Default accuracy of the series.
    pub fn accuracy(&self) -> f64 {
        self.config.accuracy
    }

    pub fn set_accuracy(&mut self, accuracy: f64) -> Result<()> {
        check_accuracy(accuracy)?;
        self.config.accuracy = accuracy;
        Ok(())
    }

    /// Contraction constant in use.
    pub fn theta1(&self) -> f64 {
        self.theta1
    }

    /// `θ²(2N − 1)` for the contraction constant in use.
    pub fn q1(&self) -> f64 {
        self.q1
    }

    /// Whether the inner-circle constant replaced the plain one.
    pub fn uses_theta2(&self) -> bool {
        self.uses_theta2
    }

    pub fn counts(&self) -> &WordCounts {
        &self.counts
    }

    /// Elements computed for the current generator data.
    pub fn num_elements(&self) -> usize {
        self.tree.computed()
    }

    /// Longest word computed for the current generator data.
    pub fn max_word_length(&self) -> usize {
        self.tree.max_word_length()
    }

    pub fn is_in_fundamental_domain(&self, p: Complex) -> bool {
        self.geometry.is_in_fundamental_domain(p, 0.0)
    }

    pub fn dist_to_boundary_of_fundamental_domain(&self, p: Complex) -> f64 {
        self.geometry.dist_to_boundary_of_fundamental_domain(p)
    }

    /// Look up an element by its word, e.g. `"aB"` for `σ_0 ∘ σ_1⁻¹`.
    /// The empty word is the identity.
    pub fn element_by_word(&mut self, word: &str) -> Result<ElementId> {
        let mut id = ElementId::IDENTITY;
        for c in word.chars().rev() {
            let letter = Letter::from_char(c)
                .filter(|l| l.index < self.num_generators())
                .ok_or_else(|| SchottkyError::InvalidWord(word.to_string()))?;
            id = if id == ElementId::IDENTITY {
                ElementId::root(letter)
            } else {
                self.tree
                    .child_with_letter(id, letter)
                    .ok_or_else(|| SchottkyError::InvalidWord(word.to_string()))?
            };
        }
        self.tree.refresh(&self.geometry, id)?;
        Ok(id)
    }

    /// Element as of its last refresh; handles from [`Self::element_by_word`]
    /// are current.
    pub fn element(&self, id: ElementId) -> &GroupElement {
        self.tree.get(id)
    }

    pub fn word(&self, id: ElementId) -> String {
        self.tree.word(id)
    }

    /// Call `f` for every element of word length `l`.
    pub(crate) fn for_each_of_word_length<F>(&mut self, l: usize, mut f: F) -> Result<()>
    where
        F: FnMut(&Geometry, &ElementTree, &GroupElement),
    {
        if l == 0 {
            f(&self.geometry, &self.tree, self.tree.get(ElementId::IDENTITY));
            return Ok(());
        }
        let roots = self.tree.all_roots();
        let geometry = &self.geometry;
        self.tree.descend(geometry, &roots, |tree, id| {
            let element = tree.get(id);
            if element.word_length() < l {
                return Ok(Visit::Descend);
            }
            f(geometry, tree, element);
            Ok(Visit::Prune)
        })
    }

    /// Minimal distance of `z` to the target circles of the words of length `l`.
    pub fn k(&mut self, z: Complex, l: usize) -> Result<f64> {
        let mut min = f64::MAX;
        self.for_each_of_word_length(l, |geo, _, e| min = min.min(estimate::k(geo, e, z)))?;
        Ok(min)
    }

    /// [`Self::k`] split by the leftmost letter, indexed `[side][index]`.
    pub(crate) fn k_indexed(&mut self, z: Complex, l: usize) -> Result<[Vec<f64>; 2]> {
        if let Some(cache) = &self.k_cache {
            if cache.z == z && cache.word_length == l {
                return Ok(cache.k.clone());
            }
        }
        let n = self.num_generators();
        let mut k = [vec![f64::MAX; n], vec![f64::MAX; n]];
        self.for_each_of_word_length(l, |geo, _, e| {
            if let Some(left) = e.left() {
                let slot = &mut k[left.side()][left.index];
                *slot = slot.min(estimate::k(geo, e, z));
            }
        })?;
        self.k_cache = Some(KCache {
            z,
            word_length: l,
            k: k.clone(),
        });
        Ok(k)
    }

    /// Maximal contraction of the words of length `l + 1` relative to their
    /// parents; `1` for `l = 0`.
    pub fn theta(&mut self, l: usize) -> Result<f64> {
        if l == 0 {
            return Ok(1.0);
        }
        let mut max = 0.0_f64;
        self.for_each_of_word_length(l + 1, |geo, tree, e| {
            max = max.max(estimate::theta(geo, tree, e));
        })?;
        Ok(max)
    }

    /// Minimal `κ̄` over the words of length `l ≥ 2`.
    pub fn kappa(&mut self, l: usize) -> Result<f64> {
        require_word_length(l, 2)?;
        let mut min = f64::MAX;
        self.for_each_of_word_length(l, |geo, tree, e| {
            min = min.min(estimate::kappa_l_bar(geo, tree, e));
        })?;
        Ok(min)
    }

    /// Minimal distance of nested image circles to their target circle over
    /// the words of length `l ≥ 2`.
    pub fn d(&mut self, l: usize) -> Result<f64> {
        require_word_length(l, 2)?;
        let mut min = f64::MAX;
        self.for_each_of_word_length(l, |geo, _, e| min = min.min(estimate::d(geo, e)))?;
        Ok(min)
    }

    /// `θ(l)²(2N − 1) < C` with `l` and `C` from the configuration.
    pub fn is_integral_series_evaluable(&mut self) -> Result<bool> {
        let theta = self.theta(self.config.evaluable_word_length)?;
        let branching = (2 * self.num_generators() - 1) as f64;
        Ok(theta * theta * branching < self.config.evaluable_bound)
    }

    /// `(2N − 1)/κ(l)² < C` with `l` and `C` from the configuration.
    pub fn is_differential_series_evaluable(&mut self) -> Result<bool> {
        let kappa = self.kappa(self.config.evaluable_word_length.max(2))?;
        let branching = (2 * self.num_generators() - 1) as f64;
        Ok(branching / kappa / kappa < self.config.evaluable_bound)
    }

    pub fn is_series_evaluable(&mut self) -> Result<bool> {
        Ok(self.is_integral_series_evaluable()? || self.is_differential_series_evaluable()?)
    }
}

fn require_word_length(l: usize, min: usize) -> Result<()> {
    if l < min {
        Err(SchottkyError::InvalidData(format!(
            "word length {l} is below {min}"
        )))
    } else {
        Ok(())
    }
}
