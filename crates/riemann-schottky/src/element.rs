//! Group elements stored in an arena and enumerated as a tree of reduced words.
//!
//! Node 0 is the identity, nodes `1..=2N` are the generators and their
//! inverses in the order `σ_0, σ_0⁻¹, σ_1, σ_1⁻¹, …`. Every other node is
//! created lazily as a child `letter · parent`, skipping the letter that
//! would cancel the parent's leftmost one. Nodes carry the generation they
//! were computed in; changing the generators bumps the generation, and
//! stale nodes are recomputed from their parents on the next access.

use std::fmt;

use riemann_math::{Complex, Moebius};

use crate::config::SchottkyConfig;
use crate::count::WordCounts;
use crate::error::{Result, SchottkyError};
use crate::geometry::Geometry;

/// A generator (`inverse == false`) or the inverse of one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Letter {
    pub index: usize,
    pub inverse: bool,
}

impl Letter {
    pub fn new(index: usize, inverse: bool) -> Self {
        Self { index, inverse }
    }

    pub fn inverse(self) -> Self {
        Self::new(self.index, !self.inverse)
    }

    /// Position `2 · index + inverse` in per-letter tables.
    #[inline]
    pub fn slot(self) -> usize {
        2 * self.index + usize::from(self.inverse)
    }

    /// `0` for generators, `1` for inverses.
    #[inline]
    pub fn side(self) -> usize {
        usize::from(self.inverse)
    }

    /// Lowercase `a, b, …` for generators, uppercase for inverses.
    pub fn to_char(self) -> Option<char> {
        let offset = u8::try_from(self.index).ok().filter(|&i| i < 26)?;
        let base = if self.inverse { b'A' } else { b'a' };
        Some(char::from(base + offset))
    }

    pub fn from_char(c: char) -> Option<Self> {
        if c.is_ascii_lowercase() {
            Some(Self::new(c as usize - 'a' as usize, false))
        } else if c.is_ascii_uppercase() {
            Some(Self::new(c as usize - 'A' as usize, true))
        } else {
            None
        }
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_char() {
            Some(c) => write!(f, "{c}"),
            None if self.inverse => write!(f, "s{}^-1", self.index),
            None => write!(f, "s{}", self.index),
        }
    }
}

/// Inverse of a word: reverse it and swap the case of every letter.
pub fn inverse_word(word: &str) -> String {
    word.chars()
        .rev()
        .map(|c| {
            if c.is_ascii_uppercase() {
                c.to_ascii_lowercase()
            } else {
                c.to_ascii_uppercase()
            }
        })
        .collect()
}

/// Handle of an element in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u32);

impl ElementId {
    pub const IDENTITY: ElementId = ElementId(0);

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }

    /// Root of the subtree of words ending (on the right) in `letter`.
    pub fn root(letter: Letter) -> Self {
        ElementId(1 + letter.slot() as u32)
    }
}

#[derive(Debug, Clone)]
pub struct GroupElement {
    moebius: Moebius,
    word_length: usize,
    left: Option<Letter>,
    right: Option<Letter>,
    parent: Option<ElementId>,
    children: Option<Vec<ElementId>>,
    generation: u64,
    norm: f64,
    image_of_a: Vec<Complex>,
    image_of_b: Vec<Complex>,
}

impl GroupElement {
    fn new(left: Option<Letter>, right: Option<Letter>, parent: Option<ElementId>, word_length: usize) -> Self {
        Self {
            moebius: Moebius::identity(),
            word_length,
            left,
            right,
            parent,
            children: None,
            generation: 0,
            norm: f64::INFINITY,
            image_of_a: Vec::new(),
            image_of_b: Vec::new(),
        }
    }

    pub fn moebius(&self) -> &Moebius {
        &self.moebius
    }

    pub fn word_length(&self) -> usize {
        self.word_length
    }

    /// Letter applied last (leftmost in the word); `None` for the identity.
    pub fn left(&self) -> Option<Letter> {
        self.left
    }

    /// Letter applied first (rightmost in the word); `None` for the identity.
    pub fn right(&self) -> Option<Letter> {
        self.right
    }

    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    pub fn is_identity(&self) -> bool {
        self.left.is_none()
    }

    /// `1/|c|²`, infinite for the identity and the generators.
    pub fn norm(&self) -> f64 {
        self.norm
    }

    /// Image of the repelling fixed point `A_n`.
    pub fn image_of_a(&self, n: usize) -> Complex {
        self.image_of_a[n]
    }

    /// Image of the attracting fixed point `B_n`.
    pub fn image_of_b(&self, n: usize) -> Complex {
        self.image_of_b[n]
    }
}

/// Decision of a tree visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Descend,
    Prune,
}

#[derive(Debug, Clone)]
pub struct ElementTree {
    nodes: Vec<GroupElement>,
    num_generators: usize,
    generation: u64,
    computed: usize,
    max_elements: usize,
    word_length_limit: usize,
    max_word_length: usize,
}

impl ElementTree {
    pub fn new(geometry: &Geometry, config: &SchottkyConfig) -> Result<Self> {
        let num_generators = geometry.num_generators();
        let mut nodes = Vec::with_capacity(1000);
        let mut identity = GroupElement::new(None, None, None, 0);
        identity.children = Some((1..=2 * num_generators as u32).map(ElementId).collect());
        nodes.push(identity);
        for n in 0..num_generators {
            for inverse in [false, true] {
                let letter = Letter::new(n, inverse);
                nodes.push(GroupElement::new(Some(letter), Some(letter), Some(ElementId::IDENTITY), 1));
            }
        }
        let mut tree = Self {
            nodes,
            num_generators,
            generation: 0,
            computed: 0,
            max_elements: config.max_elements,
            word_length_limit: word_length_limit(num_generators, config),
            max_word_length: 0,
        };
        tree.rebuild(geometry)?;
        Ok(tree)
    }

    /// Start a new generation: recompute the identity and the generators,
    /// everything else lazily.
    pub(crate) fn rebuild(&mut self, geometry: &Geometry) -> Result<()> {
        self.generation += 1;
        self.computed = 1;
        self.max_word_length = 0;
        self.compute_constants(geometry, ElementId::IDENTITY, Moebius::identity())?;
        for slot in 0..2 * self.num_generators {
            let id = ElementId(1 + slot as u32);
            let letter = Letter::new(slot / 2, slot % 2 == 1);
            self.compute_constants(geometry, id, *geometry.letter(letter))?;
        }
        tracing::debug!(generation = self.generation, "element tree rebuilt");
        Ok(())
    }

    pub(crate) fn set_limits(&mut self, config: &SchottkyConfig) {
        self.max_elements = config.max_elements;
        self.word_length_limit = word_length_limit(self.num_generators, config);
    }

    /// Longest word a traversal may visit.
    pub fn word_length_limit(&self) -> usize {
        self.word_length_limit
    }

    pub fn get(&self, id: ElementId) -> &GroupElement {
        &self.nodes[id.index()]
    }

    /// Number of nodes allocated so far, across all generations.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of elements computed in the current generation.
    pub fn computed(&self) -> usize {
        self.computed
    }

    /// Longest word computed in the current generation.
    pub fn max_word_length(&self) -> usize {
        self.max_word_length
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The word of an element, leftmost letter first.
    pub fn word(&self, id: ElementId) -> String {
        let mut word = String::new();
        let mut cur = Some(id);
        while let Some(i) = cur {
            let node = self.get(i);
            if let Some(letter) = node.left {
                word.push_str(&letter.to_string());
            }
            cur = node.parent;
        }
        word
    }

    fn compute_constants(&mut self, geometry: &Geometry, id: ElementId, moebius: Moebius) -> Result<()> {
        if id != ElementId::IDENTITY {
            self.computed += 1;
            if self.computed > self.max_elements {
                tracing::warn!(limit = self.max_elements, "stopped computing group elements");
                return Err(SchottkyError::TooManyElements {
                    limit: self.max_elements,
                });
            }
        }
        let generation = self.generation;
        let node = &mut self.nodes[id.index()];
        node.moebius = moebius;
        node.generation = generation;
        node.norm = if node.word_length <= 1 {
            f64::INFINITY
        } else {
            1.0 / moebius.c.norm_sqr()
        };
        node.image_of_a = (0..geometry.num_generators())
            .map(|n| moebius.apply(geometry.a(n)))
            .collect();
        node.image_of_b = (0..geometry.num_generators())
            .map(|n| moebius.apply(geometry.b(n)))
            .collect();
        self.max_word_length = self.max_word_length.max(node.word_length);
        Ok(())
    }

    /// Bring `id` and any stale ancestors up to the current generation.
    pub(crate) fn refresh(&mut self, geometry: &Geometry, id: ElementId) -> Result<()> {
        let mut stale = Vec::new();
        let mut cur = Some(id);
        while let Some(i) = cur {
            let node = self.get(i);
            if node.generation == self.generation {
                break;
            }
            stale.push(i);
            cur = node.parent;
        }
        for i in stale.into_iter().rev() {
            let node = self.get(i);
            let (Some(left), Some(parent)) = (node.left, node.parent) else {
                continue;
            };
            let moebius = geometry.letter(left).compose(self.get(parent).moebius());
            self.compute_constants(geometry, i, moebius)?;
        }
        Ok(())
    }

    /// Children of `id`, created on first use.
    pub(crate) fn children(&mut self, id: ElementId) -> &[ElementId] {
        if self.nodes[id.index()].children.is_none() {
            let created = self.create_children(id);
            self.nodes[id.index()].children = Some(created);
        }
        self.nodes[id.index()].children.as_deref().unwrap_or(&[])
    }

    fn create_children(&mut self, id: ElementId) -> Vec<ElementId> {
        let node = self.get(id);
        let (Some(left), right, word_length) = (node.left, node.right, node.word_length) else {
            return Vec::new();
        };
        let mut letters = Vec::with_capacity(2 * self.num_generators - 1);
        for k in 0..self.num_generators {
            if k == left.index {
                letters.push(left);
            } else {
                letters.push(Letter::new(k, false));
                letters.push(Letter::new(k, true));
            }
        }
        letters
            .into_iter()
            .map(|letter| {
                let child = ElementId(self.nodes.len() as u32);
                self.nodes
                    .push(GroupElement::new(Some(letter), right, Some(id), word_length + 1));
                child
            })
            .collect()
    }

    /// Child of `id` whose leftmost letter is `letter`.
    pub(crate) fn child_with_letter(&mut self, id: ElementId, letter: Letter) -> Option<ElementId> {
        let children: Vec<ElementId> = self.children(id).to_vec();
        children.into_iter().find(|&c| self.get(c).left == Some(letter))
    }

    /// Depth-first traversal from `roots`; children of an element are only
    /// visited when `visit` returns [`Visit::Descend`]. Fails once a word
    /// longer than the configured limit would have to be visited.
    pub(crate) fn descend<F>(&mut self, geometry: &Geometry, roots: &[ElementId], mut visit: F) -> Result<()>
    where
        F: FnMut(&ElementTree, ElementId) -> Result<Visit>,
    {
        let mut stack: Vec<ElementId> = roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            self.refresh(geometry, id)?;
            let word_length = self.get(id).word_length;
            if word_length > self.word_length_limit {
                return Err(SchottkyError::AccuracyNotReached { word_length });
            }
            if visit(self, id)? == Visit::Prune {
                continue;
            }
            stack.extend(self.children(id).iter().rev().copied());
        }
        Ok(())
    }

    /// Roots of the coset tree of generator `n`: all letters of index ≠ n.
    pub fn coset_roots(&self, n: usize) -> Vec<ElementId> {
        (0..self.num_generators)
            .filter(|&i| i != n)
            .flat_map(|i| [ElementId::root(Letter::new(i, false)), ElementId::root(Letter::new(i, true))])
            .collect()
    }

    /// Roots of the whole group minus the identity: all letters.
    pub fn all_roots(&self) -> Vec<ElementId> {
        (0..2 * self.num_generators as u32).map(|s| ElementId(1 + s)).collect()
    }
}

/// Configured word-length cap, clipped to the lengths the count tables cover.
fn word_length_limit(num_generators: usize, config: &SchottkyConfig) -> usize {
    let counted = WordCounts::new(num_generators).len().saturating_sub(1);
    config.max_word_length.min(counted)
}
