//! Dense feature score vectors
//!
//! Every feature function owns a contiguous [`FeatureSlot`] of the global
//! score vector. [`ScoreVector`] keeps the raw per-slot values together with
//! a cached weighted total that is updated incrementally on every
//! accumulation, so reading a hypothesis score is O(1).
//!
//! # Invariant
//!
//! `total() == Σ raw[i] * weights[i]` (to floating-point tolerance) after
//! any sequence of `plus_equals*`, `assign` and `reset` calls made with the
//! same [`Weights`].

use crate::error::{Error, Result};
use smallvec::SmallVec;

/// Inline capacity covering typical phrase-based setups without spilling
const INLINE_SCORES: usize = 16;

/// Contiguous sub-range of the global score vector owned by one feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeatureSlot {
    offset: usize,
    len: usize,
}

impl FeatureSlot {
    /// Slot of `len` values starting at global `offset`
    pub fn new(offset: usize, len: usize) -> Self {
        FeatureSlot { offset, len }
    }

    /// First global index
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of score values
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True for features that declare no scores
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Global index range
    #[inline]
    pub fn indices(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// Process-wide feature weights, read-only once the decoder is built
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Weights {
    values: Vec<f32>,
}

impl Weights {
    /// Wrap a dense weight vector
    pub fn new(values: Vec<f32>) -> Self {
        Weights { values }
    }

    /// Number of score slots
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when no feature is configured
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All weights
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Weights of one feature
    #[inline]
    pub fn slot(&self, slot: FeatureSlot) -> &[f32] {
        &self.values[slot.indices()]
    }

    /// Weighted sum of `scores` for the feature owning `slot`
    #[inline]
    pub fn weigh(&self, slot: FeatureSlot, scores: &[f32]) -> f32 {
        debug_assert_eq!(scores.len(), slot.len());
        self.slot(slot)
            .iter()
            .zip(scores)
            .map(|(w, s)| w * s)
            .sum()
    }
}

/// Raw feature scores plus their cached weighted total
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScoreVector {
    raw: SmallVec<[f32; INLINE_SCORES]>,
    total: f32,
}

impl ScoreVector {
    /// Zero vector over `num_scores` slots
    pub fn new(num_scores: usize) -> Self {
        ScoreVector {
            raw: SmallVec::from_elem(0.0, num_scores),
            total: 0.0,
        }
    }

    /// Zero every slot, resizing to `num_scores`
    pub fn reset(&mut self, num_scores: usize) {
        self.raw.clear();
        self.raw.resize(num_scores, 0.0);
        self.total = 0.0;
    }

    /// Add one feature's raw scores
    pub fn plus_equals(&mut self, weights: &Weights, slot: FeatureSlot, scores: &[f32]) {
        debug_assert_eq!(scores.len(), slot.len(), "score count mismatch");
        for (dst, src) in self.raw[slot.indices()].iter_mut().zip(scores) {
            *dst += src;
        }
        self.total += weights.weigh(slot, scores);
    }

    /// Add a single raw score at a global index
    pub fn plus_equals_at(&mut self, weights: &Weights, index: usize, score: f32) {
        self.raw[index] += score;
        self.total += weights.as_slice()[index] * score;
    }

    /// Add another vector computed under the same weights
    pub fn plus_equals_vector(&mut self, other: &ScoreVector) {
        debug_assert_eq!(self.raw.len(), other.raw.len());
        for (dst, src) in self.raw.iter_mut().zip(&other.raw) {
            *dst += src;
        }
        self.total += other.total;
    }

    /// Subtract another vector computed under the same weights
    pub fn minus_equals_vector(&mut self, other: &ScoreVector) {
        debug_assert_eq!(self.raw.len(), other.raw.len());
        for (dst, src) in self.raw.iter_mut().zip(&other.raw) {
            *dst -= src;
        }
        self.total -= other.total;
    }

    /// Write one feature's scores into slots that must still be zero.
    ///
    /// Used when caching per-phrase scores: each feature writes its slot
    /// exactly once.
    pub fn assign(&mut self, weights: &Weights, slot: FeatureSlot, scores: &[f32]) -> Result<()> {
        if let Some(pos) = self.raw[slot.indices()].iter().position(|v| *v != 0.0) {
            return Err(Error::ScoreSlotOccupied {
                offset: slot.offset() + pos,
            });
        }
        self.plus_equals(weights, slot, scores);
        Ok(())
    }

    /// Cached weighted total
    #[inline]
    pub fn total(&self) -> f32 {
        self.total
    }

    /// All raw scores
    #[inline]
    pub fn raw(&self) -> &[f32] {
        &self.raw
    }

    /// Raw scores of one feature
    #[inline]
    pub fn slot_scores(&self, slot: FeatureSlot) -> &[f32] {
        &self.raw[slot.indices()]
    }

    /// Recompute the weighted total from scratch
    pub fn inner_product(&self, weights: &Weights) -> f32 {
        self.raw
            .iter()
            .zip(weights.as_slice())
            .map(|(s, w)| s * w)
            .sum()
    }
}
