//! Future-cost estimates
//!
//! `cost[s, e]` is the best score of any segmentation of the span `[s, e]`
//! into translation options, each option valued at its future score. The
//! table is filled by span length; a cell takes the better of its best
//! single option and every split into two adjacent cells. Spans that
//! cannot be covered stay at `-inf`.
//!
//! A hypothesis' estimate is the sum of the cells of its uncovered gaps.

use crate::options::TranslationOptions;
use verso_core::{Bitmap, Range};

/// Triangular table of span estimates for one sentence
#[derive(Debug, Clone, Default)]
pub struct FutureCosts {
    len: usize,
    cells: Vec<f32>,
}

impl FutureCosts {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill the table from a sentence's options
    pub fn compute(&mut self, options: &TranslationOptions, len: usize) {
        self.len = len;
        self.cells.clear();
        self.cells.resize(len * len, f32::NEG_INFINITY);

        for width in 1..=len {
            for start in 0..=(len - width) {
                let end = start + width - 1;
                let mut best = options
                    .get(Range::new(start, end))
                    .first()
                    .map_or(f32::NEG_INFINITY, |opt| opt.future_score());
                for split in start..end {
                    let joined = self.cells[self.index(start, split)] + self.cells[self.index(split + 1, end)];
                    if joined > best {
                        best = joined;
                    }
                }
                let idx = self.index(start, end);
                self.cells[idx] = best;
            }
        }
    }

    /// Estimate for covering exactly `range`
    #[inline]
    pub fn get(&self, range: Range) -> f32 {
        self.cells[self.index(range.start(), range.end())]
    }

    /// Estimate for every gap of `coverage`
    pub fn estimate(&self, coverage: &Bitmap) -> f32 {
        coverage.gaps().map(|gap| self.get(gap)).sum()
    }

    /// Sentence length the table was computed for
    pub fn len(&self) -> usize {
        self.len
    }

    /// True for an empty sentence
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    fn index(&self, start: usize, end: usize) -> usize {
        start * self.len + end
    }
}
