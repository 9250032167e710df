//! Source coverage bitmaps
//!
//! A [`Bitmap`] records which source positions a hypothesis has already
//! translated. Bitmaps are never mutated once built: [`Bitmap::derive`]
//! always returns a fresh value with the new span switched on. The
//! per-sentence [`crate::bitmaps::Bitmaps`] interner hash-conses them so that
//! recombination can compare coverage by identity.
//!
//! # Invariants
//!
//! - `covered == popcount(bits)`
//! - `first_gap` is the lowest unset position, or `None` when complete
//! - bits at positions `>= len` are always zero

use crate::range::Range;
use smallvec::SmallVec;
use std::fmt;

const WORD_BITS: usize = 64;

/// Fixed-length coverage vector over the source sentence
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Bitmap {
    bits: SmallVec<[u64; 2]>,
    len: usize,
    covered: usize,
    first_gap: Option<usize>,
}

impl Bitmap {
    /// All-uncovered bitmap for a sentence of `len` words
    pub fn new(len: usize) -> Self {
        let words = (len + WORD_BITS - 1) / WORD_BITS;
        Bitmap {
            bits: SmallVec::from_elem(0, words),
            len,
            covered: 0,
            first_gap: if len == 0 { None } else { Some(0) },
        }
    }

    /// New bitmap equal to `self` with every position of `range` covered.
    ///
    /// Deriving over an already covered position is a logic error in the
    /// caller (the search checks [`Bitmap::overlaps`] first).
    pub fn derive(&self, range: Range) -> Bitmap {
        debug_assert!(range.end() < self.len, "range {} outside bitmap of {}", range, self.len);
        debug_assert!(!self.overlaps(range), "range {} already covered in {}", range, self);

        let mut next = self.clone();
        for pos in range.positions() {
            next.bits[pos / WORD_BITS] |= 1u64 << (pos % WORD_BITS);
        }
        next.covered += range.len();
        next.first_gap = match self.first_gap {
            Some(gap) if range.positions().contains(&gap) => next.scan_gap_from(range.end() + 1),
            other => other,
        };
        next
    }

    fn scan_gap_from(&self, from: usize) -> Option<usize> {
        (from..self.len).find(|&pos| !self.get(pos))
    }

    /// True if position `pos` is covered
    #[inline]
    pub fn get(&self, pos: usize) -> bool {
        debug_assert!(pos < self.len);
        self.bits[pos / WORD_BITS] & (1u64 << (pos % WORD_BITS)) != 0
    }

    /// Sentence length this bitmap was built for
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True for a zero-length sentence
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of covered positions
    #[inline]
    pub fn covered_count(&self) -> usize {
        self.covered
    }

    /// Number of uncovered positions
    #[inline]
    pub fn uncovered_count(&self) -> usize {
        self.len - self.covered
    }

    /// True once every position is covered
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.covered == self.len
    }

    /// Lowest uncovered position
    #[inline]
    pub fn first_gap(&self) -> Option<usize> {
        self.first_gap
    }

    /// True if any position of `range` is already covered
    pub fn overlaps(&self, range: Range) -> bool {
        range.positions().any(|pos| self.get(pos))
    }

    /// Maximal runs of uncovered positions, left to right
    pub fn gaps(&self) -> Gaps<'_> {
        Gaps {
            bitmap: self,
            pos: self.first_gap.unwrap_or(self.len),
        }
    }
}

impl fmt::Display for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for pos in 0..self.len {
            f.write_str(if self.get(pos) { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bitmap({})", self)
    }
}

/// Iterator over uncovered runs of a [`Bitmap`]
pub struct Gaps<'a> {
    bitmap: &'a Bitmap,
    pos: usize,
}

impl Iterator for Gaps<'_> {
    type Item = Range;

    fn next(&mut self) -> Option<Range> {
        let len = self.bitmap.len;
        while self.pos < len && self.bitmap.get(self.pos) {
            self.pos += 1;
        }
        if self.pos >= len {
            return None;
        }
        let start = self.pos;
        while self.pos < len && !self.bitmap.get(self.pos) {
            self.pos += 1;
        }
        Some(Range::new(start, self.pos - 1))
    }
}
