//! Per-sentence bitmap interner
//!
//! Every distinct coverage pattern reached during a sentence's search is
//! stored exactly once. Hypotheses and cube-pruning containers refer to a
//! pattern through its [`BitmapId`], so "same coverage" is an integer
//! comparison rather than a bit-vector scan.
//!
//! Derivations are memoised as well: extending the same base bitmap with the
//! same span (which happens once per predecessor hypothesis) is a single
//! hash lookup after the first time.

use crate::bitmap::Bitmap;
use crate::range::Range;
use rustc_hash::FxHashMap;
use std::ops::Index;

/// Identity of an interned bitmap; equal ids imply equal coverage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct BitmapId(u32);

impl BitmapId {
    /// Raw index into the interner
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Hash-consing store of coverage bitmaps for one sentence
#[derive(Debug)]
pub struct Bitmaps {
    store: Vec<Bitmap>,
    index: FxHashMap<Bitmap, BitmapId>,
    derived: FxHashMap<(BitmapId, Range), BitmapId>,
}

impl Bitmaps {
    /// Interner seeded with the all-uncovered bitmap of `len` words
    pub fn new(len: usize) -> Self {
        let mut bitmaps = Bitmaps {
            store: Vec::new(),
            index: FxHashMap::default(),
            derived: FxHashMap::default(),
        };
        bitmaps.reset(len);
        bitmaps
    }

    /// Drop every interned bitmap and reseed for a new sentence.
    ///
    /// Capacity is retained so that consecutive sentences on one worker do
    /// not reallocate.
    pub fn reset(&mut self, len: usize) {
        self.store.clear();
        self.index.clear();
        self.derived.clear();
        self.intern(Bitmap::new(len));
    }

    /// The all-uncovered bitmap
    #[inline]
    pub fn initial(&self) -> BitmapId {
        BitmapId(0)
    }

    /// Intern `bitmap`, returning the id of the existing copy if present
    pub fn intern(&mut self, bitmap: Bitmap) -> BitmapId {
        if let Some(&id) = self.index.get(&bitmap) {
            return id;
        }
        let id = BitmapId(self.store.len() as u32);
        self.store.push(bitmap.clone());
        self.index.insert(bitmap, id);
        id
    }

    /// Id of `base` with `range` covered, creating it on first use
    pub fn derive(&mut self, base: BitmapId, range: Range) -> BitmapId {
        if let Some(&id) = self.derived.get(&(base, range)) {
            return id;
        }
        let next = self.store[base.index()].derive(range);
        let id = self.intern(next);
        self.derived.insert((base, range), id);
        id
    }

    /// Look up an interned bitmap
    #[inline]
    pub fn get(&self, id: BitmapId) -> &Bitmap {
        &self.store[id.index()]
    }

    /// Number of distinct bitmaps interned so far
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Never true: the initial bitmap is always present
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl Index<BitmapId> for Bitmaps {
    type Output = Bitmap;

    fn index(&self, id: BitmapId) -> &Bitmap {
        self.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_bitmap() {
        let bitmaps = Bitmaps::new(3);
        let init = bitmaps.initial();
        assert_eq!(bitmaps[init].covered_count(), 0);
        assert_eq!(bitmaps.len(), 1);
    }

    #[test]
    fn test_same_pattern_same_id() {
        let mut bitmaps = Bitmaps::new(4);
        let init = bitmaps.initial();
        let a = bitmaps.derive(init, Range::single(0));
        let ab = bitmaps.derive(a, Range::single(2));
        let b = bitmaps.derive(init, Range::single(2));
        let ba = bitmaps.derive(b, Range::single(0));
        assert_eq!(ab, ba);
        assert_ne!(a, b);
        assert_eq!(bitmaps.len(), 4);
    }

    #[test]
    fn test_derive_is_memoised() {
        let mut bitmaps = Bitmaps::new(4);
        let init = bitmaps.initial();
        let first = bitmaps.derive(init, Range::new(0, 1));
        let again = bitmaps.derive(init, Range::new(0, 1));
        assert_eq!(first, again);
        assert_eq!(bitmaps.len(), 2);
    }

    #[test]
    fn test_reset_reseeds() {
        let mut bitmaps = Bitmaps::new(4);
        let init = bitmaps.initial();
        bitmaps.derive(init, Range::single(1));
        bitmaps.reset(6);
        assert_eq!(bitmaps.len(), 1);
        assert_eq!(bitmaps[bitmaps.initial()].len(), 6);
    }
}
