//! Inclusive spans over source-word positions
//!
//! The "empty" range (nothing translated yet) is modelled as
//! `Option<Range>::None` by callers; a `Range` value always covers at
//! least one word.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive `[start, end]` span of source positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Range {
    start: usize,
    end: usize,
}

impl Range {
    /// Create a span covering `start..=end`
    #[inline]
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "range start {} > end {}", start, end);
        Range { start, end }
    }

    /// Span covering exactly one position
    #[inline]
    pub fn single(pos: usize) -> Self {
        Range {
            start: pos,
            end: pos,
        }
    }

    /// First covered position
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Last covered position (inclusive)
    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of positions covered
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// Always false; present for clippy's `len_without_is_empty`
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterate the covered positions
    pub fn positions(&self) -> std::ops::RangeInclusive<usize> {
        self.start..=self.end
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{}]", self.start, self.end)
    }
}

/// Reordering jump between the previously translated span and the next one.
///
/// With no previous span the jump is measured from the sentence start.
/// Monotone continuation (`curr.start == prev.end + 1`) has distance 0.
#[inline]
pub fn distortion_distance(prev: Option<Range>, curr: Range) -> usize {
    match prev {
        None => curr.start,
        Some(prev) => (prev.end as isize + 1 - curr.start as isize).unsigned_abs(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_len_and_positions() {
        let r = Range::new(2, 4);
        assert_eq!(r.len(), 3);
        assert_eq!(r.positions().collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(Range::single(7).len(), 1);
    }

    #[test]
    fn test_distortion_distance() {
        assert_eq!(distortion_distance(None, Range::new(0, 1)), 0);
        assert_eq!(distortion_distance(None, Range::new(3, 3)), 3);
        assert_eq!(distortion_distance(Some(Range::new(0, 1)), Range::single(2)), 0);
        assert_eq!(distortion_distance(Some(Range::new(0, 1)), Range::single(5)), 3);
        // jumping back to position 0 after covering 3..4
        assert_eq!(distortion_distance(Some(Range::new(3, 4)), Range::single(0)), 5);
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_string(&Range::new(1, 3)).unwrap();
        assert_eq!(json, r#"{"start":1,"end":3}"#);
        let back: Range = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Range::new(1, 3));
    }

    #[test]
    fn test_ordering_is_start_then_end() {
        assert!(Range::new(0, 3) < Range::new(1, 1));
        assert!(Range::new(1, 1) < Range::new(1, 2));
    }
}
