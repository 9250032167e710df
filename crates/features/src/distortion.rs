//! Linear distortion feature
//!
//! Penalises reordering by the size of the jump between the end of the
//! previously translated span and the start of the new one. The optional
//! early variant (Moore & Quirk, 2007) charges the jump cost as soon as it
//! becomes unavoidable instead of when the jump back is made.

use crate::feature::{ApplyContext, FeatureFunction, StatefulFeature};
use crate::state::{downcast, downcast_mut, FFState};
use verso_core::{distortion_distance, Range, Sentence};

/// End position of the last translated span; `None` before the first phrase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DistortionState {
    prev_end: Option<usize>,
}

impl DistortionState {
    /// Last covered position of the previous phrase
    pub fn prev_end(&self) -> Option<usize> {
        self.prev_end
    }
}

/// Distance-based reordering penalty
#[derive(Debug, Clone)]
pub struct Distortion {
    name: String,
    early_cost: bool,
}

impl Distortion {
    /// Create the feature; `early_cost` enables the Moore & Quirk variant
    pub fn new(name: impl Into<String>, early_cost: bool) -> Self {
        Distortion {
            name: name.into(),
            early_cost,
        }
    }

    /// Raw (non-positive) score for moving from `prev_end` to `curr`.
    ///
    /// `first_gap` is the lowest uncovered position before `curr` is applied.
    pub fn score(&self, prev_end: Option<usize>, curr: Range, first_gap: Option<usize>) -> f32 {
        if !self.early_cost {
            let prev = prev_end.map(Range::single);
            return -(distortion_distance(prev, curr) as f32);
        }

        // prefix = longest fully translated initial segment
        let prefix_end = first_gap.map_or(-1, |gap| gap as isize - 1);
        let prev_end = prev_end.map_or(-1, |end| end as isize);
        let start = curr.start() as isize;
        let end = curr.end() as isize;
        let len = curr.len() as isize;

        let cost = if start == prefix_end + 1 {
            // adjacent to the prefix
            0
        } else if end < prev_end {
            // jumping back to the left of the previous phrase
            2 * len
        } else if prev_end <= prefix_end {
            // previous phrase extended the prefix
            2 * (start - prefix_end - 1 + len)
        } else {
            2 * (start - prev_end - 1 + len)
        };
        -(cost as f32)
    }
}

impl FeatureFunction for Distortion {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_scores(&self) -> usize {
        1
    }
}

impl StatefulFeature for Distortion {
    fn blank_state(&self) -> Box<dyn FFState> {
        Box::new(DistortionState::default())
    }

    fn empty_hypothesis_state(&self, state: &mut dyn FFState, _sentence: &Sentence) {
        downcast_mut::<DistortionState>(state).prev_end = None;
    }

    fn evaluate_when_applied(
        &self,
        prev: &dyn FFState,
        cand: &ApplyContext<'_>,
        out: &mut [f32],
    ) -> Box<dyn FFState> {
        let prev = downcast::<DistortionState>(prev);
        out[0] = self.score(prev.prev_end, cand.range, cand.prev_coverage.first_gap());
        Box::new(DistortionState {
            prev_end: Some(cand.range.end()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verso_core::{Bitmap, Phrase};

    fn apply(
        f: &Distortion,
        prev: &dyn FFState,
        sentence: &Sentence,
        prev_coverage: &Bitmap,
        range: Range,
    ) -> (f32, Box<dyn FFState>) {
        let target = Phrase::parse("x");
        let coverage = prev_coverage.derive(range);
        let ctx = ApplyContext {
            sentence,
            range,
            target: &target,
            reordering: None,
            prev_coverage,
            coverage: &coverage,
        };
        let mut out = [0.0];
        let next = f.evaluate_when_applied(prev, &ctx, &mut out);
        (out[0], next)
    }

    fn root(f: &Distortion, sentence: &Sentence) -> Box<dyn FFState> {
        let mut state = f.blank_state();
        f.empty_hypothesis_state(state.as_mut(), sentence);
        state
    }

    #[test]
    fn test_monotone_is_free() {
        let f = Distortion::new("d", false);
        let s = Sentence::parse("a b c");
        let root = root(&f, &s);
        let bm = Bitmap::new(3);
        let (score, next) = apply(&f, root.as_ref(), &s, &bm, Range::new(0, 1));
        assert_eq!(score, 0.0);
        let bm = bm.derive(Range::new(0, 1));
        let (score, _) = apply(&f, next.as_ref(), &s, &bm, Range::single(2));
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_jump_costs_distance() {
        let f = Distortion::new("d", false);
        let s = Sentence::parse("a b c d");
        let root = root(&f, &s);
        let bm = Bitmap::new(4);
        let (score, next) = apply(&f, root.as_ref(), &s, &bm, Range::single(2));
        assert_eq!(score, -2.0);
        let bm = bm.derive(Range::single(2));
        // back from 2 to 0: |2 + 1 - 0|
        let (score, _) = apply(&f, next.as_ref(), &s, &bm, Range::single(0));
        assert_eq!(score, -3.0);
    }

    #[test]
    fn test_states_compare_by_prev_end() {
        let f = Distortion::new("d", false);
        let s = Sentence::parse("a b c d");
        let root = root(&f, &s);
        let bm = Bitmap::new(4);
        let (_, a) = apply(&f, root.as_ref(), &s, &bm, Range::new(0, 1));
        let (_, b) = apply(&f, root.as_ref(), &s, &bm, Range::single(1));
        let (_, c) = apply(&f, root.as_ref(), &s, &bm, Range::single(0));
        assert!(a.state_eq(b.as_ref()));
        assert_eq!(a.hash_value(), b.hash_value());
        assert!(!a.state_eq(c.as_ref()));
    }

    #[test]
    fn test_early_cost_cases() {
        let f = Distortion::new("d", true);
        // adjacent to the translated prefix
        assert_eq!(f.score(None, Range::new(0, 1), Some(0)), 0.0);
        // skipping two words from the start: 2 * (2 + 1)
        assert_eq!(f.score(None, Range::single(2), Some(0)), -6.0);
        // filling in to the left of the previous phrase: 2 * len
        assert_eq!(f.score(Some(4), Range::single(2), Some(1)), -2.0);
        // continuing past a gap after the previous phrase: 2 * (1 + 1)
        assert_eq!(f.score(Some(2), Range::single(4), Some(1)), -4.0);
    }
}
