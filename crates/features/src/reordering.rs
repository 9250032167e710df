//! Lexicalized reordering
//!
//! Classifies each phrase transition into an orientation class and scores
//! it with a per-phrase-pair probability supplied alongside the candidate
//! phrase. The model is configured with a dash-separated string such as
//! `msd-bidirectional-fe`:
//!
//! | part | meaning |
//! |------|---------|
//! | `msd` / `mslr` / `monotonicity` / `leftright` | orientation classes |
//! | `backward` / `forward` / `bidirectional` | which transitions are scored |
//! | `f` / `fe` | conditioning of the table (informational) |
//!
//! The backward model scores the orientation of the new phrase relative to
//! the previous one with the new phrase's probabilities. The forward model
//! scores the same orientation with the *previous* phrase's probabilities,
//! so its state remembers them. Pairs with no probabilities contribute 0.

use crate::feature::{ApplyContext, FeatureFunction, StatefulFeature};
use crate::state::{downcast, downcast_mut, FFState};
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use verso_core::{Error, Range, Result, Sentence};

/// Orientation class sets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelType {
    /// monotone, swap, discontinuous
    Msd,
    /// monotone, swap, discontinuous-left, discontinuous-right
    Mslr,
    /// monotone, non-monotone
    Monotonicity,
    /// right, left
    LeftRight,
}

impl ModelType {
    /// Number of orientation classes
    pub fn num_types(self) -> usize {
        match self {
            ModelType::Msd => 3,
            ModelType::Mslr => 4,
            ModelType::Monotonicity | ModelType::LeftRight => 2,
        }
    }

    /// Class index of `curr` following `prev` (`None` for the first phrase)
    pub fn orientation(self, prev: Option<Range>, curr: Range) -> usize {
        const M: usize = 0;
        const S: usize = 1;
        const D: usize = 2;
        const DL: usize = 2;
        const DR: usize = 3;
        const NM: usize = 1;
        const R: usize = 0;
        const L: usize = 1;

        let monotone = |p: Range| p.end() + 1 == curr.start();
        let swap = |p: Range| p.start() == curr.end() + 1;

        match (self, prev) {
            (ModelType::Msd, None) => {
                if curr.start() == 0 {
                    M
                } else {
                    D
                }
            }
            (ModelType::Msd, Some(p)) => {
                if monotone(p) {
                    M
                } else if swap(p) {
                    S
                } else {
                    D
                }
            }
            (ModelType::Mslr, None) => {
                if curr.start() == 0 {
                    M
                } else {
                    DR
                }
            }
            (ModelType::Mslr, Some(p)) => {
                if monotone(p) {
                    M
                } else if swap(p) {
                    S
                } else if p.end() < curr.start() {
                    DR
                } else {
                    DL
                }
            }
            (ModelType::Monotonicity, None) => {
                if curr.start() == 0 {
                    M
                } else {
                    NM
                }
            }
            (ModelType::Monotonicity, Some(p)) => {
                if monotone(p) {
                    M
                } else {
                    NM
                }
            }
            (ModelType::LeftRight, None) => R,
            (ModelType::LeftRight, Some(p)) => {
                if p.end() <= curr.start() {
                    R
                } else {
                    L
                }
            }
        }
    }
}

/// Which transitions are scored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// New phrase relative to the previous one
    Backward,
    /// Previous phrase relative to the new one
    Forward,
    /// Both, backward block first
    Bidirectional,
}

impl Direction {
    fn has_backward(self) -> bool {
        matches!(self, Direction::Backward | Direction::Bidirectional)
    }

    fn has_forward(self) -> bool {
        matches!(self, Direction::Forward | Direction::Bidirectional)
    }

    fn num_blocks(self) -> usize {
        if self == Direction::Bidirectional {
            2
        } else {
            1
        }
    }
}

/// Parsed model configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorderingConfig {
    /// Orientation classes
    pub model: ModelType,
    /// Scored directions
    pub direction: Direction,
}

impl ReorderingConfig {
    /// Parse a configuration string like `msd-bidirectional-fe`
    pub fn parse(spec: &str) -> Result<Self> {
        let mut model = None;
        let mut direction = Direction::Backward;
        for part in spec.split('-') {
            match part {
                "msd" => model = Some(ModelType::Msd),
                "mslr" => model = Some(ModelType::Mslr),
                "monotonicity" => model = Some(ModelType::Monotonicity),
                "leftright" => model = Some(ModelType::LeftRight),
                "backward" | "unidirectional" => direction = Direction::Backward,
                "forward" => direction = Direction::Forward,
                "bidirectional" => direction = Direction::Bidirectional,
                "f" | "fe" | "phrase" | "wbe" | "allff" => {}
                other => {
                    return Err(Error::config(format!(
                        "unsupported lexical reordering option '{}' in '{}'",
                        other, spec
                    )))
                }
            }
        }
        let model = model.ok_or_else(|| {
            Error::config(format!(
                "lexical reordering model '{}' names no orientation type",
                spec
            ))
        })?;
        Ok(ReorderingConfig { model, direction })
    }

    /// Total score count
    pub fn num_scores(&self) -> usize {
        self.model.num_types() * self.direction.num_blocks()
    }
}

/// Previous span plus, for forward models, the previous pair's scores
#[derive(Debug, Clone, Default)]
pub struct ReorderingState {
    prev: Option<Range>,
    prev_scores: Option<Arc<[f32]>>,
}

impl PartialEq for ReorderingState {
    fn eq(&self, other: &Self) -> bool {
        self.prev == other.prev
            && match (&self.prev_scores, &other.prev_scores) {
                (None, None) => true,
                (Some(a), Some(b)) => {
                    Arc::ptr_eq(a, b)
                        || (a.len() == b.len()
                            && a.iter().zip(b.iter()).all(|(x, y)| x.to_bits() == y.to_bits()))
                }
                _ => false,
            }
    }
}

impl Eq for ReorderingState {}

impl Hash for ReorderingState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.prev.hash(state);
        if let Some(scores) = &self.prev_scores {
            for s in scores.iter() {
                state.write_u32(s.to_bits());
            }
        }
    }
}

/// Lexicalized reordering feature
#[derive(Debug, Clone)]
pub struct LexicalReordering {
    name: String,
    config: ReorderingConfig,
}

impl LexicalReordering {
    /// Create the feature from a parsed configuration
    pub fn new(name: impl Into<String>, config: ReorderingConfig) -> Self {
        LexicalReordering {
            name: name.into(),
            config,
        }
    }

    /// Model configuration
    pub fn config(&self) -> ReorderingConfig {
        self.config
    }

    fn copy_score(&self, out: &mut [f32], block: usize, orientation: usize, scores: Option<&Arc<[f32]>>) {
        let idx = block * self.config.model.num_types() + orientation;
        if let Some(value) = scores.and_then(|s| s.get(idx)) {
            out[idx] = *value;
        }
    }
}

impl FeatureFunction for LexicalReordering {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_scores(&self) -> usize {
        self.config.num_scores()
    }
}

impl StatefulFeature for LexicalReordering {
    fn blank_state(&self) -> Box<dyn FFState> {
        Box::new(ReorderingState::default())
    }

    fn empty_hypothesis_state(&self, state: &mut dyn FFState, _sentence: &Sentence) {
        let state = downcast_mut::<ReorderingState>(state);
        state.prev = None;
        state.prev_scores = None;
    }

    fn evaluate_when_applied(
        &self,
        prev: &dyn FFState,
        cand: &ApplyContext<'_>,
        out: &mut [f32],
    ) -> Box<dyn FFState> {
        let prev = downcast::<ReorderingState>(prev);
        out.iter_mut().for_each(|s| *s = 0.0);

        let orientation = self.config.model.orientation(prev.prev, cand.range);
        let mut block = 0;
        if self.config.direction.has_backward() {
            self.copy_score(out, block, orientation, cand.reordering);
            block += 1;
        }
        // forward scores nothing for the first phrase
        if self.config.direction.has_forward() && prev.prev.is_some() {
            self.copy_score(out, block, orientation, prev.prev_scores.as_ref());
        }

        Box::new(ReorderingState {
            prev: Some(cand.range),
            prev_scores: if self.config.direction.has_forward() {
                cand.reordering.cloned()
            } else {
                None
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verso_core::{Bitmap, Phrase};

    #[test]
    fn test_parse_config() {
        let cfg = ReorderingConfig::parse("msd-bidirectional-fe").unwrap();
        assert_eq!(cfg.model, ModelType::Msd);
        assert_eq!(cfg.direction, Direction::Bidirectional);
        assert_eq!(cfg.num_scores(), 6);

        let cfg = ReorderingConfig::parse("mslr-backward-f").unwrap();
        assert_eq!(cfg.num_scores(), 4);

        assert!(ReorderingConfig::parse("bidirectional-fe").is_err());
        assert!(ReorderingConfig::parse("msd-hier-fe").is_err());
    }

    #[test]
    fn test_msd_orientation() {
        let m = ModelType::Msd;
        assert_eq!(m.orientation(None, Range::new(0, 1)), 0);
        assert_eq!(m.orientation(None, Range::new(2, 3)), 2);
        assert_eq!(m.orientation(Some(Range::new(0, 1)), Range::single(2)), 0);
        assert_eq!(m.orientation(Some(Range::new(2, 3)), Range::new(0, 1)), 1);
        assert_eq!(m.orientation(Some(Range::new(3, 3)), Range::single(0)), 2);
    }

    #[test]
    fn test_mslr_orientation() {
        let m = ModelType::Mslr;
        assert_eq!(m.orientation(None, Range::single(3)), 3);
        assert_eq!(m.orientation(Some(Range::single(0)), Range::single(3)), 3);
        assert_eq!(m.orientation(Some(Range::single(4)), Range::single(1)), 2);
        assert_eq!(m.orientation(Some(Range::single(2)), Range::single(1)), 1);
    }

    #[test]
    fn test_monotonicity_and_leftright() {
        let m = ModelType::Monotonicity;
        assert_eq!(m.orientation(None, Range::single(0)), 0);
        assert_eq!(m.orientation(None, Range::single(1)), 1);
        assert_eq!(m.orientation(Some(Range::single(1)), Range::single(0)), 1);

        let lr = ModelType::LeftRight;
        assert_eq!(lr.orientation(None, Range::single(3)), 0);
        assert_eq!(lr.orientation(Some(Range::single(3)), Range::single(1)), 1);
        assert_eq!(lr.orientation(Some(Range::single(1)), Range::single(3)), 0);
    }

    fn apply(
        f: &LexicalReordering,
        prev: &dyn FFState,
        range: Range,
        reordering: Option<&Arc<[f32]>>,
    ) -> (Vec<f32>, Box<dyn FFState>) {
        let sentence = Sentence::parse("a b c d");
        let target = Phrase::parse("x");
        let prev_coverage = Bitmap::new(4);
        let coverage = prev_coverage.derive(range);
        let ctx = ApplyContext {
            sentence: &sentence,
            range,
            target: &target,
            reordering,
            prev_coverage: &prev_coverage,
            coverage: &coverage,
        };
        let mut out = vec![0.0; f.num_scores()];
        let next = f.evaluate_when_applied(prev, &ctx, &mut out);
        (out, next)
    }

    #[test]
    fn test_bidirectional_scoring() {
        let f = LexicalReordering::new(
            "lr",
            ReorderingConfig::parse("msd-bidirectional-fe").unwrap(),
        );
        let mut root = f.blank_state();
        f.empty_hypothesis_state(root.as_mut(), &Sentence::parse("a b c d"));

        let first: Arc<[f32]> = Arc::from(vec![-0.1, -0.2, -0.3, -0.4, -0.5, -0.6]);
        let second: Arc<[f32]> = Arc::from(vec![-1.0, -2.0, -3.0, -4.0, -5.0, -6.0]);

        // first phrase at 0: backward monotone, forward silent
        let (out, state) = apply(&f, root.as_ref(), Range::new(0, 1), Some(&first));
        assert_eq!(out, vec![-0.1, 0.0, 0.0, 0.0, 0.0, 0.0]);

        // next phrase is monotone: backward uses its own scores, forward the previous ones
        let (out, _) = apply(&f, state.as_ref(), Range::new(2, 3), Some(&second));
        assert_eq!(out, vec![-1.0, 0.0, 0.0, -0.4, 0.0, 0.0]);
    }

    #[test]
    fn test_missing_scores_contribute_zero() {
        let f = LexicalReordering::new("lr", ReorderingConfig::parse("msd-backward-fe").unwrap());
        let root = f.blank_state();
        let (out, _) = apply(&f, root.as_ref(), Range::single(2), None);
        assert_eq!(out, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_forward_state_includes_scores() {
        let f = LexicalReordering::new("lr", ReorderingConfig::parse("msd-forward-fe").unwrap());
        let root = f.blank_state();
        let a: Arc<[f32]> = Arc::from(vec![-0.1, -0.2, -0.3]);
        let b: Arc<[f32]> = Arc::from(vec![-0.9, -0.2, -0.3]);
        let (_, sa) = apply(&f, root.as_ref(), Range::single(0), Some(&a));
        let (_, sb) = apply(&f, root.as_ref(), Range::single(0), Some(&b));
        let (_, sa2) = apply(&f, root.as_ref(), Range::single(0), Some(&a.clone()));
        assert!(!sa.state_eq(sb.as_ref()));
        assert!(sa.state_eq(sa2.as_ref()));
        assert_eq!(sa.hash_value(), sa2.hash_value());
    }
}
