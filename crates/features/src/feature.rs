//! Feature function protocol
//!
//! This module provides:
//! - FeatureFunction: name and score count shared by every scoring unit
//! - StatelessFeature: scores a phrase pair in isolation
//! - StatefulFeature: additionally threads opaque state across hypotheses
//! - PhraseContext / ApplyContext: what a feature may look at
//!
//! Features write raw scores into the slice of their own slot; weighting
//! and accumulation are done by the caller. No feature sees another
//! feature's scores.

use crate::state::FFState;
use std::sync::Arc;
use verso_core::{Bitmap, Phrase, Range, Sentence, Word};

// ============================================================================
// Contexts
// ============================================================================

/// A candidate phrase pair viewed in isolation from any hypothesis
#[derive(Debug, Clone, Copy)]
pub struct PhraseContext<'a> {
    /// Source words of the span
    pub source: &'a [Word],

    /// Span of the source words in the sentence
    pub range: Range,

    /// Target side
    pub target: &'a Phrase,

    /// True for the pass-through option of an unknown word
    pub unknown: bool,
}

/// A phrase pair being applied to a predecessor hypothesis
#[derive(Debug, Clone, Copy)]
pub struct ApplyContext<'a> {
    /// The whole input sentence
    pub sentence: &'a Sentence,

    /// Source span being translated
    pub range: Range,

    /// Target words being appended
    pub target: &'a Phrase,

    /// Lexicalized reordering scores attached to the phrase pair, if any
    pub reordering: Option<&'a Arc<[f32]>>,

    /// Coverage of the predecessor
    pub prev_coverage: &'a Bitmap,

    /// Coverage after applying the phrase
    pub coverage: &'a Bitmap,
}

impl ApplyContext<'_> {
    /// True when this phrase completes the translation
    #[inline]
    pub fn completes(&self) -> bool {
        self.coverage.is_complete()
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Common surface of every scoring unit
pub trait FeatureFunction: Send + Sync {
    /// Unique name, used to attach weights and in score breakdowns
    fn name(&self) -> &str;

    /// Number of raw scores this feature produces
    fn num_scores(&self) -> usize;
}

/// Feature whose score depends only on the phrase pair
pub trait StatelessFeature: FeatureFunction {
    /// Write raw scores for `phrase` into `out` (length `num_scores()`)
    fn evaluate_in_isolation(&self, phrase: &PhraseContext<'_>, out: &mut [f32]);
}

/// Feature whose score depends on translation history
///
/// `evaluate_when_applied` must be a pure function of the previous state and
/// the candidate: cube pruning calls it lazily and out of global order.
pub trait StatefulFeature: FeatureFunction {
    /// Optimistic context-free estimate, folded into future costs only
    fn evaluate_in_isolation(&self, _phrase: &PhraseContext<'_>, _out: &mut [f32]) {}

    /// Allocate an uninitialised state
    fn blank_state(&self) -> Box<dyn FFState>;

    /// Initialise `state` for the empty hypothesis of `sentence`
    fn empty_hypothesis_state(&self, state: &mut dyn FFState, sentence: &Sentence);

    /// Score applying `cand` after a hypothesis in `prev`; returns the new state
    fn evaluate_when_applied(
        &self,
        prev: &dyn FFState,
        cand: &ApplyContext<'_>,
        out: &mut [f32],
    ) -> Box<dyn FFState>;
}
