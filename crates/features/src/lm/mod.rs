//! N-gram language model feature
//!
//! The feature is generic over a [`LanguageModelBackend`], which answers
//! single conditional log10 probabilities. Scores are converted to natural
//! logs so they live on the same scale as the translation model.
//!
//! - In isolation a phrase is scored without left context; that estimate
//!   only feeds future costs.
//! - When applied, each target word is scored given the previous
//!   `order - 1` words, and `</s>` is scored once the hypothesis covers the
//!   whole sentence.

mod arpa;
mod backoff;

pub use backoff::BackoffLm;

use crate::feature::{ApplyContext, FeatureFunction, PhraseContext, StatefulFeature};
use crate::state::{downcast, downcast_mut, FFState};
use smallvec::SmallVec;
use std::sync::Arc;
use verso_core::{Sentence, Word};

/// Sentence-start token
pub const BOS: &str = "<s>";
/// Sentence-end token
pub const EOS: &str = "</s>";
/// Unknown-word token
pub const UNK: &str = "<unk>";

/// log10 to natural log
pub const LOG10_TO_LN: f32 = std::f32::consts::LN_10;

/// Conditional probability lookup
pub trait LanguageModelBackend: Send + Sync {
    /// N-gram order
    fn order(&self) -> usize;

    /// log10 P(word | context); only the last `order - 1` context words matter
    fn score(&self, context: &[Word], word: &Word) -> f32;
}

/// The last `order - 1` target words of a hypothesis
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct LmState {
    context: SmallVec<[Word; 4]>,
}

impl LmState {
    /// Context words, oldest first
    pub fn context(&self) -> &[Word] {
        &self.context
    }
}

/// Language model feature over any backend
pub struct LanguageModel {
    name: String,
    backend: Arc<dyn LanguageModelBackend>,
    bos: Word,
    eos: Word,
}

impl LanguageModel {
    /// Wrap a backend
    pub fn new(name: impl Into<String>, backend: Arc<dyn LanguageModelBackend>) -> Self {
        LanguageModel {
            name: name.into(),
            backend,
            bos: Word::from(BOS),
            eos: Word::from(EOS),
        }
    }

    /// Backend order
    pub fn order(&self) -> usize {
        self.backend.order()
    }

    fn push(&self, context: &mut SmallVec<[Word; 4]>, word: &Word) {
        let keep = self.order().saturating_sub(1);
        context.push(word.clone());
        if context.len() > keep {
            let excess = context.len() - keep;
            context.drain(..excess);
        }
    }
}

impl std::fmt::Debug for LanguageModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageModel")
            .field("name", &self.name)
            .field("order", &self.order())
            .finish()
    }
}

impl FeatureFunction for LanguageModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_scores(&self) -> usize {
        1
    }
}

impl StatefulFeature for LanguageModel {
    fn evaluate_in_isolation(&self, phrase: &PhraseContext<'_>, out: &mut [f32]) {
        let mut context = SmallVec::<[Word; 4]>::new();
        let mut total = 0.0;
        for word in phrase.target.iter() {
            total += self.backend.score(&context, word);
            self.push(&mut context, word);
        }
        out[0] = total * LOG10_TO_LN;
    }

    fn blank_state(&self) -> Box<dyn FFState> {
        Box::new(LmState::default())
    }

    fn empty_hypothesis_state(&self, state: &mut dyn FFState, _sentence: &Sentence) {
        let state = downcast_mut::<LmState>(state);
        state.context.clear();
        let bos = self.bos.clone();
        self.push(&mut state.context, &bos);
    }

    fn evaluate_when_applied(
        &self,
        prev: &dyn FFState,
        cand: &ApplyContext<'_>,
        out: &mut [f32],
    ) -> Box<dyn FFState> {
        let mut context = downcast::<LmState>(prev).context.clone();
        let mut total = 0.0;
        for word in cand.target.iter() {
            total += self.backend.score(&context, word);
            self.push(&mut context, word);
        }
        if cand.completes() {
            total += self.backend.score(&context, &self.eos);
        }
        out[0] = total * LOG10_TO_LN;
        Box::new(LmState { context })
    }
}
