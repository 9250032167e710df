//! Stateless count features
//!
//! - WordPenalty: minus the number of target words
//! - PhrasePenalty: one per applied phrase pair
//! - UnknownWordPenalty: fixed penalty for each pass-through unknown word

use crate::dictionary::LOWEST_SCORE;
use crate::feature::{FeatureFunction, PhraseContext, StatelessFeature};

/// Minus the target length of each phrase
#[derive(Debug, Clone)]
pub struct WordPenalty {
    name: String,
}

impl WordPenalty {
    /// Create a word penalty feature
    pub fn new(name: impl Into<String>) -> Self {
        WordPenalty { name: name.into() }
    }
}

impl FeatureFunction for WordPenalty {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_scores(&self) -> usize {
        1
    }
}

impl StatelessFeature for WordPenalty {
    fn evaluate_in_isolation(&self, phrase: &PhraseContext<'_>, out: &mut [f32]) {
        out[0] = -(phrase.target.len() as f32);
    }
}

/// Constant 1 per phrase pair
#[derive(Debug, Clone)]
pub struct PhrasePenalty {
    name: String,
}

impl PhrasePenalty {
    /// Create a phrase penalty feature
    pub fn new(name: impl Into<String>) -> Self {
        PhrasePenalty { name: name.into() }
    }
}

impl FeatureFunction for PhrasePenalty {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_scores(&self) -> usize {
        1
    }
}

impl StatelessFeature for PhrasePenalty {
    fn evaluate_in_isolation(&self, _phrase: &PhraseContext<'_>, out: &mut [f32]) {
        out[0] = 1.0;
    }
}

/// Penalty for source words copied through untranslated
#[derive(Debug, Clone)]
pub struct UnknownWordPenalty {
    name: String,
    penalty: f32,
}

impl UnknownWordPenalty {
    /// Default raw score of an unknown word: the log-probability floor
    pub const DEFAULT_PENALTY: f32 = LOWEST_SCORE;

    /// Create the feature with an explicit raw penalty
    pub fn new(name: impl Into<String>, penalty: f32) -> Self {
        UnknownWordPenalty {
            name: name.into(),
            penalty,
        }
    }

    /// Raw score applied to each unknown word
    pub fn penalty(&self) -> f32 {
        self.penalty
    }
}

impl FeatureFunction for UnknownWordPenalty {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_scores(&self) -> usize {
        1
    }
}

impl StatelessFeature for UnknownWordPenalty {
    fn evaluate_in_isolation(&self, phrase: &PhraseContext<'_>, out: &mut [f32]) {
        out[0] = if phrase.unknown { self.penalty } else { 0.0 };
    }
}
