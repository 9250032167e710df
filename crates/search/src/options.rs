//! Translation options: every way to translate every source span
//!
//! Before search starts each span of at most `max_phrase_length` words is
//! looked up in every phrase dictionary. The candidates are scored by all
//! stateless features, given a future-score estimate that also includes
//! the stateful features' isolation estimates, then ranked and pruned.
//!
//! Single words that no dictionary knows get one pass-through option so
//! that every sentence has at least one complete derivation.

use std::sync::Arc;
use verso_core::{Error, Phrase, Range, Result, ScoreVector, Sentence};
use verso_features::{FeatureFunction, PhraseContext};

use crate::model::Model;

/// A candidate phrase bound to the source span it translates
#[derive(Debug, Clone)]
pub struct TranslationOption {
    range: Range,
    target: Phrase,
    scores: ScoreVector,
    future_score: f32,
    reordering: Option<Arc<[f32]>>,
    unknown: bool,
}

impl TranslationOption {
    /// Source span
    #[inline]
    pub fn range(&self) -> Range {
        self.range
    }

    /// Target words
    #[inline]
    pub fn target(&self) -> &Phrase {
        &self.target
    }

    /// Dictionary and stateless scores; added verbatim to a hypothesis
    #[inline]
    pub fn scores(&self) -> &ScoreVector {
        &self.scores
    }

    /// Weighted score including stateful isolation estimates
    #[inline]
    pub fn future_score(&self) -> f32 {
        self.future_score
    }

    /// Lexicalized reordering scores supplied by the dictionary
    #[inline]
    pub fn reordering(&self) -> Option<&Arc<[f32]>> {
        self.reordering.as_ref()
    }

    /// True for a pass-through unknown word
    #[inline]
    pub fn is_unknown(&self) -> bool {
        self.unknown
    }
}

/// All options of one sentence, grouped by span
#[derive(Debug, Default)]
pub struct TranslationOptions {
    options: Vec<TranslationOption>,
    spans: Vec<std::ops::Range<usize>>,
    sentence_len: usize,
    max_len: usize,
    scratch: Vec<f32>,
}

impl TranslationOptions {
    /// Empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up and score the options of `sentence`, replacing any previous
    /// contents. Allocations are kept for the next sentence.
    pub fn collect(&mut self, sentence: &Sentence, model: &Model) -> Result<()> {
        let config = model.config();
        self.options.clear();
        self.spans.clear();
        self.sentence_len = sentence.len();
        self.max_len = config.max_phrase_length.min(sentence.len()).max(1);
        self.spans.resize(self.sentence_len * self.max_len, 0..0);

        for start in 0..self.sentence_len {
            for end in start..(start + self.max_len).min(self.sentence_len) {
                let range = Range::new(start, end);
                let first = self.options.len();
                self.lookup(sentence, range, model)?;
                self.rank(first, config.table_limit, config.option_threshold);
                if range.len() == 1 && self.options.len() == first {
                    self.push_unknown(sentence, range, model)?;
                }
                let idx = self.span_index(range);
                self.spans[idx] = first..self.options.len();
            }
        }
        Ok(())
    }

    /// Options translating exactly `range`, best first
    pub fn get(&self, range: Range) -> &[TranslationOption] {
        &self.options[self.indices(range)]
    }

    /// Positions of the options for `range` in the flat option list
    pub fn indices(&self, range: Range) -> std::ops::Range<usize> {
        if range.end() >= self.sentence_len || range.len() > self.max_len {
            return 0..0;
        }
        self.spans[self.span_index(range)].clone()
    }

    /// Option by flat position
    #[inline]
    pub fn option(&self, id: usize) -> &TranslationOption {
        &self.options[id]
    }

    /// Total number of options
    pub fn len(&self) -> usize {
        self.options.len()
    }

    /// True when nothing was collected
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Longest span that can have options
    pub fn max_phrase_length(&self) -> usize {
        self.max_len
    }

    #[inline]
    fn span_index(&self, range: Range) -> usize {
        range.start() * self.max_len + range.len() - 1
    }

    fn lookup(&mut self, sentence: &Sentence, range: Range, model: &Model) -> Result<()> {
        let source = sentence.span(range);
        for (slot, dictionary) in model.registry().dictionaries() {
            for candidate in dictionary.lookup(source) {
                if candidate.scores.len() != slot.len() {
                    return Err(Error::config(format!(
                        "dictionary '{}' returned {} scores, expected {}",
                        dictionary.name(),
                        candidate.scores.len(),
                        slot.len()
                    )));
                }
                let mut scores = ScoreVector::new(model.num_scores());
                scores.assign(model.weights(), *slot, &candidate.scores)?;
                let option = self.score(
                    sentence,
                    range,
                    candidate.target.clone(),
                    scores,
                    candidate.reordering.clone(),
                    false,
                    model,
                )?;
                self.options.push(option);
            }
        }
        Ok(())
    }

    fn push_unknown(&mut self, sentence: &Sentence, range: Range, model: &Model) -> Result<()> {
        let target = if model.config().drop_unknown {
            Phrase::empty()
        } else {
            Phrase::from(sentence.span(range))
        };
        let scores = ScoreVector::new(model.num_scores());
        let option = self.score(sentence, range, target, scores, None, true, model)?;
        self.options.push(option);
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn score(
        &mut self,
        sentence: &Sentence,
        range: Range,
        target: Phrase,
        mut scores: ScoreVector,
        reordering: Option<Arc<[f32]>>,
        unknown: bool,
        model: &Model,
    ) -> Result<TranslationOption> {
        let weights = model.weights();
        let phrase = PhraseContext {
            source: sentence.words(),
            range,
            target: &target,
            unknown,
        };

        for (slot, feature) in model.registry().stateless() {
            let buf = scratch(&mut self.scratch, slot.len());
            feature.evaluate_in_isolation(&phrase, buf);
            scores.assign(weights, *slot, buf)?;
        }

        let mut future_score = scores.total();
        for (slot, feature) in model.registry().stateful() {
            let buf = scratch(&mut self.scratch, slot.len());
            feature.evaluate_in_isolation(&phrase, buf);
            future_score += weights.weigh(*slot, buf);
        }

        Ok(TranslationOption {
            range,
            target,
            scores,
            future_score,
            reordering,
            unknown,
        })
    }

    /// Sort `options[first..]` by future score and apply the per-span limits
    fn rank(&mut self, first: usize, table_limit: usize, threshold: f32) {
        let span = &mut self.options[first..];
        if span.is_empty() {
            return;
        }
        span.sort_by(|a, b| b.future_score.total_cmp(&a.future_score));
        let cutoff = span[0].future_score + threshold;
        let mut keep = span
            .iter()
            .take_while(|opt| opt.future_score >= cutoff)
            .count();
        if table_limit > 0 {
            keep = keep.min(table_limit);
        }
        self.options.truncate(first + keep);
    }
}

/// Zeroed prefix of a reusable score buffer
pub(crate) fn scratch(buf: &mut Vec<f32>, len: usize) -> &mut [f32] {
    buf.clear();
    buf.resize(len, 0.0);
    &mut buf[..]
}
