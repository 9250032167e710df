//! In-memory back-off n-gram model

use super::{LanguageModelBackend, UNK};
use crate::dictionary::LOWEST_SCORE;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::path::Path;
use tracing::info;
use verso_core::{Phrase, Result, Word};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Entry {
    logprob: f32,
    backoff: f32,
}

/// Katz-style back-off model held in a hash map.
///
/// `P(w | h) = P*(h w)` when `h w` was seen, else `bo(h) + P(w | h')` with
/// `h'` the history minus its oldest word. Unseen unigrams get the `<unk>`
/// probability.
#[derive(Debug, Clone)]
pub struct BackoffLm {
    order: usize,
    ngrams: FxHashMap<Phrase, Entry>,
}

impl BackoffLm {
    /// Empty model of the given order
    pub fn new(order: usize) -> Self {
        BackoffLm {
            order: order.max(1),
            ngrams: FxHashMap::default(),
        }
    }

    /// Load an ARPA file
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let lm = super::arpa::read_arpa(std::io::BufReader::new(file))?;
        info!(path = %path.display(), order = lm.order, ngrams = lm.ngrams.len(), "Loaded language model");
        Ok(lm)
    }

    /// Parse ARPA text from a reader
    pub fn from_arpa<R: std::io::BufRead>(reader: R) -> Result<Self> {
        super::arpa::read_arpa(reader)
    }

    /// Add or replace an n-gram with log10 probability and back-off weight
    pub fn insert(&mut self, ngram: Phrase, logprob: f32, backoff: f32) {
        self.ngrams.insert(ngram, Entry { logprob, backoff });
    }

    /// Number of stored n-grams
    pub fn len(&self) -> usize {
        self.ngrams.len()
    }

    /// True when no n-gram is stored
    pub fn is_empty(&self) -> bool {
        self.ngrams.is_empty()
    }

    fn unk_logprob(&self) -> f32 {
        self.ngrams
            .get(&[Word::from(UNK)][..])
            .map_or(LOWEST_SCORE, |e| e.logprob)
    }
}

impl LanguageModelBackend for BackoffLm {
    fn order(&self) -> usize {
        self.order
    }

    fn score(&self, context: &[Word], word: &Word) -> f32 {
        let history = &context[context.len().saturating_sub(self.order - 1)..];
        let mut key: SmallVec<[Word; 6]> = SmallVec::with_capacity(history.len() + 1);
        let mut backoff = 0.0;

        for start in 0..=history.len() {
            let hist = &history[start..];
            key.clear();
            key.extend(hist.iter().cloned());
            key.push(word.clone());
            if let Some(entry) = self.ngrams.get(&key[..]) {
                return backoff + entry.logprob;
            }
            if !hist.is_empty() {
                backoff += self.ngrams.get(hist).map_or(0.0, |e| e.backoff);
            }
        }
        backoff + self.unk_logprob()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(s: &str) -> Word {
        Word::from(s)
    }

    fn model() -> BackoffLm {
        let mut lm = BackoffLm::new(3);
        lm.insert(Phrase::parse("a"), -1.0, -0.5);
        lm.insert(Phrase::parse("b"), -1.5, -0.25);
        lm.insert(Phrase::parse("c"), -2.0, 0.0);
        lm.insert(Phrase::parse("<unk>"), -5.0, 0.0);
        lm.insert(Phrase::parse("a b"), -0.3, -0.1);
        lm.insert(Phrase::parse("a b c"), -0.05, 0.0);
        lm
    }

    #[test]
    fn test_exact_hit() {
        let lm = model();
        assert_eq!(lm.score(&[w("a"), w("b")], &w("c")), -0.05);
        assert_eq!(lm.score(&[w("a")], &w("b")), -0.3);
        assert_eq!(lm.score(&[], &w("c")), -2.0);
    }

    #[test]
    fn test_backs_off_to_lower_order() {
        let lm = model();
        // "b a" unseen, "b" has back-off -0.25
        assert!((lm.score(&[w("b")], &w("a")) - (-0.25 - 1.0)).abs() < 1e-6);
        // "a b a" unseen: bo(a b) + bo(b) + P(a)
        assert!((lm.score(&[w("a"), w("b")], &w("a")) - (-0.1 - 0.25 - 1.0)).abs() < 1e-6);
    }

    #[test]
    fn test_context_is_truncated_to_order() {
        let lm = model();
        let long = [w("c"), w("c"), w("a"), w("b")];
        assert_eq!(lm.score(&long, &w("c")), -0.05);
    }

    #[test]
    fn test_unknown_word() {
        let lm = model();
        assert_eq!(lm.score(&[], &w("zzz")), -5.0);
        assert_eq!(BackoffLm::new(2).score(&[], &w("zzz")), LOWEST_SCORE);
    }
}
