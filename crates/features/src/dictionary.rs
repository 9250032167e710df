//! Phrase dictionaries
//!
//! A phrase dictionary is the collaborator that answers "which target
//! phrases translate these source words?". Each answer is an ordered,
//! already size-limited list of [`CandidatePhrase`]s carrying the
//! dictionary's raw translation-model scores. The dictionary is also a
//! feature: those scores occupy the dictionary's own slot.
//!
//! [`MemoryPhraseTable`] is the in-memory implementation. Its text format
//! is one phrase pair per line:
//!
//! ```text
//! das haus ||| the house ||| 0.8 0.6 0.7 0.5 [||| 0.7 0.2 0.1]
//! ```
//!
//! The third field holds probabilities, stored as natural logs floored at
//! [`LOWEST_SCORE`]. The optional fourth field holds lexicalized
//! reordering probabilities for the pair, transformed the same way.

use crate::feature::FeatureFunction;
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use verso_core::{Error, Phrase, Result, Word};

/// Floor for log-probabilities read from model files
pub const LOWEST_SCORE: f32 = -100.0;

const FIELD_SEPARATOR: &str = "|||";

/// Probability to floored natural-log score
#[inline]
pub fn transform_score(prob: f32) -> f32 {
    prob.ln().max(LOWEST_SCORE)
}

// ============================================================================
// CandidatePhrase
// ============================================================================

/// One translation of a source phrase, as returned by a dictionary lookup
#[derive(Debug, Clone, PartialEq)]
pub struct CandidatePhrase {
    /// Target words
    pub target: Phrase,

    /// Raw scores for the owning dictionary's slot
    pub scores: Box<[f32]>,

    /// Lexicalized reordering scores for this pair, if the model has any
    pub reordering: Option<Arc<[f32]>>,
}

impl CandidatePhrase {
    /// Candidate with translation-model scores only
    pub fn new(target: Phrase, scores: impl Into<Box<[f32]>>) -> Self {
        CandidatePhrase {
            target,
            scores: scores.into(),
            reordering: None,
        }
    }

    /// Builder: attach lexicalized reordering scores
    pub fn with_reordering(mut self, scores: impl Into<Arc<[f32]>>) -> Self {
        self.reordering = Some(scores.into());
        self
    }

    fn weighted(&self, weights: &[f32]) -> f32 {
        self.scores.iter().zip(weights).map(|(s, w)| s * w).sum()
    }
}

// ============================================================================
// PhraseDictionary
// ============================================================================

/// Source-phrase lookup collaborator
pub trait PhraseDictionary: FeatureFunction {
    /// Candidates for exactly `source`, best first; empty when unknown
    fn lookup(&self, source: &[Word]) -> &[CandidatePhrase];
}

// ============================================================================
// MemoryPhraseTable
// ============================================================================

/// Hash-map backed phrase dictionary
#[derive(Debug)]
pub struct MemoryPhraseTable {
    name: String,
    num_scores: usize,
    entries: FxHashMap<Phrase, Vec<CandidatePhrase>>,
}

impl MemoryPhraseTable {
    /// Empty table producing `num_scores` scores per candidate
    pub fn new(name: impl Into<String>, num_scores: usize) -> Self {
        MemoryPhraseTable {
            name: name.into(),
            num_scores,
            entries: FxHashMap::default(),
        }
    }

    /// Add a phrase pair with raw (already log-space) scores
    pub fn insert(&mut self, source: Phrase, candidate: CandidatePhrase) -> Result<()> {
        if candidate.scores.len() != self.num_scores {
            return Err(Error::config(format!(
                "{}: candidate '{}' has {} scores, table declares {}",
                self.name,
                candidate.target,
                candidate.scores.len(),
                self.num_scores
            )));
        }
        if source.is_empty() {
            return Err(Error::config(format!("{}: empty source phrase", self.name)));
        }
        self.entries.entry(source).or_default().push(candidate);
        Ok(())
    }

    /// Load a table from a text file
    pub fn load(name: impl Into<String>, num_scores: usize, path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let table = Self::from_reader(name, num_scores, std::io::BufReader::new(file))?;
        info!(
            table = %table.name,
            path = %path.display(),
            sources = table.entries.len(),
            "Loaded phrase table"
        );
        Ok(table)
    }

    /// Parse the text format from any buffered reader
    pub fn from_reader<R: BufRead>(name: impl Into<String>, num_scores: usize, reader: R) -> Result<Self> {
        let mut table = MemoryPhraseTable::new(name, num_scores);
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let (source, candidate) = parse_line(&line, num_scores).map_err(|reason| Error::PhraseTable {
                line: idx + 1,
                reason,
            })?;
            table.entries.entry(source).or_default().push(candidate);
        }
        Ok(table)
    }

    /// Sort every entry by weighted score and keep the best `table_limit`.
    ///
    /// `weights` are this table's slot of the global weight vector. A limit
    /// of 0 keeps everything. Ties keep file order.
    pub fn sort_and_prune(&mut self, weights: &[f32], table_limit: usize) {
        let mut pruned = 0usize;
        for candidates in self.entries.values_mut() {
            candidates.sort_by(|a, b| {
                b.weighted(weights)
                    .partial_cmp(&a.weighted(weights))
                    .unwrap_or(Ordering::Equal)
            });
            if table_limit > 0 && candidates.len() > table_limit {
                pruned += candidates.len() - table_limit;
                candidates.truncate(table_limit);
            }
        }
        debug!(table = %self.name, pruned, "Sorted phrase table");
    }

    /// Number of distinct source phrases
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no phrase pair is loaded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_line(line: &str, num_scores: usize) -> std::result::Result<(Phrase, CandidatePhrase), String> {
    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).map(str::trim).collect();
    if fields.len() < 3 {
        return Err(format!("expected at least 3 '{}'-separated fields", FIELD_SEPARATOR));
    }
    let source = Phrase::parse(fields[0]);
    if source.is_empty() {
        return Err("empty source phrase".to_string());
    }
    let target = Phrase::parse(fields[1]);
    let scores = parse_probs(fields[2])?;
    if scores.len() != num_scores {
        return Err(format!("expected {} scores, found {}", num_scores, scores.len()));
    }
    let mut candidate = CandidatePhrase::new(target, scores);
    if let Some(reordering) = fields.get(3).filter(|f| !f.is_empty()) {
        candidate = candidate.with_reordering(parse_probs(reordering)?);
    }
    Ok((source, candidate))
}

fn parse_probs(field: &str) -> std::result::Result<Vec<f32>, String> {
    field
        .split_whitespace()
        .map(|tok| {
            tok.parse::<f32>()
                .map(transform_score)
                .map_err(|_| format!("invalid score '{}'", tok))
        })
        .collect()
}

impl FeatureFunction for MemoryPhraseTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_scores(&self) -> usize {
        self.num_scores
    }
}

impl PhraseDictionary for MemoryPhraseTable {
    fn lookup(&self, source: &[Word]) -> &[CandidatePhrase] {
        self.entries.get(source).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use verso_core::Sentence;

    const TABLE: &str = "\
das ||| the ||| 0.3 0.4
das ||| that ||| 0.6 0.5
haus ||| house ||| 1 1 ||| 0.5 0.25 0.25
das haus ||| the house ||| 0.8 0.9
";

    fn words(text: &str) -> Vec<Word> {
        Sentence::parse(text).words().to_vec()
    }

    #[test]
    fn test_parse_and_lookup() {
        let table = MemoryPhraseTable::from_reader("pt", 2, Cursor::new(TABLE)).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.lookup(&words("das")).len(), 2);
        assert_eq!(table.lookup(&words("das haus"))[0].target, Phrase::parse("the house"));
        assert!(table.lookup(&words("haus das")).is_empty());
    }

    #[test]
    fn test_scores_are_log_transformed() {
        let table = MemoryPhraseTable::from_reader("pt", 2, Cursor::new(TABLE)).unwrap();
        let haus = &table.lookup(&words("haus"))[0];
        assert_eq!(&*haus.scores, &[0.0, 0.0]);
        let reo = haus.reordering.as_ref().unwrap();
        assert!((reo[0] - 0.5f32.ln()).abs() < 1e-6);
    }

    #[test]
    fn test_zero_probability_is_floored() {
        assert_eq!(transform_score(0.0), LOWEST_SCORE);
    }

    #[test]
    fn test_sort_and_prune() {
        let mut table = MemoryPhraseTable::from_reader("pt", 2, Cursor::new(TABLE)).unwrap();
        table.sort_and_prune(&[1.0, 1.0], 1);
        let das = table.lookup(&words("das"));
        assert_eq!(das.len(), 1);
        assert_eq!(das[0].target, Phrase::parse("that"));
    }

    #[test]
    fn test_wrong_score_count_reports_line() {
        let err = MemoryPhraseTable::from_reader("pt", 3, Cursor::new(TABLE)).unwrap_err();
        assert!(matches!(err, Error::PhraseTable { line: 1, .. }));
    }

    #[test]
    fn test_missing_field() {
        let err = MemoryPhraseTable::from_reader("pt", 1, Cursor::new("a ||| b\n")).unwrap_err();
        assert!(err.to_string().contains("at least 3"));
    }

    #[test]
    fn test_insert_checks_score_count() {
        let mut table = MemoryPhraseTable::new("pt", 1);
        let bad = CandidatePhrase::new(Phrase::parse("x"), vec![0.0, 0.0]);
        assert!(table.insert(Phrase::parse("a"), bad).is_err());
        let good = CandidatePhrase::new(Phrase::parse("x"), vec![0.0]);
        table.insert(Phrase::parse("a"), good).unwrap();
        assert_eq!(table.lookup(&words("a")).len(), 1);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("phrase-table");
        std::fs::write(&path, TABLE).unwrap();
        let table = MemoryPhraseTable::load("pt", 2, &path).unwrap();
        assert_eq!(table.name(), "pt");
        assert_eq!(table.len(), 3);
    }
}
