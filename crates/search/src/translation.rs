//! Decoding results

use crate::hypothesis::{HypothesisArena, HypothesisId};
use crate::options::TranslationOptions;
use crate::search_graph::SearchGraphNode;
use crate::stats::SentenceStats;
use serde::Serialize;
use verso_core::{Range, ScoreVector};
use verso_features::FeatureRegistry;

/// Unweighted scores of one feature
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureScores {
    /// Feature name
    pub name: String,
    /// One value per score slot
    pub scores: Vec<f32>,
}

/// A source span and the target words it produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedPhrase {
    /// Source span
    pub source: Range,
    /// Target words, empty for deletions
    pub target: Vec<String>,
}

/// One complete derivation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Derivation {
    /// Target words in output order
    pub words: Vec<String>,
    /// Weighted total
    pub score: f32,
    /// Per-feature breakdown of `score`
    pub features: Vec<FeatureScores>,
    /// Phrase segmentation in target order
    pub alignment: Vec<AlignedPhrase>,
}

impl Derivation {
    /// Target words joined by single spaces
    pub fn text(&self) -> String {
        self.words.join(" ")
    }
}

/// Result of decoding one sentence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Translation {
    /// Position of the sentence in its batch
    pub index: usize,
    /// Target words of the best derivation
    pub words: Vec<String>,
    /// Weighted total of the best derivation
    pub score: f32,
    /// False when the best hypothesis does not cover the whole sentence
    pub complete: bool,
    /// Per-feature breakdown of `score`
    pub features: Vec<FeatureScores>,
    /// Phrase segmentation of the best derivation
    pub alignment: Vec<AlignedPhrase>,
    /// Alternative derivations, best first, when requested
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nbest: Vec<Derivation>,
    /// Connected search graph, when requested
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub search_graph: Vec<SearchGraphNode>,
    /// Search counters
    #[serde(skip)]
    pub stats: SentenceStats,
}

impl Translation {
    /// Result for a sentence that produced no hypothesis at all
    pub fn empty(index: usize) -> Self {
        Translation {
            index,
            words: Vec::new(),
            score: f32::NEG_INFINITY,
            complete: false,
            features: Vec::new(),
            alignment: Vec::new(),
            nbest: Vec::new(),
            search_graph: Vec::new(),
            stats: SentenceStats::default(),
        }
    }

    /// Target words joined by single spaces
    pub fn text(&self) -> String {
        self.words.join(" ")
    }

    pub(crate) fn from_best(index: usize, complete: bool, best: Derivation, nbest: Vec<Derivation>) -> Self {
        Translation {
            index,
            words: best.words,
            score: best.score,
            complete,
            features: best.features,
            alignment: best.alignment,
            nbest,
            search_graph: Vec::new(),
            stats: SentenceStats::default(),
        }
    }
}

/// Turns hypothesis chains into [`Derivation`]s
pub(crate) struct Renderer<'a> {
    pub(crate) arena: &'a HypothesisArena,
    pub(crate) options: &'a TranslationOptions,
    pub(crate) registry: &'a FeatureRegistry,
}

impl Renderer<'_> {
    /// `edges` run from the final hypothesis back to the root
    pub(crate) fn derivation(&self, edges: &[HypothesisId], scores: &ScoreVector) -> Derivation {
        let mut words = Vec::new();
        let mut alignment = Vec::with_capacity(edges.len());
        for &id in edges.iter().rev() {
            let Some(option) = self.arena.get(id).option() else {
                continue;
            };
            let option = self.options.option(option);
            let target: Vec<String> = option.target().iter().map(|w| w.to_string()).collect();
            words.extend(target.iter().cloned());
            alignment.push(AlignedPhrase {
                source: option.range(),
                target,
            });
        }

        Derivation {
            words,
            score: scores.total(),
            features: self.features(scores),
            alignment,
        }
    }

    /// Surface string of a chain, without scores
    pub(crate) fn surface(&self, edges: &[HypothesisId]) -> String {
        let mut out = String::new();
        for &id in edges.iter().rev() {
            if let Some(option) = self.arena.get(id).option() {
                for word in self.options.option(option).target().iter() {
                    if !out.is_empty() {
                        out.push(' ');
                    }
                    out.push_str(word);
                }
            }
        }
        out
    }

    fn features(&self, scores: &ScoreVector) -> Vec<FeatureScores> {
        self.registry
            .infos()
            .iter()
            .map(|info| FeatureScores {
                name: info.name.clone(),
                scores: scores.slot_scores(info.slot).to_vec(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_translation() {
        let t = Translation::empty(4);
        assert_eq!(t.index, 4);
        assert_eq!(t.text(), "");
        assert!(!t.complete);
        assert_eq!(t.score, f32::NEG_INFINITY);
    }

    #[test]
    fn test_nbest_omitted_from_json_when_empty() {
        let mut t = Translation::empty(0);
        t.score = -1.5;
        t.words = vec!["a".into(), "house".into()];
        let json = serde_json::to_value(&t).unwrap();
        assert!(json.get("nbest").is_none());
        assert!(json.get("search_graph").is_none());
        assert!(json.get("stats").is_none());
        assert_eq!(json["words"][1], "house");
        assert_eq!(t.text(), "a house");
    }
}
