//! Shared toy model for the search integration tests

#![allow(dead_code)]

use std::sync::Arc;
use verso_core::{Phrase, Weights};
use verso_features::{
    BackoffLm, CandidatePhrase, Distortion, Feature, FeatureRegistry, LanguageModel, MemoryPhraseTable,
    PhrasePenalty, UnknownWordPenalty, WordPenalty,
};
use verso_search::{AlignedPhrase, Model, SearchConfig};

pub const VOCABULARY: &[&str] = &["er", "geht", "ja", "nicht", "nach", "hause", "haus", "das"];

const PHRASES: &[(&str, &str, f32)] = &[
    ("er", "he", 0.8),
    ("er", "it", 0.2),
    ("geht", "goes", 0.6),
    ("geht", "walks", 0.3),
    ("ja", "yes", 0.4),
    ("ja", "indeed", 0.3),
    ("ja", "of course", 0.2),
    ("nicht", "not", 0.7),
    ("nicht", "does not", 0.2),
    ("nach", "to", 0.5),
    ("nach", "after", 0.3),
    ("hause", "house", 0.4),
    ("hause", "home", 0.5),
    ("nach hause", "home", 0.8),
    ("geht ja nicht", "does not go", 0.6),
    ("er geht", "he goes", 0.7),
    ("das", "the", 0.7),
    ("das", "this", 0.2),
    ("haus", "house", 0.9),
    ("das haus", "the house", 0.8),
];

const BIGRAMS: &[(&str, f32)] = &[
    ("<s> he", -0.3),
    ("he goes", -0.4),
    ("he does", -0.6),
    ("does not", -0.2),
    ("not go", -0.5),
    ("go home", -0.4),
    ("goes home", -0.5),
    ("the house", -0.3),
    ("<s> the", -0.4),
    ("home </s>", -0.2),
    ("house </s>", -0.3),
];

const UNIGRAMS: &[(&str, f32, f32)] = &[
    ("<unk>", -6.0, 0.0),
    ("<s>", -99.0, -0.5),
    ("</s>", -1.0, 0.0),
    ("he", -1.5, -0.3),
    ("it", -1.6, -0.3),
    ("goes", -2.0, -0.3),
    ("walks", -2.5, -0.3),
    ("go", -2.0, -0.3),
    ("does", -2.0, -0.3),
    ("not", -1.8, -0.3),
    ("yes", -2.2, -0.3),
    ("indeed", -2.4, -0.3),
    ("of", -1.5, -0.3),
    ("course", -2.6, -0.3),
    ("to", -1.4, -0.3),
    ("after", -2.3, -0.3),
    ("house", -2.1, -0.3),
    ("home", -2.0, -0.3),
    ("the", -1.2, -0.3),
    ("this", -1.9, -0.3),
];

/// Translation model, word/phrase/unknown penalties, distortion and a
/// bigram language model
pub fn model(config: SearchConfig) -> Arc<Model> {
    let mut table = MemoryPhraseTable::new("TranslationModel0", 1);
    for &(src, tgt, p) in PHRASES {
        table
            .insert(Phrase::parse(src), CandidatePhrase::new(Phrase::parse(tgt), vec![p.ln()]))
            .unwrap();
    }

    let mut lm = BackoffLm::new(2);
    for &(word, logprob, backoff) in UNIGRAMS {
        lm.insert(Phrase::parse(word), logprob, backoff);
    }
    for &(bigram, logprob) in BIGRAMS {
        lm.insert(Phrase::parse(bigram), logprob, 0.0);
    }

    let mut registry = FeatureRegistry::new();
    registry.register(Feature::Dictionary(Arc::new(table))).unwrap();
    registry
        .register(Feature::Stateless(Arc::new(WordPenalty::new("WordPenalty0"))))
        .unwrap();
    registry
        .register(Feature::Stateless(Arc::new(PhrasePenalty::new("PhrasePenalty0"))))
        .unwrap();
    registry
        .register(Feature::Stateless(Arc::new(UnknownWordPenalty::new(
            "UnknownWordPenalty0",
            UnknownWordPenalty::DEFAULT_PENALTY,
        ))))
        .unwrap();
    registry
        .register(Feature::Stateful(Arc::new(Distortion::new(
            "Distortion0",
            config.early_distortion_cost,
        ))))
        .unwrap();
    registry
        .register(Feature::Stateful(Arc::new(LanguageModel::new("LM0", Arc::new(lm)))))
        .unwrap();

    let weights = Weights::new(vec![0.2, -1.0, 0.2, 1.0, 0.3, 0.5]);
    Arc::new(
        Model::new(registry, weights, config)
            .unwrap()
            .with_distortion_weight(0.3),
    )
}

/// Search settings wide enough that neither algorithm prunes anything
pub fn exhaustive(algorithm: verso_search::Algorithm) -> SearchConfig {
    SearchConfig {
        algorithm,
        stack_size: 10_000,
        beam_threshold: f32::NEG_INFINITY,
        pop_limit: 1_000_000,
        ..SearchConfig::default()
    }
}

/// Every source position is translated by exactly one phrase
pub fn assert_exact_cover(alignment: &[AlignedPhrase], len: usize) {
    let mut covered = vec![0u32; len];
    for phrase in alignment {
        for pos in phrase.source.positions() {
            covered[pos] += 1;
        }
    }
    assert!(covered.iter().all(|&c| c == 1), "coverage {:?}", covered);
}
