//! N-best lists through the full loading path

use crate::common::*;
use std::collections::HashSet;
use verso::format_nbest;

fn weighted_total(weights: &[(String, Vec<f32>)], derivation: &verso::Derivation) -> f32 {
    let mut total = 0.0;
    for feature in &derivation.features {
        let (_, w) = weights.iter().find(|(name, _)| *name == feature.name).unwrap();
        total += feature.scores.iter().zip(w).map(|(s, w)| s * w).sum::<f32>();
    }
    total
}

#[test]
fn test_nbest_sorted_and_led_by_best() {
    let (_dir, config) = Fixture::full("nbest_size = 10");
    let context = context(config);
    let t = context.translate("er geht ja nicht nach hause").unwrap();

    assert!(!t.nbest.is_empty());
    assert!(t.nbest.len() <= 10);
    assert_eq!(t.nbest[0].words, t.words);
    assert_close(t.nbest[0].score, t.score);
    for pair in t.nbest.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[test]
fn test_nbest_scores_match_feature_breakdown() {
    let (_dir, config) = Fixture::full("nbest_size = 20");
    let context = context(config);
    let weights = context.weights();
    for sentence in ["das haus ist klein", "er geht nach hause"] {
        let t = context.translate(sentence).unwrap();
        for derivation in &t.nbest {
            assert_close(weighted_total(&weights, derivation), derivation.score);
            assert_eq!(
                derivation.alignment.iter().map(|a| a.source.len()).sum::<usize>(),
                sentence.split_whitespace().count()
            );
        }
    }
}

#[test]
fn test_distinct_nbest_has_unique_strings() {
    let (_dir, config) = Fixture::full("nbest_size = 8\nnbest_distinct = true");
    let context = context(config);
    let t = context.translate("er geht ja nicht nach hause").unwrap();
    let mut seen = HashSet::new();
    for derivation in &t.nbest {
        assert!(seen.insert(derivation.text()), "duplicate '{}'", derivation.text());
    }
    assert!(t.nbest.len() > 1);
}

#[test]
fn test_nbest_file_format() {
    let (_dir, config) = Fixture::full("nbest_size = 3");
    let context = context(config);
    let mut t = context.translate("das haus").unwrap();
    t.index = 4;
    let text = format_nbest(&t);
    assert_eq!(text.lines().count(), t.nbest.len());
    for (line, derivation) in text.lines().zip(&t.nbest) {
        let fields: Vec<&str> = line.split(" ||| ").collect();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0], "4");
        assert_eq!(fields[1], derivation.text());
        assert!(fields[2].starts_with("PhraseDictionary0= "));
        assert!(fields[2].contains("LanguageModel0= "));
        let total: f32 = fields[3].parse().unwrap();
        assert_close(total, derivation.score);
    }
}

#[test]
fn test_no_nbest_unless_requested() {
    let (_dir, config) = Fixture::full("");
    let context = context(config);
    let t = context.translate("das haus").unwrap();
    assert!(t.nbest.is_empty());
    assert_eq!(format_nbest(&t), "");
}
