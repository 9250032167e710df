//! Small hand-checked scenarios with exact expected scores

use crate::common::*;
use verso::{Error, Range};

const TOY_CONFIG: &str = r#"
[search]
distortion_limit = 0

[[feature]]
type = "PhraseDictionary"
path = "toy.txt"
num_scores = 1

[[feature]]
type = "WordPenalty"

[[feature]]
type = "UnknownWordPenalty"
penalty = -10.0

[[feature]]
type = "Distortion"

[weights]
PhraseDictionary0 = [1.0]
WordPenalty0 = [0.5]
UnknownWordPenalty0 = [1.0]
Distortion0 = [0.3]
"#;

fn toy(table: &str) -> (Fixture, std::sync::Arc<verso::DecoderContext>) {
    let fixture = Fixture::new();
    fixture.write("toy.txt", table);
    let config = fixture.config(TOY_CONFIG);
    (fixture, context(config))
}

#[test]
fn test_word_by_word_monotone() {
    let (_fixture, context) = toy(TOY_TABLE);
    let t = context.translate("a b").unwrap();
    assert!(t.complete);
    assert_eq!(t.text(), "X Y");
    // Two target words at -1 each, weighted 0.5
    assert_close(t.score, -1.0);
    assert_eq!(t.alignment.len(), 2);
    assert_eq!(t.alignment[0].source, Range::new(0, 0));
    assert_eq!(t.alignment[1].source, Range::new(1, 1));
}

#[test]
fn test_longer_phrase_preferred_when_better() {
    let (_fixture, context) = toy(&format!("{}{}", TOY_TABLE, TOY_PHRASE));
    let t = context.translate("a b").unwrap();
    assert_eq!(t.text(), "Z");
    assert_close(t.score, 0.5);
    assert_eq!(t.alignment.len(), 1);
    assert_eq!(t.alignment[0].source, Range::new(0, 1));
}

#[test]
fn test_unknown_word_passes_through_with_penalty() {
    let (_fixture, context) = toy(TOY_TABLE);
    let t = context.translate("a qqq").unwrap();
    assert!(t.complete);
    assert_eq!(t.text(), "X qqq");
    assert_close(t.score, -11.0);

    let unknown = t.features.iter().find(|f| f.name == "UnknownWordPenalty0").unwrap();
    assert_eq!(unknown.scores, vec![-10.0]);
}

#[test]
fn test_feature_breakdown_reproduces_total() {
    let (_fixture, context) = toy(&format!("{}{}", TOY_TABLE, TOY_PHRASE));
    let t = context.translate("b a qqq a b").unwrap();
    let weights = context.weights();
    let mut total = 0.0;
    for feature in &t.features {
        let (_, w) = weights.iter().find(|(name, _)| *name == feature.name).unwrap();
        total += feature.scores.iter().zip(w).map(|(s, w)| s * w).sum::<f32>();
    }
    assert_close(total, t.score);
}

#[test]
fn test_empty_sentence() {
    let (_fixture, context) = toy(TOY_TABLE);
    let t = context.translate("   ").unwrap();
    assert!(t.complete);
    assert!(t.words.is_empty());
    assert_close(t.score, 0.0);
}

#[test]
fn test_reordering_with_language_model() {
    let (_fixture, config) = Fixture::full("");
    let context = context(config);
    let t = context.translate("das haus").unwrap();
    assert_eq!(t.text(), "the house");

    let t = context.translate("er geht ja nicht nach hause").unwrap();
    assert!(t.complete);
    let covered: usize = t.alignment.iter().map(|a| a.source.len()).sum();
    assert_eq!(covered, 6);
}

#[test]
fn test_monotone_limit_keeps_source_order() {
    let (_fixture, config) = Fixture::full("distortion_limit = 0");
    let context = context(config);
    for sentence in SENTENCES {
        let t = context.translate(sentence).unwrap();
        let starts: Vec<usize> = t.alignment.iter().map(|a| a.source.start()).collect();
        let mut sorted = starts.clone();
        sorted.sort_unstable();
        assert_eq!(starts, sorted, "sentence '{}'", sentence);
    }
}

#[test]
fn test_config_without_phrase_table_is_fatal() {
    let fixture = Fixture::new();
    let text = "[[feature]]\ntype = \"WordPenalty\"\n\n[weights]\nWordPenalty0 = [-1.0]\n";
    let path = fixture.write("verso.toml", text);
    let err = verso::VersoConfig::from_file(&path).unwrap_err();
    assert!(matches!(err, Error::MissingSection(_)));
}
