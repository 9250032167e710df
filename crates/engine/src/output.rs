//! Rendering translations as output lines

use std::fmt::Write as _;
use verso_core::{Error, Result};
use verso_search::{Derivation, FeatureScores, SearchGraphNode, Translation};

/// How each translation is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Target words only
    #[default]
    Plain,
    /// Total score, then the target words
    Scores,
    /// One JSON object per sentence
    Json,
}

/// One output line, without the trailing newline
pub fn format_translation(translation: &Translation, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Plain => Ok(translation.text()),
        OutputFormat::Scores => Ok(format!("{} {}", format_score(translation.score), translation.text())),
        OutputFormat::Json => serde_json::to_string(translation).map_err(|e| Error::Serialization(e.to_string())),
    }
}

/// N-best lines for one sentence, each newline-terminated:
///
/// ```text
/// 0 ||| the house ||| TranslationModel0= -0.1 WordPenalty0= -2 ||| 1.9
/// ```
pub fn format_nbest(translation: &Translation) -> String {
    let mut out = String::new();
    for entry in &translation.nbest {
        push_nbest_line(&mut out, translation.index, entry);
    }
    out
}

fn push_nbest_line(out: &mut String, index: usize, entry: &Derivation) {
    let _ = write!(out, "{} ||| {} |||", index, entry.text());
    push_feature_scores(out, &entry.features);
    let _ = writeln!(out, " ||| {}", format_score(entry.score));
}

fn push_feature_scores(out: &mut String, features: &[FeatureScores]) {
    for feature in features {
        let _ = write!(out, " {}=", feature.name);
        for score in &feature.scores {
            let _ = write!(out, " {}", format_score(*score));
        }
    }
}

/// Search-graph lines for one sentence, each newline-terminated:
///
/// ```text
/// 0 hyp=0 stack=0
/// 0 hyp=1 stack=1 back=0 score=-1.2 transition=-1.2 forward=5 fscore=-2.5 covered=0-0 out=the
/// 0 hyp=3 stack=1 back=0 score=-2 transition=-2 recombined=1 forward=5 fscore=-2.5 covered=0-0 out=this
/// ```
///
/// `forward=-1` marks hypotheses of the final stack.
pub fn format_search_graph(translation: &Translation) -> String {
    let mut out = String::new();
    for node in &translation.search_graph {
        push_search_node(&mut out, translation.index, node);
    }
    out
}

fn push_search_node(out: &mut String, index: usize, node: &SearchGraphNode) {
    let (Some(back), Some(covered)) = (node.back, node.covered) else {
        let _ = writeln!(out, "{} hyp={} stack=0", index, node.id);
        return;
    };
    let _ = write!(
        out,
        "{} hyp={} stack={} back={} score={} transition={}",
        index,
        node.id,
        node.stack,
        back,
        format_score(node.score),
        format_score(node.transition)
    );
    if let Some(winner) = node.recombined {
        let _ = write!(out, " recombined={}", winner);
    }
    match node.forward {
        Some(forward) => {
            let _ = write!(out, " forward={}", forward);
        }
        None => out.push_str(" forward=-1"),
    }
    let _ = writeln!(
        out,
        " fscore={} covered={}-{} out={}",
        format_score(node.fscore),
        covered.start(),
        covered.end(),
        node.out.join(" ")
    );
}

/// Scores print like Moses: finite values in shortest form, `-inf` for
/// impossible derivations
fn format_score(score: f32) -> String {
    if score == f32::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{}", score)
    }
}

/// `name= w1 w2 ...` lines for `--show-weights`
pub fn format_weights(weights: &[(String, Vec<f32>)]) -> String {
    let mut out = String::new();
    for (name, values) in weights {
        let _ = write!(out, "{}=", name);
        for value in values {
            let _ = write!(out, " {}", value);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use verso_core::Range;
    use verso_search::AlignedPhrase;

    fn translation() -> Translation {
        let features = vec![
            FeatureScores {
                name: "TranslationModel0".into(),
                scores: vec![-0.5, -1.25],
            },
            FeatureScores {
                name: "WordPenalty0".into(),
                scores: vec![-2.0],
            },
        ];
        let best = Derivation {
            words: vec!["the".into(), "house".into()],
            score: 1.5,
            features: features.clone(),
            alignment: vec![AlignedPhrase {
                source: Range::new(0, 1),
                target: vec!["the".into(), "house".into()],
            }],
        };
        let mut t = Translation::empty(7);
        t.words = best.words.clone();
        t.score = best.score;
        t.complete = true;
        t.features = features;
        t.alignment = best.alignment.clone();
        t.nbest = vec![
            best,
            Derivation {
                words: vec!["house".into(), "the".into()],
                score: -0.25,
                features: vec![],
                alignment: vec![],
            },
        ];
        t
    }

    #[test]
    fn plain_and_scores() {
        let t = translation();
        assert_eq!(format_translation(&t, OutputFormat::Plain).unwrap(), "the house");
        assert_eq!(format_translation(&t, OutputFormat::Scores).unwrap(), "1.5 the house");
    }

    #[test]
    fn empty_translation_prints_empty_line() {
        let t = Translation::empty(0);
        assert_eq!(format_translation(&t, OutputFormat::Plain).unwrap(), "");
        assert_eq!(format_translation(&t, OutputFormat::Scores).unwrap(), "-inf ");
    }

    #[test]
    fn json_is_one_line() {
        let line = format_translation(&translation(), OutputFormat::Json).unwrap();
        assert!(!line.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["index"], 7);
        assert_eq!(value["alignment"][0]["source"]["start"], 0);
        assert_eq!(value["nbest"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn nbest_in_moses_format() {
        let text = format_nbest(&translation());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "7 ||| the house ||| TranslationModel0= -0.5 -1.25 WordPenalty0= -2 ||| 1.5"
        );
        assert_eq!(lines[1], "7 ||| house the ||| ||| -0.25");
    }

    fn graph_node(id: usize, back: usize, recombined: Option<usize>, forward: Option<usize>) -> SearchGraphNode {
        SearchGraphNode {
            id,
            stack: 1,
            back: Some(back),
            score: -1.5,
            transition: -1.5,
            recombined,
            forward,
            fscore: -0.25,
            covered: Some(Range::single(0)),
            out: vec!["the".into(), "house".into()],
        }
    }

    #[test]
    fn search_graph_in_moses_format() {
        let mut t = Translation::empty(3);
        t.search_graph = vec![
            SearchGraphNode {
                id: 0,
                stack: 0,
                back: None,
                score: 0.0,
                transition: 0.0,
                recombined: None,
                forward: Some(4),
                fscore: -1.75,
                covered: None,
                out: vec![],
            },
            graph_node(4, 0, None, None),
            graph_node(9, 0, Some(4), Some(12)),
        ];
        let text = format_search_graph(&t);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "3 hyp=0 stack=0");
        assert_eq!(
            lines[1],
            "3 hyp=4 stack=1 back=0 score=-1.5 transition=-1.5 forward=-1 fscore=-0.25 covered=0-0 out=the house"
        );
        assert_eq!(
            lines[2],
            "3 hyp=9 stack=1 back=0 score=-1.5 transition=-1.5 recombined=4 forward=12 fscore=-0.25 covered=0-0 out=the house"
        );
        assert!(format_search_graph(&Translation::empty(0)).is_empty());
    }

    #[test]
    fn weights_listing() {
        let text = format_weights(&[("Distortion0".into(), vec![0.3]), ("TM".into(), vec![0.2, 0.5])]);
        assert_eq!(text, "Distortion0= 0.3\nTM= 0.2 0.5\n");
    }
}
