//! Multi-threaded batches: one output line per input line, in input order

use crate::common::*;
use std::io;
use verso::{DecodePool, OutputCollector, OutputFormat, SideOutputs};

fn input(repeat: usize) -> Vec<String> {
    (0..repeat)
        .flat_map(|_| SENTENCES.iter().map(|s| s.to_string()))
        .collect()
}

fn run(threads: usize, format: OutputFormat, lines: &[String]) -> String {
    let (_dir, config) = Fixture::full("nbest_size = 2");
    let pool = DecodePool::new(context(config)).with_threads(threads);
    let output = OutputCollector::new(Vec::new());
    let stats = pool
        .run(
            lines.iter().cloned().map(io::Result::Ok),
            format,
            &output,
            SideOutputs::<Vec<u8>>::default(),
        )
        .unwrap();
    assert_eq!(stats.sentences, lines.len());
    assert_eq!(stats.failed, 0);
    String::from_utf8(output.into_inner()).unwrap()
}

#[test]
fn test_parallel_output_matches_sequential() {
    let lines = input(5);
    let sequential = run(1, OutputFormat::Scores, &lines);
    let parallel = run(4, OutputFormat::Scores, &lines);
    assert_eq!(sequential.lines().count(), lines.len());
    assert_eq!(parallel, sequential);
}

#[test]
fn test_parallel_output_matches_single_translations() {
    let lines = input(2);
    let (_dir, config) = Fixture::full("");
    let context = context(config);
    let expected: Vec<String> = lines.iter().map(|l| context.translate(l).unwrap().text()).collect();

    let text = run(3, OutputFormat::Plain, &lines);
    let actual: Vec<&str> = text.lines().collect();
    assert_eq!(actual, expected);
}

#[test]
fn test_json_lines_carry_their_index() {
    let lines = input(3);
    let text = run(4, OutputFormat::Json, &lines);
    for (i, line) in text.lines().enumerate() {
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(value["index"], i);
        if let Some(nbest) = value["nbest"].as_array() {
            assert!(nbest.len() <= 2);
        }
    }
}

#[test]
fn test_decode_all_in_input_order() {
    let (_dir, config) = Fixture::full("threads = 4");
    let pool = DecodePool::new(context(config));
    assert_eq!(pool.threads(), 4);
    let translations = pool.decode_all(SENTENCES).unwrap();
    assert_eq!(translations.len(), SENTENCES.len());
    for (i, t) in translations.iter().enumerate() {
        assert_eq!(t.index, i);
    }
    assert_eq!(translations[3].text(), "the house");
    assert_eq!(translations[5].text(), "");
}
