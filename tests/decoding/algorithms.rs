//! Normal search against cube pruning

use crate::common::*;

const EXHAUSTIVE: &str = "stack_size = 10000\nbeam_threshold = -inf\npop_limit = 1000000";

#[test]
fn test_cube_pruning_matches_normal_when_unbounded() {
    let (_normal_dir, normal) = Fixture::full(&format!("algorithm = \"normal\"\n{}", EXHAUSTIVE));
    let (_cube_dir, cube) = Fixture::full(&format!("algorithm = \"cube-pruning\"\n{}", EXHAUSTIVE));
    let normal = context(normal);
    let cube = context(cube);

    for sentence in SENTENCES {
        let a = normal.translate(sentence).unwrap();
        let b = cube.translate(sentence).unwrap();
        assert_close(b.score, a.score);
        assert_eq!(a.complete, b.complete, "sentence '{}'", sentence);
    }
}

#[test]
fn test_small_pop_limit_never_beats_exhaustive() {
    let (_full_dir, full) = Fixture::full(&format!("algorithm = \"cube-pruning\"\n{}", EXHAUSTIVE));
    let (_tight_dir, tight) = Fixture::full("algorithm = \"cube-pruning\"\npop_limit = 2\nstack_size = 2");
    let full = context(full);
    let tight = context(tight);

    for sentence in SENTENCES {
        let best = full.translate(sentence).unwrap();
        let pruned = tight.translate(sentence).unwrap();
        assert!(
            pruned.score <= best.score + 1e-4,
            "'{}': pruned {} beats exhaustive {}",
            sentence,
            pruned.score,
            best.score
        );
    }
}

#[test]
fn test_both_algorithms_cover_every_word() {
    for algorithm in ["normal", "cube-pruning"] {
        let (_dir, config) = Fixture::full(&format!("algorithm = \"{}\"", algorithm));
        let context = context(config);
        for sentence in SENTENCES {
            let t = context.translate(sentence).unwrap();
            let len = sentence.split_whitespace().count();
            let mut covered = vec![false; len];
            for phrase in &t.alignment {
                for i in phrase.source.start()..=phrase.source.end() {
                    assert!(!covered[i], "{}: word {} covered twice", algorithm, i);
                    covered[i] = true;
                }
            }
            assert!(covered.iter().all(|&c| c), "{}: '{}' not fully covered", algorithm, sentence);
        }
    }
}

#[test]
fn test_repeated_decoding_is_identical() {
    let (_dir, config) = Fixture::full("algorithm = \"cube-pruning\"");
    let context = context(config);
    let mut manager = context.manager();
    for (i, sentence) in SENTENCES.iter().enumerate() {
        let reused = manager.decode(i, &verso::Sentence::parse(sentence)).unwrap();
        let fresh = context.translate(sentence).unwrap();
        assert_eq!(reused.words, fresh.words);
        assert_eq!(reused.score.to_bits(), fresh.score.to_bits());
    }
}
