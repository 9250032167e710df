//! Fixtures written to disk for the decoding tests

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use verso::{DecoderContext, VersoConfig};

/// Two-word toy table for the basic scenarios. Probabilities become natural
/// log scores, so 1 scores 0 and e scores 1.
pub const TOY_TABLE: &str = "\
a ||| X ||| 1
b ||| Y ||| 1
";

pub const TOY_PHRASE: &str = "a b ||| Z ||| 2.7182817\n";

/// German-English table with two scores per pair
pub const TABLE: &str = "\
er ||| he ||| 0.8 0.7
er ||| it ||| 0.2 0.3
geht ||| goes ||| 0.6 0.5
geht ||| walks ||| 0.3 0.4
ja ||| yes ||| 0.4 0.5
ja ||| indeed ||| 0.3 0.3
nicht ||| not ||| 0.7 0.6
nicht ||| does not ||| 0.2 0.3
nach ||| to ||| 0.5 0.4
nach ||| after ||| 0.3 0.3
hause ||| house ||| 0.4 0.4
hause ||| home ||| 0.5 0.6
nach hause ||| home ||| 0.8 0.7
geht ja nicht ||| does not go ||| 0.6 0.5
er geht ||| he goes ||| 0.7 0.6
das ||| the ||| 0.7 0.6
das ||| this ||| 0.2 0.3
haus ||| house ||| 0.9 0.8
das haus ||| the house ||| 0.8 0.8
ist ||| is ||| 0.9 0.9
klein ||| small ||| 0.6 0.5
klein ||| little ||| 0.4 0.4
";

/// Bigram model over the table's target side
pub const ARPA: &str = "\
\\data\\
ngram 1=16
ngram 2=12

\\1-grams:
-99\t<s>\t-0.5
-1.0\t</s>
-3.0\t<unk>
-1.5\the\t-0.3
-1.6\tit\t-0.3
-2.0\tgoes\t-0.3
-2.5\twalks\t-0.3
-2.0\tgo\t-0.3
-2.0\tdoes\t-0.3
-1.8\tnot\t-0.3
-2.0\thome\t-0.3
-2.1\thouse\t-0.3
-1.2\tthe\t-0.3
-1.9\tthis\t-0.3
-1.4\tis\t-0.3
-2.0\tsmall\t-0.3

\\2-grams:
-0.3\t<s> he
-0.4\the goes
-0.6\the does
-0.2\tdoes not
-0.5\tnot go
-0.4\tgo home
-0.5\tgoes home
-0.3\tthe house
-0.4\t<s> the
-0.2\thome </s>
-0.3\thouse </s>
-0.2\thouse is

\\end\\
";

/// Full model: table, penalties, distortion and the bigram LM
pub const CONFIG: &str = r#"
[search]

[[feature]]
type = "PhraseDictionary"
path = "phrase-table.txt"
num_scores = 2

[[feature]]
type = "WordPenalty"

[[feature]]
type = "PhrasePenalty"

[[feature]]
type = "UnknownWordPenalty"

[[feature]]
type = "Distortion"

[[feature]]
type = "LanguageModel"
path = "lm.arpa"
order = 2

[weights]
PhraseDictionary0 = [0.2, 0.2]
WordPenalty0 = [-0.5]
PhrasePenalty0 = [0.2]
UnknownWordPenalty0 = [1.0]
Distortion0 = [0.3]
LanguageModel0 = [0.5]
"#;

pub const SENTENCES: &[&str] = &[
    "er geht ja nicht nach hause",
    "das haus ist klein",
    "er geht nach hause",
    "das haus",
    "nicht",
    "",
    "er ist klein",
    "hause nach geht er",
    "das unbekannt haus",
    "klein ist das haus",
];

/// Temporary directory holding the model files
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Fixture {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// The German-English model with the given `[search]` overrides
    /// appended as `key = value` lines
    pub fn full(search: &str) -> (Self, VersoConfig) {
        let fixture = Fixture::new();
        fixture.write("phrase-table.txt", TABLE);
        fixture.write("lm.arpa", ARPA);
        let text = CONFIG.replacen("[search]\n", &format!("[search]\n{}\n", search), 1);
        let config = fixture.config(&text);
        (fixture, config)
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).expect("Failed to write fixture file");
        path
    }

    pub fn config(&self, text: &str) -> VersoConfig {
        let path = self.write("verso.toml", text);
        VersoConfig::from_file(&path).expect("Failed to load fixture config")
    }
}

pub fn context(config: VersoConfig) -> Arc<DecoderContext> {
    Arc::new(DecoderContext::from_config(config).expect("Failed to build decoder"))
}

pub fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-4,
        "expected {} but got {}",
        expected,
        actual
    );
}
