//! Decoder configuration via `verso.toml`
//!
//! One file describes the whole decoder: search parameters, the feature
//! functions in score-slot order, and one weight list per feature. Paths
//! inside `[[feature]]` tables are resolved against the directory of the
//! configuration file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;
use verso_core::{Error, Result};
use verso_search::SearchConfig;

/// Conventional configuration file name
pub const CONFIG_FILE_NAME: &str = "verso.toml";

/// Feature types the factory knows how to build
pub const FEATURE_TYPES: &[&str] = &[
    "PhraseDictionary",
    "WordPenalty",
    "PhrasePenalty",
    "UnknownWordPenalty",
    "Distortion",
    "LexicalReordering",
    "LanguageModel",
];

/// One `[[feature]]` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FeatureConfig {
    /// Feature type, one of [`FEATURE_TYPES`]
    #[serde(rename = "type")]
    pub kind: String,
    /// Unique name; defaults to the type followed by its ordinal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Phrase table or ARPA file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Scores per phrase pair (phrase dictionaries)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_scores: Option<usize>,
    /// Candidates kept per source phrase when loading; falls back to
    /// `search.table_limit`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_limit: Option<usize>,
    /// Lexicalized reordering model string, e.g. `msd-bidirectional-fe`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Expected language model order, checked against the file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<usize>,
    /// Raw unknown-word penalty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub penalty: Option<f32>,
}

impl FeatureConfig {
    /// Table of the given type with every parameter unset
    pub fn new(kind: impl Into<String>) -> Self {
        FeatureConfig {
            kind: kind.into(),
            name: None,
            path: None,
            num_scores: None,
            table_limit: None,
            model: None,
            order: None,
            penalty: None,
        }
    }

    /// Builder: explicit name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builder: file path
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Builder: phrase-table score count
    pub fn with_num_scores(mut self, num_scores: usize) -> Self {
        self.num_scores = Some(num_scores);
        self
    }

    /// Builder: reordering model string
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Path parameter, mandatory for file-backed features
    pub fn path_for(&self, name: &str) -> Result<&Path> {
        self.path
            .as_deref()
            .ok_or_else(|| Error::config(format!("feature '{}' needs a path", name)))
    }
}

/// Decoder configuration loaded from `verso.toml`.
///
/// # Example
///
/// ```toml
/// [search]
/// stack_size = 100
/// distortion_limit = 6
///
/// [[feature]]
/// type = "PhraseDictionary"
/// path = "phrase-table.txt"
/// num_scores = 4
///
/// [[feature]]
/// type = "WordPenalty"
///
/// [weights]
/// PhraseDictionary0 = [0.2, 0.2, 0.2, 0.2]
/// WordPenalty0 = [-1.0]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct VersoConfig {
    /// Search parameters
    #[serde(default)]
    pub search: SearchConfig,
    /// Feature functions in declaration (and score-slot) order
    #[serde(default, rename = "feature")]
    pub features: Vec<FeatureConfig>,
    /// Weights by feature name
    #[serde(default)]
    pub weights: BTreeMap<String, Vec<f32>>,
    /// Directory relative feature paths are resolved against
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl VersoConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# verso decoder configuration

[search]
# "normal" (exhaustive stack expansion) or "cube-pruning"
algorithm = "normal"
# Hypotheses kept per stack
stack_size = 100
# Log-space beam relative to the best hypothesis of a stack (ln 1e-5)
beam_threshold = -11.512925
# Longest source phrase looked up
max_phrase_length = 20
# Maximum reordering jump; negative means unlimited
distortion_limit = 6
# Cube pruning: hypotheses popped per stack
pop_limit = 1000
# Cube pruning: hypotheses forced from each coverage
cube_diversity = 0
# Translation options kept per source span
table_limit = 20
# Copy unknown words (false) or delete them (true)
drop_unknown = false
# Moore & Quirk distortion cost
early_distortion_cost = false
# Distinct translations to report per sentence (0 = off)
nbest_size = 0
nbest_distinct = false
nbest_factor = 20
# Attach every connected hypothesis and recombination arc to the output
search_graph = false
# Worker threads
threads = 1
# time_limit_ms = 5000

[[feature]]
type = "PhraseDictionary"
path = "phrase-table.txt"
num_scores = 4

[[feature]]
type = "WordPenalty"

[[feature]]
type = "PhrasePenalty"

[[feature]]
type = "UnknownWordPenalty"

[[feature]]
type = "Distortion"

# [[feature]]
# type = "LexicalReordering"
# model = "msd-bidirectional-fe"

# [[feature]]
# type = "LanguageModel"
# path = "lm.arpa"

[weights]
PhraseDictionary0 = [0.2, 0.2, 0.2, 0.2]
WordPenalty0 = [-1.0]
PhrasePenalty0 = [0.2]
UnknownWordPenalty0 = [1.0]
Distortion0 = [0.3]
"#
    }

    /// Parse a configuration from TOML text; relative paths stay relative to
    /// the working directory.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: VersoConfig =
            toml::from_str(content).map_err(|e| Error::config(format!("failed to parse configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// configuration is inconsistent.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("failed to read config file '{}': {}", path.display(), e))
        })?;
        let mut config: VersoConfig = toml::from_str(&content).map_err(|e| {
            Error::config(format!("failed to parse config file '{}': {}", path.display(), e))
        })?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        config.validate()?;
        info!(
            path = %path.display(),
            features = config.features.len(),
            algorithm = ?config.search.algorithm,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::config(format!("failed to serialize configuration: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Checks that need no file access.
    ///
    /// Weight counts are verified later, once every feature's score count
    /// is known.
    pub fn validate(&self) -> Result<()> {
        self.search.validate()?;

        let mut seen = Vec::with_capacity(self.features.len());
        for name in self.feature_names() {
            if seen.contains(&name) {
                return Err(Error::config(format!("duplicate feature name '{}'", name)));
            }
            seen.push(name);
        }
        for feature in &self.features {
            if !FEATURE_TYPES.contains(&feature.kind.as_str()) {
                return Err(Error::UnknownFeature(feature.kind.clone()));
            }
        }
        if !self.features.iter().any(|f| f.kind == "PhraseDictionary") {
            return Err(Error::MissingSection("feature of type PhraseDictionary".to_string()));
        }
        for name in &seen {
            if !self.weights.contains_key(name) {
                return Err(Error::MissingSection(format!("weights.{}", name)));
            }
        }
        Ok(())
    }

    /// Effective feature names in declaration order
    pub fn feature_names(&self) -> Vec<String> {
        let mut ordinals: BTreeMap<&str, usize> = BTreeMap::new();
        self.features
            .iter()
            .map(|feature| {
                let ordinal = ordinals.entry(feature.kind.as_str()).or_insert(0);
                let name = feature
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("{}{}", feature.kind, ordinal));
                *ordinal += 1;
                name
            })
            .collect()
    }

    /// `path` joined onto the configuration directory when relative
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}
