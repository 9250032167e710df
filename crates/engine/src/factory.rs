//! Builds the feature registry and model from a [`VersoConfig`]
//!
//! Features are constructed and registered in declaration order, so score
//! slots follow the `[[feature]]` tables. Phrase tables are sorted by their
//! weighted scores and cut to their table limit while loading.

use crate::config::{FeatureConfig, VersoConfig};
use std::sync::Arc;
use tracing::{info, warn};
use verso_core::{Error, Result};
use verso_features::{
    BackoffLm, Distortion, Feature, FeatureRegistry, LanguageModel, LanguageModelBackend, LexicalReordering,
    MemoryPhraseTable, PhrasePenalty, ReorderingConfig, UnknownWordPenalty, WordPenalty,
};
use verso_search::Model;

/// Load every feature named by `config` and assemble the model
pub fn build_model(config: &VersoConfig) -> Result<Model> {
    config.validate()?;

    let mut registry = FeatureRegistry::new();
    let mut distortion_weight = 0.0;
    for (feature, name) in config.features.iter().zip(config.feature_names()) {
        let built = build_feature(config, feature, &name)?;
        if feature.kind == "Distortion" {
            distortion_weight += config.weights.get(&name).and_then(|w| w.first()).copied().unwrap_or(0.0);
        }
        registry.register(built)?;
    }

    for name in config.weights.keys() {
        if registry.slot_of(name).is_none() {
            warn!(feature = %name, "Ignoring weights for undeclared feature");
        }
    }

    let weights = registry.weights(|name| config.weights.get(name).map(Vec::as_slice))?;
    info!(
        features = registry.infos().len(),
        scores = registry.num_scores(),
        "Built feature registry"
    );
    Ok(Model::new(registry, weights, config.search.clone())?.with_distortion_weight(distortion_weight))
}

fn build_feature(config: &VersoConfig, feature: &FeatureConfig, name: &str) -> Result<Feature> {
    let built = match feature.kind.as_str() {
        "PhraseDictionary" => {
            let num_scores = feature
                .num_scores
                .ok_or_else(|| Error::config(format!("phrase dictionary '{}' needs num_scores", name)))?;
            let path = config.resolve(feature.path_for(name)?);
            let mut table = MemoryPhraseTable::load(name, num_scores, &path)?;
            let weights = config.weights.get(name).map(Vec::as_slice).unwrap_or_default();
            if weights.len() != num_scores {
                return Err(Error::MalformedWeights {
                    feature: name.to_string(),
                    expected: num_scores,
                    actual: weights.len(),
                });
            }
            table.sort_and_prune(weights, feature.table_limit.unwrap_or(config.search.table_limit));
            Feature::Dictionary(Arc::new(table))
        }
        "WordPenalty" => Feature::Stateless(Arc::new(WordPenalty::new(name))),
        "PhrasePenalty" => Feature::Stateless(Arc::new(PhrasePenalty::new(name))),
        "UnknownWordPenalty" => Feature::Stateless(Arc::new(UnknownWordPenalty::new(
            name,
            feature.penalty.unwrap_or(UnknownWordPenalty::DEFAULT_PENALTY),
        ))),
        "Distortion" => Feature::Stateful(Arc::new(Distortion::new(name, config.search.early_distortion_cost))),
        "LexicalReordering" => {
            let model = feature
                .model
                .as_deref()
                .ok_or_else(|| Error::config(format!("lexical reordering '{}' needs a model", name)))?;
            Feature::Stateful(Arc::new(LexicalReordering::new(name, ReorderingConfig::parse(model)?)))
        }
        "LanguageModel" => {
            let path = config.resolve(feature.path_for(name)?);
            let lm = BackoffLm::load(&path)?;
            if let Some(order) = feature.order {
                if order != lm.order() {
                    return Err(Error::config(format!(
                        "language model '{}' declares order {} but {} has order {}",
                        name,
                        order,
                        path.display(),
                        lm.order()
                    )));
                }
            }
            Feature::Stateful(Arc::new(LanguageModel::new(name, Arc::new(lm))))
        }
        other => return Err(Error::UnknownFeature(other.to_string())),
    };
    Ok(built)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use verso_features::PhraseDictionary;

    const TABLE: &str = "\
das ||| the ||| 0.7
das ||| this ||| 0.2
das ||| that ||| 0.1
haus ||| house ||| 0.9
";

    fn setup(extra_features: &str, extra_weights: &str) -> (TempDir, VersoConfig) {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("pt.txt"), TABLE).unwrap();
        let text = format!(
            "[search]\ntable_limit = 2\n\n[[feature]]\ntype = \"PhraseDictionary\"\npath = \"pt.txt\"\nnum_scores = 1\n\n{}\n[weights]\nPhraseDictionary0 = [1.0]\n{}",
            extra_features, extra_weights
        );
        let path = dir.path().join("verso.toml");
        std::fs::write(&path, text).unwrap();
        let config = VersoConfig::from_file(&path).unwrap();
        (dir, config)
    }

    #[test]
    fn builds_slots_in_declaration_order() {
        let (_dir, config) = setup(
            "[[feature]]\ntype = \"WordPenalty\"\n\n[[feature]]\ntype = \"Distortion\"\n",
            "WordPenalty0 = [-1.0]\nDistortion0 = [0.3]\n",
        );
        let model = build_model(&config).unwrap();
        let names: Vec<&str> = model.registry().infos().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["PhraseDictionary0", "WordPenalty0", "Distortion0"]);
        assert_eq!(model.weights().as_slice(), &[1.0, -1.0, 0.3]);
        assert_eq!(model.distortion_weight(), 0.3);
    }

    #[test]
    fn phrase_table_is_pruned_to_limit() {
        let (_dir, config) = setup("", "");
        let model = build_model(&config).unwrap();
        let (_, table) = &model.registry().dictionaries()[0];
        let source = verso_core::Phrase::parse("das");
        let targets: Vec<String> = table.lookup(source.words()).iter().map(|c| c.target.to_string()).collect();
        assert_eq!(targets, vec!["the", "this"]);
    }

    #[test]
    fn wrong_weight_count_rejected() {
        let (_dir, config) = setup("[[feature]]\ntype = \"WordPenalty\"\n", "WordPenalty0 = [-1.0, 2.0]\n");
        let err = build_model(&config).unwrap_err();
        assert!(matches!(err, Error::MalformedWeights { expected: 1, actual: 2, .. }));
    }

    #[test]
    fn reordering_needs_model_string() {
        let (_dir, config) = setup("[[feature]]\ntype = \"LexicalReordering\"\n", "LexicalReordering0 = [0.1]\n");
        assert!(matches!(build_model(&config).unwrap_err(), Error::Config(_)));
    }

    #[test]
    fn missing_table_is_io_error() {
        let (dir, config) = setup("", "");
        std::fs::remove_file(dir.path().join("pt.txt")).unwrap();
        assert!(matches!(build_model(&config).unwrap_err(), Error::Io(_)));
    }

    #[test]
    fn language_model_order_checked() {
        let arpa = "\\data\\\nngram 1=3\n\n\\1-grams:\n-1.0\t<s>\n-1.0\t</s>\n-1.0\thouse\n\n\\end\\\n";
        let (dir, mut config) = setup("", "");
        std::fs::write(dir.path().join("lm.arpa"), arpa).unwrap();
        let mut lm = FeatureConfig::new("LanguageModel").with_path("lm.arpa");
        lm.order = Some(3);
        config.features.push(lm);
        config.weights.insert("LanguageModel0".into(), vec![0.5]);
        assert!(matches!(build_model(&config).unwrap_err(), Error::Config(_)));

        config.features[1].order = Some(1);
        let model = build_model(&config).unwrap();
        assert!(model.registry().infos()[1].stateful);
    }
}
