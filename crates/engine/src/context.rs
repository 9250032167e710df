//! Read-only decoder state shared by every worker

use crate::config::VersoConfig;
use crate::factory::build_model;
use std::path::Path;
use std::sync::Arc;
use verso_core::{Result, Sentence};
use verso_search::{Manager, Model, Translation};

/// Loaded features, weights and search settings.
///
/// Built once before any sentence is decoded and then only read, so one
/// `Arc<DecoderContext>` serves any number of threads.
#[derive(Debug)]
pub struct DecoderContext {
    config: VersoConfig,
    model: Arc<Model>,
}

impl DecoderContext {
    /// Load every feature named by `config`
    pub fn from_config(config: VersoConfig) -> Result<Self> {
        let model = Arc::new(build_model(&config)?);
        Ok(DecoderContext { config, model })
    }

    /// Read `path` and load everything it names
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_config(VersoConfig::from_file(path)?)
    }

    /// Wrap an already assembled model
    pub fn from_model(model: Model) -> Self {
        let config = VersoConfig {
            search: model.config().clone(),
            ..VersoConfig::default()
        };
        DecoderContext {
            config,
            model: Arc::new(model),
        }
    }

    /// Configuration the context was built from
    pub fn config(&self) -> &VersoConfig {
        &self.config
    }

    /// Shared model
    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    /// A fresh per-thread manager
    pub fn manager(&self) -> Manager {
        Manager::new(Arc::clone(&self.model))
    }

    /// Decode one line on a throwaway manager
    pub fn translate(&self, line: &str) -> Result<Translation> {
        self.manager().decode(0, &Sentence::parse(line))
    }

    /// Feature names with their weights, in slot order
    pub fn weights(&self) -> Vec<(String, Vec<f32>)> {
        let weights = self.model.weights();
        self.model
            .registry()
            .infos()
            .iter()
            .map(|info| (info.name.clone(), weights.slot(info.slot).to_vec()))
            .collect()
    }
}
