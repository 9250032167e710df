//! Read-only decoding model shared by every worker

use crate::config::SearchConfig;
use verso_core::{Error, Result, Weights};
use verso_features::FeatureRegistry;

/// Features, weights and search parameters.
///
/// Built once before decoding starts and shared by reference (usually
/// through an `Arc`) between all managers. Nothing in here changes while
/// sentences are being translated.
#[derive(Debug, Clone)]
pub struct Model {
    registry: FeatureRegistry,
    weights: Weights,
    config: SearchConfig,
    distortion_weight: f32,
}

impl Model {
    /// Assemble a model, checking that weights cover every score slot
    pub fn new(registry: FeatureRegistry, weights: Weights, config: SearchConfig) -> Result<Self> {
        config.validate()?;
        if weights.len() != registry.num_scores() {
            return Err(Error::config(format!(
                "{} weights supplied for {} feature scores",
                weights.len(),
                registry.num_scores()
            )));
        }
        if registry.dictionaries().is_empty() {
            return Err(Error::config("at least one phrase dictionary is required"));
        }
        Ok(Model {
            registry,
            weights,
            config,
            distortion_weight: 0.0,
        })
    }

    /// Weight applied to the raw distortion distance when cube pruning
    /// orders predecessor hypotheses
    pub fn with_distortion_weight(mut self, weight: f32) -> Self {
        self.distortion_weight = weight;
        self
    }

    /// Registered features
    #[inline]
    pub fn registry(&self) -> &FeatureRegistry {
        &self.registry
    }

    /// Global weight vector
    #[inline]
    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    /// Search parameters
    #[inline]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Total weight of the distortion features
    #[inline]
    pub fn distortion_weight(&self) -> f32 {
        self.distortion_weight
    }

    /// Length of every score vector
    #[inline]
    pub fn num_scores(&self) -> usize {
        self.registry.num_scores()
    }
}
