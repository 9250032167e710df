//! Feature registry and score-slot assignment
//!
//! Features are registered in declaration order. Each one receives the
//! contiguous slot starting where the previous one ended, so offsets are
//! stable for a given configuration. Once every feature is registered the
//! registry turns per-feature weight lists into the global [`Weights`].

use crate::dictionary::PhraseDictionary;
use crate::feature::{FeatureFunction, StatefulFeature, StatelessFeature};
use std::sync::Arc;
use tracing::debug;
use verso_core::{Error, FeatureSlot, Result, Weights};

/// A feature of any kind, ready to be registered
#[derive(Clone)]
pub enum Feature {
    /// Translation-model scores supplied by a phrase dictionary
    Dictionary(Arc<dyn PhraseDictionary>),
    /// Scores a phrase pair on its own
    Stateless(Arc<dyn StatelessFeature>),
    /// Scores a phrase pair given history
    Stateful(Arc<dyn StatefulFeature>),
}

impl Feature {
    /// Feature name
    pub fn name(&self) -> &str {
        match self {
            Feature::Dictionary(f) => f.name(),
            Feature::Stateless(f) => f.name(),
            Feature::Stateful(f) => f.name(),
        }
    }

    /// Declared score count
    pub fn num_scores(&self) -> usize {
        match self {
            Feature::Dictionary(f) => f.num_scores(),
            Feature::Stateless(f) => f.num_scores(),
            Feature::Stateful(f) => f.num_scores(),
        }
    }
}

/// Registered feature with its assigned slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureInfo {
    /// Feature name
    pub name: String,
    /// Slot in the global score vector
    pub slot: FeatureSlot,
    /// True for stateful features
    pub stateful: bool,
}

/// Every feature of a decoder, in declaration order
#[derive(Clone, Default)]
pub struct FeatureRegistry {
    infos: Vec<FeatureInfo>,
    dictionaries: Vec<(FeatureSlot, Arc<dyn PhraseDictionary>)>,
    stateless: Vec<(FeatureSlot, Arc<dyn StatelessFeature>)>,
    stateful: Vec<(FeatureSlot, Arc<dyn StatefulFeature>)>,
    num_scores: usize,
}

impl FeatureRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a feature, assigning the next free slot
    pub fn register(&mut self, feature: Feature) -> Result<FeatureSlot> {
        let name = feature.name().to_string();
        if self.infos.iter().any(|info| info.name == name) {
            return Err(Error::config(format!("duplicate feature name '{}'", name)));
        }
        let slot = FeatureSlot::new(self.num_scores, feature.num_scores());
        self.num_scores += slot.len();
        debug!(feature = %name, offset = slot.offset(), len = slot.len(), "Registered feature");

        let stateful = matches!(feature, Feature::Stateful(_));
        match feature {
            Feature::Dictionary(f) => self.dictionaries.push((slot, f)),
            Feature::Stateless(f) => self.stateless.push((slot, f)),
            Feature::Stateful(f) => self.stateful.push((slot, f)),
        }
        self.infos.push(FeatureInfo { name, slot, stateful });
        Ok(slot)
    }

    /// Total score slots across all features
    pub fn num_scores(&self) -> usize {
        self.num_scores
    }

    /// All features in declaration order
    pub fn infos(&self) -> &[FeatureInfo] {
        &self.infos
    }

    /// Slot of a feature by name
    pub fn slot_of(&self, name: &str) -> Option<FeatureSlot> {
        self.infos.iter().find(|info| info.name == name).map(|info| info.slot)
    }

    /// Phrase dictionaries with their slots
    pub fn dictionaries(&self) -> &[(FeatureSlot, Arc<dyn PhraseDictionary>)] {
        &self.dictionaries
    }

    /// Stateless features with their slots
    pub fn stateless(&self) -> &[(FeatureSlot, Arc<dyn StatelessFeature>)] {
        &self.stateless
    }

    /// Stateful features with their slots, in evaluation order
    pub fn stateful(&self) -> &[(FeatureSlot, Arc<dyn StatefulFeature>)] {
        &self.stateful
    }

    /// Assemble the global weight vector.
    ///
    /// `lookup` returns the weights configured for a feature name. Every
    /// feature must have exactly as many weights as it declares scores.
    pub fn weights<'a, F>(&self, lookup: F) -> Result<Weights>
    where
        F: Fn(&str) -> Option<&'a [f32]>,
    {
        let mut values = Vec::with_capacity(self.num_scores);
        for info in &self.infos {
            let supplied = lookup(&info.name).ok_or_else(|| {
                Error::MissingSection(format!("weights.{}", info.name))
            })?;
            if supplied.len() != info.slot.len() {
                return Err(Error::MalformedWeights {
                    feature: info.name.clone(),
                    expected: info.slot.len(),
                    actual: supplied.len(),
                });
            }
            values.extend_from_slice(supplied);
        }
        Ok(Weights::new(values))
    }
}

impl std::fmt::Debug for FeatureRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureRegistry")
            .field("features", &self.infos)
            .field("num_scores", &self.num_scores)
            .finish()
    }
}
