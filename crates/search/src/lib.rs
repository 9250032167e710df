//! Search for the verso decoder
//!
//! This crate provides:
//! - SearchConfig: beam, distortion and N-best parameters
//! - Model: feature registry + weights + search configuration
//! - TranslationOptions: per-span candidate phrases with future scores
//! - FutureCosts: best-case cost of any uncovered span
//! - Hypothesis / HypothesisArena: partial translations and their recycler
//! - HypothesisStack: recombination and beam pruning
//! - Normal stack decoding and cube pruning
//! - N-best extraction over recombination arcs
//! - Search-graph export of the connected lattice
//! - Manager: one sentence end-to-end
//!
//! # Usage
//!
//! ```ignore
//! use verso_search::{Manager, Model};
//!
//! let mut manager = Manager::new(Arc::new(model));
//! let translation = manager.decode(0, &Sentence::parse("das haus"))?;
//! println!("{}", translation.text());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod future_cost;
pub mod hypothesis;
pub mod manager;
pub mod model;
pub mod nbest;
pub mod options;
mod search;
pub mod search_graph;
pub mod stack;
pub mod stats;
pub mod translation;

pub use config::{Algorithm, SearchConfig, DEFAULT_BEAM_THRESHOLD};
pub use future_cost::FutureCosts;
pub use hypothesis::{Hypothesis, HypothesisArena, HypothesisId};
pub use manager::Manager;
pub use model::Model;
pub use nbest::{NBestRequest, TrellisPath};
pub use options::{TranslationOption, TranslationOptions};
pub use search::SearchOutcome;
pub use search_graph::SearchGraphNode;
pub use stack::{AddOutcome, HypothesisStack};
pub use stats::SentenceStats;
pub use translation::{AlignedPhrase, Derivation, FeatureScores, Translation};
