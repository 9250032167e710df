//! Feature functions for the verso decoder
//!
//! This crate provides the scoring side of decoding:
//! - FFState: opaque per-hypothesis state with hash/equality
//! - FeatureFunction / StatelessFeature / StatefulFeature traits
//! - FeatureRegistry: declaration-ordered slot assignment and weights
//! - PhraseDictionary + MemoryPhraseTable: translation candidates
//! - Concrete features: penalties, distortion, lexicalized reordering,
//!   n-gram language model

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dictionary;
pub mod distortion;
pub mod feature;
pub mod lm;
pub mod penalties;
pub mod registry;
pub mod reordering;
pub mod state;

pub use dictionary::{CandidatePhrase, MemoryPhraseTable, PhraseDictionary, LOWEST_SCORE};
pub use distortion::{Distortion, DistortionState};
pub use feature::{ApplyContext, FeatureFunction, PhraseContext, StatefulFeature, StatelessFeature};
pub use lm::{BackoffLm, LanguageModel, LanguageModelBackend, LmState};
pub use penalties::{PhrasePenalty, UnknownWordPenalty, WordPenalty};
pub use registry::{Feature, FeatureInfo, FeatureRegistry};
pub use reordering::{Direction, LexicalReordering, ModelType, ReorderingConfig, ReorderingState};
pub use state::{downcast, downcast_mut, hash_states, FFState};
