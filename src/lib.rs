//! Verso - phrase-based statistical machine translation decoder
//!
//! Verso searches for the best-scoring sequence of target phrases covering a
//! source sentence, using stack decoding (optionally with cube pruning) over
//! a log-linear model of pluggable feature functions.
//!
//! # Quick Start
//!
//! ```ignore
//! use verso::{DecoderContext, VersoConfig};
//!
//! let config = VersoConfig::from_file("verso.toml".as_ref())?;
//! let context = DecoderContext::from_config(config)?;
//! let translation = context.translate("das haus ist klein")?;
//! println!("{}", translation.text());
//! ```
//!
//! # Architecture
//!
//! - [`verso_core`]: coverage bitmaps, ranges, phrases, score vectors, errors
//! - [`verso_features`]: feature functions, phrase tables, language models
//! - [`verso_search`]: hypotheses, stacks, normal and cube-pruning search, n-best
//! - [`verso_engine`]: configuration, model loading, multi-threaded batches
//!
//! The common types are re-exported here; the layer crates are re-exported
//! whole for everything else.

pub use verso_core::{Bitmap, Error, Phrase, Range, Result, ScoreVector, Sentence, Weights};
pub use verso_engine::{
    build_model, format_nbest, format_search_graph, format_translation, format_weights, Algorithm, DecodePool,
    DecoderContext, FeatureConfig, OutputCollector, OutputFormat, PoolStats, SearchConfig, SideOutputs,
    Translation, VersoConfig,
};
pub use verso_search::{Derivation, Manager, Model, SearchGraphNode};

pub use verso_core;
pub use verso_engine;
pub use verso_features;
pub use verso_search;
