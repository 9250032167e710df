//! Decoder engine for verso
//!
//! This crate wires the lower layers into a runnable decoder:
//! - VersoConfig: `verso.toml` parsing and validation
//! - Factory: features, phrase tables and language models from config
//! - DecoderContext: read-only state shared by every worker
//! - DecodePool / OutputCollector: multi-threaded batches in input order
//! - Output formatting: plain, scored, JSON, Moses n-best and search-graph lines
//!
//! The engine is the only component that touches the file system.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod context;
pub mod factory;
pub mod output;
pub mod pool;

pub use config::{FeatureConfig, VersoConfig, CONFIG_FILE_NAME, FEATURE_TYPES};
pub use context::DecoderContext;
pub use factory::build_model;
pub use output::{format_nbest, format_search_graph, format_translation, format_weights, OutputFormat};
pub use pool::{DecodePool, OutputCollector, PoolStats, SideOutputs};

// Search types callers need alongside the engine
pub use verso_search::{Algorithm, SearchConfig, SearchGraphNode, Translation};
