//! Search parameters
//!
//! Deserialized from the `[search]` table of the decoder configuration.
//! Every field has a default, so an empty table (or no table at all) yields
//! a working beam search.

use serde::{Deserialize, Serialize};
use verso_core::{Error, Result};

/// Default beam threshold: ln(1e-5)
pub const DEFAULT_BEAM_THRESHOLD: f32 = -11.512_925;

/// Search strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    /// Stack decoding with full expansion of every surviving hypothesis
    #[default]
    Normal,
    /// Lazy expansion through per-coverage priority queues
    CubePruning,
}

/// Parameters of one sentence's search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Search strategy
    pub algorithm: Algorithm,
    /// Hypotheses kept per stack after pruning
    pub stack_size: usize,
    /// Log-space margin below the best hypothesis of a stack
    pub beam_threshold: f32,
    /// Longest source span looked up in the phrase tables
    pub max_phrase_length: usize,
    /// Maximum reordering jump; negative disables the limit
    pub distortion_limit: i32,
    /// Cube-pruning pops per stack
    pub pop_limit: usize,
    /// Minimum insertions per cube-pruning container
    pub cube_diversity: usize,
    /// Normal search skips expansions expected to fall this far below the
    /// target stack's worst score; `-inf` disables it
    pub early_discarding_threshold: f32,
    /// Candidates kept per source span
    pub table_limit: usize,
    /// Log-space margin below the best option of a span; `-inf` disables it
    pub option_threshold: f32,
    /// Translate unknown words to nothing instead of copying them
    pub drop_unknown: bool,
    /// Score distortion with the early (gap-aware) rule
    pub early_distortion_cost: bool,
    /// Wall-clock budget per sentence in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit_ms: Option<u64>,
    /// Derivations to extract per sentence; 0 disables n-best
    pub nbest_size: usize,
    /// Only keep derivations with a distinct surface string
    pub nbest_distinct: bool,
    /// Bound on extraction rounds, as a multiple of `nbest_size`
    pub nbest_factor: usize,
    /// Keep every recombination arc and attach the search graph to each
    /// translation
    pub search_graph: bool,
    /// Worker threads
    pub threads: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            algorithm: Algorithm::Normal,
            stack_size: 100,
            beam_threshold: DEFAULT_BEAM_THRESHOLD,
            max_phrase_length: 20,
            distortion_limit: 6,
            pop_limit: 1000,
            cube_diversity: 0,
            early_discarding_threshold: f32::NEG_INFINITY,
            table_limit: 20,
            option_threshold: f32::NEG_INFINITY,
            drop_unknown: false,
            early_distortion_cost: false,
            time_limit_ms: None,
            nbest_size: 0,
            nbest_distinct: false,
            nbest_factor: 20,
            search_graph: false,
            threads: 1,
        }
    }
}

impl SearchConfig {
    /// Reject values the search cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.stack_size == 0 {
            return Err(Error::config("search.stack_size must be at least 1"));
        }
        if self.max_phrase_length == 0 {
            return Err(Error::config("search.max_phrase_length must be at least 1"));
        }
        if self.algorithm == Algorithm::CubePruning && self.pop_limit == 0 {
            return Err(Error::config("search.pop_limit must be at least 1"));
        }
        if self.threads == 0 {
            return Err(Error::config("search.threads must be at least 1"));
        }
        if self.beam_threshold.is_nan() || self.beam_threshold > 0.0 {
            return Err(Error::config(format!(
                "search.beam_threshold must be a non-positive log value, got {}",
                self.beam_threshold
            )));
        }
        Ok(())
    }

    /// Reordering limit, `None` when unlimited
    #[inline]
    pub fn distortion_limit(&self) -> Option<usize> {
        usize::try_from(self.distortion_limit).ok()
    }

    /// True when arc lists must be kept for n-best extraction or the
    /// search graph
    #[inline]
    pub fn keeps_arcs(&self) -> bool {
        self.nbest_size > 0 || self.search_graph
    }

    /// True when arc lists must not be trimmed
    #[inline]
    pub fn keeps_all_arcs(&self) -> bool {
        self.nbest_distinct || self.search_graph
    }

    /// Early discarding is on
    #[inline]
    pub fn early_discarding(&self) -> bool {
        self.early_discarding_threshold > f32::NEG_INFINITY
    }

    /// Effective n-best extraction round multiplier
    #[inline]
    pub fn nbest_factor(&self) -> usize {
        if self.nbest_factor == 0 {
            1000
        } else {
            self.nbest_factor
        }
    }
}
