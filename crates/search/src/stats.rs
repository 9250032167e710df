//! Per-sentence search counters

use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// What happened during one sentence's search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SentenceStats {
    /// Hypotheses built and scored
    pub created: usize,
    /// Hypotheses merged into an equivalent one
    pub recombined: usize,
    /// Hypotheses removed when a stack was cut to size
    pub pruned: usize,
    /// Hypotheses rejected on insert by the beam
    pub discarded: usize,
    /// Expansions skipped by early discarding
    pub not_built: usize,
    /// Cube-pruning queue pops
    pub popped: usize,
    /// Stack sizes after pruning, by coverage cardinality
    pub stack_sizes: Vec<usize>,
    /// Wall-clock time of the search
    #[serde(skip)]
    pub elapsed: Duration,
}

impl SentenceStats {
    /// Zero every counter, keeping the stack-size buffer
    pub fn reset(&mut self) {
        self.created = 0;
        self.recombined = 0;
        self.pruned = 0;
        self.discarded = 0;
        self.not_built = 0;
        self.popped = 0;
        self.stack_sizes.clear();
        self.elapsed = Duration::ZERO;
    }

    /// Emit the counters at debug level
    pub fn log(&self, index: usize) {
        debug!(
            sentence = index,
            created = self.created,
            recombined = self.recombined,
            pruned = self.pruned,
            discarded = self.discarded,
            not_built = self.not_built,
            popped = self.popped,
            stacks = ?self.stack_sizes,
            "Search statistics"
        );
    }
}
