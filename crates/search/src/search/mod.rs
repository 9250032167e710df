//! Search drivers
//!
//! Both strategies fill one stack per number of covered source words, in
//! increasing order, and share the hypothesis construction and stack
//! bookkeeping defined here:
//!
//! - [`normal`] expands every surviving hypothesis of a stack with every
//!   legal option.
//! - [`cube`] groups expansions into edges and pops a bounded number of
//!   the most promising ones per stack.
//!
//! The time limit, if any, is checked at each stack boundary.

mod cube;
mod normal;

use crate::future_cost::FutureCosts;
use crate::hypothesis::{HypothesisArena, HypothesisId};
use crate::model::Model;
use crate::options::{scratch, TranslationOptions};
use crate::stack::{AddOutcome, HypothesisStack};
use crate::config::Algorithm;
use crate::stats::SentenceStats;
use std::time::{Duration, Instant};
use tracing::{debug, trace};
use verso_core::{distortion_distance, BitmapId, Bitmaps, Range, Sentence};
use verso_features::ApplyContext;

/// How a search ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOutcome {
    /// Last stack that was fully processed
    pub last_stack: usize,
    /// The time limit stopped the search early
    pub interrupted: bool,
}

/// Borrowed working set of one sentence's search
pub(crate) struct Search<'a> {
    model: &'a Model,
    sentence: &'a Sentence,
    options: &'a TranslationOptions,
    future: &'a FutureCosts,
    bitmaps: &'a mut Bitmaps,
    arena: &'a mut HypothesisArena,
    stacks: &'a mut [HypothesisStack],
    stats: &'a mut SentenceStats,
    deadline: Option<Instant>,
    scratch: Vec<f32>,
}

impl<'a> Search<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        model: &'a Model,
        sentence: &'a Sentence,
        options: &'a TranslationOptions,
        future: &'a FutureCosts,
        bitmaps: &'a mut Bitmaps,
        arena: &'a mut HypothesisArena,
        stacks: &'a mut [HypothesisStack],
        stats: &'a mut SentenceStats,
    ) -> Self {
        debug_assert_eq!(stacks.len(), sentence.len() + 1);
        let deadline = model
            .config()
            .time_limit_ms
            .map(|ms| Instant::now() + Duration::from_millis(ms));
        Search {
            model,
            sentence,
            options,
            future,
            bitmaps,
            arena,
            stacks,
            stats,
            deadline,
            scratch: Vec::new(),
        }
    }

    /// Run the configured strategy to completion or timeout
    pub(crate) fn run(mut self) -> SearchOutcome {
        match self.model.config().algorithm {
            Algorithm::Normal => normal::run(&mut self),
            Algorithm::CubePruning => cube::run(&mut self),
        }
    }

    /// Build the empty hypothesis and put it on stack 0
    fn seed(&mut self) -> HypothesisId {
        let model = self.model;
        let initial = self.bitmaps.initial();
        let estimate = self.future.estimate(&self.bitmaps[initial]);
        let id = self.arena.allocate();
        let root = self.arena.get_mut(id);
        root.set_root(initial, model.num_scores(), estimate);
        for (_, feature) in model.registry().stateful() {
            let mut state = feature.blank_state();
            feature.empty_hypothesis_state(state.as_mut(), self.sentence);
            root.push_state(state);
        }
        root.finish(estimate);
        self.stats.created += 1;
        self.add(id);
        id
    }

    fn expired(&self) -> bool {
        self.deadline.map_or(false, |deadline| Instant::now() >= deadline)
    }

    /// Apply option `option` to `parent`, producing a fully scored child
    /// with coverage `bitmap` and future estimate `estimate`
    fn extend(&mut self, parent: HypothesisId, option: usize, bitmap: BitmapId, estimate: f32) -> HypothesisId {
        let model = self.model;
        let options = self.options;
        let opt = options.option(option);
        let child = self.arena.allocate();
        let (prev, hypo) = self.arena.parent_and_child(parent, child);

        hypo.set_extension(parent, prev, bitmap, opt.range(), option);
        hypo.scores_mut().plus_equals_vector(opt.scores());

        let ctx = ApplyContext {
            sentence: self.sentence,
            range: opt.range(),
            target: opt.target(),
            reordering: opt.reordering(),
            prev_coverage: &self.bitmaps[prev.bitmap()],
            coverage: &self.bitmaps[bitmap],
        };
        for (i, (slot, feature)) in model.registry().stateful().iter().enumerate() {
            let buf = scratch(&mut self.scratch, slot.len());
            let state = feature.evaluate_when_applied(prev.states()[i].as_ref(), &ctx, buf);
            hypo.scores_mut().plus_equals(model.weights(), *slot, buf);
            hypo.push_state(state);
        }
        hypo.finish(estimate);

        trace!(
            id = child.index(),
            parent = parent.index(),
            range = %opt.range(),
            target = %opt.target(),
            score = hypo.score(),
            future = estimate,
            "Created hypothesis"
        );
        self.stats.created += 1;
        child
    }

    /// Insert into the stack matching the hypothesis' coverage
    fn add(&mut self, id: HypothesisId) -> AddOutcome {
        let covered = self.bitmaps[self.arena.get(id).bitmap()].covered_count();
        let outcome = self.stacks[covered].add(id, self.arena);
        if outcome.recombined {
            self.stats.recombined += 1;
        } else if !outcome.accepted {
            self.stats.discarded += 1;
        }
        self.stats.pruned += outcome.pruned;
        outcome
    }

    /// Prune stack `c` to size and trim its arc lists before it is expanded
    fn close_stack(&mut self, c: usize) {
        let config = self.model.config();
        let stack = &mut self.stacks[c];
        self.stats.pruned += stack.prune(self.arena);
        stack.cleanup_arcs(self.arena, config.nbest_size, config.keeps_all_arcs());
        self.stats.stack_sizes.push(stack.len());
        debug!(stack = c, size = stack.len(), worst = stack.worst_score(), "Closed stack");
    }
}

/// A span not starting at the first gap must leave the gap reachable
#[inline]
fn can_return_to_gap(range: Range, first_gap: usize, limit: usize) -> bool {
    range.start() == first_gap || distortion_distance(Some(range), Range::single(first_gap)) <= limit
}
