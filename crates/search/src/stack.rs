//! Hypothesis stacks
//!
//! One stack per number of covered source words. A stack keeps at most one
//! hypothesis per recombination signature (coverage plus feature states);
//! when two hypotheses share a signature the better one stays and the
//! other becomes an arc of it (n-best mode) or is released.
//!
//! # Pruning
//!
//! - Inserts below `worst_score` are rejected. The worst score rises to
//!   `best + beam_threshold` whenever a new best arrives, and to the cut-off
//!   score after each prune.
//! - A stack that grows past `2 * max_size - 1` is pruned to `max_size`
//!   immediately; search also prunes each stack before expanding it.
//!
//! Accepted hypotheses are stamped with the next arena sequence number, so
//! score ties resolve to the earliest inserted member even when cube
//! pruning creates hypotheses long before they are pushed.

use crate::hypothesis::{HypothesisArena, HypothesisId};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use verso_core::BitmapId;

/// Result of [`HypothesisStack::add`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AddOutcome {
    /// The new hypothesis is now a stack member
    pub accepted: bool,
    /// The new hypothesis met an equivalent one
    pub recombined: bool,
    /// Member displaced by the new hypothesis (now an arc, or released)
    pub evicted: Option<HypothesisId>,
    /// Members removed by an over-fill prune
    pub pruned: usize,
}

/// Recombining, beam-pruned set of hypotheses
#[derive(Debug)]
pub struct HypothesisStack {
    members: Vec<HypothesisId>,
    buckets: FxHashMap<(BitmapId, u64), SmallVec<[usize; 2]>>,
    max_size: usize,
    beam_threshold: f32,
    best_score: f32,
    worst_score: f32,
    keep_arcs: bool,
}

impl HypothesisStack {
    /// Empty stack
    pub fn new(max_size: usize, beam_threshold: f32, keep_arcs: bool) -> Self {
        HypothesisStack {
            members: Vec::new(),
            buckets: FxHashMap::default(),
            max_size: max_size.max(1),
            beam_threshold,
            best_score: f32::NEG_INFINITY,
            worst_score: f32::NEG_INFINITY,
            keep_arcs,
        }
    }

    /// Empty the stack for a new sentence, keeping allocations.
    ///
    /// Members are not released; the arena is reset separately.
    pub fn reset(&mut self, max_size: usize, beam_threshold: f32, keep_arcs: bool) {
        self.members.clear();
        self.buckets.clear();
        self.max_size = max_size.max(1);
        self.beam_threshold = beam_threshold;
        self.best_score = f32::NEG_INFINITY;
        self.worst_score = f32::NEG_INFINITY;
        self.keep_arcs = keep_arcs;
    }

    /// Insert `id`, recombining with an equivalent member if there is one.
    ///
    /// Rejected and recombined-away hypotheses are released (or kept as
    /// arcs) here; the caller must not use them as stack members afterwards.
    pub fn add(&mut self, id: HypothesisId, arena: &mut HypothesisArena) -> AddOutcome {
        let hypo = arena.get(id);
        let total = hypo.total_score();
        if total == f32::NEG_INFINITY || total < self.worst_score {
            arena.recycle(id);
            return AddOutcome::default();
        }

        let key = (hypo.bitmap(), hypo.state_hash());
        let existing = self.buckets.get(&key).and_then(|bucket| {
            bucket
                .iter()
                .copied()
                .find(|&pos| arena.get(self.members[pos]).recombines_with(hypo))
        });

        if let Some(pos) = existing {
            let other = self.members[pos];
            if total > arena.get(other).total_score() {
                arena.stamp(id);
                self.members[pos] = id;
                self.retire(id, other, arena);
                let pruned = self.note_score(total, arena);
                return AddOutcome {
                    accepted: true,
                    recombined: true,
                    evicted: Some(other),
                    pruned,
                };
            }
            self.retire(other, id, arena);
            return AddOutcome {
                accepted: false,
                recombined: true,
                evicted: None,
                pruned: 0,
            };
        }

        arena.stamp(id);
        let pos = self.members.len();
        self.members.push(id);
        self.buckets.entry(key).or_default().push(pos);
        let pruned = self.note_score(total, arena);
        AddOutcome {
            accepted: true,
            recombined: false,
            evicted: None,
            pruned,
        }
    }

    fn retire(&mut self, winner: HypothesisId, loser: HypothesisId, arena: &mut HypothesisArena) {
        if self.keep_arcs {
            arena.absorb(winner, loser);
        } else {
            arena.recycle(loser);
        }
    }

    /// Track the best score and prune lazily when over-full
    fn note_score(&mut self, total: f32, arena: &mut HypothesisArena) -> usize {
        if total > self.best_score {
            self.best_score = total;
            self.worst_score = self.worst_score.max(total + self.beam_threshold);
        }
        if self.members.len() > 2 * self.max_size - 1 {
            self.prune(arena)
        } else {
            0
        }
    }

    /// Cut the stack to `max_size`, dropping anything outside the beam.
    ///
    /// Ties at the cut go to the earlier inserted member. Returns the number of released members.
    pub fn prune(&mut self, arena: &mut HypothesisArena) -> usize {
        if self.members.len() <= self.max_size {
            return 0;
        }
        let before = self.members.len();
        let floor = self.best_score + self.beam_threshold;

        let mut members = std::mem::take(&mut self.members);
        let mut released: Vec<HypothesisId> = Vec::new();
        members.retain(|&id| {
            let keep = arena.get(id).total_score() >= floor;
            if !keep {
                released.push(id);
            }
            keep
        });
        if members.len() > self.max_size {
            members.select_nth_unstable_by(self.max_size - 1, |a, b| arena.compare(*a, *b));
            let cut = arena.get(members[self.max_size - 1]).total_score();
            self.worst_score = self.worst_score.max(cut);
            released.extend(members.drain(self.max_size..));
        }
        for id in released {
            arena.recycle(id);
        }

        self.members = members;
        self.rebuild_buckets(arena);
        before - self.members.len()
    }

    fn rebuild_buckets(&mut self, arena: &HypothesisArena) {
        self.buckets.clear();
        for (pos, &id) in self.members.iter().enumerate() {
            let hypo = arena.get(id);
            self.buckets
                .entry((hypo.bitmap(), hypo.state_hash()))
                .or_default()
                .push(pos);
        }
    }

    /// The `k` best members, best first
    pub fn best_n(&self, k: usize, arena: &HypothesisArena) -> Vec<HypothesisId> {
        if k == 0 {
            return Vec::new();
        }
        let mut ids = self.members.clone();
        if ids.len() > k {
            ids.select_nth_unstable_by(k - 1, |a, b| arena.compare(*a, *b));
            ids.truncate(k);
        }
        ids.sort_by(|a, b| arena.compare(*a, *b));
        ids
    }

    /// Every member, best first
    pub fn sorted(&self, arena: &HypothesisArena) -> Vec<HypothesisId> {
        self.best_n(self.members.len(), arena)
    }

    /// Highest-scoring member; the earliest inserted wins ties
    pub fn best(&self, arena: &HypothesisArena) -> Option<HypothesisId> {
        self.members
            .iter()
            .copied()
            .min_by(|a, b| arena.compare(*a, *b))
    }

    /// Trim long arc lists to the `nbest_size` best arcs.
    ///
    /// Lists are left alone with `keep_all`, set for distinct n-best (many
    /// arcs may share a surface string) and for search-graph export.
    pub fn cleanup_arcs(&self, arena: &mut HypothesisArena, nbest_size: usize, keep_all: bool) {
        if !self.keep_arcs || keep_all {
            return;
        }
        let limit = nbest_size * 5;
        for &id in &self.members {
            if arena.get(id).arcs().len() > limit {
                arena.truncate_arcs(id, nbest_size);
            }
        }
    }

    /// Members in stack order
    #[inline]
    pub fn ids(&self) -> &[HypothesisId] {
        &self.members
    }

    /// Number of members
    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True when the stack has no members
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Insert threshold
    #[inline]
    pub fn worst_score(&self) -> f32 {
        self.worst_score
    }

    /// Best total score seen
    #[inline]
    pub fn best_score(&self) -> f32 {
        self.best_score
    }

    /// Capacity after pruning
    #[inline]
    pub fn max_size(&self) -> usize {
        self.max_size
    }
}
