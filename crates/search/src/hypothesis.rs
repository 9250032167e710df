//! Hypotheses and the per-sentence arena that owns them
//!
//! A hypothesis is a node in the search tree: a coverage bitmap, the option
//! applied last, a back-pointer to its parent, one feature state per
//! stateful feature, and its accumulated scores.
//!
//! # Arena
//!
//! Hypotheses never point at each other directly. They live in a
//! [`HypothesisArena`] and refer to one another by [`HypothesisId`], so
//! parent links and arc lists are plain indices. Released slots go on a
//! free list and are handed out again with their score vector and arc list
//! allocations intact; `reset` releases every slot at once between
//! sentences.

use smallvec::SmallVec;
use std::cmp::Ordering;
use verso_core::{BitmapId, Range, ScoreVector};
use verso_features::{hash_states, FFState};

/// Index of a hypothesis in its arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct HypothesisId(u32);

impl HypothesisId {
    /// Raw slot index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One partial translation
#[derive(Debug)]
pub struct Hypothesis {
    bitmap: BitmapId,
    range: Option<Range>,
    option: Option<usize>,
    parent: Option<HypothesisId>,
    states: SmallVec<[Box<dyn FFState>; 4]>,
    scores: ScoreVector,
    future_score: f32,
    state_hash: u64,
    seq: u64,
    arcs: Vec<HypothesisId>,
    winner: Option<HypothesisId>,
    live: bool,
}

impl Hypothesis {
    fn blank() -> Self {
        Hypothesis {
            bitmap: BitmapId::default(),
            range: None,
            option: None,
            parent: None,
            states: SmallVec::new(),
            scores: ScoreVector::default(),
            future_score: 0.0,
            state_hash: 0,
            seq: 0,
            arcs: Vec::new(),
            winner: None,
            live: false,
        }
    }

    /// Interned coverage
    #[inline]
    pub fn bitmap(&self) -> BitmapId {
        self.bitmap
    }

    /// Source span of the last applied option; `None` for the root
    #[inline]
    pub fn range(&self) -> Option<Range> {
        self.range
    }

    /// Flat index of the last applied option; `None` for the root
    #[inline]
    pub fn option(&self) -> Option<usize> {
        self.option
    }

    /// Predecessor
    #[inline]
    pub fn parent(&self) -> Option<HypothesisId> {
        self.parent
    }

    /// True for the empty hypothesis
    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Per-feature states, in stateful evaluation order
    #[inline]
    pub fn states(&self) -> &[Box<dyn FFState>] {
        &self.states
    }

    /// Accumulated feature scores
    #[inline]
    pub fn scores(&self) -> &ScoreVector {
        &self.scores
    }

    /// Accumulated weighted score
    #[inline]
    pub fn score(&self) -> f32 {
        self.scores.total()
    }

    /// Estimate for the uncovered remainder
    #[inline]
    pub fn future_score(&self) -> f32 {
        self.future_score
    }

    /// Accumulated score plus future estimate; the ranking key
    #[inline]
    pub fn total_score(&self) -> f32 {
        self.scores.total() + self.future_score
    }

    /// Combined hash of all feature states
    #[inline]
    pub fn state_hash(&self) -> u64 {
        self.state_hash
    }

    /// Order of entry into a stack (creation order until then)
    #[inline]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Recombined hypotheses this one won against
    #[inline]
    pub fn arcs(&self) -> &[HypothesisId] {
        &self.arcs
    }

    /// For an arc, the hypothesis that replaced it in the stack
    #[inline]
    pub fn winner(&self) -> Option<HypothesisId> {
        self.winner
    }

    pub(crate) fn set_root(&mut self, bitmap: BitmapId, num_scores: usize, future_score: f32) {
        self.bitmap = bitmap;
        self.range = None;
        self.option = None;
        self.parent = None;
        self.scores.reset(num_scores);
        self.future_score = future_score;
    }

    pub(crate) fn set_extension(
        &mut self,
        parent_id: HypothesisId,
        parent: &Hypothesis,
        bitmap: BitmapId,
        range: Range,
        option: usize,
    ) {
        self.bitmap = bitmap;
        self.range = Some(range);
        self.option = Some(option);
        self.parent = Some(parent_id);
        self.scores.clone_from(&parent.scores);
    }

    pub(crate) fn scores_mut(&mut self) -> &mut ScoreVector {
        &mut self.scores
    }

    pub(crate) fn push_state(&mut self, state: Box<dyn FFState>) {
        self.states.push(state);
    }

    /// Set the future estimate and seal the state hash
    pub(crate) fn finish(&mut self, future_score: f32) {
        self.future_score = future_score;
        self.state_hash = hash_states(self.states.iter().map(|s| &**s as &dyn FFState));
    }

    /// Same coverage and pairwise-equal feature states
    pub fn recombines_with(&self, other: &Hypothesis) -> bool {
        self.bitmap == other.bitmap
            && self.state_hash == other.state_hash
            && self.states.len() == other.states.len()
            && self
                .states
                .iter()
                .zip(other.states.iter())
                .all(|(a, b)| a.state_eq(b.as_ref()))
    }
}

/// Slab of hypotheses with a free list
#[derive(Debug, Default)]
pub struct HypothesisArena {
    slots: Vec<Hypothesis>,
    free: Vec<HypothesisId>,
    pending: Vec<HypothesisId>,
    live: usize,
    next_seq: u64,
}

impl HypothesisArena {
    /// Empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Release every hypothesis, keeping slot allocations for reuse
    pub fn reset(&mut self) {
        self.free.clear();
        for (idx, slot) in self.slots.iter_mut().enumerate().rev() {
            slot.states.clear();
            slot.arcs.clear();
            slot.winner = None;
            slot.live = false;
            self.free.push(HypothesisId(idx as u32));
        }
        self.live = 0;
        self.next_seq = 0;
    }

    /// Hand out a blank hypothesis with the next sequence number
    pub(crate) fn allocate(&mut self) -> HypothesisId {
        let id = match self.free.pop() {
            Some(id) => id,
            None => {
                self.slots.push(Hypothesis::blank());
                HypothesisId((self.slots.len() - 1) as u32)
            }
        };
        let slot = &mut self.slots[id.index()];
        debug_assert!(!slot.live, "allocated a live hypothesis slot");
        slot.live = true;
        slot.seq = self.next_seq;
        self.next_seq += 1;
        self.live += 1;
        id
    }

    /// Hypothesis by id
    #[inline]
    pub fn get(&self, id: HypothesisId) -> &Hypothesis {
        let hypo = &self.slots[id.index()];
        debug_assert!(hypo.live, "access to released hypothesis {:?}", id);
        hypo
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: HypothesisId) -> &mut Hypothesis {
        &mut self.slots[id.index()]
    }

    /// Shared access to `parent` alongside mutable access to `child`
    pub(crate) fn parent_and_child(
        &mut self,
        parent: HypothesisId,
        child: HypothesisId,
    ) -> (&Hypothesis, &mut Hypothesis) {
        let (p, c) = (parent.index(), child.index());
        debug_assert_ne!(p, c);
        if p < c {
            let (lo, hi) = self.slots.split_at_mut(c);
            (&lo[p], &mut hi[0])
        } else {
            let (lo, hi) = self.slots.split_at_mut(p);
            (&hi[0], &mut lo[c])
        }
    }

    /// Record `loser` as an arc of `winner`, moving the loser's own arcs too
    pub(crate) fn absorb(&mut self, winner: HypothesisId, loser: HypothesisId) {
        let mut moved = std::mem::take(&mut self.slots[loser.index()].arcs);
        moved.push(loser);
        for &arc in &moved {
            self.slots[arc.index()].winner = Some(winner);
        }
        self.slots[winner.index()].arcs.append(&mut moved);
        // hand the emptied buffer back so the loser keeps its capacity
        self.slots[loser.index()].arcs = moved;
    }

    /// Renumber `id` after the latest hypothesis, marking its entry into a
    /// stack
    pub(crate) fn stamp(&mut self, id: HypothesisId) {
        self.slots[id.index()].seq = self.next_seq;
        self.next_seq += 1;
    }

    /// Release `id` and every arc it holds
    pub(crate) fn recycle(&mut self, id: HypothesisId) {
        self.pending.push(id);
        while let Some(next) = self.pending.pop() {
            let slot = &mut self.slots[next.index()];
            if !slot.live {
                continue;
            }
            self.pending.extend(slot.arcs.drain(..));
            slot.states.clear();
            slot.winner = None;
            slot.live = false;
            self.free.push(next);
            self.live -= 1;
        }
    }

    /// Keep the `keep` best arcs of `id`, releasing the rest
    pub(crate) fn truncate_arcs(&mut self, id: HypothesisId, keep: usize) {
        let mut arcs = std::mem::take(&mut self.slots[id.index()].arcs);
        arcs.sort_by(|a, b| self.compare(*a, *b));
        let dropped: Vec<HypothesisId> = arcs.drain(keep.min(arcs.len())..).collect();
        self.slots[id.index()].arcs = arcs;
        for arc in dropped {
            self.recycle(arc);
        }
    }

    /// Ranking order: higher total score first, lower sequence on ties
    pub fn compare(&self, a: HypothesisId, b: HypothesisId) -> Ordering {
        let (a, b) = (self.get(a), self.get(b));
        b.total_score()
            .total_cmp(&a.total_score())
            .then(a.seq.cmp(&b.seq))
    }

    /// Hypotheses currently allocated
    pub fn live(&self) -> usize {
        self.live
    }

    /// Slots ever allocated
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}
