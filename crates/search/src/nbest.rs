//! N-best extraction from the search graph
//!
//! Every hypothesis in the final stack starts a path. A path that has been
//! popped spawns "deviations": at each edge from the one after its last
//! substitution onward, every arc of that edge's hypothesis can stand in
//! for it. Because an arc recombined with the hypothesis it replaces, the
//! rest of the path scores the same, so a deviation's score is the path
//! score minus the winner's accumulated score plus the arc's.

use crate::hypothesis::{HypothesisArena, HypothesisId};
use rustc_hash::FxHashSet;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use verso_core::ScoreVector;

/// One derivation, stored from the final hypothesis back to the root
#[derive(Debug, Clone)]
pub struct TrellisPath {
    edges: Vec<HypothesisId>,
    changed: Option<usize>,
    scores: ScoreVector,
    order: u64,
}

impl TrellisPath {
    fn from_hypothesis(arena: &HypothesisArena, id: HypothesisId, order: u64) -> Self {
        let mut edges = Vec::new();
        push_ancestry(arena, id, &mut edges);
        TrellisPath {
            edges,
            changed: None,
            scores: arena.get(id).scores().clone(),
            order,
        }
    }

    /// Copy of `self` with the hypothesis at `edge` replaced by `arc`
    fn deviate(&self, arena: &HypothesisArena, edge: usize, arc: HypothesisId, order: u64) -> Self {
        let mut edges = Vec::with_capacity(self.edges.len());
        edges.extend_from_slice(&self.edges[..edge]);
        push_ancestry(arena, arc, &mut edges);

        let mut scores = arena.get(winner_of(arena, edges[0])).scores().clone();
        for &id in &edges {
            let winner = winner_of(arena, id);
            if winner != id {
                scores.minus_equals_vector(arena.get(winner).scores());
                scores.plus_equals_vector(arena.get(id).scores());
            }
        }

        TrellisPath {
            edges,
            changed: Some(edge),
            scores,
            order,
        }
    }

    fn push_deviations(&self, arena: &HypothesisArena, out: &mut Vec<TrellisPath>, order: &mut u64) {
        let from = self.changed.map_or(0, |edge| edge + 1);
        for edge in from..self.edges.len() {
            for &arc in arena.get(self.edges[edge]).arcs() {
                out.push(self.deviate(arena, edge, arc, *order));
                *order += 1;
            }
        }
    }

    /// Hypotheses from the final one back to the root
    pub fn edges(&self) -> &[HypothesisId] {
        &self.edges
    }

    /// Feature scores of the whole derivation
    pub fn scores(&self) -> &ScoreVector {
        &self.scores
    }

    /// Weighted score of the whole derivation
    pub fn total(&self) -> f32 {
        self.scores.total()
    }
}

impl Ord for TrellisPath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.total()
            .total_cmp(&other.total())
            .then_with(|| other.order.cmp(&self.order))
    }
}

impl PartialOrd for TrellisPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for TrellisPath {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TrellisPath {}

fn push_ancestry(arena: &HypothesisArena, id: HypothesisId, edges: &mut Vec<HypothesisId>) {
    let mut next = Some(id);
    while let Some(id) = next {
        edges.push(id);
        next = arena.get(id).parent();
    }
}

#[inline]
fn winner_of(arena: &HypothesisArena, id: HypothesisId) -> HypothesisId {
    arena.get(id).winner().unwrap_or(id)
}

/// N-best extraction parameters
#[derive(Debug, Clone, Copy)]
pub struct NBestRequest {
    /// Derivations wanted
    pub count: usize,
    /// Skip derivations whose surface string was already produced
    pub distinct: bool,
    /// Round bound as a multiple of `count`; 0 means 1000
    pub factor: usize,
}

/// Extract up to `request.count` derivations, best first.
///
/// `finals` are the complete hypotheses, best first. `surface` renders a
/// path's target string and is only called in distinct mode.
pub fn extract<F>(arena: &HypothesisArena, finals: &[HypothesisId], request: NBestRequest, surface: F) -> Vec<TrellisPath>
where
    F: Fn(&[HypothesisId]) -> String,
{
    let mut results = Vec::new();
    if request.count == 0 || finals.is_empty() {
        return results;
    }

    let mut order = 0u64;
    let mut contenders: BinaryHeap<TrellisPath> = finals
        .iter()
        .map(|&id| {
            order += 1;
            TrellisPath::from_hypothesis(arena, id, order - 1)
        })
        .collect();

    let factor = if request.factor == 0 { 1000 } else { request.factor };
    let limit = if request.distinct {
        (request.factor > 0).then(|| request.count * request.factor)
    } else {
        Some(request.count)
    };

    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut spawned = Vec::new();
    let mut iteration = 0;
    while results.len() < request.count && iteration < request.count * factor {
        let Some(path) = contenders.pop() else { break };
        iteration += 1;

        path.push_deviations(arena, &mut spawned, &mut order);
        contenders.extend(spawned.drain(..));

        if !request.distinct || seen.insert(surface(path.edges())) {
            results.push(path);
        }

        if let Some(limit) = limit {
            if contenders.len() > limit {
                let mut sorted = std::mem::take(&mut contenders).into_sorted_vec();
                sorted.drain(..sorted.len() - limit);
                contenders = BinaryHeap::from(sorted);
            }
        }
    }
    results
}
