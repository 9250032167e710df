//! Search-graph export
//!
//! Once a sentence is decoded, its stacks and recombination arcs form a
//! lattice of everything the search kept. [`collect`] lists the part of it
//! connected to the final stack: every stack member reachable backwards
//! from a complete hypothesis, each followed by the arcs it won against.
//!
//! Each node also carries its best forward link. Final hypotheses point
//! nowhere with a forward score of 0. Walking the stacks from the back,
//! every connected hypothesis (and every arc it holds) offers its parent
//! `forward(child) + score(child) - score(parent)`, and the parent keeps
//! the highest offer. Arcs are reported with the forward link of their
//! winner.

use crate::hypothesis::{HypothesisArena, HypothesisId};
use crate::options::TranslationOptions;
use crate::stack::HypothesisStack;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use verso_core::{Bitmaps, Range};

/// One hypothesis of the search graph
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchGraphNode {
    /// Arena slot of the hypothesis, unique within the sentence
    pub id: usize,
    /// Number of covered source words
    pub stack: usize,
    /// Predecessor, `None` for the empty hypothesis
    pub back: Option<usize>,
    /// Accumulated weighted score, without the future estimate
    pub score: f32,
    /// Score gained by the last phrase
    pub transition: f32,
    /// For an arc, the stack member that replaced it
    pub recombined: Option<usize>,
    /// Best successor, `None` in the final stack
    pub forward: Option<usize>,
    /// Score still to gain along the best forward path
    pub fscore: f32,
    /// Source span of the last phrase
    pub covered: Option<Range>,
    /// Target words of the last phrase
    pub out: Vec<String>,
}

impl SearchGraphNode {
    /// True for the empty hypothesis
    pub fn is_root(&self) -> bool {
        self.back.is_none()
    }
}

#[derive(Clone, Copy)]
struct Forward {
    next: Option<HypothesisId>,
    score: f32,
}

/// Connected search graph of the sentence held in `stacks`, stack by stack
pub(crate) fn collect(
    arena: &HypothesisArena,
    bitmaps: &Bitmaps,
    stacks: &[HypothesisStack],
    options: &TranslationOptions,
) -> Vec<SearchGraphNode> {
    let Some(last) = stacks.last() else {
        return Vec::new();
    };
    let connected = connected(arena, last);

    let mut forward: FxHashMap<HypothesisId, Forward> = FxHashMap::default();
    for &id in last.ids() {
        forward.insert(id, Forward { next: None, score: 0.0 });
    }
    for stack in stacks.iter().skip(1).rev() {
        for &id in stack.ids() {
            if !connected.contains(&id) {
                continue;
            }
            let base = forward.get(&id).map_or(0.0, |f| f.score);
            offer(arena, &mut forward, id, base);
            for &arc in arena.get(id).arcs() {
                offer(arena, &mut forward, arc, base);
            }
        }
    }

    let mut graph = Vec::with_capacity(connected.len() + 1);
    for stack in stacks {
        for id in stack.sorted(arena) {
            if !connected.contains(&id) && !arena.get(id).is_root() {
                continue;
            }
            let link = forward.get(&id).copied();
            graph.push(node(arena, bitmaps, options, id, None, link));
            for &arc in arena.get(id).arcs() {
                graph.push(node(arena, bitmaps, options, arc, Some(id), link));
            }
        }
    }
    graph
}

/// Hypotheses reachable backwards from the final stack through parent
/// links and arcs, the empty hypothesis excluded
fn connected(arena: &HypothesisArena, last: &HypothesisStack) -> FxHashSet<HypothesisId> {
    let mut seen: FxHashSet<HypothesisId> = last.ids().iter().copied().collect();
    let mut queue: Vec<HypothesisId> = last.ids().to_vec();
    let mut next = 0;
    while next < queue.len() {
        let hypo = arena.get(queue[next]);
        next += 1;
        if let Some(parent) = hypo.parent() {
            if !arena.get(parent).is_root() && seen.insert(parent) {
                queue.push(parent);
            }
        }
        for &arc in hypo.arcs() {
            if seen.insert(arc) {
                queue.push(arc);
            }
        }
    }
    seen
}

/// Let `child` compete for the forward link of its parent
fn offer(arena: &HypothesisArena, forward: &mut FxHashMap<HypothesisId, Forward>, child: HypothesisId, base: f32) {
    let hypo = arena.get(child);
    let Some(parent) = hypo.parent() else { return };
    let score = base + hypo.score() - arena.get(parent).score();
    let entry = forward.entry(parent).or_insert(Forward {
        next: Some(child),
        score,
    });
    if entry.score < score {
        *entry = Forward {
            next: Some(child),
            score,
        };
    }
}

fn node(
    arena: &HypothesisArena,
    bitmaps: &Bitmaps,
    options: &TranslationOptions,
    id: HypothesisId,
    recombined: Option<HypothesisId>,
    forward: Option<Forward>,
) -> SearchGraphNode {
    let hypo = arena.get(id);
    let prev_score = hypo.parent().map_or(0.0, |p| arena.get(p).score());
    let out: Vec<String> = hypo
        .option()
        .map(|o| options.option(o).target().iter().map(|w| w.to_string()).collect())
        .unwrap_or_default();
    SearchGraphNode {
        id: id.index(),
        stack: bitmaps[hypo.bitmap()].covered_count(),
        back: hypo.parent().map(HypothesisId::index),
        score: hypo.score(),
        transition: hypo.score() - prev_score,
        recombined: recombined.map(HypothesisId::index),
        forward: forward.and_then(|f| f.next).map(HypothesisId::index),
        fscore: forward.map_or(0.0, |f| f.score),
        covered: hypo.range(),
        out,
    }
}
