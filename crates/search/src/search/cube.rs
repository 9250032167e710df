//! Cube pruning
//!
//! After a stack is closed, its hypotheses are grouped by coverage and every
//! (group, legal span) pair becomes an [`Edge`] into the container of the
//! resulting coverage. An edge is a grid: predecessor hypotheses sorted by
//! score down one axis, the span's options (already sorted) along the other.
//!
//! Processing a stack:
//!
//! 1. Each edge scores its `(0, 0)` corner and queues it in its container.
//! 2. Up to `pop_limit` times, the container whose best queued hypothesis
//!    scores highest pops it into the stack and queues the two grid
//!    neighbours `(x, y + 1)` and `(x + 1, y)` that were not seen before.
//! 3. With `cube_diversity > 0`, each container keeps popping until that
//!    many of its hypotheses entered the stack (or it runs dry).
//! 4. Whatever is still queued is released.

use super::{Search, SearchOutcome};
use crate::hypothesis::HypothesisId;
use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::{debug, info};
use verso_core::{distortion_distance, Bitmap, BitmapId, Range};

/// Predecessors x options for one span
struct Edge {
    hypotheses: Vec<HypothesisId>,
    options: std::ops::Range<usize>,
    estimate: f32,
    seen: FxHashSet<(usize, usize)>,
}

/// A scored grid cell waiting to be popped
struct QueueItem {
    score: f32,
    seq: u64,
    hypothesis: HypothesisId,
    edge: usize,
    x: usize,
    y: usize,
}

impl Ord for QueueItem {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueueItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueItem {}

/// All edges leading to one coverage
struct Container {
    bitmap: BitmapId,
    edges: Vec<Edge>,
    queue: BinaryHeap<QueueItem>,
    inserted: usize,
}

impl Container {
    fn new(bitmap: BitmapId) -> Self {
        Container {
            bitmap,
            edges: Vec::new(),
            queue: BinaryHeap::new(),
            inserted: 0,
        }
    }

    fn top_score(&self) -> Option<f32> {
        self.queue.peek().map(|item| item.score)
    }
}

/// Containers of one stack
#[derive(Default)]
struct Layer {
    containers: Vec<Container>,
    index: FxHashMap<BitmapId, usize>,
}

/// Container handle ordered by its best queued score
struct Ranked {
    score: f32,
    container: usize,
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.container.cmp(&self.container))
    }
}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

pub(super) fn run(search: &mut Search<'_>) -> SearchOutcome {
    let len = search.sentence.len();
    let mut layers: Vec<Layer> = (0..=len).map(|_| Layer::default()).collect();

    search.seed();
    search.close_stack(0);
    create_forward_edges(search, 0, &mut layers);

    let mut last = 0;
    for c in 1..=len {
        if search.expired() {
            info!(stack = c, "Time limit reached");
            return SearchOutcome {
                last_stack: last,
                interrupted: true,
            };
        }
        let mut layer = std::mem::take(&mut layers[c]);
        fill_stack(search, &mut layer);
        search.close_stack(c);
        last = c;
        create_forward_edges(search, c, &mut layers);
    }

    SearchOutcome {
        last_stack: last,
        interrupted: false,
    }
}

fn fill_stack(search: &mut Search<'_>, layer: &mut Layer) {
    let config = search.model.config();
    let mut ranked = BinaryHeap::with_capacity(layer.containers.len());

    for (idx, container) in layer.containers.iter_mut().enumerate() {
        initialize_edges(search, container);
        if let Some(score) = container.top_score() {
            ranked.push(Ranked { score, container: idx });
        }
    }

    let mut pops = 0;
    while pops < config.pop_limit {
        let Some(top) = ranked.pop() else { break };
        pops += 1;
        let container = &mut layer.containers[top.container];
        process_best(search, container);
        if let Some(score) = container.top_score() {
            ranked.push(Ranked {
                score,
                container: top.container,
            });
        }
    }
    search.stats.popped += pops;

    if config.cube_diversity > 0 {
        for container in &mut layer.containers {
            while container.inserted < config.cube_diversity && process_best(search, container) {}
        }
    }

    let mut leftover = 0;
    for container in &mut layer.containers {
        for item in container.queue.drain() {
            search.arena.recycle(item.hypothesis);
            leftover += 1;
        }
    }
    debug!(containers = layer.containers.len(), pops, leftover, "Filled stack");
}

fn initialize_edges(search: &mut Search<'_>, container: &mut Container) {
    for idx in 0..container.edges.len() {
        let edge = &mut container.edges[idx];
        if edge.hypotheses.is_empty() || edge.options.is_empty() {
            continue;
        }
        edge.seen.insert((0, 0));
        let item = score_cell(search, container.bitmap, &container.edges[idx], idx, 0, 0);
        container.queue.push(item);
    }
}

/// Pop the container's best cell into the stack and queue its neighbours.
/// Returns false when the queue was empty.
fn process_best(search: &mut Search<'_>, container: &mut Container) -> bool {
    let Some(item) = container.queue.pop() else {
        return false;
    };
    if search.add(item.hypothesis).accepted {
        container.inserted += 1;
    }

    let (x, y) = (item.x, item.y);
    let edge = &mut container.edges[item.edge];
    let next_y = y + 1 < edge.options.len() && edge.seen.insert((x, y + 1));
    let next_x = x + 1 < edge.hypotheses.len() && edge.seen.insert((x + 1, y));
    if next_y {
        let cell = score_cell(search, container.bitmap, &container.edges[item.edge], item.edge, x, y + 1);
        container.queue.push(cell);
    }
    if next_x {
        let cell = score_cell(search, container.bitmap, &container.edges[item.edge], item.edge, x + 1, y);
        container.queue.push(cell);
    }
    true
}

fn score_cell(search: &mut Search<'_>, bitmap: BitmapId, edge: &Edge, edge_idx: usize, x: usize, y: usize) -> QueueItem {
    let hypothesis = search.extend(edge.hypotheses[x], edge.options.start + y, bitmap, edge.estimate);
    let hypo = search.arena.get(hypothesis);
    QueueItem {
        score: hypo.total_score(),
        seq: hypo.seq(),
        hypothesis,
        edge: edge_idx,
        x,
        y,
    }
}

/// Turn closed stack `c` into edges of later stacks
fn create_forward_edges(search: &mut Search<'_>, c: usize, layers: &mut [Layer]) {
    let config = search.model.config();
    let limit = config.distortion_limit();
    let max_len = search.options.max_phrase_length();

    // group by coverage, best hypothesis first within and across groups
    let mut groups: Vec<(BitmapId, Vec<HypothesisId>)> = Vec::new();
    let mut group_of: FxHashMap<BitmapId, usize> = FxHashMap::default();
    for id in search.stacks[c].sorted(search.arena) {
        let bitmap = search.arena.get(id).bitmap();
        let idx = *group_of.entry(bitmap).or_insert_with(|| {
            groups.push((bitmap, Vec::new()));
            groups.len() - 1
        });
        groups[idx].1.push(id);
    }

    for (bitmap, hypotheses) in groups {
        let coverage = search.bitmaps[bitmap].clone();
        let len = coverage.len();
        for start in 0..len {
            if coverage.get(start) {
                continue;
            }
            for end in start..(start + max_len).min(len) {
                if coverage.get(end) {
                    break;
                }
                let range = Range::new(start, end);
                if !check_distortion(&coverage, range, limit) {
                    continue;
                }
                let options = search.options.indices(range);
                if options.is_empty() {
                    continue;
                }
                let predecessors = order_predecessors(search, &hypotheses, range, limit);
                if predecessors.is_empty() {
                    continue;
                }

                let next = search.bitmaps.derive(bitmap, range);
                let next_bitmap = &search.bitmaps[next];
                let estimate = search.future.estimate(next_bitmap);
                let layer = &mut layers[next_bitmap.covered_count()];
                let idx = *layer.index.entry(next).or_insert_with(|| {
                    layer.containers.push(Container::new(next));
                    layer.containers.len() - 1
                });
                layer.containers[idx].edges.push(Edge {
                    hypotheses: predecessors,
                    options,
                    estimate,
                    seen: FxHashSet::default(),
                });
            }
        }
    }
}

/// Whether `range` may follow anything with `coverage`
fn check_distortion(coverage: &Bitmap, range: Range, limit: Option<usize>) -> bool {
    let Some(limit) = limit else { return true };
    match coverage.first_gap() {
        Some(gap) => super::can_return_to_gap(range, gap, limit),
        None => false,
    }
}

/// Predecessors allowed to jump to `range`, best first.
///
/// With a distortion limit the order also accounts for the distortion cost
/// of the jump itself.
fn order_predecessors(
    search: &Search<'_>,
    hypotheses: &[HypothesisId],
    range: Range,
    limit: Option<usize>,
) -> Vec<HypothesisId> {
    let Some(limit) = limit else {
        return hypotheses.to_vec();
    };
    let weight = search.model.distortion_weight();
    let mut keyed: Vec<(f32, u64, HypothesisId)> = hypotheses
        .iter()
        .filter_map(|&id| {
            let hypo = search.arena.get(id);
            let distance = distortion_distance(hypo.range(), range);
            (distance <= limit).then(|| (hypo.total_score() - weight * distance as f32, hypo.seq(), id))
        })
        .collect();
    keyed.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
    keyed.into_iter().map(|(_, _, id)| id).collect()
}
