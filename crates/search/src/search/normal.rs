//! Exhaustive stack expansion
//!
//! Every hypothesis that survives pruning is extended with every option of
//! every legal span. With a distortion limit a span is legal when
//!
//! 1. it does not overlap the coverage,
//! 2. the jump from the previous phrase to its start is within the limit,
//! 3. and, unless it starts at the first gap, the jump from its end back to
//!    the first gap is within the limit too.
//!
//! Early discarding skips building children whose optimistic score already
//! falls below the target stack's worst score plus a margin.

use super::{can_return_to_gap, Search, SearchOutcome};
use crate::hypothesis::HypothesisId;
use tracing::info;
use verso_core::{distortion_distance, BitmapId, Range};

pub(super) fn run(search: &mut Search<'_>) -> SearchOutcome {
    let len = search.sentence.len();
    search.seed();

    let mut last = 0;
    for c in 0..=len {
        if search.expired() {
            info!(stack = c, "Time limit reached");
            return SearchOutcome {
                last_stack: last,
                interrupted: true,
            };
        }
        search.close_stack(c);
        last = c;
        let hypotheses = search.stacks[c].sorted(search.arena);
        for id in hypotheses {
            expand(search, id);
        }
    }

    SearchOutcome {
        last_stack: last,
        interrupted: false,
    }
}

fn expand(search: &mut Search<'_>, id: HypothesisId) {
    let hypo = search.arena.get(id);
    let bitmap = hypo.bitmap();
    let prev = hypo.range();
    let coverage = search.bitmaps[bitmap].clone();
    let len = coverage.len();
    let max_len = search.options.max_phrase_length();

    match search.model.config().distortion_limit() {
        None => {
            for start in 0..len {
                for end in start..(start + max_len).min(len) {
                    let range = Range::new(start, end);
                    if coverage.overlaps(range) {
                        break;
                    }
                    expand_span(search, id, bitmap, range);
                }
            }
        }
        Some(limit) => {
            let first_gap = match coverage.first_gap() {
                Some(gap) => gap,
                None => return,
            };
            for start in first_gap..len {
                if coverage.get(start) || distortion_distance(prev, Range::single(start)) > limit {
                    continue;
                }
                for end in start..(start + max_len).min(len) {
                    let range = Range::new(start, end);
                    if coverage.overlaps(range) {
                        break;
                    }
                    if !can_return_to_gap(range, first_gap, limit) {
                        continue;
                    }
                    expand_span(search, id, bitmap, range);
                }
            }
        }
    }
}

/// Extend `parent` with every option of `range`
fn expand_span(search: &mut Search<'_>, parent: HypothesisId, bitmap: BitmapId, range: Range) {
    let options = search.options.indices(range);
    if options.is_empty() {
        return;
    }
    let next = search.bitmaps.derive(bitmap, range);
    let next_bitmap = &search.bitmaps[next];
    let estimate = search.future.estimate(next_bitmap);
    let target = next_bitmap.covered_count();

    let config = search.model.config();
    let early = config.early_discarding();
    let base = search.arena.get(parent).score() + estimate;

    for option in options {
        if early {
            let allowed = search.stacks[target].worst_score() + config.early_discarding_threshold;
            let expected = base + search.options.option(option).future_score();
            if expected < allowed {
                search.stats.not_built += 1;
                continue;
            }
        }
        let child = search.extend(parent, option, next, estimate);
        search.add(child);
    }
}
