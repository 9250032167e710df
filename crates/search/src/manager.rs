//! Per-sentence decoding driver
//!
//! A [`Manager`] owns every per-sentence working structure: the bitmap
//! interner, the hypothesis arena and one stack per coverage cardinality.
//! They are reset between sentences, so a worker that keeps one manager
//! alive reuses their allocations for its whole batch.

use crate::future_cost::FutureCosts;
use crate::hypothesis::HypothesisArena;
use crate::model::Model;
use crate::nbest::{self, NBestRequest};
use crate::options::TranslationOptions;
use crate::search::Search;
use crate::search_graph::{self, SearchGraphNode};
use crate::stack::HypothesisStack;
use crate::stats::SentenceStats;
use crate::translation::{Renderer, Translation};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use verso_core::{Bitmaps, Result, Sentence};

/// Decodes sentences one at a time against a shared [`Model`]
pub struct Manager {
    model: Arc<Model>,
    bitmaps: Bitmaps,
    arena: HypothesisArena,
    stacks: Vec<HypothesisStack>,
    options: TranslationOptions,
    future: FutureCosts,
    stats: SentenceStats,
}

impl Manager {
    /// Manager with empty working structures
    pub fn new(model: Arc<Model>) -> Self {
        Manager {
            model,
            bitmaps: Bitmaps::new(0),
            arena: HypothesisArena::new(),
            stacks: Vec::new(),
            options: TranslationOptions::new(),
            future: FutureCosts::new(),
            stats: SentenceStats::default(),
        }
    }

    /// Shared model
    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    /// Counters of the most recent decode
    pub fn stats(&self) -> &SentenceStats {
        &self.stats
    }

    /// Hypothesis slots currently allocated, live or recycled
    pub fn arena_capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Search graph of the most recent decode.
    ///
    /// Recombination arcs only appear when the model keeps them
    /// (`search_graph` or n-best enabled).
    pub fn search_graph(&self) -> Vec<SearchGraphNode> {
        search_graph::collect(&self.arena, &self.bitmaps, &self.stacks, &self.options)
    }

    /// Translate `sentence`, which sits at `index` in its batch.
    ///
    /// A sentence without any surviving hypothesis yields
    /// [`Translation::empty`] rather than an error.
    pub fn decode(&mut self, index: usize, sentence: &Sentence) -> Result<Translation> {
        let started = Instant::now();
        let model = Arc::clone(&self.model);
        let config = model.config();
        let len = sentence.len();

        self.reset(len);
        self.options.collect(sentence, &model)?;
        self.future.compute(&self.options, len);

        let outcome = Search::new(
            &model,
            sentence,
            &self.options,
            &self.future,
            &mut self.bitmaps,
            &mut self.arena,
            &mut self.stacks,
            &mut self.stats,
        )
        .run();

        let stack = &self.stacks[outcome.last_stack];
        let mut translation = match stack.best(&self.arena) {
            None => {
                warn!(sentence = index, len, "No hypothesis survived the search");
                Translation::empty(index)
            }
            Some(best) => {
                let renderer = Renderer {
                    arena: &self.arena,
                    options: &self.options,
                    registry: model.registry(),
                };
                let hypo = self.arena.get(best);
                let complete = !outcome.interrupted && self.bitmaps[hypo.bitmap()].is_complete();

                let mut edges = Vec::with_capacity(len + 1);
                let mut next = Some(best);
                while let Some(id) = next {
                    edges.push(id);
                    next = self.arena.get(id).parent();
                }
                let derivation = renderer.derivation(&edges, hypo.scores());

                let nbest = if config.nbest_size > 0 && complete {
                    let request = NBestRequest {
                        count: config.nbest_size,
                        distinct: config.nbest_distinct,
                        factor: config.nbest_factor,
                    };
                    let finals = stack.sorted(&self.arena);
                    nbest::extract(&self.arena, &finals, request, |edges| renderer.surface(edges))
                        .iter()
                        .map(|path| renderer.derivation(path.edges(), path.scores()))
                        .collect()
                } else {
                    Vec::new()
                };

                Translation::from_best(index, complete, derivation, nbest)
            }
        };

        if config.search_graph {
            translation.search_graph = self.search_graph();
        }

        self.stats.elapsed = started.elapsed();
        self.stats.log(index);
        info!(
            sentence = index,
            len,
            score = translation.score,
            complete = translation.complete,
            elapsed_ms = self.stats.elapsed.as_millis() as u64,
            "Decoded sentence"
        );
        translation.stats = self.stats.clone();
        Ok(translation)
    }

    fn reset(&mut self, len: usize) {
        let config = self.model.config();
        let keep_arcs = config.keeps_arcs();
        self.bitmaps.reset(len);
        self.arena.reset();
        self.stats.reset();

        self.stacks.truncate(len + 1);
        for stack in &mut self.stacks {
            stack.reset(config.stack_size, config.beam_threshold, keep_arcs);
        }
        while self.stacks.len() < len + 1 {
            self.stacks
                .push(HypothesisStack::new(config.stack_size, config.beam_threshold, keep_arcs));
        }
    }
}
