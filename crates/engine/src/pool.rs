//! Batch decoding on a fixed pool of worker threads
//!
//! Workers pull `(index, line)` jobs from one shared input iterator, each
//! decoding with its own [`Manager`](verso_search::Manager) so that arenas
//! and stacks are reused across the sentences a worker handles. Results
//! reach the writer through an [`OutputCollector`], which restores input
//! order no matter which worker finishes first.
//!
//! A sentence that fails to decode produces an empty line and a warning;
//! only I/O failures on the input or output abort the batch.

use crate::context::DecoderContext;
use crate::output::{format_nbest, format_search_graph, format_translation, OutputFormat};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::iter::Enumerate;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use verso_core::{Error, Result, Sentence};
use verso_search::Translation;

/// Writes blocks strictly in index order as soon as the prefix is complete
pub struct OutputCollector<W: Write> {
    state: Mutex<CollectorState<W>>,
}

struct CollectorState<W> {
    writer: W,
    pending: BTreeMap<usize, String>,
    next: usize,
}

impl<W: Write> OutputCollector<W> {
    /// Collector writing to `writer`, expecting index 0 first
    pub fn new(writer: W) -> Self {
        OutputCollector {
            state: Mutex::new(CollectorState {
                writer,
                pending: BTreeMap::new(),
                next: 0,
            }),
        }
    }

    /// Hand over the block for `index`; everything that is now in order is
    /// written and flushed
    pub fn submit(&self, index: usize, block: String) -> io::Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.pending.insert(index, block);

        let mut wrote = false;
        while let Some(block) = state.pending.remove(&state.next) {
            state.writer.write_all(block.as_bytes())?;
            state.next += 1;
            wrote = true;
        }
        if wrote {
            state.writer.flush()?;
        }
        Ok(())
    }

    /// Blocks waiting for an earlier index
    pub fn pending(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Index the collector writes next
    pub fn next_index(&self) -> usize {
        self.state.lock().next
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.state.into_inner().writer
    }
}

/// Per-sentence blocks written next to the main output, each through its
/// own collector
pub struct SideOutputs<'a, N: Write> {
    /// Moses n-best lists
    pub nbest: Option<&'a OutputCollector<N>>,
    /// Moses search-graph lines
    pub search_graph: Option<&'a OutputCollector<N>>,
}

impl<N: Write> Default for SideOutputs<'_, N> {
    fn default() -> Self {
        SideOutputs {
            nbest: None,
            search_graph: None,
        }
    }
}

/// Summary of a batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Sentences decoded
    pub sentences: usize,
    /// Sentences that failed and produced an empty line
    pub failed: usize,
    /// Sentences whose best hypothesis was not complete
    pub incomplete: usize,
    /// Wall-clock time of the batch
    pub elapsed: Duration,
}

#[derive(Default)]
struct Tally {
    sentences: AtomicUsize,
    failed: AtomicUsize,
    incomplete: AtomicUsize,
}

/// Fixed-size decoding pool over one shared [`DecoderContext`]
pub struct DecodePool {
    context: Arc<DecoderContext>,
    threads: usize,
}

impl DecodePool {
    /// Pool sized by `search.threads`
    pub fn new(context: Arc<DecoderContext>) -> Self {
        let threads = context.model().config().threads.max(1);
        DecodePool { context, threads }
    }

    /// Override the worker count
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// Worker count
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Decode every line and write the formatted results in input order.
    ///
    /// Each sentence's n-best and search-graph blocks go to the matching
    /// collector of `side`, when set.
    pub fn run<I, W, N>(
        &self,
        lines: I,
        format: OutputFormat,
        output: &OutputCollector<W>,
        side: SideOutputs<'_, N>,
    ) -> Result<PoolStats>
    where
        I: Iterator<Item = io::Result<String>> + Send,
        W: Write + Send,
        N: Write + Send,
    {
        self.for_each(lines, |translation| {
            if let Some(nbest) = side.nbest {
                nbest.submit(translation.index, format_nbest(&translation))?;
            }
            if let Some(graph) = side.search_graph {
                graph.submit(translation.index, format_search_graph(&translation))?;
            }
            let mut line = format_translation(&translation, format)?;
            line.push('\n');
            output.submit(translation.index, line)?;
            Ok(())
        })
    }

    /// Decode a batch held in memory, results in input order
    pub fn decode_all(&self, lines: &[&str]) -> Result<Vec<Translation>> {
        let slots: Mutex<Vec<Option<Translation>>> = Mutex::new(vec![None; lines.len()]);
        self.for_each(lines.iter().map(|line| Ok(line.to_string())), |translation| {
            let index = translation.index;
            slots.lock()[index] = Some(translation);
            Ok(())
        })?;
        Ok(slots.into_inner().into_iter().flatten().collect())
    }

    /// Decode every line, handing each translation to `sink` as soon as it
    /// is ready (in completion order)
    pub fn for_each<I, F>(&self, lines: I, sink: F) -> Result<PoolStats>
    where
        I: Iterator<Item = io::Result<String>> + Send,
        F: Fn(Translation) -> Result<()> + Sync,
    {
        let started = Instant::now();
        let queue = Mutex::new(lines.enumerate());
        let failure: Mutex<Option<Error>> = Mutex::new(None);
        let tally = Tally::default();

        std::thread::scope(|scope| -> Result<()> {
            let mut handles = Vec::with_capacity(self.threads);
            for i in 0..self.threads {
                let (queue, sink, failure, tally) = (&queue, &sink, &failure, &tally);
                let handle = std::thread::Builder::new()
                    .name(format!("verso-worker-{}", i))
                    .spawn_scoped(scope, move || self.work(queue, sink, failure, tally))?;
                handles.push(handle);
            }
            for handle in handles {
                if handle.join().is_err() {
                    record(&failure, Error::config("decoding worker panicked"));
                }
            }
            Ok(())
        })?;

        if let Some(err) = failure.into_inner() {
            return Err(err);
        }
        let stats = PoolStats {
            sentences: tally.sentences.into_inner(),
            failed: tally.failed.into_inner(),
            incomplete: tally.incomplete.into_inner(),
            elapsed: started.elapsed(),
        };
        info!(
            sentences = stats.sentences,
            failed = stats.failed,
            incomplete = stats.incomplete,
            threads = self.threads,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "Decoded batch"
        );
        Ok(stats)
    }

    fn work<I, F>(&self, queue: &Mutex<Enumerate<I>>, sink: &F, failure: &Mutex<Option<Error>>, tally: &Tally)
    where
        I: Iterator<Item = io::Result<String>>,
        F: Fn(Translation) -> Result<()>,
    {
        let mut manager = self.context.manager();
        loop {
            if failure.lock().is_some() {
                return;
            }
            let job = queue.lock().next();
            let (index, line) = match job {
                None => break,
                Some((_, Err(e))) => {
                    record(failure, e.into());
                    return;
                }
                Some((index, Ok(line))) => (index, line),
            };

            let translation = match manager.decode(index, &Sentence::parse(&line)) {
                Ok(translation) => translation,
                Err(e) => {
                    warn!(sentence = index, error = %e, "Sentence failed, writing empty line");
                    tally.failed.fetch_add(1, Ordering::Relaxed);
                    Translation::empty(index)
                }
            };
            if !translation.complete {
                tally.incomplete.fetch_add(1, Ordering::Relaxed);
            }
            tally.sentences.fetch_add(1, Ordering::Relaxed);

            if let Err(e) = sink(translation) {
                record(failure, e);
                return;
            }
        }
        debug!(arena = manager.arena_capacity(), "Worker finished");
    }
}

/// Keep the first failure only
fn record(failure: &Mutex<Option<Error>>, err: Error) {
    let mut slot = failure.lock();
    if slot.is_none() {
        *slot = Some(err);
    }
}
