//! Applying batches to a graph shared with snapshot readers.

use core::ops::{AddAssign, Range};
use core::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{RwLock, RwLockReadGuard};
use serde::{Deserialize, Serialize};

use super::message::Batch;
use crate::concurrency::fork_join::map_ranges;
use crate::config::GraphConfig;
use crate::csr::{CsrFields, CsrSnapshot};
use crate::error::{Error, Result};
use crate::graph::StreamingGraph;
use crate::pool::DEFAULT_BLOCK_SIZE;
use crate::primitives::{bucket_sort_pairs, radix_sort_pairs_with_workers};

/// Counts from applying one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// New edges created.
    pub inserted: usize,
    /// Existing edges refreshed.
    pub updated: usize,
    /// Edges removed.
    pub deleted: usize,
    /// Deletions that found no edge.
    pub missing: usize,
    /// Whether the sender keeps the stream open.
    pub keep_alive: bool,
}

impl AddAssign for BatchOutcome {
    fn add_assign(&mut self, rhs: Self) {
        self.inserted += rhs.inserted;
        self.updated += rhs.updated;
        self.deleted += rhs.deleted;
        self.missing += rhs.missing;
    }
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Insert { dst: usize, weight: i64, time: i64 },
    Delete { dst: usize },
}

/// A [`StreamingGraph`] behind a reader/writer lock.
///
/// [`apply`](Self::apply) holds the write lock for a whole batch, so snapshots taken through
/// [`snapshot`](Self::snapshot) or [`read`](Self::read) see either none or all of it.
pub struct SharedGraph<const B: usize = DEFAULT_BLOCK_SIZE> {
    graph: RwLock<StreamingGraph<B>>,
    applied: AtomicU64,
}

impl<const B: usize> SharedGraph<B> {
    /// Wraps an existing graph.
    pub fn new(graph: StreamingGraph<B>) -> Self {
        Self {
            graph: RwLock::new(graph),
            applied: AtomicU64::new(0),
        }
    }

    /// Wraps a new empty graph.
    ///
    /// # Errors
    /// As [`StreamingGraph::new`].
    pub fn with_config(config: GraphConfig) -> Result<Self> {
        Ok(Self::new(StreamingGraph::new(config)?))
    }

    /// Shared read access to the graph.
    pub fn read(&self) -> RwLockReadGuard<'_, StreamingGraph<B>> {
        self.graph.read()
    }

    /// Number of batches applied so far.
    pub fn batches_applied(&self) -> u64 {
        self.applied.load(Ordering::Relaxed)
    }

    /// Takes a snapshot of every active vertex under the read lock.
    pub fn snapshot(&self, fields: CsrFields, sorted: bool) -> CsrSnapshot {
        self.graph.read().snapshot(fields, sorted)
    }

    /// Unwraps the graph.
    pub fn into_inner(self) -> StreamingGraph<B> {
        self.graph.into_inner()
    }

    /// Applies `batch` under the write lock.
    ///
    /// Undirected batches also apply every action reversed (self-loops once). Actions are
    /// grouped by source vertex; each source's actions run in batch order on one worker,
    /// distinct sources run in parallel. Insertions come before deletions of the same batch.
    ///
    /// # Errors
    /// - [`Error::EdgeTypeOutOfRange`] / [`Error::VertexOutOfRange`]: nothing is applied.
    /// - [`Error::PoolExhausted`]: the batch may be partially applied.
    pub fn apply(&self, batch: &Batch) -> Result<BatchOutcome> {
        let guard = self.graph.write();
        let graph: &StreamingGraph<B> = &guard;
        let etype = check_index(batch.edge_type, graph.edge_types(), |etype, edge_types| {
            Error::EdgeTypeOutOfRange { etype, edge_types }
        })?;

        let ops = expand(batch, graph.max_vertices())?;
        let mut outcome = BatchOutcome {
            keep_alive: batch.keep_alive,
            ..BatchOutcome::default()
        };
        if ops.is_empty() {
            self.applied.fetch_add(1, Ordering::Relaxed);
            return Ok(outcome);
        }

        let workers = graph.config().worker_count();
        let mut keys: Vec<[i64; 2]> = ops
            .iter()
            .enumerate()
            .map(|(k, (src, _))| [*src as i64, k as i64])
            .collect();
        match bucket_sort_pairs(&mut keys) {
            Err(Error::KeyRange { .. }) => {
                radix_sort_pairs_with_workers(&mut keys, graph.config().radix_bits, workers)?;
            }
            other => other?,
        }
        let groups = source_runs(&keys);

        let partials = map_ranges(groups.len(), workers, |_, range| {
            let mut local = BatchOutcome::default();
            for g in &groups[range] {
                for key in &keys[g.clone()] {
                    let (src, op) = ops[key[1] as usize];
                    match op {
                        Op::Insert { dst, weight, time } => {
                            if graph.insert_edge(etype, src, dst, weight, time)? {
                                local.inserted += 1;
                            } else {
                                local.updated += 1;
                            }
                        }
                        Op::Delete { dst } => {
                            if graph.remove_edge(etype, src, dst)? {
                                local.deleted += 1;
                            } else {
                                local.missing += 1;
                            }
                        }
                    }
                }
            }
            Ok::<_, Error>(local)
        });
        for p in partials {
            outcome += p?;
        }

        self.applied.fetch_add(1, Ordering::Relaxed);
        debug_event!(
            etype,
            actions = ops.len(),
            inserted = outcome.inserted,
            updated = outcome.updated,
            deleted = outcome.deleted,
            missing = outcome.missing,
            "batch applied"
        );
        Ok(outcome)
    }
}

fn check_index<F>(value: i64, bound: usize, err: F) -> Result<usize>
where
    F: FnOnce(i64, usize) -> Error,
{
    match usize::try_from(value) {
        Ok(v) if v < bound => Ok(v),
        _ => Err(err(value, bound)),
    }
}

/// Validates every endpoint and lists `(source, op)` in application order.
fn expand(batch: &Batch, nv: usize) -> Result<Vec<(usize, Op)>> {
    let vertex = |v: i64| check_index(v, nv, |vertex, nv| Error::VertexOutOfRange { vertex, nv });
    let mirror = |s: usize, d: usize| batch.make_undirected && s != d;

    let mut ops = Vec::with_capacity(2 * batch.len());
    for ins in &batch.insertions {
        let (s, d) = (vertex(ins.source)?, vertex(ins.destination)?);
        let (weight, time) = (ins.weight, ins.time);
        ops.push((s, Op::Insert { dst: d, weight, time }));
        if mirror(s, d) {
            ops.push((d, Op::Insert { dst: s, weight, time }));
        }
    }
    for del in &batch.deletions {
        let (s, d) = (vertex(del.source)?, vertex(del.destination)?);
        ops.push((s, Op::Delete { dst: d }));
        if mirror(s, d) {
            ops.push((d, Op::Delete { dst: s }));
        }
    }
    Ok(ops)
}

/// Ranges of equal sources in `keys`, which is sorted by source.
fn source_runs(keys: &[[i64; 2]]) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut start = 0;
    for i in 1..=keys.len() {
        if i == keys.len() || keys[i][0] != keys[start][0] {
            runs.push(start..i);
            start = i;
        }
    }
    runs
}
