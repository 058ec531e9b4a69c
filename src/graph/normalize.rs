//! In-place reordering of one `(vertex, type)` adjacency chain.
//!
//! The chain's slots, `B` per block in link order, form one logical sequence. Odd-even
//! transposition rounds sort that sequence by neighbor id, swapping whole slots, including
//! pairs that straddle a block boundary. Nothing is relinked or reallocated. Empty slots
//! (`-1`) sort to the front.
//!
//! Afterwards every block's metadata is recomputed from its slots, so the cached
//! `high`/`num_edges`/stamps equal a linear re-scan.

use serde::{Deserialize, Serialize};

use super::streaming::StreamingGraph;
use crate::error::Result;
use crate::pool::{BlockMeta, EdgeBlock, EdgeSlot};

/// What one [`StreamingGraph::sort_edge_list`] call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeReport {
    /// Blocks in the chain.
    pub blocks: usize,
    /// Odd-even rounds run, including the final swap-free one.
    pub rounds: usize,
    /// Slot swaps performed.
    pub swaps: usize,
    /// All-zero slots turned into empty slots.
    pub blanks_cleared: usize,
}

/// Slot `p` of the logical sequence formed by the chain's blocks.
#[inline]
fn slot_at<'b, const B: usize>(chain: &[&'b EdgeBlock<B>], p: usize) -> &'b EdgeSlot {
    chain[p / B].slot(p % B)
}

impl<const B: usize> StreamingGraph<B> {
    /// Sorts the `(vertex, etype)` chain by neighbor id and recomputes block metadata.
    ///
    /// A live slot whose four words are all zero is treated as a blank and cleared; the
    /// vertex's out-degree and vertex 0's in-degree drop accordingly. An empty chain is
    /// left untouched.
    ///
    /// Must not run concurrently with any mutation of the same chain.
    ///
    /// # Errors
    /// [`Error::VertexOutOfRange`](crate::Error::VertexOutOfRange) /
    /// [`Error::EdgeTypeOutOfRange`](crate::Error::EdgeTypeOutOfRange) for bad arguments.
    pub fn sort_edge_list(&self, vertex: usize, etype: usize) -> Result<NormalizeReport> {
        self.check_vertex(vertex)?;
        self.check_type(etype)?;

        let chain: Vec<&EdgeBlock<B>> = self
            .pool()
            .blocks_from(self.chain_head(vertex, etype))
            .map(|(_, b)| b)
            .skip_while(|b| b.etype() != etype as i64)
            .take_while(|b| b.etype() == etype as i64)
            .collect();

        let mut report = NormalizeReport {
            blocks: chain.len(),
            ..NormalizeReport::default()
        };
        if chain.is_empty() {
            return Ok(report);
        }

        let len = chain.len() * B;
        let mut warned = false;
        loop {
            let mut swapped = 0;
            for parity in [1usize, 0] {
                let mut p = parity;
                while p + 1 < len {
                    let (a, b) = (slot_at(&chain, p), slot_at(&chain, p + 1));
                    if a.neighbor() > b.neighbor() {
                        let (ea, eb) = (a.load(), b.load());
                        a.store(eb);
                        b.store(ea);
                        swapped += 1;
                    }
                    p += 2;
                }
            }
            report.rounds += 1;
            report.swaps += swapped;
            if swapped == 0 {
                break;
            }
            if report.rounds > len && !warned {
                warned = true;
                warn_event!(vertex, etype, rounds = report.rounds, slots = len, "edge list sort exceeded its round bound");
            }
        }

        for block in &chain {
            let mut meta = BlockMeta::EMPTY;
            for (i, s) in block.slots().iter().enumerate() {
                let e = s.load();
                if !e.is_occupied() {
                    continue;
                }
                if e.is_zero_blank() {
                    s.clear();
                    self.sub_degrees(vertex, 0);
                    report.blanks_cleared += 1;
                    continue;
                }
                meta.num_edges += 1;
                meta.high = i + 1;
                meta.small_stamp = meta.small_stamp.min(e.time_first);
                meta.large_stamp = meta.large_stamp.max(e.time_recent);
            }
            block.store_meta(meta);
        }

        trace_event!(vertex, etype, blocks = report.blocks, rounds = report.rounds, swaps = report.swaps, "edge list sorted");
        Ok(report)
    }

    /// Runs [`sort_edge_list`](Self::sort_edge_list) over every chain of every vertex below
    /// [`nv`](Self::nv), one vertex per task.
    ///
    /// # Errors
    /// Propagates the first per-chain error.
    pub fn normalize_all(&self) -> Result<NormalizeReport> {
        let reports = crate::concurrency::fork_join::map_indices(self.nv(), |v| {
            (0..self.edge_types())
                .map(|t| self.sort_edge_list(v, t))
                .collect::<Result<Vec<_>>>()
        });
        let mut total = NormalizeReport::default();
        for r in reports {
            for one in r? {
                total.blocks += one.blocks;
                total.rounds += one.rounds;
                total.swaps += one.swaps;
                total.blanks_cleared += one.blanks_cleared;
            }
        }
        Ok(total)
    }

    /// Occupied neighbors of the `(vertex, etype)` chain in traversal order.
    pub fn chain_neighbors(&self, vertex: usize, etype: usize) -> Vec<i64> {
        self.iterate_chain(vertex, etype)
            .map(|c| c.edge.neighbor)
            .collect()
    }
}
