//! The pool-backed streaming graph.

use core::sync::atomic::{AtomicUsize, Ordering};

use crate::config::GraphConfig;
use crate::error::{Error, Result};
use crate::pool::{BlockId, BlockPool, ChainEdges, Edge, DEFAULT_BLOCK_SIZE};

/// A graph whose per-vertex, per-type adjacency lists are chains of `B`-slot edge blocks.
///
/// All structural state is atomic, so every method takes `&self`. Mutations of one
/// `(vertex, type)` chain must come from one thread at a time; [`SharedGraph`] arranges
/// that for batch ingestion. Readers may run alongside mutation and observe a possibly
/// stale, never torn, view.
///
/// [`SharedGraph`]: crate::batch::SharedGraph
pub struct StreamingGraph<const B: usize = DEFAULT_BLOCK_SIZE> {
    config: GraphConfig,
    heads: Box<[AtomicUsize]>,
    out_degree: Box<[AtomicUsize]>,
    in_degree: Box<[AtomicUsize]>,
    active: AtomicUsize,
    pool: BlockPool<B>,
}

/// Graph with the default block capacity.
pub type Graph = StreamingGraph<DEFAULT_BLOCK_SIZE>;

fn atomic_zeros(len: usize) -> Box<[AtomicUsize]> {
    (0..len).map(|_| AtomicUsize::new(0)).collect()
}

impl<const B: usize> StreamingGraph<B> {
    /// Creates an empty graph.
    ///
    /// # Errors
    /// [`Error::InvalidConfig`] if `config` does not validate.
    pub fn new(config: GraphConfig) -> Result<Self> {
        config.validate()?;
        let nv = config.max_vertices;
        Ok(Self {
            heads: atomic_zeros(nv * config.edge_types),
            out_degree: atomic_zeros(nv),
            in_degree: atomic_zeros(nv),
            active: AtomicUsize::new(0),
            pool: BlockPool::new(config.max_blocks),
            config,
        })
    }

    /// Configuration the graph was built with.
    #[inline]
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Number of vertex slots.
    #[inline]
    pub fn max_vertices(&self) -> usize {
        self.config.max_vertices
    }

    /// Number of edge types.
    #[inline]
    pub fn edge_types(&self) -> usize {
        self.config.edge_types
    }

    /// One past the highest vertex id that has ever been an edge endpoint.
    #[inline]
    pub fn nv(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }

    /// Total number of live edges, summed from the out-degree counters.
    pub fn ne(&self) -> usize {
        self.out_degree.iter().map(|d| d.load(Ordering::Relaxed)).sum()
    }

    /// The block pool backing this graph.
    #[inline]
    pub fn pool(&self) -> &BlockPool<B> {
        &self.pool
    }

    pub(crate) fn check_vertex(&self, v: usize) -> Result<()> {
        if v < self.config.max_vertices {
            Ok(())
        } else {
            Err(Error::VertexOutOfRange {
                vertex: v as i64,
                nv: self.config.max_vertices,
            })
        }
    }

    pub(crate) fn check_type(&self, etype: usize) -> Result<()> {
        if etype < self.config.edge_types {
            Ok(())
        } else {
            Err(Error::EdgeTypeOutOfRange {
                etype: etype as i64,
                edge_types: self.config.edge_types,
            })
        }
    }

    #[inline]
    pub(crate) fn head_cell(&self, vertex: usize, etype: usize) -> &AtomicUsize {
        &self.heads[vertex * self.config.edge_types + etype]
    }

    pub(crate) fn note_endpoint(&self, v: usize) {
        self.active.fetch_max(v + 1, Ordering::Relaxed);
    }

    pub(crate) fn add_degrees(&self, src: usize, dst: usize) {
        self.out_degree[src].fetch_add(1, Ordering::Relaxed);
        self.in_degree[dst].fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn sub_degrees(&self, src: usize, dst: usize) {
        self.out_degree[src].fetch_sub(1, Ordering::Relaxed);
        self.in_degree[dst].fetch_sub(1, Ordering::Relaxed);
    }

    /// Head block of the `(vertex, etype)` chain; `None` for an empty chain or an
    /// out-of-range pair.
    pub fn chain_head(&self, vertex: usize, etype: usize) -> Option<BlockId> {
        if vertex >= self.config.max_vertices || etype >= self.config.edge_types {
            return None;
        }
        BlockId::from_raw(self.head_cell(vertex, etype).load(Ordering::Acquire))
    }

    /// Block linked after `block`.
    pub fn chain_next(&self, block: BlockId) -> Option<BlockId> {
        self.pool.get(block).next()
    }

    /// Occupied slots of the `(vertex, etype)` chain.
    pub fn iterate_chain(&self, vertex: usize, etype: usize) -> ChainEdges<'_, B> {
        ChainEdges::new(&self.pool, self.chain_head(vertex, etype))
    }

    /// Out-degree counter of `vertex` (all types).
    ///
    /// # Panics
    /// Panics if `vertex >= max_vertices()`.
    #[inline]
    pub fn out_degree(&self, vertex: usize) -> usize {
        self.out_degree[vertex].load(Ordering::Relaxed)
    }

    /// In-degree counter of `vertex` (all types).
    ///
    /// # Panics
    /// Panics if `vertex >= max_vertices()`.
    #[inline]
    pub fn in_degree(&self, vertex: usize) -> usize {
        self.in_degree[vertex].load(Ordering::Relaxed)
    }

    /// Calls `f(etype, edge)` for every live out-edge of `vertex`, type by type.
    pub fn for_each_successor<F>(&self, vertex: usize, mut f: F)
    where
        F: FnMut(usize, Edge),
    {
        for etype in 0..self.config.edge_types {
            for c in self.iterate_chain(vertex, etype) {
                f(etype, c.edge);
            }
        }
    }

    /// Looks up the `(src, dst)` edge of type `etype`.
    pub fn find_edge(&self, etype: usize, src: usize, dst: usize) -> Option<Edge> {
        self.iterate_chain(src, etype)
            .find(|c| c.edge.neighbor == dst as i64)
            .map(|c| c.edge)
    }

    /// Inserts or refreshes the `(src, dst)` edge of type `etype`.
    ///
    /// An existing edge gets `weight` and has `time_recent` raised to `time`. Otherwise the
    /// edge goes into the first free slot of the chain, or into a new block linked at the
    /// chain head. Returns `true` when a new edge was created.
    ///
    /// # Errors
    /// - [`Error::VertexOutOfRange`] / [`Error::EdgeTypeOutOfRange`] for bad arguments.
    /// - [`Error::PoolExhausted`] if a new block is needed and none is left.
    pub fn insert_edge(
        &self,
        etype: usize,
        src: usize,
        dst: usize,
        weight: i64,
        time: i64,
    ) -> Result<bool> {
        self.check_vertex(src)?;
        self.check_vertex(dst)?;
        self.check_type(etype)?;

        let head_cell = self.head_cell(src, etype);
        let head = BlockId::from_raw(head_cell.load(Ordering::Acquire));
        let mut free: Option<(BlockId, usize)> = None;

        for (id, block) in self.pool.blocks_from(head) {
            let high = block.high();
            for i in 0..high {
                let slot = block.slot(i);
                let n = slot.neighbor();
                if n == dst as i64 {
                    slot.touch(weight, time);
                    block.note_touch(time);
                    return Ok(false);
                }
                if n < 0 && free.is_none() {
                    free = Some((id, i));
                }
            }
            if free.is_none() && high < B {
                free = Some((id, high));
            }
        }

        let edge = Edge::at(dst as i64, weight, time);
        match free {
            Some((id, i)) => {
                let block = self.pool.get(id);
                block.slot(i).store(edge);
                block.note_insert(i, time, time);
            }
            None => {
                let id = self.pool.alloc(src, etype)?;
                let block = self.pool.get(id);
                block.slot(0).store(edge);
                block.note_insert(0, time, time);
                block.set_next(head);
                head_cell.store(BlockId::raw(Some(id)), Ordering::Release);
            }
        }
        self.add_degrees(src, dst);
        self.note_endpoint(src.max(dst));
        Ok(true)
    }

    /// Removes the `(src, dst)` edge of type `etype`, leaving a hole.
    ///
    /// Returns `true` if an edge was removed.
    ///
    /// # Errors
    /// [`Error::VertexOutOfRange`] / [`Error::EdgeTypeOutOfRange`] for bad arguments.
    pub fn remove_edge(&self, etype: usize, src: usize, dst: usize) -> Result<bool> {
        self.check_vertex(src)?;
        self.check_vertex(dst)?;
        self.check_type(etype)?;

        let Some(hit) = self
            .iterate_chain(src, etype)
            .find(|c| c.edge.neighbor == dst as i64)
        else {
            return Ok(false);
        };
        let block = self.pool.get(hit.block);
        block.slot(hit.slot).clear();
        block.note_remove();
        self.sub_degrees(src, dst);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(nv: usize, types: usize) -> StreamingGraph<2> {
        StreamingGraph::new(GraphConfig {
            max_vertices: nv,
            edge_types: types,
            max_blocks: 64,
            ..GraphConfig::default()
        })
        .unwrap()
    }

    fn neighbors<const B: usize>(g: &StreamingGraph<B>, v: usize, t: usize) -> Vec<i64> {
        let mut out: Vec<_> = g.iterate_chain(v, t).map(|c| c.edge.neighbor).collect();
        out.sort_unstable();
        out
    }

    #[test]
    fn insert_creates_then_refreshes() {
        let g = small(4, 1);
        assert!(g.insert_edge(0, 0, 1, 5, 10).unwrap());
        assert!(!g.insert_edge(0, 0, 1, 7, 20).unwrap());
        let e = g.find_edge(0, 0, 1).unwrap();
        assert_eq!((e.weight, e.time_first, e.time_recent), (7, 10, 20));
        assert_eq!(g.out_degree(0), 1);
        assert_eq!(g.in_degree(1), 1);
        assert_eq!(g.nv(), 2);
    }

    #[test]
    fn chain_grows_by_whole_blocks() {
        let g = small(8, 1);
        for d in 1..6 {
            g.insert_edge(0, 0, d, 1, d as i64).unwrap();
        }
        assert_eq!(g.pool().len(), 3);
        assert_eq!(neighbors(&g, 0, 0), vec![1, 2, 3, 4, 5]);
        assert_eq!(g.ne(), 5);

        let mut blocks = 0;
        let mut at = g.chain_head(0, 0);
        while let Some(id) = at {
            blocks += 1;
            at = g.chain_next(id);
        }
        assert_eq!(blocks, 3);
    }

    #[test]
    fn removal_leaves_reusable_hole() {
        let g = small(8, 1);
        for d in 1..5 {
            g.insert_edge(0, 0, d, 1, 1).unwrap();
        }
        assert!(g.remove_edge(0, 0, 2).unwrap());
        assert!(!g.remove_edge(0, 0, 2).unwrap());
        assert_eq!(g.out_degree(0), 3);
        assert_eq!(g.in_degree(2), 0);

        let before = g.pool().len();
        g.insert_edge(0, 0, 7, 1, 1).unwrap();
        assert_eq!(g.pool().len(), before);
        assert_eq!(neighbors(&g, 0, 0), vec![1, 3, 4, 7]);
    }

    #[test]
    fn types_have_separate_chains() {
        let g = small(4, 2);
        g.insert_edge(0, 1, 2, 1, 1).unwrap();
        g.insert_edge(1, 1, 2, 1, 1).unwrap();
        g.insert_edge(1, 1, 3, 1, 1).unwrap();
        assert_eq!(neighbors(&g, 1, 0), vec![2]);
        assert_eq!(neighbors(&g, 1, 1), vec![2, 3]);
        assert_eq!(g.out_degree(1), 3);

        let mut seen = Vec::new();
        g.for_each_successor(1, |t, e| seen.push((t, e.neighbor)));
        seen.sort_unstable();
        assert_eq!(seen, vec![(0, 2), (1, 2), (1, 3)]);
    }

    #[test]
    fn rejects_out_of_range_arguments() {
        let g = small(4, 1);
        assert!(matches!(
            g.insert_edge(0, 4, 0, 1, 1),
            Err(Error::VertexOutOfRange { vertex: 4, nv: 4 })
        ));
        assert!(matches!(
            g.insert_edge(1, 0, 0, 1, 1),
            Err(Error::EdgeTypeOutOfRange { etype: 1, .. })
        ));
        assert_eq!(g.chain_head(9, 0), None);
        assert_eq!(g.iterate_chain(9, 0).count(), 0);
    }

    #[test]
    fn pool_exhaustion_is_reported() {
        let g = StreamingGraph::<1>::new(GraphConfig {
            max_vertices: 4,
            max_blocks: 2,
            ..GraphConfig::default()
        })
        .unwrap();
        g.insert_edge(0, 0, 1, 1, 1).unwrap();
        g.insert_edge(0, 0, 2, 1, 1).unwrap();
        let err = g.insert_edge(0, 0, 3, 1, 1).unwrap_err();
        assert!(err.is_resource());
        assert_eq!(g.out_degree(0), 2);
    }
}
