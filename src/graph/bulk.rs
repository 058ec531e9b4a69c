//! Bulk loading of a CSR edge set into the pool.

use core::sync::atomic::Ordering;

use super::streaming::StreamingGraph;
use crate::concurrency::fork_join::map_indices;
use crate::error::{Error, Result};
use crate::pool::{BlockId, BlockMeta, Edge};

/// Column arrays of an initial edge set, all indexed by CSR position.
#[derive(Debug, Clone, Copy)]
pub struct InitialEdges<'a> {
    /// Row boundaries, length `nv + 1`.
    pub offsets: &'a [usize],
    /// Destinations.
    pub ind: &'a [i64],
    /// Weights.
    pub weight: &'a [i64],
    /// Creation timestamps.
    pub time_first: &'a [i64],
    /// Last-touch timestamps.
    pub time_recent: &'a [i64],
}

impl InitialEdges<'_> {
    fn validate(&self, max_vertices: usize) -> Result<()> {
        let Some(&ne) = self.offsets.last() else {
            return Err(Error::empty("set_initial_edges"));
        };
        let nv = self.offsets.len() - 1;
        if nv > max_vertices {
            return Err(Error::VertexOutOfRange {
                vertex: nv as i64 - 1,
                nv: max_vertices,
            });
        }
        Error::check_len("ind", ne, self.ind.len())?;
        Error::check_len("weight", ne, self.weight.len())?;
        Error::check_len("time_first", ne, self.time_first.len())?;
        Error::check_len("time_recent", ne, self.time_recent.len())?;
        if self.offsets[0] != 0 {
            return Err(Error::InvalidOffsets { at: 0 });
        }
        if let Some(at) = self.offsets.windows(2).position(|w| w[0] > w[1]) {
            return Err(Error::InvalidOffsets { at: at + 1 });
        }
        if let Some(&bad) = self.ind.iter().find(|&&d| d < 0 || d as usize >= max_vertices) {
            return Err(Error::VertexOutOfRange {
                vertex: bad,
                nv: max_vertices,
            });
        }
        Ok(())
    }
}

impl<const B: usize> StreamingGraph<B> {
    /// Loads `edges` as the type-`etype` adjacency of vertices `0..offsets.len()-1`.
    ///
    /// Each row is cut into runs of `B` edges, one freshly allocated block per run, filled
    /// with exact metadata and linked in row order in front of any existing chain. Rows are
    /// loaded in parallel.
    ///
    /// # Errors
    /// - [`Error::LengthMismatch`] if a column disagrees with `offsets`.
    /// - [`Error::VertexOutOfRange`] for rows or destinations beyond `max_vertices()`.
    /// - [`Error::EdgeTypeOutOfRange`] for a bad `etype`.
    /// - [`Error::PoolExhausted`] if the pool cannot hold the edge set.
    pub fn set_initial_edges(&self, etype: usize, edges: &InitialEdges<'_>) -> Result<()> {
        self.check_type(etype)?;
        edges.validate(self.max_vertices())?;
        let nv = edges.offsets.len() - 1;

        let loaded: Vec<Result<()>> = map_indices(nv, |v| self.load_row(etype, v, edges));
        loaded.into_iter().collect::<Result<()>>()?;

        if let Some(top) = edges.ind.iter().copied().max() {
            self.note_endpoint(top as usize);
        }
        if let Some(last) = (0..nv).rev().find(|&v| edges.offsets[v + 1] > edges.offsets[v]) {
            self.note_endpoint(last);
        }
        debug_event!(etype, nv, ne = edges.ind.len(), blocks = self.pool().len(), "initial edges loaded");
        Ok(())
    }

    fn load_row(&self, etype: usize, v: usize, edges: &InitialEdges<'_>) -> Result<()> {
        let row = edges.offsets[v]..edges.offsets[v + 1];
        if row.is_empty() {
            return Ok(());
        }
        let head_cell = self.head_cell(v, etype);
        let mut next = BlockId::from_raw(head_cell.load(Ordering::Acquire));

        // Last run first, so that prepending leaves the runs in row order.
        let starts: Vec<usize> = row.clone().step_by(B).collect();
        for &start in starts.iter().rev() {
            let end = (start + B).min(row.end);
            let id = self.pool().alloc(v, etype)?;
            let block = self.pool().get(id);
            let mut meta = BlockMeta::EMPTY;
            for (i, k) in (start..end).enumerate() {
                let edge = Edge {
                    neighbor: edges.ind[k],
                    weight: edges.weight[k],
                    time_first: edges.time_first[k],
                    time_recent: edges.time_recent[k],
                };
                block.slot(i).store(edge);
                meta.small_stamp = meta.small_stamp.min(edge.time_first);
                meta.large_stamp = meta.large_stamp.max(edge.time_recent);
                self.add_degrees(v, edge.neighbor as usize);
            }
            meta.high = end - start;
            meta.num_edges = end - start;
            block.store_meta(meta);
            block.set_next(next);
            next = Some(id);
        }
        head_cell.store(BlockId::raw(next), Ordering::Release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphConfig;

    fn graph(nv: usize) -> StreamingGraph<2> {
        StreamingGraph::new(GraphConfig {
            max_vertices: nv,
            max_blocks: 32,
            ..GraphConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn rows_become_ordered_chains() {
        let g = graph(4);
        let offsets = [0, 5, 5, 6];
        let ind = [1, 2, 3, 0, 2, 0];
        let w = [1; 6];
        let t = [10, 20, 30, 40, 50, 60];
        g.set_initial_edges(
            0,
            &InitialEdges {
                offsets: &offsets,
                ind: &ind,
                weight: &w,
                time_first: &t,
                time_recent: &t,
            },
        )
        .unwrap();

        let row0: Vec<_> = g.iterate_chain(0, 0).map(|c| c.edge.neighbor).collect();
        assert_eq!(row0, vec![1, 2, 3, 0, 2]);
        assert_eq!(g.out_degree(0), 5);
        assert_eq!(g.out_degree(1), 0);
        assert_eq!(g.in_degree(2), 2);
        assert_eq!(g.nv(), 4);
        assert_eq!(g.pool().len(), 4);

        let head = g.pool().get(g.chain_head(0, 0).unwrap());
        assert_eq!(head.meta(), head.scan_meta());
        assert_eq!((head.small_stamp(), head.large_stamp()), (10, 20));
    }

    #[test]
    fn rejects_bad_columns() {
        let g = graph(2);
        let offsets = [0, 1];
        let err = g
            .set_initial_edges(
                0,
                &InitialEdges {
                    offsets: &offsets,
                    ind: &[5],
                    weight: &[1],
                    time_first: &[1],
                    time_recent: &[1],
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::VertexOutOfRange { vertex: 5, .. }));

        let err = g
            .set_initial_edges(
                0,
                &InitialEdges {
                    offsets: &offsets,
                    ind: &[1],
                    weight: &[],
                    time_first: &[1],
                    time_recent: &[1],
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { what: "weight", .. }));
    }
}
