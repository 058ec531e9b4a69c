//! Owned CSR snapshots and extraction from a [`StreamingGraph`].

use core::ops::Range;

use serde::{Deserialize, Serialize};

use crate::concurrency::fork_join::{for_each_mut, map_indices};
use crate::error::{Error, Result};
use crate::graph::StreamingGraph;
use crate::pool::Edge;
use crate::primitives::{find_in_sorted, offsets_from_degrees, prefix_sum::split_mut};

/// Which optional columns an extraction fills in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CsrFields {
    /// Edge weights.
    pub weight: bool,
    /// Creation timestamps.
    pub time_first: bool,
    /// Last-touch timestamps.
    pub time_recent: bool,
    /// Edge types.
    pub etype: bool,
}

impl CsrFields {
    /// Destinations only.
    pub const NONE: Self = Self {
        weight: false,
        time_first: false,
        time_recent: false,
        etype: false,
    };

    /// Every column.
    pub const ALL: Self = Self {
        weight: true,
        time_first: true,
        time_recent: true,
        etype: true,
    };
}

/// A static compressed-sparse-row copy of a graph's out-edges.
///
/// `offsets` has `nv + 1` entries; row `v` is `offsets[v]..offsets[v + 1]` in `ind` and in
/// every present optional column. The snapshot owns its arrays and keeps no link to the
/// graph it came from.
///
/// | Operation | Complexity | Notes |
/// |-----------|------------|-------|
/// | `degree` | \(O(1)\) | |
/// | `neighbors` | \(O(1)\) | Borrowed slice |
/// | `has_edge` | \(O(\log d)\) sorted, \(O(d)\) unsorted | |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsrSnapshot {
    /// Row boundaries.
    pub offsets: Vec<usize>,
    /// Destination of each edge.
    pub ind: Vec<i64>,
    /// Edge weights, if requested.
    pub weight: Option<Vec<i64>>,
    /// Creation timestamps, if requested.
    pub time_first: Option<Vec<i64>>,
    /// Last-touch timestamps, if requested.
    pub time_recent: Option<Vec<i64>>,
    /// Edge types, if requested.
    pub etype: Option<Vec<i64>>,
    /// Whether every row is ordered by destination.
    pub sorted: bool,
}

/// Mutable view of one row across every present column.
struct RowMut<'a> {
    ind: &'a mut [i64],
    weight: Option<&'a mut [i64]>,
    time_first: Option<&'a mut [i64]>,
    time_recent: Option<&'a mut [i64]>,
    etype: Option<&'a mut [i64]>,
}

impl RowMut<'_> {
    fn write(&mut self, k: usize, etype: usize, e: Edge) {
        self.ind[k] = e.neighbor;
        if let Some(w) = self.weight.as_deref_mut() {
            w[k] = e.weight;
        }
        if let Some(t) = self.time_first.as_deref_mut() {
            t[k] = e.time_first;
        }
        if let Some(t) = self.time_recent.as_deref_mut() {
            t[k] = e.time_recent;
        }
        if let Some(t) = self.etype.as_deref_mut() {
            t[k] = etype as i64;
        }
    }

    /// Reorders the row by destination, carrying every column through the same permutation.
    fn sort_by_destination(&mut self) {
        let len = self.ind.len();
        if len < 2 {
            return;
        }
        let mut perm: Vec<usize> = (0..len).collect();
        perm.sort_by_key(|&j| self.ind[j]);
        let mut scratch = vec![0i64; len];
        permute(self.ind, &perm, &mut scratch);
        for col in [
            self.weight.as_deref_mut(),
            self.time_first.as_deref_mut(),
            self.time_recent.as_deref_mut(),
            self.etype.as_deref_mut(),
        ]
        .into_iter()
        .flatten()
        {
            permute(col, &perm, &mut scratch);
        }
    }
}

fn permute(col: &mut [i64], perm: &[usize], scratch: &mut [i64]) {
    for (dst, &src) in scratch.iter_mut().zip(perm) {
        *dst = col[src];
    }
    col.copy_from_slice(scratch);
}

fn split_column<'a>(
    col: Option<&'a mut Vec<i64>>,
    ranges: &[Range<usize>],
) -> Vec<Option<&'a mut [i64]>> {
    match col {
        Some(c) => split_mut(c, ranges).into_iter().map(Some).collect(),
        None => ranges.iter().map(|_| None).collect(),
    }
}

impl CsrSnapshot {
    fn zeroed(offsets: Vec<usize>, fields: CsrFields) -> Self {
        let ne = offsets.last().copied().unwrap_or(0);
        let column = |on: bool| on.then(|| vec![0i64; ne]);
        Self {
            ind: vec![0; ne],
            weight: column(fields.weight),
            time_first: column(fields.time_first),
            time_recent: column(fields.time_recent),
            etype: column(fields.etype),
            offsets,
            sorted: false,
        }
    }

    fn rows(&mut self) -> Vec<RowMut<'_>> {
        let ranges: Vec<Range<usize>> = self.offsets.windows(2).map(|w| w[0]..w[1]).collect();
        let ind = split_mut(&mut self.ind, &ranges);
        let weight = split_column(self.weight.as_mut(), &ranges);
        let time_first = split_column(self.time_first.as_mut(), &ranges);
        let time_recent = split_column(self.time_recent.as_mut(), &ranges);
        let etype = split_column(self.etype.as_mut(), &ranges);

        ind.into_iter()
            .zip(weight)
            .zip(time_first)
            .zip(time_recent)
            .zip(etype)
            .map(|((((ind, weight), time_first), time_recent), etype)| RowMut {
                ind,
                weight,
                time_first,
                time_recent,
                etype,
            })
            .collect()
    }

    /// Number of rows.
    #[inline]
    pub fn nv(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Number of edges.
    #[inline]
    pub fn ne(&self) -> usize {
        self.ind.len()
    }

    /// Index range of row `v`.
    ///
    /// # Panics
    /// Panics if `v >= nv()`.
    #[inline]
    pub fn row(&self, v: usize) -> Range<usize> {
        self.offsets[v]..self.offsets[v + 1]
    }

    /// Out-degree of `v`.
    ///
    /// # Panics
    /// Panics if `v >= nv()`.
    #[inline]
    pub fn degree(&self, v: usize) -> usize {
        self.offsets[v + 1] - self.offsets[v]
    }

    /// Destinations of row `v`.
    ///
    /// # Panics
    /// Panics if `v >= nv()`.
    #[inline]
    pub fn neighbors(&self, v: usize) -> &[i64] {
        &self.ind[self.row(v)]
    }

    /// Returns `true` if row `u` contains `v`. Out-of-range `u` has no edges.
    pub fn has_edge(&self, u: usize, v: i64) -> bool {
        if u >= self.nv() {
            return false;
        }
        let row = self.neighbors(u);
        if self.sorted {
            find_in_sorted(v, row).is_some()
        } else {
            row.contains(&v)
        }
    }

    /// Sorts every row by destination in parallel, applying the same permutation to every
    /// present column. Equal destinations keep their relative order.
    pub fn sort_rows(&mut self) {
        let mut rows = self.rows();
        for_each_mut(&mut rows, |_, row| row.sort_by_destination());
        drop(rows);
        self.sorted = true;
    }
}

fn check_nv<const B: usize>(graph: &StreamingGraph<B>, nv: usize) -> Result<()> {
    if nv > graph.max_vertices() {
        return Err(Error::VertexOutOfRange {
            vertex: nv as i64 - 1,
            nv: graph.max_vertices(),
        });
    }
    Ok(())
}

/// Copies the out-edges of vertices `0..nv` into a fresh CSR snapshot, in chain order.
///
/// Row sizes come from the out-degree counters; each row is then gathered in parallel from
/// every type chain of its vertex. The graph should be quiescent for the vertices read: if a
/// row's chains change size between the two passes, the row keeps its counted length, surplus
/// edges are dropped and unfilled slots stay zero.
///
/// # Errors
/// [`Error::VertexOutOfRange`] if `nv` exceeds the graph's vertex capacity.
pub fn to_unsorted_csr<const B: usize>(
    graph: &StreamingGraph<B>,
    nv: usize,
    fields: CsrFields,
) -> Result<CsrSnapshot> {
    check_nv(graph, nv)?;
    let degrees = map_indices(nv, |v| graph.out_degree(v));
    let mut snap = CsrSnapshot::zeroed(offsets_from_degrees(&degrees), fields);

    let mut rows = snap.rows();
    for_each_mut(&mut rows, |v, row| {
        let want = row.ind.len();
        let mut got = 0usize;
        graph.for_each_successor(v, |etype, e| {
            if got < want {
                row.write(got, etype, e);
            }
            got += 1;
        });
        if got != want {
            warn_event!(
                vertex = v,
                gathered = got,
                degree = want,
                "out-degree changed during extraction"
            );
        }
    });
    drop(rows);

    debug_event!(nv, ne = snap.ne(), "unsorted csr extracted");
    Ok(snap)
}

/// Like [`to_unsorted_csr`], with every row then ordered by destination.
///
/// # Errors
/// Same as [`to_unsorted_csr`].
pub fn to_sorted_csr<const B: usize>(
    graph: &StreamingGraph<B>,
    nv: usize,
    fields: CsrFields,
) -> Result<CsrSnapshot> {
    let mut snap = to_unsorted_csr(graph, nv, fields)?;
    snap.sort_rows();
    Ok(snap)
}

impl<const B: usize> StreamingGraph<B> {
    /// Snapshot of every active vertex (`0..nv()`), sorted or in chain order.
    pub fn snapshot(&self, fields: CsrFields, sorted: bool) -> CsrSnapshot {
        let nv = self.nv();
        let result = if sorted {
            to_sorted_csr(self, nv, fields)
        } else {
            to_unsorted_csr(self, nv, fields)
        };
        match result {
            Ok(snap) => snap,
            Err(e) => unreachable!("active vertex count is within capacity: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphConfig;

    fn sample() -> StreamingGraph<2> {
        let g = StreamingGraph::new(GraphConfig {
            max_vertices: 8,
            edge_types: 2,
            max_blocks: 32,
            ..GraphConfig::default()
        })
        .unwrap();
        g.insert_edge(0, 0, 3, 30, 1).unwrap();
        g.insert_edge(1, 0, 1, 10, 2).unwrap();
        g.insert_edge(0, 0, 2, 20, 3).unwrap();
        g.insert_edge(0, 0, 1, 11, 4).unwrap();
        g.insert_edge(0, 2, 0, 5, 5).unwrap();
        g
    }

    #[test]
    fn unsorted_rows_hold_every_edge() {
        let g = sample();
        let snap = to_unsorted_csr(&g, 4, CsrFields::ALL).unwrap();
        assert_eq!(snap.offsets, vec![0, 4, 4, 5, 5]);
        let mut row0: Vec<_> = snap.neighbors(0).to_vec();
        row0.sort_unstable();
        assert_eq!(row0, vec![1, 1, 2, 3]);
        assert!(!snap.sorted);
    }

    #[test]
    fn sorted_rows_carry_columns_along() {
        let g = sample();
        let snap = to_sorted_csr(&g, 4, CsrFields::ALL).unwrap();
        assert_eq!(snap.neighbors(0), &[1, 1, 2, 3]);
        let r = snap.row(0);
        let w = &snap.weight.as_ref().unwrap()[r.clone()];
        let t = &snap.etype.as_ref().unwrap()[r];
        // The two edges to vertex 1 differ by type; pair them back up.
        let mut to_one: Vec<_> = w[..2].iter().zip(&t[..2]).map(|(&w, &t)| (t, w)).collect();
        to_one.sort_unstable();
        assert_eq!(to_one, vec![(0, 11), (1, 10)]);
        assert_eq!(&w[2..], &[20, 30]);
        assert!(snap.has_edge(0, 3));
        assert!(!snap.has_edge(0, 4));
        assert!(!snap.has_edge(7, 0));
    }

    #[test]
    fn fields_select_columns() {
        let g = sample();
        let snap = to_unsorted_csr(&g, 3, CsrFields::NONE).unwrap();
        assert!(snap.weight.is_none() && snap.etype.is_none());
        let snap = to_unsorted_csr(
            &g,
            3,
            CsrFields {
                time_recent: true,
                ..CsrFields::NONE
            },
        )
        .unwrap();
        assert_eq!(snap.time_recent.as_ref().map(Vec::len), Some(5));
        assert!(snap.time_first.is_none());
    }

    #[test]
    fn nv_beyond_capacity_is_rejected() {
        let g = sample();
        assert!(matches!(
            to_unsorted_csr(&g, 9, CsrFields::NONE),
            Err(Error::VertexOutOfRange { .. })
        ));
    }

    #[test]
    fn snapshot_covers_active_vertices() {
        let g = sample();
        let snap = g.snapshot(CsrFields::NONE, true);
        assert_eq!(snap.nv(), 4);
        assert_eq!(snap.ne(), 5);
        assert_eq!(snap.degree(2), 1);
        assert_eq!(snap.degree(1), 0);
    }

    #[test]
    fn extraction_survives_concurrent_mutation() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let g = sample();
        let done = AtomicBool::new(false);
        std::thread::scope(|s| {
            s.spawn(|| {
                for round in 0..2_000i64 {
                    for d in 4..8 {
                        g.insert_edge(0, 0, d, 1, round).unwrap();
                    }
                    for d in 4..8 {
                        g.remove_edge(0, 0, d).unwrap();
                    }
                }
                done.store(true, Ordering::Release);
            });
            let mut reads = 0;
            while !done.load(Ordering::Acquire) || reads < 10 {
                let snap = to_unsorted_csr(&g, 4, CsrFields::ALL).unwrap();
                assert_eq!(snap.offsets.len(), 5);
                assert_eq!(snap.ind.len(), snap.ne());
                assert!(snap.ind.iter().all(|&d| (0..8).contains(&d)));
                reads += 1;
            }
        });
        assert_eq!(to_unsorted_csr(&g, 4, CsrFields::NONE).unwrap().ne(), 5);
    }
}
