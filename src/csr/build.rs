//! Bulk construction: flat edge list to CSR, and CSR to a freshly loaded graph.

use crate::concurrency::{fork_join::for_each_index, BucketCounters, ScatterBuffer};
use crate::config::GraphConfig;
use crate::error::{Error, Result};
use crate::graph::{InitialEdges, StreamingGraph};
use crate::primitives::offsets_from_degrees;

use super::snapshot::CsrSnapshot;

/// Borrowed columns of a flat edge list.
#[derive(Debug, Clone, Copy)]
pub struct EdgeList<'a> {
    /// Source of each edge.
    pub sources: &'a [i64],
    /// Destination of each edge.
    pub destinations: &'a [i64],
    /// Weight of each edge.
    pub weights: &'a [i64],
    /// Optional creation timestamps.
    pub time_first: Option<&'a [i64]>,
    /// Optional last-touch timestamps.
    pub time_recent: Option<&'a [i64]>,
}

impl<'a> EdgeList<'a> {
    /// An edge list without timestamps.
    pub fn new(sources: &'a [i64], destinations: &'a [i64], weights: &'a [i64]) -> Self {
        Self {
            sources,
            destinations,
            weights,
            time_first: None,
            time_recent: None,
        }
    }

    /// Attaches creation timestamps.
    #[must_use]
    pub fn with_time_first(mut self, time_first: &'a [i64]) -> Self {
        self.time_first = Some(time_first);
        self
    }

    /// Attaches last-touch timestamps.
    #[must_use]
    pub fn with_time_recent(mut self, time_recent: &'a [i64]) -> Self {
        self.time_recent = Some(time_recent);
        self
    }

    /// Number of edges.
    #[inline]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns `true` if the list has no edges.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// The `(time_first, time_recent)` columns after filling in whichever is missing.
    fn times(&self) -> (Option<&'a [i64]>, Option<&'a [i64]>) {
        match (self.time_first, self.time_recent) {
            (Some(f), Some(r)) => (Some(f), Some(r)),
            (Some(t), None) | (None, Some(t)) => (Some(t), Some(t)),
            (None, None) => (None, None),
        }
    }

    fn validate(&self, nv: usize) -> Result<()> {
        let ne = self.len();
        Error::check_len("destinations", ne, self.destinations.len())?;
        Error::check_len("weights", ne, self.weights.len())?;
        if let Some(t) = self.time_first {
            Error::check_len("time_first", ne, t.len())?;
        }
        if let Some(t) = self.time_recent {
            Error::check_len("time_recent", ne, t.len())?;
        }
        if let Some(&vertex) = self
            .sources
            .iter()
            .chain(self.destinations)
            .find(|&&v| v < 0 || v as u64 >= nv as u64)
        {
            return Err(Error::VertexOutOfRange { vertex, nv });
        }
        Ok(())
    }
}

/// Buckets `edges` by source into a CSR over `nv` vertices.
///
/// Out-degrees are histogrammed with atomic fetch-and-add, prefix-summed into `offsets`, and
/// every edge is scattered to a slot claimed from its source's atomic cursor. Order within a
/// row is therefore unspecified. Both timestamp columns are always produced: a single given
/// column is used for both, and with none `default_timestamp` fills them.
///
/// # Errors
/// - [`Error::LengthMismatch`] if the columns disagree in length.
/// - [`Error::VertexOutOfRange`] if an endpoint is outside `[0, nv)`.
pub fn edge_list_to_csr(
    nv: usize,
    edges: &EdgeList<'_>,
    default_timestamp: i64,
) -> Result<CsrSnapshot> {
    edges.validate(nv)?;
    let ne = edges.len();
    let src = edges.sources;

    let counts = BucketCounters::zeroed(nv);
    for_each_index(ne, |i| {
        counts.fetch_add(src[i] as usize, 1);
    });
    let offsets = offsets_from_degrees(&counts.into_vec());

    let cursors = BucketCounters::from_values(&offsets[..nv]);
    let ind = ScatterBuffer::zeroed(ne);
    let weight = ScatterBuffer::zeroed(ne);
    let time_first = ScatterBuffer::zeroed(ne);
    let time_recent = ScatterBuffer::zeroed(ne);
    let (tf, tr) = edges.times();
    for_each_index(ne, |i| {
        let at = cursors.fetch_add(src[i] as usize, 1);
        ind.put(at, edges.destinations[i]);
        weight.put(at, edges.weights[i]);
        time_first.put(at, tf.map_or(default_timestamp, |t| t[i]));
        time_recent.put(at, tr.map_or(default_timestamp, |t| t[i]));
    });

    trace_event!(nv, ne, "edge list bucketed by source");
    Ok(CsrSnapshot {
        offsets,
        ind: ind.into_vec(),
        weight: Some(weight.into_vec()),
        time_first: Some(time_first.into_vec()),
        time_recent: Some(time_recent.into_vec()),
        etype: None,
        sorted: false,
    })
}

/// Builds a graph whose type-0 edges are exactly `edges`.
///
/// The graph gets `config`, widened to at least `nv` vertex slots; missing timestamps take
/// `config.default_timestamp`.
///
/// # Errors
/// Everything [`edge_list_to_csr`] and [`StreamingGraph::new`] report, plus
/// [`Error::PoolExhausted`] if `config.max_blocks` is too small for the edge set.
pub fn edge_list_to_graph<const B: usize>(
    config: &GraphConfig,
    nv: usize,
    edges: &EdgeList<'_>,
) -> Result<StreamingGraph<B>> {
    let csr = edge_list_to_csr(nv, edges, config.default_timestamp)?;
    csr_to_graph(config, &csr)
}

/// Builds a graph whose type-0 edges are the rows of `csr`.
///
/// Missing weights are filled with 1. A lone timestamp column seeds both timestamps; with
/// neither present both take `config.default_timestamp`.
///
/// # Errors
/// As [`StreamingGraph::set_initial_edges`] and [`StreamingGraph::new`].
pub fn csr_to_graph<const B: usize>(
    config: &GraphConfig,
    csr: &CsrSnapshot,
) -> Result<StreamingGraph<B>> {
    let nv = csr.nv();
    let graph = StreamingGraph::new(GraphConfig {
        max_vertices: config.max_vertices.max(nv),
        ..config.clone()
    })?;

    let ne = csr.ne();
    let weight = csr.weight.clone().unwrap_or_else(|| vec![1; ne]);
    // A single timestamp column stands in for both.
    let (time_first, time_recent) = match (&csr.time_first, &csr.time_recent) {
        (Some(f), Some(r)) => (f.clone(), r.clone()),
        (Some(t), None) | (None, Some(t)) => (t.clone(), t.clone()),
        (None, None) => {
            let t = vec![config.default_timestamp; ne];
            (t.clone(), t)
        }
    };
    graph.set_initial_edges(
        0,
        &InitialEdges {
            offsets: &csr.offsets,
            ind: &csr.ind,
            weight: &weight,
            time_first: &time_first,
            time_recent: &time_recent,
        },
    )?;
    debug_event!(nv, ne, blocks = graph.pool().len(), "graph bulk-loaded");
    Ok(graph)
}
