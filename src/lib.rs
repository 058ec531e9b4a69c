//! # `blockgraph` - Streaming Graph Store on Pooled Edge Blocks
//!
//! A concurrently mutable graph whose adjacency lists are chains of fixed-capacity edge
//! blocks drawn from one append-only pool, plus the parallel machinery to move between that
//! live structure and static compressed-sparse-row (CSR) snapshots.
//!
//! ## Architecture
//!
//! Leaves first:
//!
//! 1. **Primitives** ([`primitives`]): prefix sum, counting sort, radix and bucket sorts over
//!    `(i64, i64)` pairs, sorted search. Every histogram and scatter step coordinates only
//!    through atomic fetch-and-add, so results do not depend on the worker count.
//! 2. **Edge block pool** ([`pool`]): `B`-slot blocks in a segmented arena. A [`BlockId`] is
//!    a stable index; index 0 is the "no block" sentinel.
//! 3. **Streaming graph** ([`graph`]): per-vertex, per-type block chains with atomic degree
//!    counters, single-edge insert/remove, bulk loading, and the in-place chain normalizer.
//! 4. **CSR conversion** ([`csr`]): unsorted and sorted extraction, and construction of a
//!    graph from a flat edge list.
//! 5. **Boundaries** ([`batch`], [`io`]): lock-guarded batch application and the binary
//!    graph/action file formats.
//!
//! ## Concurrency
//!
//! Every block and vertex field is a word-sized atomic. Readers running alongside a writer
//! may see stale data but never torn words. Mutations of one `(vertex, type)` chain must be
//! serialized by the caller; [`SharedGraph`] does this by holding a write lock per batch and
//! giving each source vertex to exactly one worker.
//!
//! Parallel regions run on rayon with the `parallel` feature (default) and on scoped std
//! threads otherwise.
//!
//! ## Example
//!
//! ```
//! use blockgraph::{edge_list_to_graph, to_sorted_csr, CsrFields, EdgeList, Graph, GraphConfig};
//!
//! let src = [0, 0, 1];
//! let dst = [1, 2, 0];
//! let w = [5, 3, 5];
//! let t = [100, 50, 100];
//! let edges = EdgeList::new(&src, &dst, &w).with_time_first(&t);
//!
//! let graph: Graph = edge_list_to_graph(&GraphConfig::with_vertices(3), 3, &edges)?;
//! let snap = to_sorted_csr(&graph, 3, CsrFields::ALL)?;
//! assert_eq!(snap.offsets, vec![0, 2, 3, 3]);
//! assert_eq!(snap.neighbors(0), &[1, 2]);
//! # Ok::<(), blockgraph::Error>(())
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_wrap, clippy::cast_sign_loss, clippy::cast_possible_truncation)]

#[macro_use]
mod macros;

pub mod batch;
pub mod concurrency;
pub mod config;
pub mod csr;
pub mod error;
pub mod graph;
pub mod io;
pub mod pool;
pub mod primitives;

pub use batch::{Batch, BatchOutcome, EdgeDeletion, EdgeInsertion, RandomEdgeGenerator, SharedGraph};
pub use config::GraphConfig;
pub use csr::{
    csr_to_graph, edge_list_to_csr, edge_list_to_graph, to_sorted_csr, to_unsorted_csr, CsrFields,
    CsrSnapshot, EdgeList,
};
pub use error::{Error, Result};
pub use graph::{Graph, InitialEdges, NormalizeReport, StreamingGraph};
pub use io::{Action, ActionStream, GraphFile};
pub use pool::{BlockId, BlockMeta, BlockPool, Edge, EdgeBlock, DEFAULT_BLOCK_SIZE};
pub use primitives::{
    bucket_sort_pairs, counting_sort, counting_sort_strided, find_in_sorted, prefix_sum,
    radix_sort_pairs,
};
