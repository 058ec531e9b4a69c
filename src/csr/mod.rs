//! Conversion between the streaming graph and static CSR snapshots.
//!
//! Forward: [`to_unsorted_csr`] / [`to_sorted_csr`] copy a quiescent graph's out-edges into
//! an owned [`CsrSnapshot`]. Inverse: [`edge_list_to_csr`] buckets a flat edge list by
//! source, and [`edge_list_to_graph`] loads the result into a fresh graph.

pub mod build;
pub mod snapshot;

pub use build::{csr_to_graph, edge_list_to_csr, edge_list_to_graph, EdgeList};
pub use snapshot::{to_sorted_csr, to_unsorted_csr, CsrFields, CsrSnapshot};
