//! The streaming graph: per-vertex, per-type chains of edge blocks.
//!
//! - [`streaming`]: construction, chain access and single-edge mutation.
//! - [`bulk`]: parallel loading of an initial CSR edge set.
//! - [`normalize`]: in-place sorting of one chain with metadata recomputation.

pub mod bulk;
pub mod normalize;
pub mod streaming;

pub use bulk::InitialEdges;
pub use normalize::NormalizeReport;
pub use streaming::{Graph, StreamingGraph};
