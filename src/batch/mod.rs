//! Batch ingestion: insert/delete batch messages, a lock-guarded shared graph that applies
//! them, and a random batch generator.

pub mod apply;
pub mod generator;
pub mod message;

pub use apply::{BatchOutcome, SharedGraph};
pub use generator::RandomEdgeGenerator;
pub use message::{Batch, EdgeDeletion, EdgeInsertion};
