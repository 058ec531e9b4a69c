//! The edge block pool: fixed-capacity blocks, the append-only arena that owns them, and
//! chain traversal.
//!
//! A chain is a singly linked list of blocks of one `(vertex, edge type)` pair, threaded
//! through [`BlockId`] links rather than pointers.

pub mod arena;
pub mod block;
pub mod chain;

pub use arena::{BlockIter, BlockPool, MAX_POOL_BLOCKS};
pub use block::{BlockId, BlockMeta, Edge, EdgeBlock, EdgeSlot, DEFAULT_BLOCK_SIZE, EMPTY_NEIGHBOR};
pub use chain::{ChainEdge, ChainEdges};
