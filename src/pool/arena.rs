//! Append-only segmented arena of edge blocks.
//!
//! Storage is a fixed directory of segments whose sizes double (`64, 128, 256, ...`). A
//! segment is materialized the first time an index inside it is handed out and is never
//! moved or freed while the pool lives, so a [`BlockId`] stays valid for the pool's lifetime
//! and can be dereferenced without locking.
//!
//! Allocation is a single `fetch_add` on a cache-padded cursor. Index 0 is the sentinel:
//! it occupies storage but is never issued.

use core::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

use crossbeam_utils::CachePadded;

use super::block::{BlockId, EdgeBlock};
use crate::error::{Error, Result};

/// log2 of the first segment's block count.
const FIRST_SEGMENT_SHIFT: u32 = 6;

/// Largest capacity a pool accepts; keeps segment arithmetic clear of overflow.
pub const MAX_POOL_BLOCKS: usize = usize::MAX >> 2;

/// A pool of up to `capacity` edge blocks of `B` slots each.
pub struct BlockPool<const B: usize> {
    segments: Box<[OnceLock<Box<[EdgeBlock<B>]>>]>,
    cursor: CachePadded<AtomicUsize>,
    capacity: usize,
}

#[inline]
const fn locate(index: usize) -> (usize, usize) {
    let j = index + (1 << FIRST_SEGMENT_SHIFT);
    let top = (usize::BITS - 1 - j.leading_zeros()) as usize;
    let seg = top - FIRST_SEGMENT_SHIFT as usize;
    (seg, j - (1 << top))
}

#[inline]
const fn segment_len(seg: usize) -> usize {
    1 << (seg + FIRST_SEGMENT_SHIFT as usize)
}

impl<const B: usize> BlockPool<B> {
    /// Creates a pool able to issue `capacity` blocks (the sentinel is extra).
    ///
    /// No block storage is allocated until the first [`alloc`](Self::alloc).
    ///
    /// # Panics
    /// Panics if `B == 0` or `capacity > MAX_POOL_BLOCKS`.
    pub fn new(capacity: usize) -> Self {
        assert!(B > 0, "edge blocks must have at least one slot");
        assert!(capacity <= MAX_POOL_BLOCKS, "pool capacity {capacity} is too large");
        let (last_seg, _) = locate(capacity);
        Self {
            segments: (0..=last_seg).map(|_| OnceLock::new()).collect(),
            cursor: CachePadded::new(AtomicUsize::new(1)),
            capacity,
        }
    }

    /// Maximum number of blocks this pool can issue.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of blocks issued so far.
    #[inline]
    pub fn len(&self) -> usize {
        (self.cursor.load(Ordering::Relaxed) - 1).min(self.capacity)
    }

    /// Returns `true` if no block has been issued.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of segments currently backed by memory.
    pub fn segments_allocated(&self) -> usize {
        self.segments.iter().filter(|s| s.get().is_some()).count()
    }

    /// Issues a fresh block owned by `(vertex, etype)`.
    ///
    /// The block is empty and unlinked; the caller fills it and links it into a chain.
    ///
    /// # Errors
    /// [`Error::PoolExhausted`] once `capacity` blocks have been issued.
    pub fn alloc(&self, vertex: usize, etype: usize) -> Result<BlockId> {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed);
        if index > self.capacity {
            return Err(Error::PoolExhausted {
                capacity: self.capacity,
            });
        }
        let block = self.materialize(index);
        block.claim(vertex, etype);
        BlockId::from_raw(index).ok_or(Error::PoolExhausted {
            capacity: self.capacity,
        })
    }

    fn materialize(&self, index: usize) -> &EdgeBlock<B> {
        let (seg, offset) = locate(index);
        let blocks = self.segments[seg].get_or_init(|| {
            debug_event!(segment = seg, blocks = segment_len(seg), "edge pool segment allocated");
            (0..segment_len(seg)).map(|_| EdgeBlock::new()).collect()
        });
        &blocks[offset]
    }

    /// Returns the block behind `id`.
    ///
    /// # Panics
    /// Panics if `id` was not issued by this pool.
    #[inline]
    pub fn get(&self, id: BlockId) -> &EdgeBlock<B> {
        let (seg, offset) = locate(id.index());
        match self.segments.get(seg).and_then(OnceLock::get) {
            Some(blocks) => &blocks[offset],
            None => panic!("block {} was not issued by this pool", id.index()),
        }
    }

    /// Ids along a chain starting at `head`, in link order.
    pub fn blocks_from(&self, head: Option<BlockId>) -> BlockIter<'_, B> {
        BlockIter { pool: self, at: head }
    }
}

/// Iterator over the blocks of one chain.
#[derive(Clone)]
pub struct BlockIter<'p, const B: usize> {
    pool: &'p BlockPool<B>,
    at: Option<BlockId>,
}

impl<'p, const B: usize> Iterator for BlockIter<'p, B> {
    type Item = (BlockId, &'p EdgeBlock<B>);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.at?;
        let block = self.pool.get(id);
        self.at = block.next();
        Some((id, block))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concurrency::fork_join::map_indices;

    #[test]
    fn locate_walks_geometric_segments() {
        assert_eq!(locate(0), (0, 0));
        assert_eq!(locate(63), (0, 63));
        assert_eq!(locate(64), (1, 0));
        assert_eq!(locate(191), (1, 127));
        assert_eq!(locate(192), (2, 0));
        let (seg, offset) = locate(MAX_POOL_BLOCKS);
        assert!(offset < segment_len(seg));
    }

    #[test]
    fn largest_capacity_is_lazy() {
        let pool = BlockPool::<4>::new(MAX_POOL_BLOCKS);
        assert_eq!(pool.capacity(), MAX_POOL_BLOCKS);
        assert_eq!(pool.segments_allocated(), 0);
        assert_eq!(pool.alloc(0, 0).unwrap().index(), 1);
    }

    #[test]
    fn sentinel_is_never_issued() {
        let pool = BlockPool::<4>::new(3);
        let ids: Vec<_> = (0..3).map(|v| pool.alloc(v, 0).unwrap().index()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(matches!(pool.alloc(0, 0), Err(Error::PoolExhausted { capacity: 3 })));
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn growth_keeps_earlier_blocks_in_place() {
        let pool = BlockPool::<2>::new(500);
        let first = pool.alloc(7, 1).unwrap();
        let addr = pool.get(first) as *const EdgeBlock<2>;
        for v in 0..400 {
            pool.alloc(v, 0).unwrap();
        }
        assert!(pool.segments_allocated() >= 3);
        assert_eq!(pool.get(first) as *const EdgeBlock<2>, addr);
        assert_eq!(pool.get(first).vertex(), 7);
        assert_eq!(pool.get(first).etype(), 1);
    }

    #[test]
    fn concurrent_allocation_issues_distinct_ids() {
        let pool = BlockPool::<4>::new(5000);
        let mut ids = map_indices(5000, |i| pool.alloc(i, 0).unwrap().index());
        ids.sort_unstable();
        assert!(ids.iter().enumerate().all(|(k, &id)| id == k + 1));
    }

    #[test]
    fn chain_iteration_follows_links() {
        let pool = BlockPool::<4>::new(8);
        let a = pool.alloc(0, 0).unwrap();
        let b = pool.alloc(0, 0).unwrap();
        pool.get(b).set_next(Some(a));
        let order: Vec<_> = pool.blocks_from(Some(b)).map(|(id, _)| id).collect();
        assert_eq!(order, vec![b, a]);
        assert_eq!(pool.blocks_from(None).count(), 0);
    }
}
