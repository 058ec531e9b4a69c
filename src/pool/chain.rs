//! Lazy traversal of the occupied slots of one chain.

use super::arena::{BlockIter, BlockPool};
use super::block::{BlockId, Edge, EdgeBlock};

/// One occupied slot reached during traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainEdge {
    /// Block holding the slot.
    pub block: BlockId,
    /// Slot index inside the block.
    pub slot: usize,
    /// Slot contents at the time it was read.
    pub edge: Edge,
}

/// Iterator over the occupied slots of a chain, in link order then slot order.
///
/// Each block is scanned only up to its `high` mark as read when the block is entered.
/// Traversal restarts from the head whenever a new iterator is requested.
#[derive(Clone)]
pub struct ChainEdges<'p, const B: usize> {
    blocks: BlockIter<'p, B>,
    current: Option<(BlockId, &'p EdgeBlock<B>, usize)>,
    slot: usize,
}

impl<'p, const B: usize> ChainEdges<'p, B> {
    pub(crate) fn new(pool: &'p BlockPool<B>, head: Option<BlockId>) -> Self {
        Self {
            blocks: pool.blocks_from(head),
            current: None,
            slot: 0,
        }
    }
}

impl<const B: usize> Iterator for ChainEdges<'_, B> {
    type Item = ChainEdge;

    fn next(&mut self) -> Option<ChainEdge> {
        loop {
            match self.current {
                Some((id, block, high)) if self.slot < high => {
                    let slot = self.slot;
                    self.slot += 1;
                    let edge = block.slot(slot).load();
                    if edge.is_occupied() {
                        return Some(ChainEdge {
                            block: id,
                            slot,
                            edge,
                        });
                    }
                }
                _ => {
                    let (id, block) = self.blocks.next()?;
                    self.current = Some((id, block, block.high()));
                    self.slot = 0;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_holes_and_respects_high() {
        let pool = BlockPool::<3>::new(4);
        let a = pool.alloc(0, 0).unwrap();
        let b = pool.alloc(0, 0).unwrap();
        let (ba, bb) = (pool.get(a), pool.get(b));

        ba.slot(0).store(Edge::at(4, 1, 1));
        ba.note_insert(0, 1, 1);
        ba.slot(2).store(Edge::at(6, 1, 1));
        ba.note_insert(2, 1, 1);

        bb.slot(1).store(Edge::at(9, 1, 1));
        bb.note_insert(1, 1, 1);
        // Written past `high` without bookkeeping: must stay invisible.
        bb.slot(2).store(Edge::at(99, 1, 1));
        bb.store_meta(crate::pool::BlockMeta {
            high: 2,
            ..bb.meta()
        });
        bb.set_next(Some(a));

        let seen: Vec<_> = ChainEdges::new(&pool, Some(b))
            .map(|c| (c.block, c.slot, c.edge.neighbor))
            .collect();
        assert_eq!(seen, vec![(b, 1, 9), (a, 0, 4), (a, 2, 6)]);
    }

    #[test]
    fn empty_chain_yields_nothing() {
        let pool = BlockPool::<3>::new(1);
        assert_eq!(ChainEdges::new(&pool, None).count(), 0);
    }
}
