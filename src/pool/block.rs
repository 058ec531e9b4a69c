//! Edge slots and fixed-capacity edge blocks.
//!
//! Every field is a word-sized atomic. A block may be read while another thread mutates it;
//! such a reader sees each word either before or after the write, never a torn value, which
//! is the whole consistency guarantee offered to concurrent readers.
//!
//! Writers store the payload words first and the `neighbor` word last with `Release`;
//! readers load `neighbor` with `Acquire` before the payload.

use core::num::NonZeroUsize;
use core::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

/// Default number of slots per edge block.
pub const DEFAULT_BLOCK_SIZE: usize = 14;

/// Neighbor value marking an unoccupied slot.
pub const EMPTY_NEIGHBOR: i64 = -1;

/// One edge as stored in a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    /// Destination vertex, or a negative value for an empty slot.
    pub neighbor: i64,
    /// Integer weight.
    pub weight: i64,
    /// Creation timestamp.
    pub time_first: i64,
    /// Last-touch timestamp.
    pub time_recent: i64,
}

impl Edge {
    /// The value of a slot that has never held an edge or was cleared by deletion.
    pub const EMPTY: Self = Self {
        neighbor: EMPTY_NEIGHBOR,
        weight: 0,
        time_first: 0,
        time_recent: 0,
    };

    /// Creates an edge whose two timestamps are equal.
    pub const fn at(neighbor: i64, weight: i64, time: i64) -> Self {
        Self {
            neighbor,
            weight,
            time_first: time,
            time_recent: time,
        }
    }

    /// Returns `true` if the slot holds a live edge.
    #[inline]
    pub const fn is_occupied(&self) -> bool {
        self.neighbor >= 0
    }

    /// Returns `true` for the all-zero pattern that the normalizer treats as a blank hole.
    #[inline]
    pub const fn is_zero_blank(&self) -> bool {
        self.neighbor == 0 && self.weight == 0 && self.time_first == 0 && self.time_recent == 0
    }
}

/// Atomic storage for one [`Edge`].
pub struct EdgeSlot {
    neighbor: AtomicI64,
    weight: AtomicI64,
    time_first: AtomicI64,
    time_recent: AtomicI64,
}

impl EdgeSlot {
    const fn empty() -> Self {
        Self {
            neighbor: AtomicI64::new(EMPTY_NEIGHBOR),
            weight: AtomicI64::new(0),
            time_first: AtomicI64::new(0),
            time_recent: AtomicI64::new(0),
        }
    }

    /// Loads the neighbor word.
    #[inline]
    pub fn neighbor(&self) -> i64 {
        self.neighbor.load(Ordering::Acquire)
    }

    /// Loads the whole edge.
    #[inline]
    pub fn load(&self) -> Edge {
        let neighbor = self.neighbor.load(Ordering::Acquire);
        Edge {
            neighbor,
            weight: self.weight.load(Ordering::Relaxed),
            time_first: self.time_first.load(Ordering::Relaxed),
            time_recent: self.time_recent.load(Ordering::Relaxed),
        }
    }

    /// Stores the whole edge, publishing the neighbor word last.
    #[inline]
    pub fn store(&self, edge: Edge) {
        self.weight.store(edge.weight, Ordering::Relaxed);
        self.time_first.store(edge.time_first, Ordering::Relaxed);
        self.time_recent.store(edge.time_recent, Ordering::Relaxed);
        self.neighbor.store(edge.neighbor, Ordering::Release);
    }

    /// Overwrites the weight and raises `time_recent` to at least `time`.
    #[inline]
    pub fn touch(&self, weight: i64, time: i64) {
        self.weight.store(weight, Ordering::Relaxed);
        self.time_recent.fetch_max(time, Ordering::Relaxed);
    }

    /// Resets the slot to [`Edge::EMPTY`].
    #[inline]
    pub fn clear(&self) {
        self.store(Edge::EMPTY);
    }
}

/// Stable handle to a block in a [`BlockPool`](super::BlockPool).
///
/// Index 0 is the pool's reserved sentinel and is never a valid handle, which lets
/// `Option<BlockId>` pack into one word and lets links store "end of chain" as 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(NonZeroUsize);

impl BlockId {
    /// Wraps a raw index; `0` (the sentinel) yields `None`.
    #[inline]
    pub const fn from_raw(raw: usize) -> Option<Self> {
        match NonZeroUsize::new(raw) {
            Some(nz) => Some(Self(nz)),
            None => None,
        }
    }

    /// Raw index of an optional handle, with `None` mapped to the sentinel.
    #[inline]
    pub const fn raw(id: Option<Self>) -> usize {
        match id {
            Some(b) => b.0.get(),
            None => 0,
        }
    }

    /// Position of the block in the pool.
    #[inline]
    pub const fn index(self) -> usize {
        self.0.get()
    }
}

/// Cached per-block metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMeta {
    /// One past the last slot in use.
    pub high: usize,
    /// Number of occupied slots.
    pub num_edges: usize,
    /// Minimum `time_first` over occupied slots (`i64::MAX` if none).
    pub small_stamp: i64,
    /// Maximum `time_recent` over occupied slots (`i64::MIN` if none).
    pub large_stamp: i64,
}

impl BlockMeta {
    /// Metadata of a block with no edges.
    pub const EMPTY: Self = Self {
        high: 0,
        num_edges: 0,
        small_stamp: i64::MAX,
        large_stamp: i64::MIN,
    };
}

/// A fixed-capacity block of `B` edge slots, all of one edge type, owned by one vertex.
pub struct EdgeBlock<const B: usize> {
    vertex: AtomicI64,
    etype: AtomicI64,
    next: AtomicUsize,
    high: AtomicUsize,
    num_edges: AtomicUsize,
    small_stamp: AtomicI64,
    large_stamp: AtomicI64,
    edges: [EdgeSlot; B],
}

impl<const B: usize> EdgeBlock<B> {
    pub(crate) fn new() -> Self {
        Self {
            vertex: AtomicI64::new(EMPTY_NEIGHBOR),
            etype: AtomicI64::new(EMPTY_NEIGHBOR),
            next: AtomicUsize::new(0),
            high: AtomicUsize::new(0),
            num_edges: AtomicUsize::new(0),
            small_stamp: AtomicI64::new(i64::MAX),
            large_stamp: AtomicI64::new(i64::MIN),
            edges: core::array::from_fn(|_| EdgeSlot::empty()),
        }
    }

    pub(crate) fn claim(&self, vertex: usize, etype: usize) {
        self.vertex.store(vertex as i64, Ordering::Relaxed);
        self.etype.store(etype as i64, Ordering::Relaxed);
    }

    /// Capacity in slots.
    #[inline(always)]
    pub const fn capacity() -> usize {
        B
    }

    /// Owning vertex.
    #[inline]
    pub fn vertex(&self) -> i64 {
        self.vertex.load(Ordering::Relaxed)
    }

    /// Edge type of every occupied slot.
    #[inline]
    pub fn etype(&self) -> i64 {
        self.etype.load(Ordering::Relaxed)
    }

    /// Next block in the chain.
    #[inline]
    pub fn next(&self) -> Option<BlockId> {
        BlockId::from_raw(self.next.load(Ordering::Acquire))
    }

    pub(crate) fn set_next(&self, next: Option<BlockId>) {
        self.next.store(BlockId::raw(next), Ordering::Release);
    }

    /// One past the last slot in use.
    #[inline]
    pub fn high(&self) -> usize {
        self.high.load(Ordering::Acquire).min(B)
    }

    /// Number of occupied slots.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.num_edges.load(Ordering::Relaxed)
    }

    /// Smallest `time_first` among occupied slots.
    #[inline]
    pub fn small_stamp(&self) -> i64 {
        self.small_stamp.load(Ordering::Relaxed)
    }

    /// Largest `time_recent` among occupied slots.
    #[inline]
    pub fn large_stamp(&self) -> i64 {
        self.large_stamp.load(Ordering::Relaxed)
    }

    /// Slot `i`.
    ///
    /// # Panics
    /// Panics if `i >= B`.
    #[inline]
    pub fn slot(&self, i: usize) -> &EdgeSlot {
        &self.edges[i]
    }

    /// All `B` slots, including those past `high`.
    #[inline]
    pub fn slots(&self) -> &[EdgeSlot; B] {
        &self.edges
    }

    /// Currently cached metadata.
    pub fn meta(&self) -> BlockMeta {
        BlockMeta {
            high: self.high(),
            num_edges: self.num_edges(),
            small_stamp: self.small_stamp(),
            large_stamp: self.large_stamp(),
        }
    }

    /// Metadata computed by scanning every slot; the block is not modified.
    pub fn scan_meta(&self) -> BlockMeta {
        let mut meta = BlockMeta::EMPTY;
        for (i, slot) in self.edges.iter().enumerate() {
            let e = slot.load();
            if e.is_occupied() {
                meta.num_edges += 1;
                meta.high = i + 1;
                meta.small_stamp = meta.small_stamp.min(e.time_first);
                meta.large_stamp = meta.large_stamp.max(e.time_recent);
            }
        }
        meta
    }

    pub(crate) fn store_meta(&self, meta: BlockMeta) {
        self.num_edges.store(meta.num_edges, Ordering::Relaxed);
        self.small_stamp.store(meta.small_stamp, Ordering::Relaxed);
        self.large_stamp.store(meta.large_stamp, Ordering::Relaxed);
        self.high.store(meta.high, Ordering::Release);
    }

    /// Records a new edge in slot `i`: counts it, extends `high` and widens the stamps.
    pub(crate) fn note_insert(&self, i: usize, time_first: i64, time_recent: i64) {
        self.num_edges.fetch_add(1, Ordering::Relaxed);
        self.small_stamp.fetch_min(time_first, Ordering::Relaxed);
        self.large_stamp.fetch_max(time_recent, Ordering::Relaxed);
        self.high.fetch_max(i + 1, Ordering::Release);
    }

    pub(crate) fn note_touch(&self, time_recent: i64) {
        self.large_stamp.fetch_max(time_recent, Ordering::Relaxed);
    }

    pub(crate) fn note_remove(&self) {
        self.num_edges.fetch_sub(1, Ordering::Relaxed);
    }

    /// Occupied slots below `high`, in slot order.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, Edge)> + '_ {
        self.edges[..self.high()]
            .iter()
            .enumerate()
            .map(|(i, s)| (i, s.load()))
            .filter(|(_, e)| e.is_occupied())
    }
}
