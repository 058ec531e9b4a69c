//! Atomic arrays used by the histogram and scatter phases.
//!
//! Every shared counter that several workers may bump is a true atomic read-modify-write.
//! Scatter targets are atomics too: each position is written exactly once, so `Relaxed`
//! stores suffice, and the fork-join barrier at the end of the parallel region publishes them.

use core::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

/// A fixed array of `AtomicUsize` bucket counters / cursors.
pub struct BucketCounters {
    cells: Box<[AtomicUsize]>,
}

impl BucketCounters {
    /// Creates `len` counters, all zero.
    pub fn zeroed(len: usize) -> Self {
        Self {
            cells: (0..len).map(|_| AtomicUsize::new(0)).collect(),
        }
    }

    /// Creates counters initialised from `values`.
    pub fn from_values(values: &[usize]) -> Self {
        Self {
            cells: values.iter().map(|&v| AtomicUsize::new(v)).collect(),
        }
    }

    /// Number of counters.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` if there are no counters.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Atomically adds `n` to counter `i`, returning its previous value.
    ///
    /// # Panics
    /// Panics if `i >= len()`.
    #[inline(always)]
    pub fn fetch_add(&self, i: usize, n: usize) -> usize {
        self.cells[i].fetch_add(n, Ordering::Relaxed)
    }

    /// Loads counter `i`.
    #[inline]
    pub fn load(&self, i: usize) -> usize {
        self.cells[i].load(Ordering::Relaxed)
    }

    /// Consumes the counters, returning their final values.
    pub fn into_vec(self) -> Vec<usize> {
        self.cells
            .into_vec()
            .into_iter()
            .map(AtomicUsize::into_inner)
            .collect()
    }
}

/// A write-once scatter target of `i64` words.
pub struct ScatterBuffer {
    cells: Box<[AtomicI64]>,
}

impl ScatterBuffer {
    /// Creates `len` zeroed slots.
    pub fn zeroed(len: usize) -> Self {
        Self {
            cells: (0..len).map(|_| AtomicI64::new(0)).collect(),
        }
    }

    /// Writes `value` at `i`.
    #[inline(always)]
    pub fn put(&self, i: usize, value: i64) {
        self.cells[i].store(value, Ordering::Relaxed);
    }

    /// Reads slot `i`.
    #[inline(always)]
    pub fn get(&self, i: usize) -> i64 {
        self.cells[i].load(Ordering::Relaxed)
    }

    /// Number of slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` if the buffer has no slots.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Consumes the buffer into plain words.
    pub fn into_vec(self) -> Vec<i64> {
        self.cells
            .into_vec()
            .into_iter()
            .map(AtomicI64::into_inner)
            .collect()
    }
}
