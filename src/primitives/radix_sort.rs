//! LSD radix sort for `(first, second)` pairs.
//!
//! Two full radix sorts run back to back: all digit passes over the secondary (`second`)
//! field, then all digit passes over the primary (`first`) field. Because every pass is
//! stable, the output is ordered by `first` and ties are ordered by `second`.
//!
//! Each pass:
//! 1. histograms digits with atomic fetch-and-add into a `bucket x worker` counter grid,
//! 2. prefix-sums the grid (bucket-major) into start offsets,
//! 3. scatters each pair to a cursor claimed by atomic fetch-and-add.
//!
//! Workers own contiguous input ranges and their own column of cursors, so pairs of the same
//! digit keep their input order across workers.
//!
//! Keys are biased by the field minimum when digits are extracted, so negative values sort
//! correctly; the stored pairs are never modified.

use crate::concurrency::{
    fork_join::{current_workers, for_each_index, for_each_range},
    BucketCounters, ScatterBuffer,
};
use crate::error::{Error, Result};
use crate::primitives::prefix_sum::exclusive_prefix_sum;

/// Widest supported digit.
pub const MAX_RADIX_BITS: u32 = 16;

/// Digit width used when callers have no preference.
pub const DEFAULT_RADIX_BITS: u32 = 8;

/// Sorts `pairs` ascending by `[0]`, then by `[1]`, using `2^bits` buckets per pass.
///
/// # Errors
/// - [`Error::RadixBits`] if `bits` is not in `1..=MAX_RADIX_BITS`.
/// - [`Error::EmptyInput`] if `pairs` is empty.
pub fn radix_sort_pairs(pairs: &mut [[i64; 2]], bits: u32) -> Result<()> {
    radix_sort_pairs_with_workers(pairs, bits, current_workers())
}

/// Like [`radix_sort_pairs`] with an explicit worker count.
///
/// # Errors
/// Same as [`radix_sort_pairs`].
pub fn radix_sort_pairs_with_workers(
    pairs: &mut [[i64; 2]],
    bits: u32,
    workers: usize,
) -> Result<()> {
    if !(1..=MAX_RADIX_BITS).contains(&bits) {
        return Err(Error::RadixBits {
            bits,
            max: MAX_RADIX_BITS,
        });
    }
    if pairs.is_empty() {
        return Err(Error::empty("radix_sort_pairs"));
    }

    let n = pairs.len();
    let workers = workers.clamp(1, n);

    let mut src = ScatterBuffer::zeroed(2 * n);
    let mut dst = ScatterBuffer::zeroed(2 * n);
    {
        let view: &[[i64; 2]] = pairs;
        for_each_index(n, |i| {
            src.put(2 * i, view[i][0]);
            src.put(2 * i + 1, view[i][1]);
        });
    }

    let mut passes = 0usize;
    for field in [1usize, 0] {
        let (min, max) = field_bounds(&src, n, field);
        let mut remaining = max.wrapping_sub(min) as u64;
        let mut shift = 0u32;
        while remaining != 0 {
            scatter_pass(&src, &dst, n, field, min, shift, bits, workers);
            core::mem::swap(&mut src, &mut dst);
            shift += bits;
            remaining >>= bits;
            passes += 1;
        }
    }
    trace_event!(pairs = n, bits, workers, passes, "radix_sort_pairs");

    for (i, pair) in pairs.iter_mut().enumerate() {
        *pair = [src.get(2 * i), src.get(2 * i + 1)];
    }
    Ok(())
}

fn field_bounds(buf: &ScatterBuffer, n: usize, field: usize) -> (i64, i64) {
    (0..n)
        .map(|i| buf.get(2 * i + field))
        .fold((i64::MAX, i64::MIN), |(lo, hi), k| (lo.min(k), hi.max(k)))
}

#[allow(clippy::too_many_arguments)]
fn scatter_pass(
    src: &ScatterBuffer,
    dst: &ScatterBuffer,
    n: usize,
    field: usize,
    min: i64,
    shift: u32,
    bits: u32,
    workers: usize,
) {
    let buckets = 1usize << bits;
    let mask = (buckets - 1) as u64;
    let digit = |i: usize| -> usize {
        let biased = src.get(2 * i + field).wrapping_sub(min) as u64;
        ((biased >> shift) & mask) as usize
    };

    // Histogram: cell (bucket, worker) lives at `bucket * workers + worker`.
    let counts = BucketCounters::zeroed(buckets * workers);
    for_each_range(n, workers, |w, range| {
        for i in range {
            counts.fetch_add(digit(i) * workers + w, 1);
        }
    });

    let mut starts = counts.into_vec();
    let total = exclusive_prefix_sum(&mut starts);
    debug_assert_eq!(total, n);
    let cursors = BucketCounters::from_values(&starts);

    for_each_range(n, workers, |w, range| {
        for i in range {
            let at = cursors.fetch_add(digit(i) * workers + w, 1);
            dst.put(2 * at, src.get(2 * i));
            dst.put(2 * at + 1, src.get(2 * i + 1));
        }
    });
}
