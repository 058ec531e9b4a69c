//! Inclusive prefix sum with deterministic two-pass parallel execution.
//!
//! The slice is cut into one contiguous range per worker. Pass one sums each range; the
//! partial sums are exclusive-prefixed on the calling thread; pass two scans each range
//! seeded with its worker's offset. The result does not depend on the worker count.

use core::ops::AddAssign;

use num_traits::Zero;

use crate::concurrency::fork_join::{self, current_workers, map_ranges, split_ranges};
use crate::error::{Error, Result};

/// Replaces `ary[k]` with `ary[0] + ... + ary[k]` and returns the total.
///
/// # Errors
/// Returns [`Error::EmptyInput`] if `ary` is empty.
pub fn prefix_sum<T>(ary: &mut [T]) -> Result<T>
where
    T: Copy + Send + Sync + Zero + AddAssign,
{
    prefix_sum_with_workers(ary, current_workers())
}

/// Like [`prefix_sum`] with an explicit worker count.
///
/// `workers` is clamped to `1..=ary.len()`.
///
/// # Errors
/// Returns [`Error::EmptyInput`] if `ary` is empty.
pub fn prefix_sum_with_workers<T>(ary: &mut [T], workers: usize) -> Result<T>
where
    T: Copy + Send + Sync + Zero + AddAssign,
{
    if ary.is_empty() {
        return Err(Error::empty("prefix_sum"));
    }
    Ok(inclusive_scan(ary, workers))
}

/// Turns bucket counts into bucket start offsets in place and returns the total.
///
/// After the call `counts[k]` is the sum of the original `counts[..k]`.
pub fn exclusive_prefix_sum(counts: &mut [usize]) -> usize {
    if counts.is_empty() {
        return 0;
    }
    let total = inclusive_scan(counts, current_workers());
    counts.rotate_right(1);
    counts[0] = 0;
    total
}

/// Builds a CSR offset array of length `degrees.len() + 1` from per-row degrees.
pub fn offsets_from_degrees(degrees: &[usize]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(degrees.len() + 1);
    offsets.extend_from_slice(degrees);
    offsets.push(0);
    exclusive_prefix_sum(&mut offsets);
    offsets
}

fn inclusive_scan<T>(ary: &mut [T], workers: usize) -> T
where
    T: Copy + Send + Sync + Zero + AddAssign,
{
    let n = ary.len();
    debug_assert!(n > 0);
    let workers = workers.clamp(1, n);

    if workers == 1 {
        scan_slice(ary, T::zero());
        return ary[n - 1];
    }

    // Pass 1: per-worker slice sums.
    let partials: Vec<T> = {
        let view: &[T] = ary;
        map_ranges(n, workers, |_, range| {
            let mut acc = T::zero();
            for &x in &view[range] {
                acc += x;
            }
            acc
        })
    };

    // Exclusive prefix over the partials.
    let mut seeds = Vec::with_capacity(workers);
    let mut running = T::zero();
    for p in partials {
        seeds.push(running);
        running += p;
    }

    // Pass 2: scan each slice starting from its seed.
    let mut jobs: Vec<(&mut [T], T)> = split_mut(ary, &split_ranges(n, workers))
        .into_iter()
        .zip(seeds)
        .collect();
    fork_join::for_each_mut(&mut jobs, |_, (slice, seed)| scan_slice(slice, *seed));

    ary[n - 1]
}

#[inline]
fn scan_slice<T: Copy + AddAssign>(slice: &mut [T], seed: T) {
    let Some((first, rest)) = slice.split_first_mut() else {
        return;
    };
    *first += seed;
    let mut prev = *first;
    for x in rest {
        *x += prev;
        prev = *x;
    }
}

/// Splits `data` into the consecutive `ranges` (which must tile `0..data.len()`).
pub(crate) fn split_mut<'a, T>(
    data: &'a mut [T],
    ranges: &[core::ops::Range<usize>],
) -> Vec<&'a mut [T]> {
    let mut out = Vec::with_capacity(ranges.len());
    let mut tail = data;
    let mut consumed = 0;
    for r in ranges {
        debug_assert_eq!(r.start, consumed);
        let (head, rest) = tail.split_at_mut(r.end - consumed);
        out.push(head);
        tail = rest;
        consumed = r.end;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_rejected() {
        let mut v: Vec<i64> = Vec::new();
        let err = prefix_sum(&mut v).unwrap_err();
        assert!(err.is_precondition());
    }

    #[test]
    fn single_element() {
        let mut v = vec![42i64];
        assert_eq!(prefix_sum(&mut v).unwrap(), 42);
        assert_eq!(v, vec![42]);
    }

    #[test]
    fn matches_sequential_scan_for_every_worker_count() {
        let original: Vec<i64> = (0..997).map(|i| (i * 7919 % 113) - 50).collect();
        let mut expected = original.clone();
        for k in 1..expected.len() {
            expected[k] += expected[k - 1];
        }
        for workers in [1usize, 2, 3, 4, 7, 16, 64, 997, 5000] {
            let mut v = original.clone();
            let total = prefix_sum_with_workers(&mut v, workers).unwrap();
            assert_eq!(v, expected, "workers = {workers}");
            assert_eq!(total, *expected.last().unwrap());
        }
    }

    #[test]
    fn exclusive_offsets() {
        let mut counts = vec![2usize, 0, 3, 1];
        assert_eq!(exclusive_prefix_sum(&mut counts), 6);
        assert_eq!(counts, vec![0, 2, 2, 5]);

        assert_eq!(offsets_from_degrees(&[2, 1, 0]), vec![0, 2, 3, 3]);
        assert_eq!(offsets_from_degrees(&[]), vec![0]);
    }
}
