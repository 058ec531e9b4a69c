//! Bucket sort for `(first, second)` pairs with one bucket per distinct `first` value.
//!
//! Pairs are histogrammed by `first`, scattered through atomic fetch-and-add cursors (which
//! does not preserve input order), and each bucket spanning at least
//! [`MIN_SORTED_BUCKET_WORDS`] words is then sorted by the pair comparator. Smaller buckets hold
//! a single pair and are left alone.
//!
//! Hot buckets serialize on their cursor, so this sort suits moderate key ranges and worker
//! counts; [`radix_sort_pairs`](super::radix_sort_pairs) is the scalable alternative.

use crate::concurrency::{fork_join, fork_join::for_each_index, BucketCounters, ScatterBuffer};
use crate::error::{Error, Result};
use crate::primitives::counting_sort::MAX_COUNTING_RANGE;
use crate::primitives::prefix_sum::{exclusive_prefix_sum, split_mut};

/// A bucket is re-sorted when it spans at least this many `i64` words (two pairs).
pub const MIN_SORTED_BUCKET_WORDS: usize = 4;

/// Sorts `pairs` ascending by `[0]`, then by `[1]`.
///
/// # Errors
/// - [`Error::EmptyInput`] if `pairs` is empty.
/// - [`Error::KeyRange`] if the `first` values span too many buckets.
pub fn bucket_sort_pairs(pairs: &mut [[i64; 2]]) -> Result<()> {
    if pairs.is_empty() {
        return Err(Error::empty("bucket_sort_pairs"));
    }
    let n = pairs.len();

    let (min, max) = pairs
        .iter()
        .fold((i64::MAX, i64::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));
    let span = max.wrapping_sub(min) as u64;
    if span >= MAX_COUNTING_RANGE {
        return Err(Error::KeyRange { min, max });
    }
    let range = span as usize + 1;
    let bucket_of = |key: i64| key.wrapping_sub(min) as u64 as usize;

    // Histogram key values.
    let counts = BucketCounters::zeroed(range);
    {
        let view: &[[i64; 2]] = pairs;
        for_each_index(n, |i| {
            counts.fetch_add(bucket_of(view[i][0]), 1);
        });
    }

    // Start index of each bucket, plus a trailing end marker.
    let mut starts = counts.into_vec();
    starts.push(0);
    exclusive_prefix_sum(&mut starts);

    // Move each pair into its bucket's segment.
    let cursors = BucketCounters::from_values(&starts[..range]);
    let tmp = ScatterBuffer::zeroed(2 * n);
    {
        let view: &[[i64; 2]] = pairs;
        for_each_index(n, |i| {
            let at = cursors.fetch_add(bucket_of(view[i][0]), 1);
            tmp.put(2 * at, view[i][0]);
            tmp.put(2 * at + 1, view[i][1]);
        });
    }
    for (i, pair) in pairs.iter_mut().enumerate() {
        *pair = [tmp.get(2 * i), tmp.get(2 * i + 1)];
    }

    let ranges: Vec<_> = starts.windows(2).map(|w| w[0]..w[1]).collect();
    let mut segments = split_mut(pairs, &ranges);
    fork_join::for_each_mut(&mut segments, |_, seg| {
        if seg.len() * 2 >= MIN_SORTED_BUCKET_WORDS {
            seg.sort_unstable();
        }
    });
    Ok(())
}
