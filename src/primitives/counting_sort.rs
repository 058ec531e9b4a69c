//! Counting sort over integer keys.
//!
//! Works on keys only. For strided records the key is the first word of each record and only
//! key positions are rewritten; the remaining words of each record are left where they were.

use crate::concurrency::{fork_join::for_each_index, BucketCounters};
use crate::error::{Error, Result};

/// Largest key range (in distinct values) a counting sort will allocate counters for.
pub const MAX_COUNTING_RANGE: u64 = 1 << 28;

/// Sorts `keys` ascending.
///
/// # Errors
/// - [`Error::EmptyInput`] if `keys` is empty.
/// - [`Error::KeyRange`] if `max - min` exceeds [`MAX_COUNTING_RANGE`].
pub fn counting_sort(keys: &mut [i64]) -> Result<()> {
    counting_sort_strided(keys, 1)
}

/// Sorts the first word of every `stride`-word record in `records` ascending.
///
/// # Errors
/// - [`Error::ZeroStride`] if `stride == 0`.
/// - [`Error::LengthMismatch`] if `records.len()` is not a multiple of `stride`.
/// - [`Error::EmptyInput`] if there are no records.
/// - [`Error::KeyRange`] if the key range is too wide.
pub fn counting_sort_strided(records: &mut [i64], stride: usize) -> Result<()> {
    if stride == 0 {
        return Err(Error::ZeroStride);
    }
    if records.len() % stride != 0 {
        return Err(Error::LengthMismatch {
            what: "strided records",
            expected: records.len() - records.len() % stride,
            actual: records.len(),
        });
    }
    let num = records.len() / stride;
    if num == 0 {
        return Err(Error::empty("counting_sort"));
    }

    let (min, max) = records
        .iter()
        .step_by(stride)
        .fold((i64::MAX, i64::MIN), |(lo, hi), &k| (lo.min(k), hi.max(k)));

    let span = max.wrapping_sub(min) as u64;
    if span >= MAX_COUNTING_RANGE {
        return Err(Error::KeyRange { min, max });
    }
    let range = span as usize + 1;

    let counts = BucketCounters::zeroed(range);
    {
        let view: &[i64] = records;
        for_each_index(num, |i| {
            let key = view[i * stride];
            counts.fetch_add(key.wrapping_sub(min) as u64 as usize, 1);
        });
    }

    let mut z = 0usize;
    for (offset, count) in counts.into_vec().into_iter().enumerate() {
        let key = min.wrapping_add(offset as i64);
        for _ in 0..count {
            records[z * stride] = key;
            z += 1;
        }
    }
    debug_assert_eq!(z, num);
    Ok(())
}
