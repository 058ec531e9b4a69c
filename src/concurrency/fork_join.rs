//! Data-parallel fork-join over contiguous index ranges.
//!
//! With the `parallel` feature the work runs on rayon's global pool. Without it, work is
//! split into one contiguous range per worker and executed on `std::thread::scope` threads.
//! Either way every helper returns only after all spawned work has finished, so borrowed
//! data never outlives the call.

use core::ops::Range;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Inputs shorter than this run inline on the calling thread in the scoped fallback.
#[cfg(not(feature = "parallel"))]
const SEQUENTIAL_CUTOFF: usize = 1 << 12;

/// Number of workers the runtime will use for a parallel region.
pub fn current_workers() -> usize {
    #[cfg(feature = "parallel")]
    {
        rayon::current_num_threads().max(1)
    }
    #[cfg(not(feature = "parallel"))]
    {
        std::thread::available_parallelism().map_or(1, core::num::NonZeroUsize::get)
    }
}

/// Splits `0..len` into `parts` contiguous ranges whose lengths differ by at most one.
///
/// Range `k` is `[k*len/parts, (k+1)*len/parts)`. Empty ranges are kept so that range `k`
/// always belongs to worker `k`.
pub fn split_ranges(len: usize, parts: usize) -> Vec<Range<usize>> {
    let parts = parts.max(1);
    (0..parts)
        .map(|k| (k * len) / parts..((k + 1) * len) / parts)
        .collect()
}

/// Runs `f(i)` for every `i` in `0..len`.
pub fn for_each_index<F>(len: usize, f: F)
where
    F: Fn(usize) + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        (0..len).into_par_iter().for_each(f);
    }
    #[cfg(not(feature = "parallel"))]
    {
        for_each_range(len, current_workers(), |_, range| range.for_each(&f));
    }
}

/// Runs `f(i, &mut items[i])` for every element.
pub fn for_each_mut<T, F>(items: &mut [T], f: F)
where
    T: Send,
    F: Fn(usize, &mut T) + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        items.par_iter_mut().enumerate().for_each(|(i, item)| f(i, item));
    }
    #[cfg(not(feature = "parallel"))]
    {
        let workers = current_workers();
        if workers == 1 || items.len() < SEQUENTIAL_CUTOFF {
            for (i, item) in items.iter_mut().enumerate() {
                f(i, item);
            }
            return;
        }
        let chunk = items.len().div_ceil(workers);
        std::thread::scope(|scope| {
            for (c, slice) in items.chunks_mut(chunk).enumerate() {
                let f = &f;
                scope.spawn(move || {
                    let base = c * chunk;
                    for (i, item) in slice.iter_mut().enumerate() {
                        f(base + i, item);
                    }
                });
            }
        });
    }
}

/// Collects `f(i)` for every `i` in `0..len`, preserving index order.
pub fn map_indices<R, F>(len: usize, f: F) -> Vec<R>
where
    R: Send,
    F: Fn(usize) -> R + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        (0..len).into_par_iter().map(f).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        map_ranges(len, current_workers(), |_, range| range.map(&f).collect::<Vec<R>>())
            .into_iter()
            .flatten()
            .collect()
    }
}

/// Runs `f(worker, range)` once per worker over `split_ranges(len, workers)`.
///
/// Unlike [`for_each_index`], the caller sees the worker id and its whole range, which is what
/// two-pass schemes (per-worker partial sums, per-worker bucket cursors) need.
pub fn for_each_range<F>(len: usize, workers: usize, f: F)
where
    F: Fn(usize, Range<usize>) + Sync + Send,
{
    map_ranges(len, workers, |w, r| f(w, r));
}

/// Collects `f(worker, range)` for every worker, in worker order.
pub fn map_ranges<R, F>(len: usize, workers: usize, f: F) -> Vec<R>
where
    R: Send,
    F: Fn(usize, Range<usize>) -> R + Sync + Send,
{
    let ranges = split_ranges(len, workers);

    #[cfg(feature = "parallel")]
    {
        ranges
            .into_par_iter()
            .enumerate()
            .map(|(w, r)| f(w, r))
            .collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        if ranges.len() == 1 || len < SEQUENTIAL_CUTOFF {
            return ranges.into_iter().enumerate().map(|(w, r)| f(w, r)).collect();
        }
        std::thread::scope(|scope| {
            let f = &f;
            let handles: Vec<_> = ranges
                .into_iter()
                .enumerate()
                .map(|(w, r)| scope.spawn(move || f(w, r)))
                .collect();
            handles
                .into_iter()
                .map(|h| match h.join() {
                    Ok(v) => v,
                    Err(payload) => std::panic::resume_unwind(payload),
                })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn split_ranges_covers_everything_once() {
        for len in [0usize, 1, 7, 64, 1000] {
            for parts in [1usize, 2, 3, 8, 33] {
                let ranges = split_ranges(len, parts);
                assert_eq!(ranges.len(), parts);
                let mut next = 0;
                for r in &ranges {
                    assert_eq!(r.start, next);
                    next = r.end;
                }
                assert_eq!(next, len);
            }
        }
    }

    #[test]
    fn for_each_index_visits_each_index() {
        let hits: Vec<AtomicUsize> = (0..5000).map(|_| AtomicUsize::new(0)).collect();
        for_each_index(hits.len(), |i| {
            hits[i].fetch_add(1, Ordering::Relaxed);
        });
        assert!(hits.iter().all(|h| h.load(Ordering::Relaxed) == 1));
    }

    #[test]
    fn map_indices_preserves_order() {
        let out = map_indices(10_000, |i| i * 2);
        assert!(out.iter().enumerate().all(|(i, &v)| v == i * 2));
    }

    #[test]
    fn for_each_mut_passes_global_index() {
        let mut v = vec![0usize; 9000];
        for_each_mut(&mut v, |i, x| *x = i);
        assert!(v.iter().enumerate().all(|(i, &x)| x == i));
    }

    #[test]
    fn map_ranges_returns_in_worker_order() {
        let lens = map_ranges(100, 4, |w, r| (w, r.len()));
        assert_eq!(lens, vec![(0, 25), (1, 25), (2, 25), (3, 25)]);
    }
}
