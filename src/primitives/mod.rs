//! Parallel primitives: prefix sums, counting/radix/bucket sorts and sorted search.
//!
//! Every higher layer buckets items by key through these routines. Shared state during the
//! histogram and scatter phases is limited to atomic fetch-and-add counters, so results are
//! deterministic regardless of how many workers run them (bucket sort's intra-bucket order
//! before its final per-bucket sort is the one documented exception).

pub mod bucket_sort;
pub mod counting_sort;
pub mod prefix_sum;
pub mod radix_sort;
pub mod search;

pub use bucket_sort::bucket_sort_pairs;
pub use counting_sort::{counting_sort, counting_sort_strided};
pub use prefix_sum::{exclusive_prefix_sum, offsets_from_degrees, prefix_sum, prefix_sum_with_workers};
pub use radix_sort::{radix_sort_pairs, radix_sort_pairs_with_workers, DEFAULT_RADIX_BITS, MAX_RADIX_BITS};
pub use search::find_in_sorted;
