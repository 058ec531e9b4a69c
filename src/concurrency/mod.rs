//! Concurrency helpers: fork-join execution and atomic bucket arrays.
//!
//! Important: nothing here provides mutual exclusion. Histogram and scatter phases coordinate
//! solely through atomic fetch-and-add on [`BucketCounters`]; everything else writes to
//! disjoint index ranges.

pub mod atomic;
pub mod fork_join;

pub use atomic::{BucketCounters, ScatterBuffer};
pub use fork_join::current_workers;
