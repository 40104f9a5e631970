//! Hash sets built on three concurrency strategies.
//!
//! All three share the [`ConcurrentSet`] interface and a fixed bucket
//! table. [`CoarseHashSet`] takes one lock around the whole table,
//! [`FineHashSet`] one lock per bucket, and [`TxHashSet`] keeps each
//! bucket in a transactional cell and runs every operation as its own
//! transaction.
//!
//! The sets exist to pit the strategies against each other under the
//! same workload; see the accompanying benchmarks.

mod coarse;
mod fine;
mod txset;

pub use crate::coarse::CoarseHashSet;
pub use crate::fine::FineHashSet;
pub use crate::txset::TxHashSet;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Number of buckets the sets allocate by default.
pub const DEFAULT_BUCKETS: usize = 1024;

/// A set shared between threads.
///
/// The sets never resize; a heavily loaded bucket degrades into longer
/// probes instead of a reallocation.
pub trait ConcurrentSet<T> {
    /// Insert `item`. Returns `false` when it was already present.
    fn add(&self, item: T) -> bool;

    /// Whether `item` is in the set.
    fn contains(&self, item: &T) -> bool;
}

/// Map an item to its bucket.
fn bucket_index<T: Hash>(item: &T, buckets: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    item.hash(&mut hasher);
    (hasher.finish() as usize) % buckets
}
