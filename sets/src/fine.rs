use parking_lot::Mutex;
use std::hash::Hash;

use crate::{bucket_index, ConcurrentSet, DEFAULT_BUCKETS};

/// A hash set with one lock per bucket.
///
/// Operations on different buckets run in parallel; only operations on
/// the same bucket contend.
pub struct FineHashSet<T> {
    buckets: Vec<Mutex<Vec<T>>>,
}

impl<T: Eq + Hash> FineHashSet<T> {
    pub fn new() -> FineHashSet<T> {
        FineHashSet::with_buckets(DEFAULT_BUCKETS)
    }

    pub fn with_buckets(buckets: usize) -> FineHashSet<T> {
        FineHashSet {
            buckets: (0..buckets).map(|_| Mutex::new(Vec::new())).collect(),
        }
    }
}

impl<T: Eq + Hash> ConcurrentSet<T> for FineHashSet<T> {
    fn add(&self, item: T) -> bool {
        let mut bucket = self.buckets[bucket_index(&item, self.buckets.len())].lock();

        if bucket.contains(&item) {
            return false;
        }
        bucket.push(item);
        true
    }

    fn contains(&self, item: &T) -> bool {
        self.buckets[bucket_index(item, self.buckets.len())]
            .lock()
            .contains(item)
    }
}

impl<T: Eq + Hash> Default for FineHashSet<T> {
    fn default() -> Self {
        FineHashSet::new()
    }
}

#[test]
fn add_then_contains() {
    let set = FineHashSet::new();

    assert!(set.add(42));
    assert!(!set.add(42));
    assert!(set.contains(&42));
    assert!(!set.contains(&7));
}
