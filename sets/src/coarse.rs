use parking_lot::Mutex;
use std::hash::Hash;

use crate::{bucket_index, ConcurrentSet, DEFAULT_BUCKETS};

/// A hash set guarded by a single lock.
///
/// Every operation serializes behind one mutex. The baseline the other
/// strategies are measured against.
pub struct CoarseHashSet<T> {
    table: Mutex<Vec<Vec<T>>>,
}

impl<T: Eq + Hash> CoarseHashSet<T> {
    pub fn new() -> CoarseHashSet<T> {
        CoarseHashSet::with_buckets(DEFAULT_BUCKETS)
    }

    pub fn with_buckets(buckets: usize) -> CoarseHashSet<T> {
        CoarseHashSet {
            table: Mutex::new((0..buckets).map(|_| Vec::new()).collect()),
        }
    }
}

impl<T: Eq + Hash> ConcurrentSet<T> for CoarseHashSet<T> {
    fn add(&self, item: T) -> bool {
        let mut table = self.table.lock();
        let bucket = bucket_index(&item, table.len());

        if table[bucket].contains(&item) {
            return false;
        }
        table[bucket].push(item);
        true
    }

    fn contains(&self, item: &T) -> bool {
        let table = self.table.lock();
        table[bucket_index(item, table.len())].contains(item)
    }
}

impl<T: Eq + Hash> Default for CoarseHashSet<T> {
    fn default() -> Self {
        CoarseHashSet::new()
    }
}

#[test]
fn add_then_contains() {
    let set = CoarseHashSet::new();

    assert!(set.add(42));
    assert!(!set.add(42));
    assert!(set.contains(&42));
    assert!(!set.contains(&7));
}
