use std::any::Any;
use std::hash::Hash;

use txcell::{atomically, TCell};

use crate::{bucket_index, ConcurrentSet, DEFAULT_BUCKETS};

/// A hash set whose buckets live in transactional cells.
///
/// Each operation runs as its own transaction over the one bucket it
/// touches. Operations on different buckets never conflict; contended
/// ones retry until they commit.
///
/// The operations start transactions themselves, so calling them from
/// inside another transaction panics.
pub struct TxHashSet<T> {
    buckets: Vec<TCell<Vec<T>>>,
}

impl<T> TxHashSet<T>
where
    T: Any + Send + Sync + Clone + Eq + Hash,
{
    pub fn new() -> TxHashSet<T> {
        TxHashSet::with_buckets(DEFAULT_BUCKETS)
    }

    pub fn with_buckets(buckets: usize) -> TxHashSet<T> {
        TxHashSet {
            buckets: (0..buckets).map(|_| TCell::new(Vec::new())).collect(),
        }
    }
}

impl<T> ConcurrentSet<T> for TxHashSet<T>
where
    T: Any + Send + Sync + Clone + Eq + Hash,
{
    fn add(&self, item: T) -> bool {
        let cell = &self.buckets[bucket_index(&item, self.buckets.len())];

        atomically(|tx| {
            let mut bucket = cell.read(tx)?;
            if bucket.contains(&item) {
                return Ok(false);
            }
            bucket.push(item.clone());
            cell.write(tx, bucket)?;
            Ok(true)
        })
        .expect("set operations cannot run inside a transaction")
    }

    fn contains(&self, item: &T) -> bool {
        let cell = &self.buckets[bucket_index(item, self.buckets.len())];

        atomically(|tx| Ok(cell.read(tx)?.contains(item)))
            .expect("set operations cannot run inside a transaction")
    }
}

impl<T> Default for TxHashSet<T>
where
    T: Any + Send + Sync + Clone + Eq + Hash,
{
    fn default() -> Self {
        TxHashSet::new()
    }
}

#[test]
fn add_then_contains() {
    let set = TxHashSet::new();

    assert!(set.add(42));
    assert!(!set.add(42));
    assert!(set.contains(&42));
    assert!(!set.contains(&7));
}

#[test]
fn colliding_items_share_a_bucket() {
    let set = TxHashSet::with_buckets(1);

    assert!(set.add(1));
    assert!(set.add(2));
    assert!(set.contains(&1));
    assert!(set.contains(&2));
}

#[test]
fn owns_non_copy_items() {
    let set = TxHashSet::new();

    assert!(set.add(String::from("carl")));
    assert!(!set.add(String::from("carl")));
    assert!(set.contains(&String::from("carl")));
}
