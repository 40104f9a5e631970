use parking_lot::RwLock;
use std::any::Any;
use std::cmp;
use std::fmt::{self, Debug};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::result::StmClosureResult;
use crate::Transaction;

/// `CellControlBlock` is the shared, untyped core of a [`TCell`].
///
/// Control blocks are what transaction logs actually reference; the cell
/// is just a typesafe handle around one. Their allocation address doubles
/// as cell identity and defines the one global order commits take locks in.
pub struct CellControlBlock {
    /// The committed value of the cell.
    ///
    /// The value sits behind an `Arc` so a reader can snapshot it without
    /// copying the payload, and so a log can tell "unchanged" from
    /// "replaced" by pointer identity alone.
    ///
    /// Only a committing transaction writes through this lock, and every
    /// transactional acquisition of it is a non-blocking try. Nobody holds
    /// it across a suspension point.
    pub(crate) value: RwLock<Arc<dyn Any + Send + Sync>>,
}

impl CellControlBlock {
    pub(crate) fn new<T>(val: T) -> Arc<CellControlBlock>
    where
        T: Any + Send + Sync,
    {
        Arc::new(CellControlBlock {
            value: RwLock::new(Arc::new(val)),
        })
    }

    fn address(&self) -> usize {
        std::ptr::from_ref::<CellControlBlock>(self) as usize
    }
}

// Comparison operators so that logs and commits can keep cells sorted
// by address.

impl PartialEq for CellControlBlock {
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }
}

impl Eq for CellControlBlock {}

impl Ord for CellControlBlock {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        self.address().cmp(&other.address())
    }
}

impl PartialOrd for CellControlBlock {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// A shared memory location that transactions read and write atomically.
///
/// `TCell` is a cheap handle: cloning it clones the handle, not the value,
/// and both clones name the same cell.
#[derive(Clone)]
pub struct TCell<T> {
    /// The control block carries the actual state.
    ///
    /// The rest of `TCell` is just the typesafe interface.
    control_block: Arc<CellControlBlock>,

    /// Keeps the handle typed while the block stays untyped.
    _marker: PhantomData<T>,
}

impl<T> TCell<T>
where
    T: Any + Send + Sync + Clone,
{
    /// Create a new `TCell` holding `val`.
    pub fn new(val: T) -> TCell<T> {
        TCell {
            control_block: CellControlBlock::new(val),
            _marker: PhantomData,
        }
    }

    #[allow(clippy::missing_panics_doc)]
    /// Read the committed value without a transaction.
    ///
    /// It is semantically close to
    ///
    /// ```
    /// # use txcell::*;
    /// let cell = TCell::new(0);
    /// atomically(|tx| cell.read(tx)).unwrap();
    /// ```
    ///
    /// but cheaper, and it can never conflict. The snapshot may already be
    /// outdated by the time the caller looks at it.
    ///
    /// `read_atomic` returns a clone of the value.
    pub fn read_atomic(&self) -> T {
        let val = self.read_ref_atomic();

        (&*val as &dyn Any)
            .downcast_ref::<T>()
            .expect("wrong type in TCell<T>")
            .clone()
    }

    /// Read the committed value without a transaction, as a shared
    /// reference.
    ///
    /// Mostly used internally, but useful when `read_atomic`'s clone of
    /// the inner value would be expensive.
    pub fn read_ref_atomic(&self) -> Arc<dyn Any + Send + Sync> {
        self.control_block.value.read().clone()
    }

    /// Read the cell as part of a transaction.
    ///
    /// Equivalent to `tx.read(&cell)`, but reads more naturally.
    pub fn read(&self, tx: &mut Transaction) -> StmClosureResult<T> {
        tx.read(self)
    }

    /// Write a value as part of a transaction.
    ///
    /// Equivalent to `tx.write(&cell, value)`.
    pub fn write(&self, tx: &mut Transaction, value: T) -> StmClosureResult<()> {
        tx.write(self, value)
    }

    /// Apply `f` to the content of the cell.
    ///
    /// ```
    /// # use txcell::*;
    /// let cell = TCell::new(21);
    /// atomically(|tx| cell.modify(tx, |x| x * 2)).unwrap();
    ///
    /// assert_eq!(cell.read_atomic(), 42);
    /// ```
    pub fn modify<F>(&self, tx: &mut Transaction, f: F) -> StmClosureResult<()>
    where
        F: FnOnce(T) -> T,
    {
        let old = self.read(tx)?;
        self.write(tx, f(old))
    }

    /// Replace the content of the cell, returning the old value.
    ///
    /// ```
    /// # use txcell::*;
    /// let cell = TCell::new(0);
    /// let old = atomically(|tx| cell.replace(tx, 42)).unwrap();
    ///
    /// assert_eq!(old, 0);
    /// assert_eq!(cell.read_atomic(), 42);
    /// ```
    pub fn replace(&self, tx: &mut Transaction, value: T) -> StmClosureResult<T> {
        let old = self.read(tx)?;
        self.write(tx, value)?;
        Ok(old)
    }

    /// Check whether two handles name the same cell.
    pub fn ref_eq(this: &TCell<T>, other: &TCell<T>) -> bool {
        Arc::ptr_eq(&this.control_block, &other.control_block)
    }

    pub(crate) fn control_block(&self) -> &Arc<CellControlBlock> {
        &self.control_block
    }
}

/// Debug output the committed value.
///
/// The read is not transactional: when another thread commits at the same
/// time, the printed state may already be stale.
impl<T> Debug for TCell<T>
where
    T: Any + Send + Sync + Clone,
    T: Debug,
{
    #[inline(never)]
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let x = self.read_atomic();
        f.debug_struct("TCell").field("value", &x).finish()
    }
}

#[test]
// Test if creating and reading a TCell works.
fn test_read_atomic() {
    let cell = TCell::new(42);

    assert_eq!(42, cell.read_atomic());
}

#[test]
fn test_ref_eq() {
    let cell = TCell::new(1);
    let alias = cell.clone();

    assert!(TCell::ref_eq(&cell, &alias));
    assert!(!TCell::ref_eq(&cell, &TCell::new(1)));
}

// More tests are in lib.rs.
