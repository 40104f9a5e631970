use std::any::Any;
use std::collections::btree_map::Entry;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::cell::TCell;
use crate::result::{StmClosureResult, StmError, UsageError};

use super::entry::{ArcAny, LogEntry};
use super::{clear_thread_active, mark_thread_active, EntryMap};

/// Commit and abort tallies of a transaction context.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TxStats {
    /// Transactions this context committed.
    pub commits: u64,

    /// Transactions this context explicitly aborted.
    pub aborts: u64,
}

/// A transaction context tracking all read and written cells.
///
/// Contexts are explicit values handed to every cell operation. A context
/// is confined to the thread that started it, and at most one context per
/// thread may be active at a time.
///
/// [`atomically`] drives a context through start, body and commit with
/// retries. [`begin`] and the methods below are the manual interface for
/// code that steers commit and abort itself.
///
/// [`atomically`]: crate::atomically
/// [`begin`]: Transaction::begin
pub struct Transaction {
    /// Whether a transaction currently runs on this context.
    active: bool,

    /// The log of accessed cells, sorted by cell address.
    cells: EntryMap,

    /// Lifetime tallies of this context.
    stats: TxStats,

    /// Keeps the context on the thread that started it.
    _not_send: PhantomData<*const ()>,
}

impl Transaction {
    /// Create an inactive context. [`start`] activates it.
    ///
    /// [`start`]: Transaction::start
    pub fn new() -> Transaction {
        Transaction {
            active: false,
            cells: EntryMap::new(),
            stats: TxStats::default(),
            _not_send: PhantomData,
        }
    }

    /// Create a context and start its first transaction.
    ///
    /// Fails with [`UsageError::TransactionAlreadyActive`] when the
    /// current thread already runs a transaction.
    pub fn begin() -> Result<Transaction, UsageError> {
        let mut tx = Transaction::new();
        tx.start()?;
        Ok(tx)
    }

    /// Start a transaction on this context with an empty log.
    ///
    /// Fails with [`UsageError::TransactionAlreadyActive`] when this
    /// context, or any other on the current thread, is still active.
    pub fn start(&mut self) -> Result<(), UsageError> {
        if self.active || !mark_thread_active() {
            return Err(UsageError::TransactionAlreadyActive);
        }

        self.active = true;
        self.cells.clear();
        Ok(())
    }

    /// Whether a transaction currently runs on this context.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The commit and abort tallies accumulated so far.
    pub fn stats(&self) -> TxStats {
        self.stats
    }

    #[allow(clippy::needless_pass_by_value)]
    /// Perform a downcast on a cell snapshot.
    fn downcast<T: Any + Clone>(value: ArcAny) -> T {
        match value.downcast_ref::<T>() {
            Some(s) => s.clone(),
            None => unreachable!("TCell<T> has wrong type"),
        }
    }

    /// Read a cell inside the transaction.
    ///
    /// The first read snapshots the committed value into the log; later
    /// reads of the same cell report the logged value. Either way the
    /// read fails with [`StmError::Conflict`] when the cell's lock is
    /// unavailable.
    pub fn read<T: Send + Sync + Any + Clone>(&mut self, cell: &TCell<T>) -> StmClosureResult<T> {
        self.ensure_active()?;

        let value = match self.cells.entry(cell.control_block().clone()) {
            Entry::Occupied(entry) => {
                // Repeat reads report the logged value but still probe
                // the lock, so a cell mid-commit conflicts here as well.
                let _probe = entry.key().value.try_read().ok_or(StmError::Conflict)?;
                entry.get().current()
            }
            Entry::Vacant(entry) => {
                let snapshot = {
                    let guard = entry.key().value.try_read().ok_or(StmError::Conflict)?;
                    guard.clone()
                };
                entry.insert(LogEntry::Read(snapshot.clone()));
                snapshot
            }
        };

        Ok(Transaction::downcast(value))
    }

    /// Write a value to a cell inside the transaction.
    ///
    /// The value lands in the log; the cell itself only changes on a
    /// successful [`commit`]. Writing never takes part in conflict
    /// detection, so it cannot fail with [`StmError::Conflict`].
    ///
    /// [`commit`]: Transaction::commit
    pub fn write<T: Any + Send + Sync + Clone>(
        &mut self,
        cell: &TCell<T>,
        value: T,
    ) -> StmClosureResult<()> {
        self.ensure_active()?;

        let pending: ArcAny = Arc::new(value);

        match self.cells.entry(cell.control_block().clone()) {
            Entry::Occupied(mut entry) => entry.get_mut().write(pending),
            Entry::Vacant(entry) => {
                // A blind write still snapshots a baseline; commit
                // validates it like any other entry.
                let baseline = cell.read_ref_atomic();
                entry.insert(LogEntry::Written { baseline, pending });
            }
        }

        Ok(())
    }

    /// Try to commit the logged accesses.
    ///
    /// Commit locks every logged cell in address order, read locks for
    /// cells only read and write locks for written ones. Locking never
    /// blocks: an unavailable lock fails the attempt with
    /// [`StmError::Conflict`]. Once all locks are held, every logged
    /// baseline is compared against the committed value, and a mismatch
    /// returns `Ok(false)`. Only when the whole log verifies are the
    /// pending values written back, and the transaction ends with
    /// `Ok(true)`.
    ///
    /// A failed attempt, `Ok(false)` or `Err`, leaves the transaction
    /// active with its log intact; the caller decides between [`abort`]
    /// and another attempt.
    ///
    /// [`abort`]: Transaction::abort
    pub fn commit(&mut self) -> StmClosureResult<bool> {
        self.ensure_active()?;

        {
            let mut read_guards = Vec::with_capacity(self.cells.len());
            let mut write_back = Vec::with_capacity(self.cells.len());

            for (block, entry) in &self.cells {
                match entry {
                    LogEntry::Read(snapshot) => {
                        let guard = block.value.try_read().ok_or(StmError::Conflict)?;
                        if !Arc::ptr_eq(&guard, snapshot) {
                            return Ok(false);
                        }
                        read_guards.push(guard);
                    }
                    LogEntry::Written { baseline, pending } => {
                        let guard = block.value.try_write().ok_or(StmError::Conflict)?;
                        if !Arc::ptr_eq(&guard, baseline) {
                            return Ok(false);
                        }
                        write_back.push((pending, guard));
                    }
                }
            }

            // The whole log checked out under lock. The read locks can
            // go; the held write locks pin the verified cells until the
            // new values are in place.
            drop(read_guards);

            for (pending, mut guard) in write_back {
                *guard = pending.clone();
            }
        }

        self.stats.commits += 1;
        self.deactivate();

        Ok(true)
    }

    /// Abort the running transaction, discarding its log.
    ///
    /// Aborting an inactive context is a no-op; only a live transaction
    /// counts towards the abort tally.
    pub fn abort(&mut self) {
        if self.active {
            self.stats.aborts += 1;
            self.deactivate();
        }
    }

    fn ensure_active(&self) -> Result<(), UsageError> {
        if self.active {
            Ok(())
        } else {
            Err(UsageError::NoActiveTransaction)
        }
    }

    fn deactivate(&mut self) {
        self.active = false;
        self.cells.clear();
        clear_thread_active();
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Transaction::new()
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        // A context dropped mid-transaction must not keep the thread
        // marked as running one.
        if self.active {
            clear_thread_active();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn read_the_committed_value() {
        let mut tx = Transaction::begin().unwrap();
        let cell = TCell::new(42);

        assert_eq!(tx.read(&cell), Ok(42));
    }

    #[test]
    fn write_then_read_reports_the_pending_value() {
        let mut tx = Transaction::begin().unwrap();
        let cell = TCell::new(0);

        tx.write(&cell, 42).unwrap();

        assert_eq!(tx.read(&cell), Ok(42));
        // The cell itself keeps the committed value until commit.
        assert_eq!(cell.read_atomic(), 0);
    }

    #[test]
    fn commit_applies_the_log() {
        let mut tx = Transaction::begin().unwrap();
        let cell = TCell::new(0);

        tx.write(&cell, 42).unwrap();

        assert_eq!(tx.commit(), Ok(true));
        assert_eq!(cell.read_atomic(), 42);
        assert!(!tx.is_active());
    }

    #[test]
    fn empty_transactions_commit() {
        let mut tx = Transaction::begin().unwrap();

        assert_eq!(tx.commit(), Ok(true));
        assert_eq!(tx.stats(), TxStats { commits: 1, aborts: 0 });
    }

    #[test]
    fn operations_need_an_active_transaction() {
        let mut tx = Transaction::begin().unwrap();
        tx.abort();

        let cell = TCell::new(7);

        assert_eq!(
            tx.read(&cell),
            Err(StmError::Usage(UsageError::NoActiveTransaction))
        );
        assert_eq!(
            tx.write(&cell, 8),
            Err(StmError::Usage(UsageError::NoActiveTransaction))
        );
        assert_eq!(
            tx.commit(),
            Err(StmError::Usage(UsageError::NoActiveTransaction))
        );
        assert_eq!(cell.read_atomic(), 7);
    }

    #[test]
    fn starting_twice_is_an_error() {
        let mut tx = Transaction::begin().unwrap();

        assert_eq!(tx.start(), Err(UsageError::TransactionAlreadyActive));
    }

    #[test]
    fn one_active_context_per_thread() {
        let _live = Transaction::begin().unwrap();

        assert!(matches!(
            Transaction::begin(),
            Err(UsageError::TransactionAlreadyActive)
        ));
    }

    #[test]
    fn dropping_an_active_context_releases_the_thread() {
        {
            let _tx = Transaction::begin().unwrap();
        }

        let tx = Transaction::begin().unwrap();
        assert!(tx.is_active());
    }

    #[test]
    fn abort_discards_the_log_and_tallies() {
        let mut tx = Transaction::begin().unwrap();
        let cell = TCell::new(1);

        tx.write(&cell, 2).unwrap();
        tx.abort();
        // Aborting again without a live transaction changes nothing.
        tx.abort();

        assert_eq!(cell.read_atomic(), 1);
        assert_eq!(tx.stats(), TxStats { commits: 0, aborts: 1 });

        tx.start().unwrap();
        assert_eq!(tx.read(&cell), Ok(1));
        assert_eq!(tx.commit(), Ok(true));
        assert_eq!(tx.stats(), TxStats { commits: 1, aborts: 1 });
    }
}
