pub mod entry;
pub mod log;
pub mod run;

pub use self::log::{Transaction, TxStats};
pub use self::run::{atomically, atomically_with_budget};

use std::cell::Cell;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::cell::CellControlBlock;
use self::entry::LogEntry;

/// The per-transaction register of accessed cells.
///
/// A `BTreeMap` keyed by control block keeps the register sorted by cell
/// address, which is exactly the order commit acquires locks in.
pub(crate) type EntryMap = BTreeMap<Arc<CellControlBlock>, LogEntry>;

thread_local! {
    /// Marks whether the current thread already runs a transaction.
    ///
    /// Contexts are explicit values, but at most one of them may be live
    /// per thread. The flag is how a second `begin` or `start` on the
    /// same thread gets caught.
    static ACTIVE_ON_THREAD: Cell<bool> = const { Cell::new(false) };
}

/// Claim the thread for a transaction. Returns `false` when another
/// transaction is already live on it.
pub(crate) fn mark_thread_active() -> bool {
    ACTIVE_ON_THREAD.with(|flag| {
        if flag.get() {
            false
        } else {
            flag.set(true);
            true
        }
    })
}

/// Release the thread after a commit, abort or drop.
pub(crate) fn clear_thread_active() {
    ACTIVE_ON_THREAD.with(|flag| flag.set(false));
}
