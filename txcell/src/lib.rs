//! Optimistic software transactional memory over shared cells.
//!
//! A [`TCell`] holds a value that many threads read and write through
//! transactions. A transaction buffers every access in a private log and
//! publishes all of its writes at once on commit, after checking that no
//! cell it touched changed in the meantime. A transaction that fails
//! leaves no trace and is simply run again.
//!
//! The easiest way to run one is [`atomically`]:
//!
//! ```
//! use txcell::{atomically, TCell};
//!
//! let balance = TCell::new(100);
//!
//! atomically(|tx| {
//!     let x = balance.read(tx)?;
//!     balance.write(tx, x - 30)
//! })
//! .unwrap();
//!
//! assert_eq!(balance.read_atomic(), 70);
//! ```
//!
//! `atomically` retries conflicted transactions with a capped, jittered
//! backoff until one commits; [`atomically_with_budget`] bounds the
//! number of attempts instead. Code that wants to steer commit and abort
//! itself holds an explicit [`Transaction`] context:
//!
//! ```
//! use txcell::{TCell, Transaction};
//!
//! let cell = TCell::new(5);
//!
//! let mut tx = Transaction::begin().unwrap();
//! let x = cell.read(&mut tx).unwrap();
//! cell.write(&mut tx, x + 1).unwrap();
//!
//! // false would mean a concurrent commit got in between.
//! assert!(tx.commit().unwrap());
//! assert_eq!(cell.read_atomic(), 6);
//! ```
//!
//! # Rules
//!
//! A transaction body may run more than once, so it must not have side
//! effects besides its cell accesses: no I/O, no other synchronization
//! primitives, no transaction inside another one. Nesting is reported as
//! [`UsageError::TransactionAlreadyActive`] rather than retried.
//!
//! Commits take their cell locks in one global order and never wait for
//! a lock, so transactions cannot deadlock each other.

mod backoff;
mod cell;
mod result;
mod transaction;

pub use crate::backoff::Backoff;
pub use crate::cell::TCell;
pub use crate::result::{ExecuteError, StmClosureResult, StmError, UsageError};
pub use crate::transaction::{atomically, atomically_with_budget, Transaction, TxStats};
