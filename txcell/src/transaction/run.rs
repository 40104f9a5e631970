use log::{debug, trace};

use crate::backoff::Backoff;
use crate::result::{ExecuteError, StmClosureResult, StmError, UsageError};

use super::log::Transaction;

/// Drive `f` to a successful commit, or until the budget runs out.
fn run<T, F>(budget: Option<u32>, f: F) -> Result<T, ExecuteError>
where
    F: Fn(&mut Transaction) -> StmClosureResult<T>,
{
    let mut tx = Transaction::begin()?;
    let mut backoff = Backoff::default();
    let mut attempts: u32 = 1;

    loop {
        match f(&mut tx) {
            Ok(value) => match tx.commit() {
                Ok(true) => {
                    debug!("transaction committed on attempt {}", attempts);
                    return Ok(value);
                }
                Ok(false) => trace!("commit validation failed, retrying"),
                Err(StmError::Conflict) => trace!("commit hit a contended cell, retrying"),
                Err(StmError::Usage(usage)) => return Err(usage.into()),
            },
            Err(StmError::Conflict) => trace!("body hit a contended cell, retrying"),
            Err(StmError::Usage(usage)) => return Err(usage.into()),
        }

        tx.abort();

        if let Some(limit) = budget {
            if attempts >= limit {
                debug!("retry budget exhausted after {} attempts", attempts);
                return Err(ExecuteError::RetriesExhausted { attempts });
            }
        }

        attempts += 1;
        backoff.pause();
        tx.start()?;
    }
}

/// Run a function atomically with respect to every other transaction.
///
/// The body may run several times: after a conflict or a failed
/// validation the transaction is aborted and started over with a fresh
/// log, pausing with a jittered, growing delay between attempts. The body
/// should therefore be free of side effects other than its cell accesses.
///
/// Misuse, like starting a transaction inside another one, is reported as
/// an error instead of being retried.
///
/// ```
/// # use txcell::*;
/// let cell = TCell::new(21);
///
/// let doubled = atomically(|tx| {
///     let x = cell.read(tx)?;
///     cell.write(tx, x * 2)?;
///     Ok(x * 2)
/// })
/// .unwrap();
///
/// assert_eq!(doubled, 42);
/// assert_eq!(cell.read_atomic(), 42);
/// ```
pub fn atomically<T, F>(f: F) -> Result<T, UsageError>
where
    F: Fn(&mut Transaction) -> StmClosureResult<T>,
{
    match run(None, f) {
        Ok(value) => Ok(value),
        Err(ExecuteError::Usage(usage)) => Err(usage),
        Err(ExecuteError::RetriesExhausted { .. }) => {
            unreachable!("unbudgeted transaction ran out of attempts")
        }
    }
}

/// Like [`atomically`], but giving up after `attempts` tries.
///
/// A budget of `n` means the body runs at most `n` times; when the last
/// attempt still fails to commit, the call ends with
/// [`ExecuteError::RetriesExhausted`] and no cell is modified. A budget
/// of zero behaves like a budget of one.
pub fn atomically_with_budget<T, F>(attempts: u32, f: F) -> Result<T, ExecuteError>
where
    F: Fn(&mut Transaction) -> StmClosureResult<T>,
{
    run(Some(attempts), f)
}
