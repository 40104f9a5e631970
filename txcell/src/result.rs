/// Caller misuse of the transactional API.
///
/// These are programming errors, not contention. The coordinator never
/// retries them and hands them straight back to the caller.
#[derive(Eq, PartialEq, Clone, Copy, Debug, thiserror::Error)]
pub enum UsageError {
    /// A cell operation or a commit ran against a context whose
    /// transaction is not active.
    #[error("no active transaction on this context")]
    NoActiveTransaction,

    /// A transaction was started while one is already active on this
    /// thread, either on the same context or on another one.
    #[error("a transaction is already active on this thread")]
    TransactionAlreadyActive,
}

/// Failure of a single step inside a transaction body.
#[derive(Eq, PartialEq, Clone, Copy, Debug, thiserror::Error)]
pub enum StmError {
    /// A non-blocking lock attempt lost against a committer. The
    /// enclosing transaction must be discarded and re-run.
    #[error("transactional cell is contended")]
    Conflict,

    /// Misuse observed mid-body; bubbles out of the retry loop untouched.
    #[error(transparent)]
    Usage(#[from] UsageError),
}

/// Result of a single step of an STM calculation.
///
/// Propagate it with `?`. Recovering from [`StmError::Conflict`] by hand
/// breaks the retry protocol; only the coordinator should see it.
pub type StmClosureResult<T> = Result<T, StmError>;

/// Failure of a budgeted run ([`atomically_with_budget`]).
///
/// [`atomically_with_budget`]: crate::atomically_with_budget
#[derive(Eq, PartialEq, Clone, Copy, Debug, thiserror::Error)]
pub enum ExecuteError {
    /// Caller misuse, surfaced unchanged.
    #[error(transparent)]
    Usage(#[from] UsageError),

    /// The attempt budget ran out before any attempt committed.
    #[error("transaction gave up after {attempts} attempts")]
    RetriesExhausted {
        /// Attempts consumed, the initial run included.
        attempts: u32,
    },
}
