use std::any::Any;
use std::sync::Arc;

/// Value snapshots in a transaction log are untyped and shared.
pub type ArcAny = Arc<dyn Any + Send + Sync>;

/// `LogEntry` is the record a transaction keeps per accessed cell.
///
/// Every entry carries the `baseline`: the committed value that was
/// current when the cell first entered the log. Commit checks each
/// baseline against the cell and only applies the log when all of them
/// still match. A write does not lose the baseline, it only changes what
/// would be written back.
#[derive(Clone)]
pub enum LogEntry {
    /// The cell was only read.
    ///
    /// The snapshot doubles as the baseline.
    Read(ArcAny),

    /// The cell was written, after a read or blindly.
    ///
    /// `baseline` is the committed value observed on first access and
    /// `pending` is what commit will install.
    Written { baseline: ArcAny, pending: ArcAny },
}

impl LogEntry {
    /// The value a read inside the transaction observes.
    ///
    /// A written cell reads back its pending value, an unwritten one its
    /// snapshot.
    pub fn current(&self) -> ArcAny {
        match self {
            LogEntry::Read(snapshot) => snapshot.clone(),
            LogEntry::Written { pending, .. } => pending.clone(),
        }
    }

    /// Record a write, preserving the baseline of the first access.
    pub fn write(&mut self, value: ArcAny) {
        *self = match self {
            LogEntry::Read(snapshot) => LogEntry::Written {
                baseline: snapshot.clone(),
                pending: value,
            },
            LogEntry::Written { baseline, .. } => LogEntry::Written {
                baseline: baseline.clone(),
                pending: value,
            },
        };
    }

    /// The committed value this entry was built against.
    pub fn baseline(&self) -> &ArcAny {
        match self {
            LogEntry::Read(snapshot) => snapshot,
            LogEntry::Written { baseline, .. } => baseline,
        }
    }
}
