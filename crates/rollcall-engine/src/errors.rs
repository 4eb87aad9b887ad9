//! Error types for the recorder, sweep, and collaborator seams.
//!
//! The taxonomy mirrors how callers must react:
//!
//! - [`RecorderError::InvalidSignal`] — rejected synchronously, never retried
//! - [`RecorderError::Storage`] — transient; surfaced for client-driven retry
//! - [`ReconcileError::Roster`] — aborts a sweep before any write
//! - [`DispatchError`] — always non-fatal; logged, never propagated into a
//!   write path
//!
//! A duplicate signal is deliberately absent here: it is an outcome
//! ([`RecordOutcome::Duplicate`]), not an error.
//!
//! [`RecordOutcome::Duplicate`]: crate::recorder::RecordOutcome::Duplicate

use thiserror::Error;

use rollcall_ledger::LedgerError;

/// Errors from the attendance recorder.
#[derive(Debug, Error)]
pub enum RecorderError {
    /// Malformed or incomplete presence signal; never retried.
    #[error("invalid signal: {0}")]
    InvalidSignal(String),

    /// Ledger failure. Retryable when the underlying fault is
    /// (`LedgerError::is_retryable`); the recorder itself never retries, to
    /// avoid amplifying duplicate signals.
    #[error("ledger failure: {0}")]
    Storage(#[from] LedgerError),
}

impl RecorderError {
    /// Whether the caller may usefully retry the same signal.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::InvalidSignal(_) => false,
            Self::Storage(err) => err.is_retryable(),
        }
    }
}

/// Errors from roster providers.
#[derive(Debug, Error)]
pub enum RosterError {
    /// The provider could not produce the enrollment set.
    #[error("roster provider error: {0}")]
    Provider(String),
}

/// Errors that abort a reconciliation run before any write.
///
/// Per-student ledger failures do not abort the run — they are accumulated
/// in the run summary instead.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The roster could not be fetched; sweeping a partial roster would
    /// mark students absent for sections the provider never vouched for.
    #[error("roster unavailable: {0}")]
    Roster(#[from] RosterError),
}

/// Notification delivery failure. Never fatal to the caller.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Delivery to the downstream channel failed.
    #[error("notification dispatch failed: {0}")]
    Delivery(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_signal_is_not_retryable() {
        let err = RecorderError::InvalidSignal("empty student id".into());
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "invalid signal: empty student id");
    }

    #[test]
    fn storage_retryability_follows_the_ledger() {
        let transient: RecorderError =
            LedgerError::Sqlite(rusqlite::Error::QueryReturnedNoRows).into();
        assert!(transient.is_retryable());

        let terminal: RecorderError = LedgerError::InvalidRecord("bad".into()).into();
        assert!(!terminal.is_retryable());
    }

    #[test]
    fn roster_error_wraps_into_reconcile_error() {
        let err: ReconcileError = RosterError::Provider("upstream 503".into()).into();
        assert_eq!(err.to_string(), "roster unavailable: upstream 503");
    }

    #[test]
    fn dispatch_error_display() {
        let err = DispatchError::Delivery("channel closed".into());
        assert!(err.to_string().contains("dispatch failed"));
    }
}
