//! Error types for the ledger subsystem.
//!
//! [`LedgerError`] is the primary error type returned by all ledger
//! operations. `Sqlite` and `Pool` form the transient storage-fault class —
//! callers decide whether to surface them for retry ([`is_retryable`]) —
//! while `RecordNotFound` and `InvalidRecord` are terminal.
//!
//! [`is_retryable`]: LedgerError::is_retryable

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// `SQLite` database error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Schema migration failed.
    #[error("migration error: {message}")]
    Migration {
        /// Describes which migration failed and why.
        message: String,
    },

    /// No record exists for the requested (student, subject, date) key.
    #[error("no attendance record for {0}")]
    RecordNotFound(String),

    /// Record rejected before write, or a stored row failed to parse.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// Internal error (e.g. a row vanished mid-operation).
    #[error("internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Build a `RecordNotFound` for a logical key.
    pub fn not_found(student_id: &str, subject: &str, date: NaiveDate) -> Self {
        Self::RecordNotFound(format!("student {student_id}, subject {subject}, date {date}"))
    }

    /// Whether the failure is a transient storage fault worth retrying.
    ///
    /// Pool exhaustion and SQLite I/O errors qualify; key misses and
    /// validation failures never do.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Sqlite(_) | Self::Pool(_))
    }
}

/// Convenience type alias for ledger results.
pub type Result<T> = std::result::Result<T, LedgerError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
