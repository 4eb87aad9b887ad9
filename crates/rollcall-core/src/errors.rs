//! Error types for the core vocabulary.
//!
//! [`CoreError`] covers construction-time validation of the shared types —
//! malformed scan windows and day policies. Subsystem-specific failures
//! (storage, signal validation, dispatch) live in their own crates.

use thiserror::Error;

/// Errors raised while constructing core types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Scan window bounds are not a valid interval.
    #[error("invalid scan window: {0}")]
    InvalidWindow(String),

    /// Day policy parameters are inconsistent with each other.
    #[error("invalid day policy: {0}")]
    InvalidPolicy(String),
}

/// Convenience type alias for core results.
pub type Result<T> = std::result::Result<T, CoreError>;
