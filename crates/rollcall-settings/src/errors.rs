//! Error types for settings loading.

use thiserror::Error;

/// Errors that can occur while loading or validating settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Settings file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file contained invalid JSON or mismatched types.
    #[error("parse error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A value parsed but is semantically invalid.
    #[error("invalid setting: {message}")]
    Invalid {
        /// Which setting failed and why.
        message: String,
    },
}

/// Convenience type alias for settings results.
pub type Result<T> = std::result::Result<T, SettingsError>;
