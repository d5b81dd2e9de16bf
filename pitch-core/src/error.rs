//! Error types for the session layer.
//!
//! The estimator itself never fails: silence, aperiodic input and degenerate
//! windows all come back as "no pitch". Errors only arise at the boundary with
//! the sample source and when loading configuration.

use thiserror::Error;

/// Result type for session and configuration operations.
pub type Result<T> = std::result::Result<T, PitchError>;

/// Errors that can occur around pitch estimation.
#[derive(Debug, Error)]
pub enum PitchError {
    /// The sample source has already ended and can deliver no more audio.
    #[error("sample source has ended")]
    StreamUnavailable,

    /// A configuration value is out of range.
    #[error("invalid config '{field}': {message}")]
    InvalidConfig {
        /// Offending field name.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PitchError {
    pub(crate) fn invalid_config(field: &'static str, message: impl Into<String>) -> Self {
        PitchError::InvalidConfig {
            field,
            message: message.into(),
        }
    }
}
