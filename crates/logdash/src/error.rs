//! Error types for ingestion, storage and aggregation.

use std::time::Duration;

use thiserror::Error;

/// Reasons a candidate record is rejected by the validator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field was absent or empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The timestamp text could not be parsed as an RFC 3339 instant.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// The level is not one of error, warn, info, debug.
    #[error("invalid level: {0}")]
    InvalidLevel(String),

    /// An optional field had the wrong shape.
    #[error("invalid field: {0}")]
    InvalidField(&'static str),

    /// The candidate was not a JSON object.
    #[error("candidate is not an object")]
    NotAnObject,
}

/// Errors that can occur in the logdash core.
#[derive(Debug, Error)]
pub enum LogError {
    /// A candidate record failed validation.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Query parameters were malformed, out of range or duplicated.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// A source blob did not decode to a sequence of candidates.
    #[error("malformed source: {0}")]
    MalformedSource(String),

    /// The store is closed and cannot serve requests.
    #[error("store unavailable")]
    StoreUnavailable,

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The remote collector transport failed.
    #[error("collector error: {0}")]
    Collector(String),

    /// The remote collector did not answer in time.
    #[error("collector timed out after {0:?}")]
    CollectorTimeout(Duration),
}

impl LogError {
    /// Returns true for per-record failures that a batch tolerates.
    #[must_use]
    pub const fn is_record_level(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Result type alias for logdash operations.
pub type Result<T> = std::result::Result<T, LogError>;
