//! Record validation.
//!
//! [`validate`] turns a [`CandidateRecord`] into a [`LogRecord`] or explains
//! why it cannot. It never touches the store.

use chrono::{DateTime, Utc};

use crate::error::ValidationError;
use crate::types::{CandidateRecord, LogLevel, LogRecord, TimestampInput};

/// Validates and normalizes a candidate record.
///
/// # Errors
///
/// - [`ValidationError::MissingField`] if timestamp, level, message or source
///   is absent, or message/source is empty
/// - [`ValidationError::InvalidTimestamp`] if the timestamp text is not RFC 3339
/// - [`ValidationError::InvalidLevel`] if the level is not a known name
pub fn validate(candidate: &CandidateRecord) -> Result<LogRecord, ValidationError> {
    validate_owned(candidate.clone())
}

/// Validates a candidate, consuming it to avoid copying large payloads.
///
/// # Errors
///
/// Same as [`validate`].
pub fn validate_owned(candidate: CandidateRecord) -> Result<LogRecord, ValidationError> {
    let timestamp = match candidate.timestamp {
        Some(ref input) => parse_timestamp(input)?,
        None => return Err(ValidationError::MissingField("timestamp")),
    };

    let level: LogLevel = candidate
        .level
        .as_deref()
        .ok_or(ValidationError::MissingField("level"))?
        .parse()?;

    let message = candidate
        .message
        .filter(|m| !m.is_empty())
        .ok_or(ValidationError::MissingField("message"))?;
    let source = candidate
        .source
        .filter(|s| !s.is_empty())
        .ok_or(ValidationError::MissingField("source"))?;

    Ok(LogRecord {
        timestamp,
        level,
        message,
        source,
        error_code: candidate.error_code,
        context: candidate.context,
    })
}

/// Parses a timestamp input into a UTC instant.
///
/// Text must be RFC 3339 (`2024-01-15T10:30:00Z`, fractional seconds and
/// numeric offsets allowed).
///
/// # Errors
///
/// Returns [`ValidationError::InvalidTimestamp`] if the text does not parse.
pub fn parse_timestamp(input: &TimestampInput) -> Result<DateTime<Utc>, ValidationError> {
    match input {
        TimestampInput::Instant(instant) => Ok(*instant),
        TimestampInput::Text(text) => parse_instant(text)
            .ok_or_else(|| ValidationError::InvalidTimestamp(text.clone())),
    }
}

/// Parses RFC 3339 text into a UTC instant.
///
/// The text is taken as given; surrounding whitespace makes it invalid.
#[must_use]
pub fn parse_instant(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
