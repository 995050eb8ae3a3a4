//! Core types for log records.
//!
//! This module provides:
//! - [`LogLevel`] — The closed set of severities
//! - [`LogRecord`] — A validated record
//! - [`StoredRecord`] — A record with store-assigned identity and bookkeeping
//! - [`CandidateRecord`] — Unvalidated input to the ingestion pipeline
//! - [`TimeWindow`] and [`RecordFilter`] — Read-side filtering
//! - [`RetentionPolicy`] — The event-time expiry rule

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;

/// How long a record stays visible, measured from its event timestamp.
pub const RETENTION_WINDOW: Duration = Duration::from_secs(10 * 24 * 60 * 60);

/// Opaque structured payload attached to a record.
pub type Context = Map<String, Value>;

/// Identifier assigned by the store on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(pub u64);

/// Log severity levels.
///
/// Declaration order is the severity order used to break ties in the level
/// distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Error conditions
    Error,
    /// Warning conditions
    Warn,
    /// General information
    Info,
    /// Debugging information
    Debug,
}

impl LogLevel {
    /// All levels, most severe first.
    pub const ALL: [Self; 4] = [Self::Error, Self::Warn, Self::Info, Self::Debug];

    /// Returns the string representation of this level.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "error" => Ok(Self::Error),
            "warn" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            other => Err(ValidationError::InvalidLevel(other.to_string())),
        }
    }
}

/// A validated log record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    /// When the event happened
    pub timestamp: DateTime<Utc>,
    /// Severity level
    pub level: LogLevel,
    /// The log message
    pub message: String,
    /// Component that emitted the record
    pub source: String,
    /// Application error code, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Opaque structured payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Context>,
}

/// A record as held by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord {
    /// Store-assigned identity
    pub id: RecordId,
    /// The validated record
    #[serde(flatten)]
    pub record: LogRecord,
    /// When the store accepted the record
    pub created_at: DateTime<Utc>,
    /// When the store last touched the record
    pub updated_at: DateTime<Utc>,
}

impl StoredRecord {
    /// Shorthand for the record's event timestamp.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.record.timestamp
    }

    /// Shorthand for the record's level.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.record.level
    }
}

/// Timestamp as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampInput {
    /// Already parsed
    Instant(DateTime<Utc>),
    /// ISO-8601 text, parsed by the validator
    Text(String),
}

impl From<DateTime<Utc>> for TimestampInput {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Instant(value)
    }
}

impl From<&str> for TimestampInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for TimestampInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// An unvalidated record.
///
/// Every field is optional here; the validator decides what is acceptable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateRecord {
    /// Event time
    pub timestamp: Option<TimestampInput>,
    /// Level name
    pub level: Option<String>,
    /// Message text
    pub message: Option<String>,
    /// Emitting component
    pub source: Option<String>,
    /// Application error code
    pub error_code: Option<String>,
    /// Opaque payload
    pub context: Option<Context>,
}

impl CandidateRecord {
    /// Creates an empty candidate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: impl Into<TimestampInput>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Sets the level name.
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    /// Sets the message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the source.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the error code.
    #[must_use]
    pub fn with_error_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }

    /// Sets the context payload.
    #[must_use]
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    /// Builds a candidate from an arbitrary JSON value.
    ///
    /// Absent and `null` fields become `None`. Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not an object or a known field has
    /// the wrong JSON type.
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        let Value::Object(mut obj) = value else {
            return Err(ValidationError::NotAnObject);
        };

        let timestamp = match obj.remove("timestamp") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(TimestampInput::Text(s)),
            Some(other) => return Err(ValidationError::InvalidTimestamp(other.to_string())),
        };

        let level = match obj.remove("level") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(other) => return Err(ValidationError::InvalidLevel(other.to_string())),
        };

        let error_code = match obj.remove("errorCode") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(_) => return Err(ValidationError::InvalidField("errorCode")),
        };

        let context = match obj.remove("context") {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) => Some(map),
            Some(_) => return Err(ValidationError::InvalidField("context")),
        };

        Ok(Self {
            timestamp,
            level,
            message: take_string(&mut obj, "message"),
            source: take_string(&mut obj, "source"),
            error_code,
            context,
        })
    }
}

fn take_string(obj: &mut Map<String, Value>, key: &str) -> Option<String> {
    match obj.remove(key) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

/// Time window for filtering records. Both bounds are inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Earliest timestamp to include
    pub from: Option<DateTime<Utc>>,
    /// Latest timestamp to include
    pub to: Option<DateTime<Utc>>,
}

impl TimeWindow {
    /// Creates a window with the given bounds.
    #[must_use]
    pub const fn new(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        Self { from, to }
    }

    /// Creates a window with no bounds.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self { from: None, to: None }
    }

    /// Checks if a timestamp falls within this window.
    #[must_use]
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        if let Some(from) = self.from {
            if timestamp < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if timestamp > to {
                return false;
            }
        }
        true
    }

    /// Narrows the lower bound so nothing before `floor` is included.
    #[must_use]
    pub fn clamp_from(self, floor: DateTime<Utc>) -> Self {
        let from = match self.from {
            Some(from) if from > floor => from,
            _ => floor,
        };
        Self { from: Some(from), to: self.to }
    }
}

/// Filter criteria for store reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /// Time window
    pub window: TimeWindow,
    /// Only records with this level
    pub level: Option<LogLevel>,
    /// Only records with this error code (`Some(None)` selects records without one)
    pub error_code: Option<Option<String>>,
}

impl RecordFilter {
    /// Creates a filter that matches everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to a time window.
    #[must_use]
    pub const fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = window;
        self
    }

    /// Restricts to one level.
    #[must_use]
    pub const fn with_level(mut self, level: LogLevel) -> Self {
        self.level = Some(level);
        self
    }

    /// Restricts to one error code.
    #[must_use]
    pub fn with_error_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(Some(code.into()));
        self
    }

    /// Restricts to records that carry no error code.
    #[must_use]
    pub fn without_error_code(mut self) -> Self {
        self.error_code = Some(None);
        self
    }

    /// Checks if a record matches this filter.
    #[must_use]
    pub fn matches(&self, record: &LogRecord) -> bool {
        if let Some(level) = self.level {
            if record.level != level {
                return false;
            }
        }
        if let Some(ref code) = self.error_code {
            if record.error_code != *code {
                return false;
            }
        }
        self.window.contains(record.timestamp)
    }
}

/// Event-time expiry rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    window: Duration,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            window: RETENTION_WINDOW,
        }
    }
}

impl RetentionPolicy {
    /// Creates a policy with a custom window.
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self { window }
    }

    /// Returns the retention window.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Oldest timestamp still visible at `now`.
    #[must_use]
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let window = chrono::Duration::from_std(self.window)
            .unwrap_or_else(|_| chrono::Duration::days(10));
        now - window
    }

    /// Returns true if a record with this timestamp is expired at `now`.
    #[must_use]
    pub fn is_expired(&self, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        timestamp < self.cutoff(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ===========================================
    // LogLevel Tests
    // ===========================================

    #[test]
    fn log_level_as_str() {
        assert_eq!(LogLevel::Error.as_str(), "error");
        assert_eq!(LogLevel::Warn.as_str(), "warn");
        assert_eq!(LogLevel::Info.as_str(), "info");
        assert_eq!(LogLevel::Debug.as_str(), "debug");
    }

    #[test]
    fn log_level_parses_exact_names_only() {
        assert_eq!("warn".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert!("WARN".parse::<LogLevel>().is_err());
        assert!("warning".parse::<LogLevel>().is_err());
        assert!("trace".parse::<LogLevel>().is_err());
    }

    #[test]
    fn log_level_serialization() {
        let json = serde_json::to_string(&LogLevel::Info).expect("serialize");
        assert_eq!(json, "\"info\"");

        let level: LogLevel = serde_json::from_str("\"debug\"").expect("deserialize");
        assert_eq!(level, LogLevel::Debug);
    }

    // ===========================================
    // Record Tests
    // ===========================================

    fn make_record() -> LogRecord {
        LogRecord {
            timestamp: Utc::now(),
            level: LogLevel::Error,
            message: "Database connection failed".to_string(),
            source: "api-server".to_string(),
            error_code: Some("DB_CONN_001".to_string()),
            context: None,
        }
    }

    #[test]
    fn stored_record_serializes_camel_case_and_flat() {
        let now = Utc::now();
        let stored = StoredRecord {
            id: RecordId(7),
            record: make_record(),
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&stored).expect("serialize");

        assert_eq!(json["id"], json!(7));
        assert_eq!(json["errorCode"], json!("DB_CONN_001"));
        assert_eq!(json["level"], json!("error"));
        assert!(json.get("createdAt").is_some());
        assert!(json.get("record").is_none());
        assert!(json.get("context").is_none());
    }

    #[test]
    fn context_key_order_is_preserved() {
        let mut record = make_record();
        let context = json!({"zeta": 1, "alpha": {"nested": [1, 2]}, "mid": null});
        record.context = context.as_object().cloned();

        let text = serde_json::to_string(&record).expect("serialize");
        let zeta = text.find("zeta").expect("zeta");
        let alpha = text.find("alpha").expect("alpha");
        let mid = text.find("mid").expect("mid");
        assert!(zeta < alpha && alpha < mid);
    }

    // ===========================================
    // CandidateRecord Tests
    // ===========================================

    #[test]
    fn candidate_from_value_reads_all_fields() {
        let value = json!({
            "timestamp": "2024-01-15T10:30:00Z",
            "level": "error",
            "message": "boom",
            "source": "worker",
            "errorCode": "E1",
            "context": {"retry": 3},
            "ignored": true
        });
        let candidate = CandidateRecord::from_value(value).expect("candidate");

        assert_eq!(
            candidate.timestamp,
            Some(TimestampInput::Text("2024-01-15T10:30:00Z".to_string()))
        );
        assert_eq!(candidate.level.as_deref(), Some("error"));
        assert_eq!(candidate.message.as_deref(), Some("boom"));
        assert_eq!(candidate.source.as_deref(), Some("worker"));
        assert_eq!(candidate.error_code.as_deref(), Some("E1"));
        assert!(candidate.context.is_some());
    }

    #[test]
    fn candidate_from_value_treats_null_as_absent() {
        let value = json!({"errorCode": null, "context": null, "timestamp": null});
        let candidate = CandidateRecord::from_value(value).expect("candidate");
        assert!(candidate.error_code.is_none());
        assert!(candidate.context.is_none());
        assert!(candidate.timestamp.is_none());
    }

    #[test]
    fn candidate_from_value_rejects_wrong_shapes() {
        assert_eq!(
            CandidateRecord::from_value(json!([1, 2])),
            Err(ValidationError::NotAnObject)
        );
        assert_eq!(
            CandidateRecord::from_value(json!({"errorCode": 12})),
            Err(ValidationError::InvalidField("errorCode"))
        );
        assert_eq!(
            CandidateRecord::from_value(json!({"context": "text"})),
            Err(ValidationError::InvalidField("context"))
        );
        assert!(matches!(
            CandidateRecord::from_value(json!({"timestamp": 1700000000})),
            Err(ValidationError::InvalidTimestamp(_))
        ));
        assert!(matches!(
            CandidateRecord::from_value(json!({"level": 3})),
            Err(ValidationError::InvalidLevel(_))
        ));
    }

    // ===========================================
    // TimeWindow / RecordFilter Tests
    // ===========================================

    #[test]
    fn time_window_bounds_are_inclusive() {
        let now = Utc::now();
        let window = TimeWindow::new(Some(now), Some(now));
        assert!(window.contains(now));
        assert!(!window.contains(now + chrono::Duration::milliseconds(1)));
        assert!(!window.contains(now - chrono::Duration::milliseconds(1)));
    }

    #[test]
    fn time_window_unbounded() {
        let window = TimeWindow::unbounded();
        assert!(window.contains(Utc::now() - chrono::Duration::days(365)));
        assert!(window.contains(Utc::now() + chrono::Duration::days(365)));
    }

    #[test]
    fn time_window_clamp_from_keeps_later_bound() {
        let now = Utc::now();
        let floor = now - chrono::Duration::days(10);

        let clamped = TimeWindow::unbounded().clamp_from(floor);
        assert_eq!(clamped.from, Some(floor));

        let later = TimeWindow::new(Some(now), None).clamp_from(floor);
        assert_eq!(later.from, Some(now));
    }

    #[test]
    fn filter_by_level_and_code() {
        let record = make_record();
        assert!(RecordFilter::new().matches(&record));
        assert!(RecordFilter::new().with_level(LogLevel::Error).matches(&record));
        assert!(!RecordFilter::new().with_level(LogLevel::Info).matches(&record));
        assert!(RecordFilter::new().with_error_code("DB_CONN_001").matches(&record));
        assert!(!RecordFilter::new().without_error_code().matches(&record));
    }

    // ===========================================
    // RetentionPolicy Tests
    // ===========================================

    #[test]
    fn retention_default_is_ten_days() {
        assert_eq!(RetentionPolicy::default().window(), RETENTION_WINDOW);
        assert_eq!(RETENTION_WINDOW.as_secs(), 864_000);
    }

    #[test]
    fn retention_expiry_is_keyed_on_timestamp() {
        let policy = RetentionPolicy::default();
        let now = Utc::now();
        assert!(policy.is_expired(now - chrono::Duration::days(11), now));
        assert!(!policy.is_expired(now - chrono::Duration::days(9), now));
        assert!(!policy.is_expired(now + chrono::Duration::days(30), now));
    }
}
