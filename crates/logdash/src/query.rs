//! Query parameter parsing for the stats endpoints.
//!
//! All three aggregations accept the same parameter set; [`StatsQuery`]
//! parses it once from raw `(name, value)` pairs so that duplicates can be
//! detected before any typed extraction happens.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LogError, Result};
use crate::types::TimeWindow;
use crate::validate::parse_instant;

/// Default number of top-error groups.
pub const DEFAULT_LIMIT: usize = 10;

/// Largest accepted `limit`.
pub const MAX_LIMIT: usize = 100;

/// Parameter names understood by the stats endpoints.
const KNOWN_PARAMS: [&str; 4] = ["from", "to", "limit", "bucket"];

/// Time-series bucket width.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    /// One hour
    #[default]
    Hour,
    /// One UTC day
    Day,
}

impl Bucket {
    /// Returns the parameter spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
        }
    }

    /// Start of the bucket containing `timestamp`.
    #[must_use]
    pub fn truncate(&self, timestamp: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Hour => timestamp
                .with_nanosecond(0)
                .and_then(|t| t.with_second(0))
                .and_then(|t| t.with_minute(0))
                .unwrap_or(timestamp),
            Self::Day => timestamp.date_naive().and_time(NaiveTime::MIN).and_utc(),
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Bucket {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            other => Err(LogError::InvalidParameters(format!("unknown bucket: {other}"))),
        }
    }
}

/// Parsed stats query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsQuery {
    /// Inclusive window
    pub window: TimeWindow,
    /// Maximum number of top-error groups
    pub limit: usize,
    /// Time-series bucket width
    pub bucket: Bucket,
}

impl Default for StatsQuery {
    fn default() -> Self {
        Self {
            window: TimeWindow::unbounded(),
            limit: DEFAULT_LIMIT,
            bucket: Bucket::Hour,
        }
    }
}

impl StatsQuery {
    /// Creates a query with defaults: unbounded window, limit 10, hourly buckets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the window.
    #[must_use]
    pub const fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = window;
        self
    }

    /// Sets the limit. Not range-checked; use [`Self::from_pairs`] for input.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the bucket width.
    #[must_use]
    pub const fn with_bucket(mut self, bucket: Bucket) -> Self {
        self.bucket = bucket;
        self
    }

    /// Parses raw `(name, value)` pairs.
    ///
    /// Unknown names are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::InvalidParameters`] if a known name appears more
    /// than once, `from`/`to` is not RFC 3339, `limit` is not an integer in
    /// `1..=100`, or `bucket` is not `hour` or `day`.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut seen: [Option<String>; 4] = Default::default();

        for (name, value) in pairs {
            let Some(slot) = KNOWN_PARAMS.iter().position(|&p| p == name.as_ref()) else {
                continue;
            };
            if seen[slot].is_some() {
                return Err(LogError::InvalidParameters(format!(
                    "duplicate parameter: {}",
                    name.as_ref()
                )));
            }
            seen[slot] = Some(value.as_ref().to_string());
        }

        let [from, to, limit, bucket] = seen;

        Ok(Self {
            window: TimeWindow::new(
                from.as_deref().map(|v| parse_bound("from", v)).transpose()?,
                to.as_deref().map(|v| parse_bound("to", v)).transpose()?,
            ),
            limit: limit.as_deref().map(parse_limit).transpose()?.unwrap_or(DEFAULT_LIMIT),
            bucket: bucket.as_deref().map(str::parse::<Bucket>).transpose()?.unwrap_or_default(),
        })
    }
}

fn parse_bound(name: &str, value: &str) -> Result<DateTime<Utc>> {
    parse_instant(value)
        .ok_or_else(|| LogError::InvalidParameters(format!("{name} is not an ISO-8601 instant: {value}")))
}

fn parse_limit(value: &str) -> Result<usize> {
    value
        .parse::<usize>()
        .ok()
        .filter(|limit| (1..=MAX_LIMIT).contains(limit))
        .ok_or_else(|| {
            LogError::InvalidParameters(format!("limit must be an integer in 1..={MAX_LIMIT}: {value}"))
        })
}
