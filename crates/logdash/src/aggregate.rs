//! Read-only aggregations over the store.
//!
//! This module provides:
//! - [`Aggregator`] — Runs the three stats queries against a [`RecordStore`]
//! - [`group_top_errors`], [`bucket_time_series`], [`level_distribution`] —
//!   The pure group/sort/truncate stages, usable on any record slice
//! - [`StatsResponse`] — The `{success, data, meta}` envelope
//!
//! Every aggregation sees only records inside the retention window at the
//! time of the call.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::query::{Bucket, StatsQuery};
use crate::traits::RecordStore;
use crate::types::{LogLevel, LogRecord, RecordFilter, TimeWindow};

/// Messages kept per error group.
pub const SAMPLE_MESSAGES: usize = 5;

// ============================================================================
// Result types
// ============================================================================

/// Error records sharing one error code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorGroup {
    /// The shared code; `None` groups every record without one
    pub error_code: Option<String>,
    /// Records in the group
    pub count: usize,
    /// First messages in store order
    pub sample_messages: Vec<String>,
    /// Distinct sources in first-seen order
    pub sources: Vec<String>,
}

/// Per-interval activity counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBucket {
    /// Bucket start
    pub timestamp: DateTime<Utc>,
    /// All records in the bucket
    pub total: usize,
    /// Error records
    pub errors: usize,
    /// Warn records
    pub warnings: usize,
    /// Info records
    pub info: usize,
}

impl TimeBucket {
    fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            total: 0,
            errors: 0,
            warnings: 0,
            info: 0,
        }
    }
}

/// Share of records at one level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelShare {
    /// The level
    pub level: LogLevel,
    /// Records at this level
    pub count: usize,
    /// `round(100 * count / total)`
    pub percentage: u32,
}

// ============================================================================
// Response envelope
// ============================================================================

/// Window echoed back in response metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    /// Requested lower bound
    pub from: Option<DateTime<Utc>>,
    /// Requested upper bound
    pub to: Option<DateTime<Utc>>,
}

impl From<TimeWindow> for Period {
    fn from(window: TimeWindow) -> Self {
        Self {
            from: window.from,
            to: window.to,
        }
    }
}

/// Metadata for top-errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopErrorsMeta {
    /// Groups returned
    pub total: usize,
    /// Requested window
    pub period: Period,
}

/// Metadata for the time series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSeriesMeta {
    /// Bucket width used
    pub bucket: Bucket,
    /// Requested window
    pub period: Period,
}

/// Metadata for the level distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelsMeta {
    /// Records counted
    pub total: usize,
    /// Requested window
    pub period: Period,
}

/// Successful stats response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsResponse<T, M> {
    /// Always true
    pub success: bool,
    /// Result rows
    pub data: Vec<T>,
    /// Query metadata
    pub meta: M,
}

impl<T, M> StatsResponse<T, M> {
    /// Wraps result rows.
    #[must_use]
    pub const fn new(data: Vec<T>, meta: M) -> Self {
        Self {
            success: true,
            data,
            meta,
        }
    }
}

/// Top-errors response.
pub type TopErrorsResponse = StatsResponse<ErrorGroup, TopErrorsMeta>;
/// Time-series response.
pub type TimeSeriesResponse = StatsResponse<TimeBucket, TimeSeriesMeta>;
/// Level-distribution response.
pub type LevelsResponse = StatsResponse<LevelShare, LevelsMeta>;

// ============================================================================
// Pure stages
// ============================================================================

struct GroupBuilder {
    group: ErrorGroup,
    seen_sources: HashSet<String>,
}

/// Groups error records by code, sorts by count descending and truncates.
///
/// Non-error records are skipped. Ties keep first-seen order.
pub fn group_top_errors<'a>(
    records: impl IntoIterator<Item = &'a LogRecord>,
    limit: usize,
) -> Vec<ErrorGroup> {
    let mut slots: HashMap<Option<&'a str>, usize> = HashMap::new();
    let mut builders: Vec<GroupBuilder> = Vec::new();

    for record in records {
        if record.level != LogLevel::Error {
            continue;
        }

        let slot = *slots.entry(record.error_code.as_deref()).or_insert_with(|| {
            builders.push(GroupBuilder {
                group: ErrorGroup {
                    error_code: record.error_code.clone(),
                    count: 0,
                    sample_messages: Vec::new(),
                    sources: Vec::new(),
                },
                seen_sources: HashSet::new(),
            });
            builders.len() - 1
        });

        let builder = &mut builders[slot];
        builder.group.count += 1;
        if builder.group.sample_messages.len() < SAMPLE_MESSAGES {
            builder.group.sample_messages.push(record.message.clone());
        }
        if builder.seen_sources.insert(record.source.clone()) {
            builder.group.sources.push(record.source.clone());
        }
    }

    let mut groups: Vec<ErrorGroup> = builders.into_iter().map(|b| b.group).collect();
    groups.sort_by(|a, b| b.count.cmp(&a.count));
    groups.truncate(limit);
    groups
}

/// Buckets records by truncated timestamp, ascending.
pub fn bucket_time_series<'a>(
    records: impl IntoIterator<Item = &'a LogRecord>,
    bucket: Bucket,
) -> Vec<TimeBucket> {
    let mut buckets: BTreeMap<DateTime<Utc>, TimeBucket> = BTreeMap::new();

    for record in records {
        let start = bucket.truncate(record.timestamp);
        let entry = buckets
            .entry(start)
            .or_insert_with(|| TimeBucket::empty(start));

        entry.total += 1;
        match record.level {
            LogLevel::Error => entry.errors += 1,
            LogLevel::Warn => entry.warnings += 1,
            LogLevel::Info => entry.info += 1,
            LogLevel::Debug => {}
        }
    }

    buckets.into_values().collect()
}

/// Counts records per level with rounded percentages, largest first.
///
/// Ties keep severity order. An empty input yields an empty result.
pub fn level_distribution<'a>(records: impl IntoIterator<Item = &'a LogRecord>) -> Vec<LevelShare> {
    let mut counts = [0usize; LogLevel::ALL.len()];
    for record in records {
        counts[severity_rank(record.level)] += 1;
    }

    let total: usize = counts.iter().sum();
    if total == 0 {
        return Vec::new();
    }

    let mut shares: Vec<LevelShare> = LogLevel::ALL
        .iter()
        .zip(counts)
        .filter(|&(_, count)| count > 0)
        .map(|(&level, count)| LevelShare {
            level,
            count,
            percentage: rounded_percentage(count, total),
        })
        .collect();

    shares.sort_by(|a, b| b.count.cmp(&a.count));
    shares
}

const fn severity_rank(level: LogLevel) -> usize {
    match level {
        LogLevel::Error => 0,
        LogLevel::Warn => 1,
        LogLevel::Info => 2,
        LogLevel::Debug => 3,
    }
}

/// `round(100 * count / total)`, halves rounded up.
fn rounded_percentage(count: usize, total: usize) -> u32 {
    let scaled = (200 * count as u128 + total as u128) / (2 * total as u128);
    u32::try_from(scaled).unwrap_or(100)
}

// ============================================================================
// Aggregator
// ============================================================================

/// Runs the stats queries against a store.
#[derive(Debug, Clone)]
pub struct Aggregator<S> {
    store: S,
}

impl<S: RecordStore> Aggregator<S> {
    /// Creates an aggregator over `store`.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Most frequent error codes in the window.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot serve reads.
    pub fn top_errors(&self, query: &StatsQuery) -> Result<TopErrorsResponse> {
        self.top_errors_at(query, Utc::now())
    }

    /// Same as [`Self::top_errors`] with an explicit clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot serve reads.
    pub fn top_errors_at(&self, query: &StatsQuery, now: DateTime<Utc>) -> Result<TopErrorsResponse> {
        let filter = RecordFilter::new()
            .with_window(query.window)
            .with_level(LogLevel::Error);
        let records = self.store.query_at(&filter, now)?;

        let groups = group_top_errors(records.iter().map(|s| &s.record), query.limit);
        info!(
            scanned = records.len(),
            groups = groups.len(),
            limit = query.limit,
            "top errors computed"
        );

        let meta = TopErrorsMeta {
            total: groups.len(),
            period: query.window.into(),
        };
        Ok(StatsResponse::new(groups, meta))
    }

    /// Activity per hour or day in the window.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot serve reads.
    pub fn time_series(&self, query: &StatsQuery) -> Result<TimeSeriesResponse> {
        self.time_series_at(query, Utc::now())
    }

    /// Same as [`Self::time_series`] with an explicit clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot serve reads.
    pub fn time_series_at(
        &self,
        query: &StatsQuery,
        now: DateTime<Utc>,
    ) -> Result<TimeSeriesResponse> {
        let filter = RecordFilter::new().with_window(query.window);
        let records = self.store.query_at(&filter, now)?;

        let buckets = bucket_time_series(records.iter().map(|s| &s.record), query.bucket);
        info!(
            scanned = records.len(),
            buckets = buckets.len(),
            bucket = %query.bucket,
            "time series computed"
        );

        let meta = TimeSeriesMeta {
            bucket: query.bucket,
            period: query.window.into(),
        };
        Ok(StatsResponse::new(buckets, meta))
    }

    /// Level breakdown in the window.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot serve reads.
    pub fn levels(&self, query: &StatsQuery) -> Result<LevelsResponse> {
        self.levels_at(query, Utc::now())
    }

    /// Same as [`Self::levels`] with an explicit clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot serve reads.
    pub fn levels_at(&self, query: &StatsQuery, now: DateTime<Utc>) -> Result<LevelsResponse> {
        let filter = RecordFilter::new().with_window(query.window);
        let records = self.store.query_at(&filter, now)?;

        let shares = level_distribution(records.iter().map(|s| &s.record));
        info!(scanned = records.len(), levels = shares.len(), "level distribution computed");

        let meta = LevelsMeta {
            total: records.len(),
            period: query.window.into(),
        };
        Ok(StatsResponse::new(shares, meta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LogError;
    use crate::store::RetentionStore;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;
    use serde_json::json;
    use std::sync::Arc;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    fn record(level: LogLevel, code: Option<&str>, message: &str, source: &str, ts: DateTime<Utc>) -> LogRecord {
        LogRecord {
            timestamp: ts,
            level,
            message: message.to_string(),
            source: source.to_string(),
            error_code: code.map(str::to_string),
            context: None,
        }
    }

    fn error(code: Option<&str>, message: &str, source: &str) -> LogRecord {
        record(LogLevel::Error, code, message, source, base_time())
    }

    fn store_with(records: Vec<LogRecord>) -> Aggregator<Arc<RetentionStore>> {
        let store = Arc::new(RetentionStore::new());
        for r in records {
            let _ = store.insert(r);
        }
        Aggregator::new(store)
    }

    fn now() -> DateTime<Utc> {
        base_time() + Duration::hours(1)
    }

    // ===========================================
    // Top-errors Tests
    // ===========================================

    #[test]
    fn top_errors_orders_groups_by_count() {
        let mut records = Vec::new();
        records.extend((0..3).map(|i| error(Some("DB_CONN_001"), &format!("db {i}"), "api-server")));
        records.extend((0..2).map(|i| error(Some("AUTH_001"), &format!("auth {i}"), "auth-service")));
        records.push(error(Some("FILE_001"), "file", "worker"));

        let groups = group_top_errors(records.iter().rev(), 10);
        let codes: Vec<_> = groups.iter().map(|g| g.error_code.as_deref()).collect();
        assert_eq!(codes, vec![Some("DB_CONN_001"), Some("AUTH_001"), Some("FILE_001")]);
        assert_eq!(groups.iter().map(|g| g.count).collect::<Vec<_>>(), vec![3, 2, 1]);
    }

    #[test]
    fn top_errors_skips_non_error_levels() {
        let records = vec![
            error(Some("E1"), "e", "a"),
            record(LogLevel::Warn, Some("E1"), "w", "a", base_time()),
            record(LogLevel::Info, Some("I1"), "i", "a", base_time()),
        ];

        let groups = group_top_errors(&records, 10);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].count, 1);
    }

    #[test]
    fn top_errors_single_null_group() {
        let records = vec![
            error(None, "a", "s1"),
            error(Some("X"), "b", "s1"),
            error(None, "c", "s2"),
            error(None, "d", "s1"),
        ];

        let groups = group_top_errors(&records, 10);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].error_code, None);
        assert_eq!(groups[0].count, 3);
        assert_eq!(groups[0].sources, vec!["s1", "s2"]);
    }

    #[test]
    fn top_errors_empty_code_is_distinct_from_null() {
        let records = vec![error(Some(""), "a", "s"), error(None, "b", "s")];
        let groups = group_top_errors(&records, 10);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].error_code.as_deref(), Some(""));
        assert_eq!(groups[1].error_code, None);
    }

    #[test]
    fn top_errors_ties_keep_first_seen_order() {
        let records = vec![
            error(Some("B"), "1", "s"),
            error(Some("A"), "2", "s"),
            error(Some("B"), "3", "s"),
            error(Some("A"), "4", "s"),
        ];
        let groups = group_top_errors(&records, 10);
        let codes: Vec<_> = groups.iter().map(|g| g.error_code.as_deref()).collect();
        assert_eq!(codes, vec![Some("B"), Some("A")]);
    }

    #[test]
    fn top_errors_samples_first_five_messages() {
        let records: Vec<_> = (0..8).map(|i| error(Some("E"), &format!("m{i}"), "s")).collect();
        let groups = group_top_errors(&records, 10);
        assert_eq!(groups[0].sample_messages, vec!["m0", "m1", "m2", "m3", "m4"]);
        assert_eq!(groups[0].count, 8);
    }

    #[test]
    fn top_errors_truncates_to_limit() {
        let records: Vec<_> = (0..20).map(|i| error(Some(&format!("E{i}")), "m", "s")).collect();
        assert_eq!(group_top_errors(&records, 1).len(), 1);
        assert_eq!(group_top_errors(&records, 100).len(), 20);
    }

    #[test]
    fn aggregator_top_errors_envelope() {
        let aggregator = store_with(vec![
            error(Some("DB_CONN_001"), "Database connection failed", "api-server"),
            error(Some("DB_CONN_001"), "Database connection failed", "worker"),
            record(LogLevel::Info, None, "ok", "api-server", base_time()),
        ]);

        let response = aggregator
            .top_errors_at(&StatsQuery::new(), now())
            .expect("top errors");
        let value = serde_json::to_value(&response).expect("serialize");

        assert_eq!(value["success"], json!(true));
        assert_eq!(value["meta"]["total"], json!(1));
        assert_eq!(value["meta"]["period"], json!({"from": null, "to": null}));
        assert_eq!(value["data"][0]["errorCode"], json!("DB_CONN_001"));
        assert_eq!(value["data"][0]["count"], json!(2));
        assert_eq!(value["data"][0]["sources"], json!(["api-server", "worker"]));
        assert_eq!(
            value["data"][0]["sampleMessages"],
            json!(["Database connection failed", "Database connection failed"])
        );
    }

    #[test]
    fn aggregator_null_code_serializes_as_null() {
        let aggregator = store_with(vec![error(None, "m", "s")]);
        let response = aggregator
            .top_errors_at(&StatsQuery::new(), now())
            .expect("top errors");
        let value = serde_json::to_value(&response).expect("serialize");
        assert_eq!(value["data"][0]["errorCode"], json!(null));
    }

    // ===========================================
    // Time-series Tests
    // ===========================================

    #[test]
    fn time_series_hour_buckets() {
        let records = vec![
            record(LogLevel::Error, None, "a", "s", base_time()),
            record(LogLevel::Info, None, "b", "s", base_time() + Duration::hours(1)),
        ];

        let buckets = bucket_time_series(&records, Bucket::Hour);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].timestamp, base_time());
        assert_eq!(buckets[1].timestamp, base_time() + Duration::hours(1));

        let buckets = bucket_time_series(&records, Bucket::Day);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].total, 2);
        assert_eq!(buckets[0].timestamp.to_rfc3339(), "2024-01-15T00:00:00+00:00");
    }

    #[test]
    fn time_series_day_buckets_split_at_midnight() {
        let late = Utc.with_ymd_and_hms(2024, 1, 15, 23, 30, 0).unwrap();
        let early = Utc.with_ymd_and_hms(2024, 1, 16, 0, 30, 0).unwrap();
        let records = vec![
            record(LogLevel::Error, None, "a", "s", late),
            record(LogLevel::Warn, None, "b", "s", late),
            record(LogLevel::Info, None, "c", "s", early),
        ];

        let buckets = bucket_time_series(&records, Bucket::Day);

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].timestamp.to_rfc3339(), "2024-01-15T00:00:00+00:00");
        assert_eq!(buckets[1].timestamp.to_rfc3339(), "2024-01-16T00:00:00+00:00");
        assert_eq!((buckets[0].total, buckets[0].errors, buckets[0].warnings), (2, 1, 1));
        assert_eq!((buckets[1].total, buckets[1].info), (1, 1));
    }

    #[test]
    fn time_series_counts_levels_separately() {
        let ts = base_time() + Duration::minutes(15);
        let records = vec![
            record(LogLevel::Error, None, "a", "s", ts),
            record(LogLevel::Warn, None, "b", "s", ts),
            record(LogLevel::Info, None, "c", "s", ts),
            record(LogLevel::Debug, None, "d", "s", ts),
        ];

        let buckets = bucket_time_series(&records, Bucket::Hour);
        assert_eq!(
            buckets,
            vec![TimeBucket {
                timestamp: base_time(),
                total: 4,
                errors: 1,
                warnings: 1,
                info: 1,
            }]
        );
    }

    #[test]
    fn aggregator_time_series_respects_window() {
        let aggregator = store_with(vec![
            record(LogLevel::Info, None, "in", "s", base_time()),
            record(LogLevel::Info, None, "out", "s", base_time() - Duration::hours(3)),
        ]);
        let query = StatsQuery::new()
            .with_window(TimeWindow::new(Some(base_time() - Duration::hours(1)), None))
            .with_bucket(Bucket::Day);

        let response = aggregator.time_series_at(&query, now()).expect("series");
        assert_eq!(response.data.len(), 1);
        assert_eq!(response.data[0].total, 1);
        assert_eq!(response.meta.bucket, Bucket::Day);

        let value = serde_json::to_value(&response).expect("serialize");
        assert_eq!(value["meta"]["bucket"], json!("day"));
    }

    // ===========================================
    // Level-distribution Tests
    // ===========================================

    #[test]
    fn levels_percentages_round() {
        let mut records = Vec::new();
        records.extend((0..3).map(|_| record(LogLevel::Info, None, "i", "s", base_time())));
        records.extend((0..2).map(|_| record(LogLevel::Error, None, "e", "s", base_time())));
        records.push(record(LogLevel::Warn, None, "w", "s", base_time()));

        let shares = level_distribution(&records);
        let summary: Vec<_> = shares.iter().map(|s| (s.level, s.count, s.percentage)).collect();
        assert_eq!(
            summary,
            vec![
                (LogLevel::Info, 3, 50),
                (LogLevel::Error, 2, 33),
                (LogLevel::Warn, 1, 17),
            ]
        );
    }

    #[test]
    fn levels_ties_keep_severity_order() {
        let records = vec![
            record(LogLevel::Debug, None, "d", "s", base_time()),
            record(LogLevel::Warn, None, "w", "s", base_time()),
        ];
        let shares = level_distribution(&records);
        assert_eq!(shares[0].level, LogLevel::Warn);
        assert_eq!(shares[1].level, LogLevel::Debug);
        assert_eq!(shares[0].percentage, 50);
    }

    #[test]
    fn levels_empty_is_empty() {
        assert!(level_distribution(&Vec::<LogRecord>::new()).is_empty());

        let aggregator = store_with(Vec::new());
        let response = aggregator.levels_at(&StatsQuery::new(), now()).expect("levels");
        assert!(response.data.is_empty());
        assert_eq!(response.meta.total, 0);
    }

    #[test]
    fn rounded_percentage_halves_round_up() {
        assert_eq!(rounded_percentage(1, 8), 13);
        assert_eq!(rounded_percentage(1, 3), 33);
        assert_eq!(rounded_percentage(2, 3), 67);
        assert_eq!(rounded_percentage(1, 1), 100);
    }

    // ===========================================
    // Retention / store interaction
    // ===========================================

    #[test]
    fn expired_records_never_aggregate() {
        let fresh_now = Utc::now();
        let aggregator = store_with(vec![
            record(LogLevel::Error, Some("OLD"), "old", "s", fresh_now - Duration::days(11)),
            record(LogLevel::Error, Some("NEW"), "new", "s", fresh_now - Duration::days(1)),
        ]);

        let top = aggregator.top_errors(&StatsQuery::new()).expect("top");
        assert_eq!(top.data.len(), 1);
        assert_eq!(top.data[0].error_code.as_deref(), Some("NEW"));

        let series = aggregator.time_series(&StatsQuery::new()).expect("series");
        assert_eq!(series.data.iter().map(|b| b.total).sum::<usize>(), 1);

        let levels = aggregator.levels(&StatsQuery::new()).expect("levels");
        assert_eq!(levels.meta.total, 1);
    }

    #[test]
    fn closed_store_propagates_unavailable() {
        let aggregator = store_with(Vec::new());
        aggregator.store().close();
        assert!(matches!(
            aggregator.levels(&StatsQuery::new()),
            Err(LogError::StoreUnavailable)
        ));
    }

    // ===========================================
    // Property Tests
    // ===========================================

    fn arb_records() -> impl Strategy<Value = Vec<LogRecord>> {
        prop::collection::vec((0usize..4, 0i64..(24 * 9 * 60), prop::option::of(0u8..6), 0u8..4), 0..200)
            .prop_map(|rows| {
                rows.into_iter()
                    .map(|(level, minutes, code, source)| {
                        record(
                            LogLevel::ALL[level],
                            code.map(|c| format!("E{c}")).as_deref(),
                            "m",
                            &format!("src-{source}"),
                            base_time() - Duration::minutes(minutes),
                        )
                    })
                    .collect()
            })
    }

    proptest! {
        #[test]
        fn prop_top_errors_counts_only_errors(records in arb_records()) {
            let groups = group_top_errors(&records, 100);
            let errors = records.iter().filter(|r| r.level == LogLevel::Error).count();
            prop_assert_eq!(groups.iter().map(|g| g.count).sum::<usize>(), errors);
            prop_assert!(groups.windows(2).all(|w| w[0].count >= w[1].count));
            prop_assert!(groups.iter().filter(|g| g.error_code.is_none()).count() <= 1);
            prop_assert!(groups.iter().all(|g| g.sample_messages.len() <= SAMPLE_MESSAGES));
        }

        #[test]
        fn prop_time_series_is_strictly_increasing(records in arb_records(), day in any::<bool>()) {
            let bucket = if day { Bucket::Day } else { Bucket::Hour };
            let buckets = bucket_time_series(&records, bucket);
            prop_assert!(buckets.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
            prop_assert_eq!(buckets.iter().map(|b| b.total).sum::<usize>(), records.len());
            prop_assert!(buckets.iter().all(|b| b.errors + b.warnings + b.info <= b.total));
        }

        #[test]
        fn prop_percentages_sum_near_hundred(records in arb_records()) {
            let shares = level_distribution(&records);
            if records.is_empty() {
                prop_assert!(shares.is_empty());
            } else {
                let sum: i64 = shares.iter().map(|s| i64::from(s.percentage)).sum();
                let slack = i64::try_from(shares.len()).unwrap_or(4);
                prop_assert!((sum - 100).abs() <= slack);
                prop_assert_eq!(shares.iter().map(|s| s.count).sum::<usize>(), records.len());
            }
        }
    }
}
