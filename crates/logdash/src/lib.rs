//! # logdash
//!
//! Log ingestion, retention-bounded storage and aggregation.
//!
//! This crate provides:
//!
//! - [`LogRecord`] — Validated log records with a closed set of [`LogLevel`]s
//! - [`validate`] — Turns a [`CandidateRecord`] into a [`LogRecord`]
//! - [`RetentionStore`] — In-memory store hiding records older than 10 days
//! - [`RecordStore`] — Abstract trait for store backends
//! - [`IngestPipeline`] — Single, batch, file, directory and remote ingestion
//! - [`LineParser`] / [`SshCollector`] — Raw text collection from remote hosts
//! - [`Aggregator`] — Top errors, time series and level distribution
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use logdash::{Aggregator, CandidateRecord, IngestPipeline, RetentionStore, StatsQuery};
//!
//! let store = Arc::new(RetentionStore::new());
//! let pipeline = IngestPipeline::new(Arc::clone(&store));
//!
//! let candidate = CandidateRecord::new()
//!     .with_timestamp(chrono::Utc::now())
//!     .with_level("error")
//!     .with_message("Database connection failed")
//!     .with_source("api-server")
//!     .with_error_code("DB_CONN_001");
//! let report = pipeline.ingest_batch(vec![candidate]).unwrap();
//! assert_eq!(report.success, 1);
//!
//! let top = Aggregator::new(store).top_errors(&StatsQuery::new()).unwrap();
//! assert_eq!(top.data[0].count, 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod aggregate;
pub mod collector;
pub mod error;
pub mod index;
pub mod ingest;
pub mod query;
pub mod store;
pub mod traits;
pub mod types;
pub mod validate;

// Re-export main types
pub use aggregate::{
    Aggregator, ErrorGroup, LevelShare, LevelsMeta, LevelsResponse, Period, StatsResponse,
    TimeBucket, TimeSeriesMeta, TimeSeriesResponse, TopErrorsMeta, TopErrorsResponse,
};
pub use collector::{FetchRequest, LineParser, RemoteCollector, SshCollector, SshConfig};
pub use error::{LogError, Result, ValidationError};
pub use index::RecordIndex;
pub use ingest::{BatchReport, FileReport, IngestPipeline};
pub use query::{Bucket, StatsQuery};
pub use store::{RetentionStore, SharedStore, shared_store, spawn_compaction};
pub use traits::RecordStore;
pub use types::{
    CandidateRecord, Context, LogLevel, LogRecord, RETENTION_WINDOW, RecordFilter, RecordId,
    RetentionPolicy, StoredRecord, TimeWindow, TimestampInput,
};
pub use validate::{validate, validate_owned};
