//! Ingestion pipeline.
//!
//! Candidates flow through [`validate_owned`] and, if they survive, into the
//! store. Per-record validation failures are counted in a [`BatchReport`];
//! structural failures (malformed source, closed store, unreadable file,
//! collector errors) abort the call.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::collector::{FetchRequest, LineParser, RemoteCollector};
use crate::error::{LogError, Result};
use crate::traits::RecordStore;
use crate::types::{CandidateRecord, StoredRecord};
use crate::validate::validate_owned;

/// Outcome of a batch ingestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Records stored
    pub success: usize,
    /// Candidates rejected
    pub errors: usize,
}

impl BatchReport {
    /// Candidates seen.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.success + self.errors
    }

    /// Adds another report's counts to this one.
    pub const fn merge(&mut self, other: Self) {
        self.success += other.success;
        self.errors += other.errors;
    }
}

/// Outcome of ingesting one file from a directory.
#[derive(Debug)]
pub struct FileReport {
    /// The file
    pub path: PathBuf,
    /// Its batch report, or why it could not be ingested
    pub result: Result<BatchReport>,
}

/// Validates candidates and writes them to a store.
#[derive(Debug, Clone)]
pub struct IngestPipeline<S> {
    store: S,
}

impl<S: RecordStore> IngestPipeline<S> {
    /// Creates a pipeline writing to `store`.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Validates and stores one candidate.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Validation`] if the candidate is rejected, or the
    /// store's error if the insert fails.
    pub fn ingest_one(&self, candidate: CandidateRecord) -> Result<Arc<StoredRecord>> {
        let record = validate_owned(candidate)?;
        let stored = self.store.insert(record)?;
        debug!(
            id = stored.id.0,
            level = %stored.level(),
            source = %stored.record.source,
            "record ingested"
        );
        Ok(stored)
    }

    /// Validates and stores each candidate independently.
    ///
    /// # Errors
    ///
    /// Returns the store's error if an insert fails; records stored before
    /// that point stay.
    pub fn ingest_batch(
        &self,
        candidates: impl IntoIterator<Item = CandidateRecord>,
    ) -> Result<BatchReport> {
        let mut report = BatchReport::default();

        for candidate in candidates {
            self.ingest_counted(candidate, &mut report)?;
        }

        info!(success = report.success, errors = report.errors, "batch ingested");
        Ok(report)
    }

    /// Converts JSON values into candidates and ingests them.
    ///
    /// Values that are not well-formed candidates count as errors.
    ///
    /// # Errors
    ///
    /// Same as [`Self::ingest_batch`].
    pub fn ingest_values(&self, values: Vec<Value>) -> Result<BatchReport> {
        let mut report = BatchReport::default();

        for (position, value) in values.into_iter().enumerate() {
            match CandidateRecord::from_value(value) {
                Ok(candidate) => self.ingest_counted(candidate, &mut report)?,
                Err(e) => {
                    warn!(position, error = %e, "candidate rejected");
                    report.errors += 1;
                }
            }
        }

        info!(success = report.success, errors = report.errors, "batch ingested");
        Ok(report)
    }

    /// Decodes a JSON array of candidates and ingests it.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::MalformedSource`] if the blob is not a JSON array,
    /// otherwise as [`Self::ingest_batch`].
    pub fn ingest_from_source(&self, blob: &[u8]) -> Result<BatchReport> {
        let value: Value = serde_json::from_slice(blob)
            .map_err(|e| LogError::MalformedSource(format!("invalid JSON: {e}")))?;

        let Value::Array(values) = value else {
            return Err(LogError::MalformedSource(format!(
                "expected an array, found {}",
                json_kind(&value)
            )));
        };

        self.ingest_values(values)
    }

    /// Reads a JSON file and ingests it.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Io`] if the file cannot be read, otherwise as
    /// [`Self::ingest_from_source`].
    pub async fn ingest_file(&self, path: impl AsRef<Path>) -> Result<BatchReport> {
        let path = path.as_ref();
        let blob = tokio::fs::read(path).await?;
        let report = self.ingest_from_source(&blob)?;
        info!(
            path = %path.display(),
            success = report.success,
            errors = report.errors,
            "file ingested"
        );
        Ok(report)
    }

    /// Ingests every `*.json` file in a directory, in file name order.
    ///
    /// A file that fails is reported and the rest continue.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Io`] if the directory cannot be listed, or
    /// [`LogError::StoreUnavailable`] if the store closes midway.
    pub async fn ingest_dir(&self, dir: impl AsRef<Path>) -> Result<Vec<FileReport>> {
        let dir = dir.as_ref();
        let mut entries = tokio::fs::read_dir(dir).await?;
        let mut paths = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_json = path.extension().is_some_and(|ext| ext == "json");
            if is_json && entry.file_type().await?.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        info!(dir = %dir.display(), files = paths.len(), "ingesting directory");

        let mut reports = Vec::with_capacity(paths.len());
        for path in paths {
            let result = self.ingest_file(&path).await;
            match &result {
                Err(LogError::StoreUnavailable) => return Err(LogError::StoreUnavailable),
                Err(e) => error!(path = %path.display(), error = %e, "file ingestion failed"),
                Ok(_) => {}
            }
            reports.push(FileReport { path, result });
        }

        Ok(reports)
    }

    /// Parses raw collector text line by line and ingests it.
    ///
    /// Blank lines are skipped.
    ///
    /// # Errors
    ///
    /// Same as [`Self::ingest_batch`].
    pub fn ingest_lines(&self, text: &str, parser: &LineParser) -> Result<BatchReport> {
        let mut report = BatchReport::default();

        for (number, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match parser.parse(line) {
                Ok(candidate) => self.ingest_counted(candidate, &mut report)?,
                Err(e) => {
                    warn!(line = number + 1, error = %e, "line rejected");
                    report.errors += 1;
                }
            }
        }

        info!(
            source = parser.source(),
            success = report.success,
            errors = report.errors,
            "lines ingested"
        );
        Ok(report)
    }

    /// Fetches text from a remote collector and ingests it.
    ///
    /// # Errors
    ///
    /// Returns the collector's error or timeout, otherwise as
    /// [`Self::ingest_lines`].
    pub async fn ingest_remote<C: RemoteCollector>(
        &self,
        collector: &C,
        request: &FetchRequest,
    ) -> Result<BatchReport> {
        let text = collector.fetch(request).await?;
        let parser = LineParser::new(collector.source());
        self.ingest_lines(&text, &parser)
    }

    fn ingest_counted(&self, candidate: CandidateRecord, report: &mut BatchReport) -> Result<()> {
        match self.ingest_one(candidate) {
            Ok(_) => report.success += 1,
            Err(LogError::Validation(e)) => {
                warn!(error = %e, "candidate rejected");
                report.errors += 1;
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
