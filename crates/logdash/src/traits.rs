//! Traits for record storage backends.
//!
//! This module provides the [`RecordStore`] trait, the seam between the
//! ingestion pipeline / aggregation engine and a concrete store.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::{LogRecord, RecordFilter, RecordId, StoredRecord};

/// Trait for record storage backends.
///
/// Implementors must hide records past their retention window from every
/// read, and fail with [`crate::LogError::StoreUnavailable`] when closed.
pub trait RecordStore: Send + Sync {
    /// Inserts a validated record, assigning it an ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot accept the record.
    fn insert(&self, record: LogRecord) -> Result<Arc<StoredRecord>>;

    /// Inserts several records, each independently.
    ///
    /// # Errors
    ///
    /// Returns the first insert error; earlier inserts stay committed.
    fn insert_many(&self, records: Vec<LogRecord>) -> Result<Vec<Arc<StoredRecord>>> {
        records.into_iter().map(|r| self.insert(r)).collect()
    }

    /// Queries non-expired records matching the filter at `now`.
    ///
    /// Returns records in chronological order, insertion order breaking ties.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot serve reads.
    fn query_at(&self, filter: &RecordFilter, now: DateTime<Utc>)
    -> Result<Vec<Arc<StoredRecord>>>;

    /// Queries non-expired records matching the filter.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot serve reads.
    fn query(&self, filter: &RecordFilter) -> Result<Vec<Arc<StoredRecord>>> {
        self.query_at(filter, Utc::now())
    }

    /// Gets a record by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot serve reads.
    fn get(&self, id: RecordId) -> Result<Option<Arc<StoredRecord>>>;

    /// Purges records expired at `now`, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be modified.
    fn expire_at(&self, now: DateTime<Utc>) -> Result<usize>;

    /// Returns the number of held records.
    fn len(&self) -> usize;

    /// Returns true if the store holds no records.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: RecordStore + ?Sized> RecordStore for Arc<S> {
    fn insert(&self, record: LogRecord) -> Result<Arc<StoredRecord>> {
        (**self).insert(record)
    }

    fn query_at(
        &self,
        filter: &RecordFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<Arc<StoredRecord>>> {
        (**self).query_at(filter, now)
    }

    fn get(&self, id: RecordId) -> Result<Option<Arc<StoredRecord>>> {
        (**self).get(id)
    }

    fn expire_at(&self, now: DateTime<Utc>) -> Result<usize> {
        (**self).expire_at(now)
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}
