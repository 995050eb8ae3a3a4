//! Ordered indexes over stored records.
//!
//! This module provides:
//! - [`RecordIndex`] — Primary index ordered by `(timestamp, id)`
//! - Secondary indexes by level and by error code, each ordered the same way
//!   so that "level within a time window" is a range scan
//!
//! The index holds no locks of its own; [`crate::store::RetentionStore`]
//! mutates it only under its write lock, which is what makes an insert
//! atomic across all indexes.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Bound;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::types::{LogLevel, RecordId, StoredRecord, TimeWindow};

/// Ordering key shared by all indexes.
type Key = (DateTime<Utc>, RecordId);

/// Multi-dimensional index for stored records.
#[derive(Debug, Default)]
pub struct RecordIndex {
    /// Primary storage, chronological
    by_time: BTreeMap<Key, Arc<StoredRecord>>,
    /// Identity lookup
    by_id: HashMap<RecordId, Key>,
    /// Level → keys
    by_level: HashMap<LogLevel, BTreeSet<Key>>,
    /// Error code (including the absent code) → keys
    by_error_code: HashMap<Option<String>, BTreeSet<Key>>,
}

impl RecordIndex {
    /// Creates a new empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes a record.
    pub fn insert(&mut self, stored: Arc<StoredRecord>) {
        let key = (stored.timestamp(), stored.id);

        self.by_id.insert(stored.id, key);
        self.by_level.entry(stored.level()).or_default().insert(key);
        self.by_error_code
            .entry(stored.record.error_code.clone())
            .or_default()
            .insert(key);
        self.by_time.insert(key, stored);
    }

    /// Removes a record from all indexes.
    pub fn remove(&mut self, id: RecordId) -> Option<Arc<StoredRecord>> {
        let key = self.by_id.remove(&id)?;
        let stored = self.by_time.remove(&key)?;
        self.unlink_secondary(&stored, &key);
        Some(stored)
    }

    /// Gets a record by identity.
    #[must_use]
    pub fn get(&self, id: RecordId) -> Option<&Arc<StoredRecord>> {
        self.by_id.get(&id).and_then(|key| self.by_time.get(key))
    }

    /// Iterates records inside a window in chronological order.
    pub fn range(&self, window: TimeWindow) -> impl Iterator<Item = &Arc<StoredRecord>> + '_ {
        let bounds = key_bounds(window);
        let iter = bounds.map(|b| self.by_time.range(b));
        iter.into_iter().flatten().map(|(_, stored)| stored)
    }

    /// Iterates records of one level inside a window in chronological order.
    pub fn level_range(
        &self,
        level: LogLevel,
        window: TimeWindow,
    ) -> impl Iterator<Item = &Arc<StoredRecord>> + '_ {
        self.secondary_range(self.by_level.get(&level), window)
    }

    /// Iterates records with one error code inside a window in chronological order.
    pub fn error_code_range(
        &self,
        code: Option<&str>,
        window: TimeWindow,
    ) -> impl Iterator<Item = &Arc<StoredRecord>> + '_ {
        let keys = self.by_error_code.get(&code.map(str::to_string));
        self.secondary_range(keys, window)
    }

    /// Removes every record whose timestamp is strictly before `cutoff`.
    ///
    /// Returns the number of records removed.
    pub fn split_expired(&mut self, cutoff: DateTime<Utc>) -> usize {
        let retained = self.by_time.split_off(&(cutoff, RecordId(0)));
        let expired = std::mem::replace(&mut self.by_time, retained);

        for (key, stored) in &expired {
            self.by_id.remove(&stored.id);
            self.unlink_secondary(stored, key);
        }

        expired.len()
    }

    /// Clears all indexes.
    pub fn clear(&mut self) {
        self.by_time.clear();
        self.by_id.clear();
        self.by_level.clear();
        self.by_error_code.clear();
    }

    /// Returns the number of indexed records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_time.len()
    }

    /// Returns true if the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_time.is_empty()
    }

    fn secondary_range<'a>(
        &'a self,
        keys: Option<&'a BTreeSet<Key>>,
        window: TimeWindow,
    ) -> impl Iterator<Item = &'a Arc<StoredRecord>> + 'a {
        let scan = keys.zip(key_bounds(window)).map(|(set, b)| set.range(b));
        scan.into_iter()
            .flatten()
            .filter_map(|key| self.by_time.get(key))
    }

    fn unlink_secondary(&mut self, stored: &StoredRecord, key: &Key) {
        if let Some(keys) = self.by_level.get_mut(&stored.level()) {
            keys.remove(key);
            if keys.is_empty() {
                self.by_level.remove(&stored.level());
            }
        }
        if let Some(keys) = self.by_error_code.get_mut(&stored.record.error_code) {
            keys.remove(key);
            if keys.is_empty() {
                self.by_error_code.remove(&stored.record.error_code);
            }
        }
    }
}

/// Converts a window into key bounds, or `None` for an empty window.
///
/// `BTreeMap::range` panics when start > end, so inverted windows are
/// filtered out here.
fn key_bounds(window: TimeWindow) -> Option<(Bound<Key>, Bound<Key>)> {
    if let (Some(from), Some(to)) = (window.from, window.to) {
        if from > to {
            return None;
        }
    }

    let lower = window
        .from
        .map_or(Bound::Unbounded, |from| Bound::Included((from, RecordId(0))));
    let upper = window
        .to
        .map_or(Bound::Unbounded, |to| Bound::Included((to, RecordId(u64::MAX))));

    Some((lower, upper))
}
