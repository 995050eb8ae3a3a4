//! In-memory record storage with event-time retention.
//!
//! This module provides:
//! - [`RetentionStore`] — Thread-safe store with a 10-day retention window
//! - [`spawn_compaction`] — Optional background sweep of expired records
//! - Implementation of [`RecordStore`] for generic usage
//!
//! Expiry is enforced on every read: the query window is clamped to the
//! retention cutoff before the index is scanned, so a record past its window
//! is invisible whether or not the sweep has run.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::{LogError, Result};
use crate::index::RecordIndex;
use crate::traits::RecordStore;
use crate::types::{LogRecord, RecordFilter, RecordId, RetentionPolicy, StoredRecord};

/// Thread-safe in-memory record store.
pub struct RetentionStore {
    /// Expiry rule
    policy: RetentionPolicy,
    /// Records and every index over them, behind one lock
    index: RwLock<RecordIndex>,
    /// Next record ID counter
    next_id: AtomicU64,
    /// Whether the store is serving requests
    open: AtomicBool,
}

impl fmt::Debug for RetentionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetentionStore")
            .field("policy", &self.policy)
            .field("records", &self.len())
            .field("open", &self.is_open())
            .finish_non_exhaustive()
    }
}

impl Default for RetentionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RetentionStore {
    /// Creates an open store with the default 10-day retention.
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(RetentionPolicy::default())
    }

    /// Creates an open store with a custom retention policy.
    #[must_use]
    pub fn with_policy(policy: RetentionPolicy) -> Self {
        Self {
            policy,
            index: RwLock::new(RecordIndex::new()),
            next_id: AtomicU64::new(1),
            open: AtomicBool::new(true),
        }
    }

    /// Inserts a validated record, assigning identity and bookkeeping times.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::StoreUnavailable`] if the store is closed.
    pub fn insert(&self, record: LogRecord) -> Result<Arc<StoredRecord>> {
        self.ensure_open()?;

        let now = Utc::now();
        let mut index = self.index.write();
        let id = RecordId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let stored = Arc::new(StoredRecord {
            id,
            record,
            created_at: now,
            updated_at: now,
        });
        index.insert(Arc::clone(&stored));
        drop(index);

        Ok(stored)
    }

    /// Inserts several records. Each insert is independent.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::StoreUnavailable`] if the store is closed; records
    /// inserted before that point stay.
    pub fn insert_many(
        &self,
        records: impl IntoIterator<Item = LogRecord>,
    ) -> Result<Vec<Arc<StoredRecord>>> {
        records.into_iter().map(|r| self.insert(r)).collect()
    }

    /// Queries non-expired records matching the filter, chronologically.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::StoreUnavailable`] if the store is closed.
    pub fn query(&self, filter: &RecordFilter) -> Result<Vec<Arc<StoredRecord>>> {
        self.query_at(filter, Utc::now())
    }

    /// Same as [`Self::query`] with an explicit clock.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::StoreUnavailable`] if the store is closed.
    pub fn query_at(
        &self,
        filter: &RecordFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<Arc<StoredRecord>>> {
        self.ensure_open()?;

        let window = filter.window.clamp_from(self.policy.cutoff(now));
        let index = self.index.read();

        let scan: Box<dyn Iterator<Item = &Arc<StoredRecord>>> =
            match (filter.level, &filter.error_code) {
                (Some(level), _) => Box::new(index.level_range(level, window)),
                (None, Some(code)) => Box::new(index.error_code_range(code.as_deref(), window)),
                (None, None) => Box::new(index.range(window)),
            };

        Ok(scan
            .filter(|stored| filter.matches(&stored.record))
            .cloned()
            .collect())
    }

    /// Gets a record by ID. Expired records are not returned.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::StoreUnavailable`] if the store is closed.
    pub fn get(&self, id: RecordId) -> Result<Option<Arc<StoredRecord>>> {
        self.ensure_open()?;

        let cutoff = self.policy.cutoff(Utc::now());
        Ok(self
            .index
            .read()
            .get(id)
            .filter(|stored| stored.timestamp() >= cutoff)
            .cloned())
    }

    /// Purges records older than the retention window.
    ///
    /// Returns the number of records removed.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::StoreUnavailable`] if the store is closed.
    pub fn expire(&self) -> Result<usize> {
        self.expire_at(Utc::now())
    }

    /// Same as [`Self::expire`] with an explicit clock.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::StoreUnavailable`] if the store is closed.
    pub fn expire_at(&self, now: DateTime<Utc>) -> Result<usize> {
        self.ensure_open()?;

        let cutoff = self.policy.cutoff(now);
        let removed = self.index.write().split_expired(cutoff);
        if removed > 0 {
            debug!(removed, %cutoff, "expired records purged");
        }
        Ok(removed)
    }

    /// Returns the number of held records, including any not yet swept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    /// Returns true if the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.read().is_empty()
    }

    /// Removes all records.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::StoreUnavailable`] if the store is closed.
    pub fn clear(&self) -> Result<()> {
        self.ensure_open()?;
        self.index.write().clear();
        Ok(())
    }

    /// Stops serving requests. Held records are kept.
    pub fn close(&self) {
        self.open.store(false, Ordering::Release);
    }

    /// Returns true if the store is serving requests.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Returns the retention policy.
    #[must_use]
    pub const fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(LogError::StoreUnavailable)
        }
    }
}

/// Shared store handle.
pub type SharedStore = Arc<RetentionStore>;

/// Creates a new shared store with default retention.
#[must_use]
pub fn shared_store() -> SharedStore {
    Arc::new(RetentionStore::new())
}

/// Runs [`RetentionStore::expire`] every `interval` until `shutdown` resolves.
///
/// Sweeps that find the store closed are skipped.
pub fn spawn_compaction<F>(store: SharedStore, interval: Duration, shutdown: F) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(interval_secs = interval.as_secs(), "compaction task started");

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                _ = ticker.tick() => {
                    if let Err(e) = store.expire() {
                        debug!(error = %e, "compaction sweep skipped");
                    }
                }
            }
        }

        info!("compaction task stopped");
    })
}

// ============================================================================
// Trait Implementations
// ============================================================================

impl RecordStore for RetentionStore {
    fn insert(&self, record: LogRecord) -> Result<Arc<StoredRecord>> {
        RetentionStore::insert(self, record)
    }

    fn query_at(
        &self,
        filter: &RecordFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<Arc<StoredRecord>>> {
        RetentionStore::query_at(self, filter, now)
    }

    fn get(&self, id: RecordId) -> Result<Option<Arc<StoredRecord>>> {
        RetentionStore::get(self, id)
    }

    fn expire_at(&self, now: DateTime<Utc>) -> Result<usize> {
        RetentionStore::expire_at(self, now)
    }

    fn len(&self) -> usize {
        RetentionStore::len(self)
    }
}
