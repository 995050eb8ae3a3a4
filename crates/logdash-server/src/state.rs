//! Shared state for the server.

use std::sync::Arc;
use std::time::Instant;

use logdash::{Aggregator, IngestPipeline, SharedStore, shared_store};

use crate::config::ServerConfig;

/// Shared state handed to every handler.
#[derive(Debug)]
pub struct AppState {
    config: Arc<ServerConfig>,
    store: SharedStore,
    pipeline: IngestPipeline<SharedStore>,
    aggregator: Aggregator<SharedStore>,
    start_time: Instant,
}

impl AppState {
    /// Create state over a fresh store.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self::with_store(config, shared_store())
    }

    /// Create state over an existing store.
    #[must_use]
    pub fn with_store(config: ServerConfig, store: SharedStore) -> Self {
        Self {
            config: Arc::new(config),
            pipeline: IngestPipeline::new(Arc::clone(&store)),
            aggregator: Aggregator::new(Arc::clone(&store)),
            store,
            start_time: Instant::now(),
        }
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the store.
    #[must_use]
    pub const fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Get the ingestion pipeline.
    #[must_use]
    pub const fn pipeline(&self) -> &IngestPipeline<SharedStore> {
        &self.pipeline
    }

    /// Get the aggregation engine.
    #[must_use]
    pub const fn aggregator(&self) -> &Aggregator<SharedStore> {
        &self.aggregator
    }

    /// Get server uptime in seconds.
    #[must_use]
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logdash::CandidateRecord;

    #[test]
    fn pipeline_and_aggregator_share_the_store() {
        let state = AppState::new(ServerConfig::default());
        let candidate = CandidateRecord::new()
            .with_timestamp(chrono::Utc::now())
            .with_level("info")
            .with_message("User login successful")
            .with_source("auth-service");

        let report = state.pipeline().ingest_batch(vec![candidate]);
        assert_eq!(report.map(|r| r.success).ok(), Some(1));
        assert_eq!(state.store().len(), 1);
        assert_eq!(state.aggregator().store().len(), 1);
    }

    #[test]
    fn fresh_state_has_zero_uptime() {
        let state = AppState::new(ServerConfig::default());
        assert_eq!(state.uptime_secs(), 0);
        assert_eq!(state.config().bind_addr.port(), 3000);
    }
}
