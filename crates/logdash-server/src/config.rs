//! Server configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use axum::http::{HeaderValue, Uri};

use crate::error::{ServerError, ServerResult};

/// Default listen address.
pub const DEFAULT_BIND_ADDR: SocketAddr = SocketAddr::new(
    std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED),
    3000,
);

/// Default interval between background expiry sweeps.
pub const DEFAULT_COMPACTION_INTERVAL: Duration = Duration::from_secs(60);

/// Default maximum request body size.
pub const DEFAULT_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Configuration for the logdash server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP server to.
    pub bind_addr: SocketAddr,
    /// CORS allowed origins (empty means all).
    pub cors_origins: Vec<String>,
    /// Interval between background expiry sweeps.
    pub compaction_interval: Duration,
    /// Directory of `*.json` files ingested at startup.
    pub ingest_dir: Option<PathBuf>,
    /// Load sample records at startup.
    pub seed: bool,
    /// Maximum request body size in bytes.
    pub body_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR,
            cors_origins: Vec::new(),
            compaction_interval: DEFAULT_COMPACTION_INTERVAL,
            ingest_dir: None,
            seed: false,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl ServerConfig {
    /// Create a new configuration with the specified bind address.
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            ..Self::default()
        }
    }

    /// Add a CORS allowed origin.
    #[must_use]
    pub fn with_cors_origin(mut self, origin: impl Into<String>) -> Self {
        self.cors_origins.push(origin.into());
        self
    }

    /// Set the compaction interval.
    #[must_use]
    pub const fn with_compaction_interval(mut self, interval: Duration) -> Self {
        self.compaction_interval = interval;
        self
    }

    /// Ingest a directory at startup.
    #[must_use]
    pub fn with_ingest_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.ingest_dir = Some(dir.into());
        self
    }

    /// Load sample records at startup.
    #[must_use]
    pub const fn with_seed(mut self, seed: bool) -> Self {
        self.seed = seed;
        self
    }

    /// Set the maximum request body size.
    #[must_use]
    pub const fn with_body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = bytes;
        self
    }

    /// Check values the builder cannot reject on its own.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::InvalidConfig`] for a CORS origin that is not
    /// `scheme://host[:port]`.
    pub fn validate(&self) -> ServerResult<()> {
        match self.cors_origins.iter().find(|o| parse_origin(o).is_none()) {
            Some(bad) => Err(ServerError::InvalidConfig(format!("invalid CORS origin: {bad}"))),
            None => Ok(()),
        }
    }
}

/// Parse a CORS origin of the form `scheme://host[:port]`.
#[must_use]
pub fn parse_origin(origin: &str) -> Option<HeaderValue> {
    let uri: Uri = origin.parse().ok()?;
    let bare = uri.scheme().is_some()
        && uri.authority().is_some()
        && uri.query().is_none()
        && uri.path() == "/";
    if !bare {
        return None;
    }
    HeaderValue::from_str(origin.trim_end_matches('/')).ok()
}
