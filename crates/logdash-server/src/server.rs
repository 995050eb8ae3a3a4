//! Server lifecycle.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Utc;
use logdash::{BatchReport, SharedStore, spawn_compaction};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::routes::create_router;
use crate::seed::seed_records;
use crate::state::AppState;

/// HTTP server for the stats API.
///
/// Owns the shared store for its lifetime: [`LogdashServer::run`] loads the
/// startup data, keeps a compaction task sweeping expired records while it
/// serves, and closes the store once the listener has drained.
#[derive(Debug, Clone)]
pub struct LogdashServer {
    state: Arc<AppState>,
}

impl LogdashServer {
    /// Create a server over a fresh store.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self {
            state: Arc::new(AppState::new(config)),
        }
    }

    /// Create a server over an existing store.
    #[must_use]
    pub fn with_store(config: ServerConfig, store: SharedStore) -> Self {
        Self {
            state: Arc::new(AppState::with_store(config, store)),
        }
    }

    /// Get the server state for external access.
    #[must_use]
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Create the router without starting the server.
    pub fn router(&self) -> axum::Router {
        create_router(self.state())
    }

    /// Ingest the configured startup directory and sample records.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed or the store is
    /// closed. Individual bad files are logged and skipped.
    pub async fn load_initial(&self) -> ServerResult<BatchReport> {
        let config = self.state.config();
        let pipeline = self.state.pipeline();
        let mut total = BatchReport::default();

        if let Some(dir) = &config.ingest_dir {
            for file in pipeline.ingest_dir(dir).await? {
                match file.result {
                    Ok(report) => total.merge(report),
                    Err(e) => warn!(path = %file.path.display(), error = %e, "skipped file"),
                }
            }
        }

        if config.seed {
            let report = pipeline.ingest_values(seed_records(Utc::now()))?;
            info!(success = report.success, "sample records loaded");
            total.merge(report);
        }

        Ok(total)
    }

    /// Start the server and listen for connections.
    ///
    /// This method runs until the server encounters a fatal error.
    ///
    /// # Errors
    ///
    /// Returns an error if binding to the address fails.
    pub async fn serve(&self, addr: SocketAddr) -> ServerResult<()> {
        self.serve_with_shutdown(addr, std::future::pending()).await
    }

    /// Start the server with graceful shutdown support.
    ///
    /// The server will shut down when the provided future completes.
    ///
    /// # Errors
    ///
    /// Returns an error if binding to the address fails.
    pub async fn serve_with_shutdown<F>(&self, addr: SocketAddr, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = bind(addr).await?;
        self.serve_listener(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` completes.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener fails.
    pub async fn serve_listener<F>(&self, listener: TcpListener, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Ok(addr) = listener.local_addr() {
            info!(addr = %addr, "logdash server listening");
        }

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;

        info!("logdash server shut down");
        Ok(())
    }

    /// Bind the configured address and run until `shutdown` completes.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, or startup
    /// ingestion or binding fails.
    pub async fn run<F>(&self, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.state.config().validate()?;
        let listener = bind(self.state.config().bind_addr).await?;
        self.run_on(listener, shutdown).await
    }

    /// Full lifecycle on an already bound listener.
    ///
    /// # Errors
    ///
    /// Returns an error if startup ingestion or serving fails.
    pub async fn run_on<F>(&self, listener: TcpListener, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let loaded = self.load_initial().await?;
        info!(success = loaded.success, errors = loaded.errors, "startup ingestion done");

        let (stop_tx, stop_rx) = watch::channel(false);
        let compaction = spawn_compaction(
            Arc::clone(self.state.store()),
            self.state.config().compaction_interval,
            wait_for_stop(stop_rx),
        );

        let result = self.serve_listener(listener, shutdown).await;

        let _ = stop_tx.send(true);
        if let Err(e) = compaction.await {
            error!(error = %e, "compaction task failed");
        }
        self.state.store().close();
        info!("store closed");

        result
    }
}

async fn bind(addr: SocketAddr) -> ServerResult<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::BindFailed(addr, e))
}

async fn wait_for_stop(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|stopped| *stopped).await;
}
