//! # logdash-server
//!
//! HTTP stats API and command-line front end for [`logdash`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use logdash_server::{LogdashServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = LogdashServer::new(ServerConfig::default().with_seed(true));
//!     // server.run(async { let _ = tokio::signal::ctrl_c().await; }).await.unwrap();
//! }
//! ```
//!
//! ## API Endpoints
//!
//! | Endpoint | Method | Description |
//! |----------|--------|-------------|
//! | `/health` | GET | Liveness, uptime and record count |
//! | `/stats/top-errors` | GET | Most frequent error codes |
//! | `/stats/time-series` | GET | Activity per hour or day |
//! | `/stats/levels` | GET | Share of records per level |
//! | `/logs` | POST | Ingest a JSON array of records |
//!
//! Stats endpoints accept `from`, `to` (RFC 3339), `limit` (1 to 100) and
//! `bucket` (`hour` or `day`).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod seed;
pub mod server;
pub mod state;

// Re-export main types
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use routes::create_router;
pub use server::LogdashServer;
pub use state::AppState;
