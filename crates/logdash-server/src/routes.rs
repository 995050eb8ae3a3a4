//! Route configuration for the stats API.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{Router, get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::{ServerConfig, parse_origin};
use crate::handlers::{health_check, ingest_logs, levels, not_found, time_series, top_errors};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = build_cors_layer(state.config());
    let body_limit = state.config().body_limit;

    let stats_routes = Router::new()
        .route("/top-errors", get(top_errors))
        .route("/time-series", get(time_series))
        .route("/levels", get(levels));

    Router::new()
        .route("/health", get(health_check))
        .route("/logs", post(ingest_logs))
        .nest("/stats", stats_routes)
        .fallback(not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    if config.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|origin| {
                let parsed = parse_origin(origin);
                if parsed.is_none() {
                    warn!(%origin, "ignoring invalid CORS origin");
                }
                parsed
            })
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
