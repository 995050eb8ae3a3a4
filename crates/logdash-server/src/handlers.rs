//! HTTP request handlers for the stats API.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{StatusCode, Uri};
use chrono::{DateTime, Utc};
use logdash::{
    BatchReport, LevelsResponse, StatsQuery, TimeSeriesResponse, TopErrorsResponse,
};
use serde::Serialize;

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Raw query pairs, in request order.
type QueryPairs = Result<Query<Vec<(String, String)>>, QueryRejection>;

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Status message.
    pub status: String,
    /// Current server time.
    pub timestamp: DateTime<Utc>,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
    /// Records held, including any awaiting expiry.
    pub records: usize,
}

/// Handle GET /health.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
        uptime_secs: state.uptime_secs(),
        records: state.store().len(),
    })
}

/// Handle GET /stats/top-errors.
pub async fn top_errors(
    State(state): State<Arc<AppState>>,
    pairs: QueryPairs,
) -> ServerResult<Json<TopErrorsResponse>> {
    let query = parse_query(pairs)?;
    Ok(Json(state.aggregator().top_errors(&query)?))
}

/// Handle GET /stats/time-series.
pub async fn time_series(
    State(state): State<Arc<AppState>>,
    pairs: QueryPairs,
) -> ServerResult<Json<TimeSeriesResponse>> {
    let query = parse_query(pairs)?;
    Ok(Json(state.aggregator().time_series(&query)?))
}

/// Handle GET /stats/levels.
pub async fn levels(
    State(state): State<Arc<AppState>>,
    pairs: QueryPairs,
) -> ServerResult<Json<LevelsResponse>> {
    let query = parse_query(pairs)?;
    Ok(Json(state.aggregator().levels(&query)?))
}

/// Handle POST /logs - ingest a JSON array of candidate records.
pub async fn ingest_logs(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> ServerResult<Json<BatchReport>> {
    let body = body.map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ServerError::PayloadTooLarge(e.body_text())
        } else {
            ServerError::MalformedSource(e.body_text())
        }
    })?;
    let report = state.pipeline().ingest_from_source(&body)?;
    Ok(Json(report))
}

/// Fallback for unknown routes.
pub async fn not_found(uri: Uri) -> ServerError {
    ServerError::NotFound(uri.path().to_string())
}

fn parse_query(pairs: QueryPairs) -> ServerResult<StatsQuery> {
    let Query(pairs) = pairs.map_err(|e| ServerError::InvalidParameters(e.body_text()))?;
    Ok(StatsQuery::from_pairs(pairs)?)
}
