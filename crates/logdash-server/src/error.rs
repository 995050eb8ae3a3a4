//! Error types for the HTTP server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use logdash::LogError;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// Result type alias for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the specified address.
    #[error("failed to bind to {0}: {1}")]
    BindFailed(std::net::SocketAddr, std::io::Error),

    /// Query parameters were rejected.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Request body was not a JSON array of records.
    #[error("malformed source: {0}")]
    MalformedSource(String),

    /// Request body exceeded the configured limit.
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    /// Configuration values were rejected at startup.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The store is closed.
    #[error("store unavailable")]
    StoreUnavailable,

    /// No route matched.
    #[error("not found: {0}")]
    NotFound(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// HTTP status and the short public message for this error.
    #[must_use]
    pub const fn status_and_message(&self) -> (StatusCode, &'static str) {
        match self {
            Self::InvalidParameters(_) => (StatusCode::BAD_REQUEST, "invalid parameters"),
            Self::MalformedSource(_) => (StatusCode::BAD_REQUEST, "malformed source"),
            Self::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "payload too large"),
            Self::StoreUnavailable => (StatusCode::SERVICE_UNAVAILABLE, "store unavailable"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "not found"),
            Self::BindFailed(_, _) | Self::InvalidConfig(_) | Self::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error")
            }
        }
    }
}

impl From<LogError> for ServerError {
    fn from(err: LogError) -> Self {
        match err {
            LogError::InvalidParameters(detail) => Self::InvalidParameters(detail),
            LogError::MalformedSource(detail) => Self::MalformedSource(detail),
            LogError::StoreUnavailable => Self::StoreUnavailable,
            other => Self::Internal(other.to_string()),
        }
    }
}

/// JSON failure body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    error: &'static str,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "request rejected");
        }

        let body = ErrorResponse {
            success: false,
            error: message,
        };

        let json = serde_json::to_string(&body).unwrap_or_else(|_| {
            r#"{"success":false,"error":"internal error"}"#.to_string()
        });

        (status, [("content-type", "application/json")], json).into_response()
    }
}
