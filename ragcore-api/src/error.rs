//! ABOUTME: Maps `RagError` to the transport error JSON shape from §7

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use ragcore_core::RagError;
use serde::Serialize;

/// `{error, code, statusCode, details?, timestamp, path, method}`; `path`/
/// `method` are filled in by the handler that caught the error, since
/// `RagError` itself carries no transport context.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub timestamp: chrono::DateTime<Utc>,
    pub path: String,
    pub method: String,
}

/// Wraps a `RagError` with the request path/method needed to fill out the
/// transport error body; every handler converts its `Result<_, RagError>`
/// into `Result<_, ApiError>` via `.map_err`.
pub struct ApiError {
    pub source: RagError,
    pub path: String,
    pub method: String,
}

impl ApiError {
    #[must_use]
    pub fn new(source: RagError, path: impl Into<String>, method: impl Into<String>) -> Self {
        Self { source, path: path.into(), method: method.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.source.kind();
        let status = StatusCode::from_u16(kind.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody {
            error: self.source.to_string(),
            code: kind.code(),
            status_code: status.as_u16(),
            details: None,
            timestamp: Utc::now(),
            path: self.path,
            method: self.method,
        };
        (status, Json(body)).into_response()
    }
}
