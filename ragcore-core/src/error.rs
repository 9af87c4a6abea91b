//! ABOUTME: Error taxonomy shared by every stage of the retrieval pipeline
//! ABOUTME: Provides RagError, ErrorKind, and the Result type alias

use thiserror::Error;

/// Errors produced anywhere in the pipeline, from guardrails down to adapters.
///
/// Each variant maps to exactly one [`ErrorKind`]; transports use [`RagError::kind`]
/// to pick an HTTP status and a stable `code` string without matching on variants.
#[derive(Debug, Error)]
pub enum RagError {
    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden: {message}")]
    Forbidden { message: String },

    #[error("not found: {resource}")]
    NotFound { resource: String },

    #[error("rate limited")]
    RateLimited,

    #[error("adapter unavailable: {adapter}")]
    AdapterUnavailable { adapter: String },

    #[error("adapter timeout: {adapter} after {elapsed_ms}ms")]
    AdapterTimeout { adapter: String, elapsed_ms: u64 },

    #[error("adapter error: {adapter}: {message}")]
    AdapterError { adapter: String, message: String },

    #[error("pipeline degraded: {message}")]
    PipelineDegraded { message: String },

    #[error("cancelled")]
    Cancelled,

    #[error("internal error: {message}")]
    Internal { message: String },
}

/// Stable classification used for HTTP status mapping and metrics labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Unauthorized,
    Forbidden,
    NotFound,
    RateLimited,
    AdapterUnavailable,
    AdapterTimeout,
    AdapterError,
    PipelineDegraded,
    Cancelled,
    Internal,
}

impl RagError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Unauthorized => ErrorKind::Unauthorized,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::RateLimited => ErrorKind::RateLimited,
            Self::AdapterUnavailable { .. } => ErrorKind::AdapterUnavailable,
            Self::AdapterTimeout { .. } => ErrorKind::AdapterTimeout,
            Self::AdapterError { .. } => ErrorKind::AdapterError,
            Self::PipelineDegraded { .. } => ErrorKind::PipelineDegraded,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    #[must_use]
    pub fn adapter_unavailable(adapter: impl Into<String>) -> Self {
        Self::AdapterUnavailable { adapter: adapter.into() }
    }

    #[must_use]
    pub fn adapter_timeout(adapter: impl Into<String>, elapsed_ms: u64) -> Self {
        Self::AdapterTimeout { adapter: adapter.into(), elapsed_ms }
    }

    #[must_use]
    pub fn adapter_error(adapter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AdapterError { adapter: adapter.into(), message: message.into() }
    }
}

impl ErrorKind {
    /// The code string surfaced in the JSON error body (see the transport error shape).
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "notFound",
            Self::RateLimited => "rateLimited",
            Self::AdapterUnavailable => "adapterUnavailable",
            Self::AdapterTimeout => "adapterTimeout",
            Self::AdapterError => "adapterError",
            Self::PipelineDegraded => "pipelineDegraded",
            Self::Cancelled => "cancelled",
            Self::Internal => "internal",
        }
    }

    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::RateLimited => 429,
            Self::AdapterUnavailable => 502,
            Self::AdapterTimeout => 504,
            Self::AdapterError => 502,
            Self::PipelineDegraded => 200,
            Self::Cancelled => 499,
            Self::Internal => 500,
        }
    }
}

/// Convenience Result type alias used across every `ragcore-*` crate.
pub type Result<T> = std::result::Result<T, RagError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_code() {
        let err = RagError::adapter_timeout("vector-store", 2500);
        assert_eq!(err.kind().code(), "adapterTimeout");
        assert_eq!(err.kind().http_status(), 504);
    }

    #[test]
    fn validation_maps_to_400() {
        assert_eq!(RagError::validation("too short").kind().http_status(), 400);
    }

    #[test]
    fn pipeline_degraded_is_not_a_transport_error() {
        assert_eq!(ErrorKind::PipelineDegraded.http_status(), 200);
    }
}
