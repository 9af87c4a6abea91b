//! ABOUTME: reqwest-backed adapters for the three plain HTTP/JSON collaborators
//! ABOUTME: (LLM driver, embedding service, reranker service); stores stay trait-only

mod embedding;
mod llm;
mod reranker;

pub use embedding::HttpEmbeddingService;
pub use llm::HttpLlmDriver;
pub use reranker::HttpRerankerService;

use ragcore_core::{RagError, Result};
use std::time::Duration;

/// Shared request-dispatch helper: builds the client once per adapter,
/// maps connect/timeout failures onto the adapter error taxonomy.
pub(crate) fn timeout_or_unavailable(adapter: &str, err: &reqwest::Error, elapsed_ms: u64) -> RagError {
    if err.is_timeout() {
        RagError::adapter_timeout(adapter, elapsed_ms)
    } else if err.is_connect() {
        RagError::adapter_unavailable(adapter)
    } else {
        RagError::adapter_error(adapter, err.to_string())
    }
}

pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| RagError::internal(format!("failed to build HTTP client: {e}")))
}
