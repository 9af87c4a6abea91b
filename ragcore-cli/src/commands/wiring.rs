//! ABOUTME: Builds the adapter set `serve` and `eval` both need from a loaded `RagConfig`.
//! ABOUTME: The LLM/embedding/reranker trio talk HTTP; the remaining stores are in-memory,
//! ABOUTME: mirroring the adapter crate's own Non-goal of not shipping an HTTP store adapter.

use ragcore_adapters::http::{HttpEmbeddingService, HttpLlmDriver, HttpRerankerService};
use ragcore_adapters::memory::{InMemoryCache, InMemoryGraphStore, InMemoryRelationalStore, InMemoryVectorStore};
use ragcore_adapters::{Cache, EmbeddingService, GraphStore, LlmDriver, RelationalStore, RerankerService, VectorStore};
use ragcore_config::RagConfig;
use std::sync::Arc;

pub struct Adapters {
    pub embedding: Arc<dyn EmbeddingService>,
    pub vector_store: Arc<dyn VectorStore>,
    pub reranker: Arc<dyn RerankerService>,
    pub graph_store: Arc<dyn GraphStore>,
    pub relational_store: Arc<dyn RelationalStore>,
    pub cache: Option<Arc<dyn Cache>>,
    pub llm: Arc<dyn LlmDriver>,
}

/// Wires every collaborator `ragcore-pipeline`/`ragcore-eval` need, reading
/// endpoint URLs and credentials from `config.endpoints`.
pub fn build(config: &RagConfig) -> anyhow::Result<Adapters> {
    Ok(Adapters {
        embedding: Arc::new(HttpEmbeddingService::new(config.endpoints.embedding.clone())?),
        llm: Arc::new(HttpLlmDriver::new(config.endpoints.llm.clone())?),
        reranker: Arc::new(HttpRerankerService::new(config.endpoints.reranker.clone())?),
        vector_store: Arc::new(InMemoryVectorStore::new()),
        graph_store: Arc::new(InMemoryGraphStore::new()),
        relational_store: Arc::new(InMemoryRelationalStore::new()),
        cache: Some(Arc::new(InMemoryCache::new())),
    })
}
