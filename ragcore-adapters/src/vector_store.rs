//! ABOUTME: Vector store trait: hybrid lexical+vector search, document-expansion lookups

use crate::health::HealthStatus;
use async_trait::async_trait;
use ragcore_core::{Chunk, ChunkId, DocumentId, HierarchyLevel, SearchHit};
use std::collections::HashSet;

use ragcore_core::Result;

#[derive(Debug, Clone)]
pub struct HybridSearchQuery {
    pub query: String,
    pub embedding: Vec<f32>,
    pub limit: usize,
    pub threshold: f32,
    /// `0.0` is pure lexical, `1.0` pure vector; intermediate values linearly
    /// blend normalized scores.
    pub alpha: f32,
    pub allowed_document_ids: Option<HashSet<DocumentId>>,
    pub level_filter: Option<HashSet<HierarchyLevel>>,
}

impl HybridSearchQuery {
    #[must_use]
    pub fn new(query: impl Into<String>, embedding: Vec<f32>, limit: usize) -> Self {
        Self {
            query: query.into(),
            embedding,
            limit,
            threshold: 0.0,
            alpha: 0.5,
            allowed_document_ids: None,
            level_filter: None,
        }
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn with_allowed_document_ids(mut self, ids: HashSet<DocumentId>) -> Self {
        self.allowed_document_ids = Some(ids);
        self
    }

    #[must_use]
    pub fn with_level_filter(mut self, levels: HashSet<HierarchyLevel>) -> Self {
        self.level_filter = Some(levels);
        self
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ExpansionQuery {
    pub max_per_doc: usize,
    pub level_filter: Option<HierarchyLevel>,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn hybrid_search(&self, query: &HybridSearchQuery) -> Result<Vec<SearchHit>>;

    async fn chunks_by_document_ids(
        &self,
        document_ids: &[DocumentId],
        query: &ExpansionQuery,
    ) -> Result<Vec<Chunk>>;

    /// Fetches chunks by id, used to recover the text of a set of search hits
    /// (e.g. before sending chunk contents to the reranker or prompt composer).
    /// Order is not guaranteed to match `chunk_ids`; ids with no match are omitted.
    async fn chunks_by_ids(&self, chunk_ids: &[ChunkId]) -> Result<Vec<Chunk>>;

    async fn upsert_chunks(&self, chunks: Vec<Chunk>) -> Result<Vec<ChunkId>>;

    async fn health_check(&self) -> HealthStatus;
}
