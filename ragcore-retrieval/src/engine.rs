//! ABOUTME: RetrievalEngine: the seven-step permission-aware hybrid+graph retrieval algorithm

use crate::graph_summary;
use crate::request::RetrieveRequest;
use crate::response::{GraphContext, RetrievalFlags, RetrieveResponse};
use ragcore_adapters::{
    cache_key, Cache, EmbeddingService, ExpansionQuery, GraphStore, HybridSearchQuery,
    RelationalStore, RerankerService, TraversalQuery, TraversalStrategy, VectorStore,
};
use ragcore_core::{RequestContext, Result, SearchHit, SourceTag, Span, SpanName};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

const RERANK_CACHE_TTL: Duration = Duration::from_secs(300);
const EMBEDDING_CACHE_TTL: Duration = Duration::from_secs(3600);
const EXPANSION_SCORE: f32 = 0.1;

/// Orchestrates one `retrieve()` call across the permission, embedding,
/// search, rerank, expansion, and graph-enrichment collaborators (C1).
pub struct RetrievalEngine {
    embedding: Arc<dyn EmbeddingService>,
    vector_store: Arc<dyn VectorStore>,
    reranker: Arc<dyn RerankerService>,
    graph_store: Arc<dyn GraphStore>,
    relational_store: Arc<dyn RelationalStore>,
    cache: Option<Arc<dyn Cache>>,
}

impl RetrievalEngine {
    #[must_use]
    pub fn new(
        embedding: Arc<dyn EmbeddingService>,
        vector_store: Arc<dyn VectorStore>,
        reranker: Arc<dyn RerankerService>,
        graph_store: Arc<dyn GraphStore>,
        relational_store: Arc<dyn RelationalStore>,
        cache: Option<Arc<dyn Cache>>,
    ) -> Self {
        Self { embedding, vector_store, reranker, graph_store, relational_store, cache }
    }

    pub async fn retrieve(
        &self,
        request: &RetrieveRequest,
        ctx: &RequestContext,
    ) -> Result<RetrieveResponse> {
        let mut warnings = Vec::new();
        let mut spans = Vec::new();

        // Step 1: permission resolution.
        self.relational_store.set_user_context(&request.user).await?;
        let accessible = self.relational_store.list_documents_for_user(&request.user).await?;
        if accessible.is_empty() {
            return Ok(RetrieveResponse::no_accessible_documents());
        }
        let allowed_document_ids: HashSet<_> = accessible.iter().map(|d| d.id).collect();

        if ctx.is_cancelled() {
            return Err(ragcore_core::RagError::Cancelled);
        }

        // Step 2: embedding, with degrade-to-lexical on adapter error.
        let mut hybrid_alpha = request.hybrid_alpha;
        let mut embedding_span = Span::start(SpanName::EmbeddingGeneration, None);
        let embedding = match self.embed_query(&request.sanitized_query, &request.embedding_model).await {
            Ok(embedding) => {
                embedding_span.end_ok();
                embedding
            }
            Err(err) => {
                warn!(error = %err, "embedding adapter failed, degrading to pure lexical search");
                warnings.push("embedding unavailable; degraded to lexical search".to_string());
                embedding_span.end_error(err.to_string());
                hybrid_alpha = 0.0;
                Vec::new()
            }
        };
        spans.push(embedding_span);

        if ctx.is_cancelled() {
            return Err(ragcore_core::RagError::Cancelled);
        }

        // Step 3: hybrid search.
        let level_filter = if request.analysis.recommended_level_filter.is_empty() {
            None
        } else {
            Some(
                request
                    .analysis
                    .recommended_level_filter
                    .iter()
                    .filter_map(|level| level_from_u8(*level))
                    .collect(),
            )
        };
        let search_query = HybridSearchQuery::new(request.sanitized_query.as_str(), embedding, request.search_limit)
            .with_threshold(request.search_threshold)
            .with_alpha(hybrid_alpha)
            .with_allowed_document_ids(allowed_document_ids.clone());
        let search_query = match level_filter {
            Some(levels) => search_query.with_level_filter(levels),
            None => search_query,
        };
        let mut vector_search_span = Span::start(SpanName::VectorSearch, None);
        let mut hits = self.vector_store.hybrid_search(&search_query).await?;
        vector_search_span.end_ok();
        spans.push(vector_search_span);

        if ctx.is_cancelled() {
            return Err(ragcore_core::RagError::Cancelled);
        }

        // Step 4: reranking.
        if request.rerank && !hits.is_empty() {
            let mut rerank_span = Span::start(SpanName::Reranking, None);
            match self.rerank_hits(&request.sanitized_query, &hits, request.rerank_top_k).await {
                Ok(reranked) => {
                    hits = reranked;
                    rerank_span.end_ok();
                }
                Err(err) => {
                    warn!(error = %err, "rerank failed, keeping original order");
                    warnings.push("reranker unavailable; kept original result order".to_string());
                    rerank_span.end_error(err.to_string());
                }
            }
            spans.push(rerank_span);
        }

        if ctx.is_cancelled() {
            return Err(ragcore_core::RagError::Cancelled);
        }

        // Step 5: document expansion.
        let mut expanded = false;
        if request.enable_expansion {
            let additions = self.expand_documents(request, &hits).await?;
            if !additions.is_empty() {
                expanded = true;
                hits.extend(additions);
            }
        }

        if ctx.is_cancelled() {
            return Err(ragcore_core::RagError::Cancelled);
        }

        // Step 6: graph enrichment.
        let graph_context = if request.use_graph {
            let mut graph_span = Span::start(SpanName::GraphTraversal, None);
            let context = self.enrich_with_graph(request).await?;
            graph_span.end_ok();
            spans.push(graph_span);
            context
        } else {
            None
        };

        Ok(RetrieveResponse {
            hits,
            flags: RetrievalFlags { no_accessible_documents: false, expanded, warnings },
            graph_context,
            spans,
        })
    }

    async fn embed_query(&self, query: &str, model: &str) -> Result<Vec<f32>> {
        let key = cache_key(&["embed", model, query]);
        if let Some(cache) = &self.cache {
            if let Ok(Some(bytes)) = cache.get(&key).await {
                if let Ok(embedding) = serde_json::from_slice::<Vec<f32>>(&bytes) {
                    return Ok(embedding);
                }
            }
        }
        let embedding = self.embedding.embed(query, model).await?;
        if let Some(cache) = &self.cache {
            if let Ok(bytes) = serde_json::to_vec(&embedding) {
                let _ = cache.set(&key, bytes, EMBEDDING_CACHE_TTL).await;
            }
        }
        Ok(embedding)
    }

    async fn rerank_hits(
        &self,
        query: &str,
        hits: &[SearchHit],
        top_k: usize,
    ) -> Result<Vec<SearchHit>> {
        let chunk_ids: Vec<_> = hits.iter().map(|hit| hit.chunk_id).collect();
        let chunks = self.vector_store.chunks_by_ids(&chunk_ids).await?;
        let texts: Vec<String> = chunk_ids
            .iter()
            .map(|id| {
                chunks
                    .iter()
                    .find(|chunk| chunk.id == *id)
                    .map(|chunk| chunk.text.clone())
                    .unwrap_or_default()
            })
            .collect();

        let key_parts: Vec<&str> = std::iter::once(query).chain(texts.iter().map(String::as_str)).collect();
        let key = cache_key(&key_parts);
        let ranked = if let Some(cache) = &self.cache {
            if let Ok(Some(bytes)) = cache.get(&key).await {
                serde_json::from_slice(&bytes).ok()
            } else {
                None
            }
        } else {
            None
        };
        let ranked = match ranked {
            Some(ranked) => ranked,
            None => {
                let ranked: Vec<(usize, f32)> = self
                    .reranker
                    .rerank(query, &texts, top_k)
                    .await?
                    .into_iter()
                    .map(|r| (r.original_index, r.score))
                    .collect();
                if let Some(cache) = &self.cache {
                    if let Ok(bytes) = serde_json::to_vec(&ranked) {
                        let _ = cache.set(&key, bytes, RERANK_CACHE_TTL).await;
                    }
                }
                ranked
            }
        };

        Ok(ranked
            .into_iter()
            .filter_map(|(index, score)| hits.get(index).cloned().map(|hit| hit.with_rerank_score(score)))
            .collect())
    }

    async fn expand_documents(
        &self,
        request: &RetrieveRequest,
        hits: &[SearchHit],
    ) -> Result<Vec<SearchHit>> {
        let mut seen_documents = HashSet::new();
        let mut seen_chunks: HashSet<_> = hits.iter().map(|hit| hit.chunk_id).collect();
        let mut candidate_documents = Vec::new();
        for hit in hits {
            if hit.effective_score() >= request.expansion_threshold
                && seen_documents.insert(hit.document_id)
            {
                candidate_documents.push(hit.document_id);
            }
        }
        candidate_documents.truncate(request.max_docs_to_expand);
        if candidate_documents.is_empty() {
            return Ok(Vec::new());
        }

        let query = ExpansionQuery {
            max_per_doc: request.max_chunks_per_doc,
            level_filter: Some(ragcore_core::HierarchyLevel::Paragraph),
        };
        let chunks = self.vector_store.chunks_by_document_ids(&candidate_documents, &query).await?;

        Ok(chunks
            .into_iter()
            .filter(|chunk| seen_chunks.insert(chunk.id))
            .map(|chunk| {
                SearchHit::new(chunk.id, chunk.document_id, EXPANSION_SCORE).with_source(SourceTag::Expansion)
            })
            .collect())
    }

    async fn enrich_with_graph(&self, request: &RetrieveRequest) -> Result<Option<GraphContext>> {
        if request.analysis.entities.is_empty() {
            return Ok(None);
        }
        let resolved = self.graph_store.find_by_text(&request.analysis.entities).await?;
        if resolved.is_empty() {
            return Ok(None);
        }

        let query = TraversalQuery::new(resolved.iter().map(|e| e.id).collect(), TraversalStrategy::Neighborhood)
            .with_max_depth(request.graph_max_depth)
            .with_max_nodes(request.graph_max_nodes);
        let sub_graph = self.graph_store.traverse(&query).await?;
        let summary = graph_summary::summarize(&sub_graph);
        Ok(Some(GraphContext { sub_graph, summary }))
    }
}

fn level_from_u8(level: u8) -> Option<ragcore_core::HierarchyLevel> {
    match level {
        0 => Some(ragcore_core::HierarchyLevel::DocumentSummary),
        1 => Some(ragcore_core::HierarchyLevel::Section),
        2 => Some(ragcore_core::HierarchyLevel::Paragraph),
        _ => None,
    }
}
