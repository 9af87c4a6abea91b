//! ABOUTME: Retrieval engine (C4): permission resolution, hybrid search, reranking,
//! ABOUTME: document expansion, and graph enrichment behind one `retrieve()` call

mod engine;
mod graph_summary;
mod request;
mod response;

pub use engine::RetrievalEngine;
pub use request::RetrieveRequest;
pub use response::{GraphContext, RetrievalFlags, RetrieveResponse};

#[cfg(test)]
mod tests {
    use super::*;
    use ragcore_adapters::memory::{
        InMemoryCache, InMemoryEmbeddingService, InMemoryGraphStore, InMemoryRelationalStore,
        InMemoryRerankerService, InMemoryVectorStore,
    };
    use ragcore_core::{
        Chunk, ChunkId, Document, DocumentId, HierarchyLevel, QueryAnalysis, QueryType,
        RequestContext, RetrievalStrategy, UserContext, UserRole, Visibility,
    };
    use std::collections::HashSet;
    use std::sync::Arc;

    fn analysis() -> QueryAnalysis {
        QueryAnalysis {
            query_type: QueryType::Factual,
            entities: Vec::new(),
            is_multi_hop: false,
            requires_graph: false,
            requires_table: false,
            strategy: RetrievalStrategy::Hybrid,
            recommended_level_filter: HashSet::new(),
            confidence: 0.8,
        }
    }

    fn user() -> UserContext {
        UserContext::new("alice", UserRole::Employee, "eng")
    }

    async fn seeded_vector_store() -> (Arc<InMemoryVectorStore>, Arc<InMemoryRelationalStore>, DocumentId) {
        let vector_store = Arc::new(InMemoryVectorStore::new());
        let relational_store = Arc::new(InMemoryRelationalStore::new());

        let document_id = DocumentId::new();
        let document = Document {
            id: document_id,
            original_file_name: "handbook.pdf".to_string(),
            display_name: "Handbook".to_string(),
            size_bytes: 1024,
            page_count: 3,
            owner_id: "alice".to_string(),
            visibility: Visibility::Public,
            department: None,
            uploaded_at: chrono::Utc::now(),
        };
        relational_store.upsert_document(document).await.unwrap();

        let chunk = Chunk::new(ChunkId::new(), document_id, 0, HierarchyLevel::Paragraph, "Acme pays invoices net 30.");
        vector_store.upsert_chunks(vec![chunk]).await.unwrap();

        (vector_store, relational_store, document_id)
    }

    #[tokio::test]
    async fn returns_no_accessible_documents_flag_when_user_has_no_visible_documents() {
        let vector_store = Arc::new(InMemoryVectorStore::new());
        let relational_store = Arc::new(InMemoryRelationalStore::new());
        let engine = RetrievalEngine::new(
            Arc::new(InMemoryEmbeddingService::new(8)),
            vector_store,
            Arc::new(InMemoryRerankerService::new()),
            Arc::new(InMemoryGraphStore::new()),
            relational_store,
            None,
        );
        let request = RetrieveRequest::from_pipeline_config(
            "What is the invoice policy?",
            analysis(),
            user(),
            "test-model",
            &ragcore_config::PipelineConfig::default(),
        );
        let ctx = RequestContext::new(user(), "sess-1");
        let response = engine.retrieve(&request, &ctx).await.unwrap();
        assert!(response.flags.no_accessible_documents);
        assert!(response.hits.is_empty());
    }

    #[tokio::test]
    async fn retrieves_hits_for_an_accessible_document() {
        let (vector_store, relational_store, _document_id) = seeded_vector_store().await;
        let engine = RetrievalEngine::new(
            Arc::new(InMemoryEmbeddingService::new(8)),
            vector_store,
            Arc::new(InMemoryRerankerService::new()),
            Arc::new(InMemoryGraphStore::new()),
            relational_store,
            Some(Arc::new(InMemoryCache::new())),
        );
        let request = RetrieveRequest::from_pipeline_config(
            "What is the invoice policy?",
            analysis(),
            user(),
            "test-model",
            &ragcore_config::PipelineConfig::default(),
        );
        let ctx = RequestContext::new(user(), "sess-1");
        let response = engine.retrieve(&request, &ctx).await.unwrap();
        assert!(!response.flags.no_accessible_documents);
        assert!(!response.hits.is_empty());
    }

    #[tokio::test]
    async fn repeated_calls_reuse_the_embedding_cache_without_error() {
        let (vector_store, relational_store, _document_id) = seeded_vector_store().await;
        let cache = Arc::new(InMemoryCache::new());
        let engine = RetrievalEngine::new(
            Arc::new(InMemoryEmbeddingService::new(8)),
            vector_store,
            Arc::new(InMemoryRerankerService::new()),
            Arc::new(InMemoryGraphStore::new()),
            relational_store,
            Some(cache),
        );
        let request = RetrieveRequest::from_pipeline_config(
            "What is the invoice policy?",
            analysis(),
            user(),
            "test-model",
            &ragcore_config::PipelineConfig::default(),
        );
        let ctx = RequestContext::new(user(), "sess-1");
        let first = engine.retrieve(&request, &ctx).await.unwrap();
        let second = engine.retrieve(&request, &ctx).await.unwrap();
        assert_eq!(first.hits.len(), second.hits.len());
    }
}
