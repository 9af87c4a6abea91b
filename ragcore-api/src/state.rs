//! ABOUTME: Shared application state threaded into every axum handler via `State`

use ragcore_adapters::{Cache, EmbeddingService, GraphStore, InstrumentedCache, LlmDriver, RelationalStore, RerankerService, VectorStore};
use ragcore_config::RagConfig;
use ragcore_eval::EvalHarness;
use ragcore_pipeline::Pipeline;
use ragcore_trace::{AlertGenerator, Tracer};
use std::sync::Arc;
use std::time::Instant;

/// Collaborators and config every handler needs; cloning is cheap since
/// every field is already an `Arc` or plain config data.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub eval_harness: Arc<EvalHarness>,
    pub tracer: Arc<Tracer>,
    pub alerts: Arc<AlertGenerator>,
    pub config: RagConfig,
    pub vector_store: Arc<dyn VectorStore>,
    pub embedding: Arc<dyn EmbeddingService>,
    pub reranker: Arc<dyn RerankerService>,
    pub graph_store: Arc<dyn GraphStore>,
    pub relational_store: Arc<dyn RelationalStore>,
    pub cache: Option<Arc<InstrumentedCache>>,
    pub llm: Arc<dyn LlmDriver>,
    pub started_at: Instant,
}

#[allow(clippy::too_many_arguments)]
impl AppState {
    #[must_use]
    pub fn new(
        embedding: Arc<dyn EmbeddingService>,
        vector_store: Arc<dyn VectorStore>,
        reranker: Arc<dyn RerankerService>,
        graph_store: Arc<dyn GraphStore>,
        relational_store: Arc<dyn RelationalStore>,
        cache: Option<Arc<dyn Cache>>,
        llm: Arc<dyn LlmDriver>,
        config: RagConfig,
    ) -> Self {
        let instrumented_cache = cache.clone().map(InstrumentedCache::new).map(Arc::new);
        let cache_for_pipeline: Option<Arc<dyn Cache>> =
            instrumented_cache.clone().map(|c| c as Arc<dyn Cache>).or(cache);

        let tracer = Arc::new(Tracer::new(config.observability.trace.clone(), Some(relational_store.clone())));
        let alerts = Arc::new(AlertGenerator::new(config.observability.alert.clone(), Some(relational_store.clone())));

        let pipeline = Arc::new(Pipeline::new(
            embedding.clone(),
            vector_store.clone(),
            reranker.clone(),
            graph_store.clone(),
            relational_store.clone(),
            cache_for_pipeline.clone(),
            llm.clone(),
            config.clone(),
            tracer.clone(),
        ));

        let eval_harness = Arc::new(EvalHarness::new(
            embedding.clone(),
            vector_store.clone(),
            reranker.clone(),
            graph_store.clone(),
            relational_store.clone(),
            cache_for_pipeline,
            llm.clone(),
        ));

        Self {
            pipeline,
            eval_harness,
            tracer,
            alerts,
            config,
            vector_store,
            embedding,
            reranker,
            graph_store,
            relational_store,
            cache: instrumented_cache,
            llm,
            started_at: Instant::now(),
        }
    }
}
