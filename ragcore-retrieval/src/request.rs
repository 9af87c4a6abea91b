//! ABOUTME: Tuning knobs and caller identity for one `retrieve()` call

use ragcore_config::PipelineConfig;
use ragcore_core::{QueryAnalysis, UserContext};

#[derive(Debug, Clone)]
pub struct RetrieveRequest {
    pub sanitized_query: String,
    pub analysis: QueryAnalysis,
    pub user: UserContext,
    pub embedding_model: String,
    pub search_limit: usize,
    pub search_threshold: f32,
    pub hybrid_alpha: f32,
    pub rerank: bool,
    pub rerank_top_k: usize,
    pub enable_expansion: bool,
    pub max_docs_to_expand: usize,
    pub max_chunks_per_doc: usize,
    pub expansion_threshold: f32,
    pub use_graph: bool,
    pub graph_max_depth: u32,
    pub graph_max_nodes: usize,
}

impl RetrieveRequest {
    /// Builds a request from the deployment's default pipeline knobs,
    /// overridden per-query by the router's analysis (`use_graph` only fires
    /// when both the config and the analysis agree the query needs it).
    #[must_use]
    pub fn from_pipeline_config(
        sanitized_query: impl Into<String>,
        analysis: QueryAnalysis,
        user: UserContext,
        embedding_model: impl Into<String>,
        config: &PipelineConfig,
    ) -> Self {
        let use_graph = config.graph.enabled && analysis.requires_graph;
        Self {
            sanitized_query: sanitized_query.into(),
            analysis,
            user,
            embedding_model: embedding_model.into(),
            search_limit: config.search_limit,
            search_threshold: config.search_threshold,
            hybrid_alpha: config.hybrid_alpha,
            rerank: config.rerank.enabled,
            rerank_top_k: config.rerank.top_k,
            enable_expansion: config.expansion.enabled,
            max_docs_to_expand: config.expansion.max_docs,
            max_chunks_per_doc: config.expansion.max_chunks_per_doc,
            expansion_threshold: config.expansion.threshold,
            use_graph,
            graph_max_depth: config.graph.max_depth,
            graph_max_nodes: config.graph.max_nodes,
        }
    }
}
