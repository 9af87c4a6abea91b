//! ABOUTME: Output of one `retrieve()` call: ordered hits, degradation flags, graph context

use ragcore_adapters::SubGraph;
use ragcore_core::{SearchHit, Span};

#[derive(Debug, Clone, Default)]
pub struct RetrievalFlags {
    pub no_accessible_documents: bool,
    pub expanded: bool,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct GraphContext {
    pub sub_graph: SubGraph,
    pub summary: String,
}

#[derive(Debug, Clone)]
pub struct RetrieveResponse {
    pub hits: Vec<SearchHit>,
    pub flags: RetrievalFlags,
    pub graph_context: Option<GraphContext>,
    /// Per-step spans (embedding generation, vector search, reranking, graph
    /// traversal) for the caller to fold into its own request trace — C4
    /// itself has no `Tracer` dependency, it just hands back what it timed.
    pub spans: Vec<Span>,
}

impl RetrieveResponse {
    #[must_use]
    pub fn no_accessible_documents() -> Self {
        Self {
            hits: Vec::new(),
            flags: RetrievalFlags { no_accessible_documents: true, ..RetrievalFlags::default() },
            graph_context: None,
            spans: Vec::new(),
        }
    }
}
