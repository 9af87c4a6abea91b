//! ABOUTME: Core data model, error taxonomy, and request context for the RAG engine
//! ABOUTME: Every other ragcore-* crate depends on this one; it has no pipeline-stage logic

pub mod error;
pub mod ids;
pub mod logging;
pub mod request_context;
pub mod types;

pub use error::{ErrorKind, RagError, Result};
pub use ids::{
    AlertId, ChunkId, DocumentId, EntityId, EvaluationRunId, GoldenQueryId, RelationshipId,
    SpanId, TraceId,
};
pub use request_context::RequestContext;
pub use types::{
    Alert, AlertSeverity, Chunk, Difficulty, Document, Entity, EntityOccurrence, EntityType,
    EvaluationStatus, GoldenQuery, HierarchyLevel, QueryAnalysis, QueryType, RelationType,
    Relationship, RetrievalStrategy, SearchHit, Span, SpanName, SpanStatus, SourceTag, Trace,
    UserContext, UserRole, Visibility, normalize_canonical_form,
};
