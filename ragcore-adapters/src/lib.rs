//! ABOUTME: Trait definitions for every external collaborator (C1), plus in-memory test
//! ABOUTME: doubles and reqwest-backed HTTP implementations for the LLM/embedding/reranker trio

pub mod cache;
pub mod embedding;
pub mod graph_store;
pub mod health;
pub mod http;
pub mod llm;
pub mod memory;
pub mod reranker;
pub mod relational_store;
pub mod vector_store;

pub use cache::{cache_key, Cache, CacheStats, InstrumentedCache};
pub use embedding::EmbeddingService;
pub use graph_store::{GraphStore, SubGraph, TraversalQuery, TraversalStrategy};
pub use health::{HealthState, HealthStatus};
pub use llm::{ChatMessage, ChatOptions, ChatRole, ChatStream, ChatTokenStream, CompleteResponse, LlmDriver, StreamMetadata};
pub use relational_store::RelationalStore;
pub use reranker::{identity_ranking, RankedIndex, RerankerService};
pub use vector_store::{ExpansionQuery, HybridSearchQuery, VectorStore};
