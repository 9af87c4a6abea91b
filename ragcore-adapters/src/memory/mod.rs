//! ABOUTME: Deterministic in-process test doubles for every adapter trait

mod cache;
mod embedding;
mod graph_store;
mod llm;
mod reranker;
mod relational_store;
mod vector_store;

pub use cache::InMemoryCache;
pub use embedding::InMemoryEmbeddingService;
pub use graph_store::InMemoryGraphStore;
pub use llm::InMemoryLlmDriver;
pub use relational_store::InMemoryRelationalStore;
pub use reranker::InMemoryRerankerService;
pub use vector_store::InMemoryVectorStore;
