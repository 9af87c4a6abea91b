//! ABOUTME: Embedding service trait: single and batch embedding, order-preserving

use crate::health::HealthStatus;
use async_trait::async_trait;
use ragcore_core::Result;

#[async_trait]
pub trait EmbeddingService: Send + Sync {
    async fn embed(&self, text: &str, model: &str) -> Result<Vec<f32>>;

    /// Embeds a batch of texts, preserving input order in the output.
    async fn embed_batch(&self, texts: &[String], model: &str) -> Result<Vec<Vec<f32>>>;

    async fn health_check(&self) -> HealthStatus;
}
