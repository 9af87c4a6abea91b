use crate::embedding::EmbeddingService;
use crate::health::HealthStatus;
use async_trait::async_trait;
use ragcore_core::Result;

/// Deterministic hash-based embedding double: same text always yields the
/// same vector, distinct texts yield distinct vectors, without any model call.
pub struct InMemoryEmbeddingService {
    dimensions: usize,
}

impl InMemoryEmbeddingService {
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for (i, byte) in text.bytes().enumerate() {
            let slot = i % self.dimensions;
            vector[slot] += f32::from(byte) / 255.0;
        }
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingService for InMemoryEmbeddingService {
    async fn embed(&self, text: &str, _model: &str) -> Result<Vec<f32>> {
        Ok(self.embed_one(text))
    }

    async fn embed_batch(&self, texts: &[String], _model: &str) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    async fn health_check(&self) -> HealthStatus {
        HealthStatus::ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_text_yields_same_vector() {
        let svc = InMemoryEmbeddingService::new(16);
        let a = svc.embed("hello world", "test").await.unwrap();
        let b = svc.embed("hello world", "test").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn batch_preserves_order() {
        let svc = InMemoryEmbeddingService::new(8);
        let texts = vec!["alpha".to_string(), "beta".to_string(), "gamma".to_string()];
        let batch = svc.embed_batch(&texts, "test").await.unwrap();
        for (text, vector) in texts.iter().zip(batch.iter()) {
            let single = svc.embed(text, "test").await.unwrap();
            assert_eq!(&single, vector);
        }
    }
}
