use crate::health::HealthStatus;
use crate::vector_store::{ExpansionQuery, HybridSearchQuery, VectorStore};
use async_trait::async_trait;
use dashmap::DashMap;
use ragcore_core::{Chunk, ChunkId, DocumentId, Result, SearchHit};

/// In-process hybrid search double: lexical score is token-overlap, vector
/// score is cosine similarity against the stored chunk embedding, fused
/// linearly by `alpha` exactly as the adapter contract describes.
#[derive(Default)]
pub struct InMemoryVectorStore {
    chunks: DashMap<ChunkId, Chunk>,
}

impl InMemoryVectorStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lexical_score(query: &str, text: &str) -> f32 {
        let q: Vec<String> = query.to_lowercase().split_whitespace().map(str::to_string).collect();
        let t: std::collections::HashSet<String> =
            text.to_lowercase().split_whitespace().map(str::to_string).collect();
        if q.is_empty() {
            return 0.0;
        }
        let hits = q.iter().filter(|tok| t.contains(*tok)).count();
        hits as f32 / q.len() as f32
    }

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if na == 0.0 || nb == 0.0 {
            0.0
        } else {
            (dot / (na * nb)).clamp(-1.0, 1.0)
        }
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn hybrid_search(&self, query: &HybridSearchQuery) -> Result<Vec<SearchHit>> {
        let mut hits: Vec<SearchHit> = self
            .chunks
            .iter()
            .filter(|entry| {
                query
                    .allowed_document_ids
                    .as_ref()
                    .map_or(true, |allowed| allowed.contains(&entry.value().document_id))
            })
            .filter(|entry| {
                query.level_filter.as_ref().map_or(true, |levels| levels.contains(&entry.value().level))
            })
            .filter_map(|entry| {
                let chunk = entry.value();
                let lexical = Self::lexical_score(&query.query, &chunk.text);
                let vector = chunk
                    .embedding
                    .as_ref()
                    .map(|e| Self::cosine(&query.embedding, e))
                    .unwrap_or(0.0);
                let fused = query.alpha * vector + (1.0 - query.alpha) * lexical;
                if fused < query.threshold {
                    return None;
                }
                Some(SearchHit::new(chunk.id, chunk.document_id, fused))
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(query.limit);
        Ok(hits)
    }

    async fn chunks_by_document_ids(
        &self,
        document_ids: &[DocumentId],
        query: &ExpansionQuery,
    ) -> Result<Vec<Chunk>> {
        let mut result = Vec::new();
        for document_id in document_ids {
            let mut per_doc: Vec<Chunk> = self
                .chunks
                .iter()
                .filter(|e| e.value().document_id == *document_id)
                .filter(|e| query.level_filter.map_or(true, |l| e.value().level == l))
                .map(|e| e.value().clone())
                .collect();
            per_doc.sort_by_key(|c| c.ordinal);
            per_doc.truncate(query.max_per_doc);
            result.extend(per_doc);
        }
        Ok(result)
    }

    async fn chunks_by_ids(&self, chunk_ids: &[ChunkId]) -> Result<Vec<Chunk>> {
        Ok(chunk_ids.iter().filter_map(|id| self.chunks.get(id).map(|c| c.value().clone())).collect())
    }

    async fn upsert_chunks(&self, chunks: Vec<Chunk>) -> Result<Vec<ChunkId>> {
        let ids = chunks.iter().map(|c| c.id).collect();
        for chunk in chunks {
            self.chunks.insert(chunk.id, chunk);
        }
        Ok(ids)
    }

    async fn health_check(&self) -> HealthStatus {
        HealthStatus::ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragcore_core::{ChunkId, DocumentId, HierarchyLevel};

    fn chunk(doc: DocumentId, ordinal: u32, text: &str, embedding: Vec<f32>) -> Chunk {
        Chunk::new(ChunkId::new(), doc, ordinal, HierarchyLevel::Paragraph, text)
            .with_embedding(embedding)
    }

    #[tokio::test]
    async fn alpha_zero_is_pure_lexical() {
        let store = InMemoryVectorStore::new();
        let doc = DocumentId::new();
        store
            .upsert_chunks(vec![chunk(doc, 0, "vacation policy details", vec![1.0, 0.0])])
            .await
            .unwrap();
        let query = HybridSearchQuery::new("vacation policy", vec![0.0, 1.0], 5).with_alpha(0.0);
        let hits = store.hybrid_search(&query).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].score > 0.0);
    }

    #[tokio::test]
    async fn allowed_document_ids_filters_results() {
        let store = InMemoryVectorStore::new();
        let allowed_doc = DocumentId::new();
        let other_doc = DocumentId::new();
        store
            .upsert_chunks(vec![
                chunk(allowed_doc, 0, "quarterly report", vec![1.0, 0.0]),
                chunk(other_doc, 0, "quarterly report", vec![1.0, 0.0]),
            ])
            .await
            .unwrap();
        let mut allowed = std::collections::HashSet::new();
        allowed.insert(allowed_doc);
        let query = HybridSearchQuery::new("quarterly report", vec![1.0, 0.0], 10)
            .with_allowed_document_ids(allowed);
        let hits = store.hybrid_search(&query).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document_id, allowed_doc);
    }
}
