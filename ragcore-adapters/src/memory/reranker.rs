use crate::health::HealthStatus;
use crate::reranker::{RankedIndex, RerankerService};
use async_trait::async_trait;
use ragcore_core::Result;

/// Scores documents by token-overlap with the query; deterministic and
/// model-free, for tests that care about ordering rather than real relevance.
pub struct InMemoryRerankerService;

impl InMemoryRerankerService {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn overlap_score(query: &str, document: &str) -> f32 {
        let query_tokens: std::collections::HashSet<&str> = query.split_whitespace().collect();
        let doc_tokens: std::collections::HashSet<&str> = document.split_whitespace().collect();
        if query_tokens.is_empty() {
            return 0.0;
        }
        let overlap = query_tokens.intersection(&doc_tokens).count();
        overlap as f32 / query_tokens.len() as f32
    }
}

impl Default for InMemoryRerankerService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RerankerService for InMemoryRerankerService {
    async fn rerank(&self, query: &str, documents: &[String], top_k: usize) -> Result<Vec<RankedIndex>> {
        let mut ranked: Vec<RankedIndex> = documents
            .iter()
            .enumerate()
            .map(|(i, doc)| RankedIndex { original_index: i, score: Self::overlap_score(query, doc) })
            .collect();
        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(top_k);
        Ok(ranked)
    }

    async fn health_check(&self) -> HealthStatus {
        HealthStatus::ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ranks_higher_overlap_first() {
        let reranker = InMemoryRerankerService::new();
        let docs = vec!["cats and dogs".to_string(), "vacation policy details".to_string()];
        let ranked = reranker.rerank("vacation policy", &docs, 2).await.unwrap();
        assert_eq!(ranked[0].original_index, 1);
    }
}
