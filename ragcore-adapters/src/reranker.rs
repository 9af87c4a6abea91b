//! ABOUTME: Reranker service trait: scores documents against a query, with a wall-clock timeout

use crate::health::HealthStatus;
use async_trait::async_trait;
use ragcore_core::Result;

/// `(original_index, score)`, returned in descending score order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedIndex {
    pub original_index: usize,
    pub score: f32,
}

#[async_trait]
pub trait RerankerService: Send + Sync {
    /// Scores `documents` against `query`, returning the top `top_k` by
    /// descending score. Callers that hit the configured timeout should
    /// substitute identity ordering rather than fail the request.
    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        top_k: usize,
    ) -> Result<Vec<RankedIndex>>;

    async fn health_check(&self) -> HealthStatus;
}

/// Identity ordering fallback used by callers when a rerank call times out.
#[must_use]
pub fn identity_ranking(document_count: usize, top_k: usize) -> Vec<RankedIndex> {
    (0..document_count.min(top_k))
        .map(|i| RankedIndex { original_index: i, score: 1.0 - (i as f32 * 1e-6) })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_ranking_preserves_input_order_and_respects_top_k() {
        let ranked = identity_ranking(5, 3);
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].original_index, 0);
        assert_eq!(ranked[2].original_index, 2);
        assert!(ranked[0].score >= ranked[1].score);
    }
}
