use super::{build_client, timeout_or_unavailable};
use crate::health::HealthStatus;
use crate::reranker::{identity_ranking, RankedIndex, RerankerService};
use async_trait::async_trait;
use ragcore_config::EndpointConfig;
use ragcore_core::{RagError, Result};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::warn;

const ADAPTER_NAME: &str = "reranker-service";

#[derive(Serialize)]
struct RerankRequest<'a> {
    query: &'a str,
    documents: &'a [String],
    top_k: usize,
}

#[derive(Deserialize)]
struct RerankResult {
    index: usize,
    score: f32,
}

#[derive(Deserialize)]
struct RerankResponse {
    results: Vec<RerankResult>,
}

pub struct HttpRerankerService {
    client: reqwest::Client,
    endpoint: EndpointConfig,
}

impl HttpRerankerService {
    pub fn new(endpoint: EndpointConfig) -> Result<Self> {
        let client = build_client(endpoint.timeout())?;
        Ok(Self { client, endpoint })
    }

    fn request_builder(&self) -> reqwest::RequestBuilder {
        let url = format!("{}/rerank", self.endpoint.url);
        let req = self.client.post(url);
        match &self.endpoint.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }
}

#[async_trait]
impl RerankerService for HttpRerankerService {
    /// On timeout, substitutes identity ordering rather than failing the
    /// caller, per the adapter contract.
    async fn rerank(&self, query: &str, documents: &[String], top_k: usize) -> Result<Vec<RankedIndex>> {
        let started = Instant::now();
        let body = RerankRequest { query, documents, top_k };
        let response = self.request_builder().json(&body).send().await;

        let response = match response {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                warn!("reranker timed out, falling back to identity ordering");
                return Ok(identity_ranking(documents.len(), top_k));
            }
            Err(e) => {
                return Err(timeout_or_unavailable(ADAPTER_NAME, &e, started.elapsed().as_millis() as u64))
            }
        };

        if !response.status().is_success() {
            return Err(RagError::adapter_error(
                ADAPTER_NAME,
                format!("upstream returned {}", response.status()),
            ));
        }

        let parsed: RerankResponse = response
            .json()
            .await
            .map_err(|e| RagError::adapter_error(ADAPTER_NAME, e.to_string()))?;

        let mut ranked: Vec<RankedIndex> = parsed
            .results
            .into_iter()
            .map(|r| RankedIndex { original_index: r.index, score: r.score })
            .collect();
        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(top_k);
        Ok(ranked)
    }

    async fn health_check(&self) -> HealthStatus {
        let started = Instant::now();
        let url = format!("{}/health", self.endpoint.url);
        match self.client.get(url).send().await {
            Ok(resp) if resp.status().is_success() => {
                HealthStatus::ok(started.elapsed().as_millis() as u64)
            }
            Ok(_) => HealthStatus::degraded(started.elapsed().as_millis() as u64),
            Err(e) => {
                warn!(error = %e, "reranker service health check failed");
                HealthStatus::down()
            }
        }
    }
}
