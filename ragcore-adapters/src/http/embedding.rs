use super::{build_client, timeout_or_unavailable};
use crate::embedding::EmbeddingService;
use crate::health::HealthStatus;
use async_trait::async_trait;
use ragcore_config::EndpointConfig;
use ragcore_core::{RagError, Result};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::warn;

const ADAPTER_NAME: &str = "embedding-service";

#[derive(Serialize)]
struct EmbedBatchRequest<'a> {
    model: &'a str,
    texts: &'a [String],
}

#[derive(Deserialize)]
struct EmbedBatchResponse {
    embeddings: Vec<Vec<f32>>,
}

pub struct HttpEmbeddingService {
    client: reqwest::Client,
    endpoint: EndpointConfig,
}

impl HttpEmbeddingService {
    pub fn new(endpoint: EndpointConfig) -> Result<Self> {
        let client = build_client(endpoint.timeout())?;
        Ok(Self { client, endpoint })
    }

    fn request_builder(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{path}", self.endpoint.url);
        let req = self.client.post(url);
        match &self.endpoint.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }
}

#[async_trait]
impl EmbeddingService for HttpEmbeddingService {
    async fn embed(&self, text: &str, model: &str) -> Result<Vec<f32>> {
        let texts = vec![text.to_string()];
        let mut result = self.embed_batch(&texts, model).await?;
        result.pop().ok_or_else(|| RagError::adapter_error(ADAPTER_NAME, "empty embedding response"))
    }

    async fn embed_batch(&self, texts: &[String], model: &str) -> Result<Vec<Vec<f32>>> {
        let started = Instant::now();
        let body = EmbedBatchRequest { model, texts };
        let response = self
            .request_builder("/embeddings")
            .json(&body)
            .send()
            .await
            .map_err(|e| timeout_or_unavailable(ADAPTER_NAME, &e, started.elapsed().as_millis() as u64))?;

        if !response.status().is_success() {
            return Err(RagError::adapter_error(
                ADAPTER_NAME,
                format!("upstream returned {}", response.status()),
            ));
        }

        let parsed: EmbedBatchResponse = response
            .json()
            .await
            .map_err(|e| RagError::adapter_error(ADAPTER_NAME, e.to_string()))?;

        if parsed.embeddings.len() != texts.len() {
            return Err(RagError::adapter_error(
                ADAPTER_NAME,
                "embedding count does not match input count",
            ));
        }
        Ok(parsed.embeddings)
    }

    async fn health_check(&self) -> HealthStatus {
        let started = Instant::now();
        match self.request_builder("/health").send().await {
            Ok(resp) if resp.status().is_success() => {
                HealthStatus::ok(started.elapsed().as_millis() as u64)
            }
            Ok(_) => HealthStatus::degraded(started.elapsed().as_millis() as u64),
            Err(e) => {
                warn!(error = %e, "embedding service health check failed");
                HealthStatus::down()
            }
        }
    }
}
