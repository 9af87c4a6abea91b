use super::{build_client, timeout_or_unavailable};
use crate::health::HealthStatus;
use crate::llm::{
    ChatMessage, ChatOptions, ChatStream, ChatTokenStream, CompleteResponse, LlmDriver,
    StreamMetadata,
};
use async_trait::async_trait;
use futures::StreamExt;
use ragcore_config::EndpointConfig;
use ragcore_core::{RagError, Result};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{instrument, warn};

const ADAPTER_NAME: &str = "llm-driver";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponseBody {
    content: String,
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Deserialize)]
struct ChatStreamChunk {
    #[serde(default)]
    delta: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

pub struct HttpLlmDriver {
    client: reqwest::Client,
    endpoint: EndpointConfig,
}

impl HttpLlmDriver {
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
impl LlmDriver for HttpLlmDriver {
    #[instrument(skip(self, messages), fields(model))]
    async fn chat(
        &self,
        messages: &[ChatMessage],
        model: &str,
        options: &ChatOptions,
    ) -> Result<CompleteResponse> {
        let started = Instant::now();
        let body = ChatRequest {
            model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            stream: false,
        };
        let response = self
            .request_builder("/chat")
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

        let parsed: ChatResponseBody = response
            .json()
            .await
            .map_err(|e| RagError::adapter_error(ADAPTER_NAME, e.to_string()))?;

        Ok(CompleteResponse {
            content: parsed.content,
            model: model.to_string(),
            prompt_tokens: parsed.prompt_tokens,
            completion_tokens: parsed.completion_tokens,
        })
    }

    async fn chat_stream(
        &self,
        messages: &[ChatMessage],
        model: &str,
        options: &ChatOptions,
    ) -> Result<ChatStream> {
        let started = Instant::now();
        let body = ChatRequest {
            model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            stream: true,
        };
        let response = self
            .request_builder("/chat/stream")
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

        let model = model.to_string();
        let (metadata_tx, metadata_rx) = tokio::sync::oneshot::channel();
        let mut byte_stream = response.bytes_stream();

        let tokens: ChatTokenStream = Box::pin(async_stream::try_stream! {
            let mut buffer = String::new();
            let mut metadata_tx = Some(metadata_tx);
            while let Some(chunk) = byte_stream.next().await {
                let chunk = chunk.map_err(|e| RagError::adapter_error(ADAPTER_NAME, e.to_string()))?;
                buffer.push_str(&String::from_utf8_lossy(&chunk));
                while let Some(pos) = buffer.find('\n') {
                    let line = buffer[..pos].trim().to_string();
                    buffer.drain(..=pos);
                    if line.is_empty() {
                        continue;
                    }
                    let parsed: ChatStreamChunk = serde_json::from_str(&line)
                        .map_err(|e| RagError::adapter_error(ADAPTER_NAME, format!("malformed stream chunk: {e}")))?;
                    if parsed.done {
                        if let Some(tx) = metadata_tx.take() {
                            let _ = tx.send(StreamMetadata {
                                model: model.clone(),
                                prompt_tokens: parsed.prompt_tokens,
                                completion_tokens: parsed.completion_tokens,
                            });
                        }
                        return;
                    }
                    if !parsed.delta.is_empty() {
                        yield parsed.delta;
                    }
                }
            }
            if let Some(tx) = metadata_tx.take() {
                let _ = tx.send(StreamMetadata { model: model.clone(), prompt_tokens: 0, completion_tokens: 0 });
            }
        });

        Ok(ChatStream { tokens, metadata: metadata_rx })
    }

    async fn health_check(&self) -> HealthStatus {
        let started = Instant::now();
        match self.request_builder("/health").send().await {
            Ok(resp) if resp.status().is_success() => {
                HealthStatus::ok(started.elapsed().as_millis() as u64)
            }
            Ok(_) => HealthStatus::degraded(started.elapsed().as_millis() as u64),
            Err(e) => {
                warn!(error = %e, "llm driver health check failed");
                HealthStatus::down()
            }
        }
    }
}
