//! ABOUTME: LLM driver trait: non-streaming chat, streaming chat, health check

use crate::health::HealthStatus;
use async_trait::async_trait;
use futures::Stream;
use ragcore_core::Result;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatOptions {
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self { temperature: 0.3, max_tokens: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteResponse {
    pub content: String,
    pub model: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// Terminal metadata delivered once a `chat_stream` finishes, via its oneshot channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamMetadata {
    pub model: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

pub type ChatTokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// A streaming chat response: the token stream and a oneshot receiver that
/// resolves to [`StreamMetadata`] once the stream has been fully drained.
/// Dropping the stream before it completes cancels the upstream call.
pub struct ChatStream {
    pub tokens: ChatTokenStream,
    pub metadata: tokio::sync::oneshot::Receiver<StreamMetadata>,
}

#[async_trait]
pub trait LlmDriver: Send + Sync {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        model: &str,
        options: &ChatOptions,
    ) -> Result<CompleteResponse>;

    async fn chat_stream(
        &self,
        messages: &[ChatMessage],
        model: &str,
        options: &ChatOptions,
    ) -> Result<ChatStream>;

    async fn health_check(&self) -> HealthStatus;
}
