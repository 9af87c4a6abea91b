use crate::health::HealthStatus;
use crate::llm::{
    ChatMessage, ChatOptions, ChatStream, ChatTokenStream, CompleteResponse, LlmDriver,
    StreamMetadata,
};
use async_trait::async_trait;
use futures::stream;
use ragcore_core::Result;

/// Deterministic test double: echoes the last user message, optionally with
/// a canned response keyed by a substring match, so tests can script answers.
pub struct InMemoryLlmDriver {
    scripted_responses: Vec<(String, String)>,
    default_response: String,
}

impl InMemoryLlmDriver {
    #[must_use]
    pub fn new(default_response: impl Into<String>) -> Self {
        Self { scripted_responses: Vec::new(), default_response: default_response.into() }
    }

    #[must_use]
    pub fn with_scripted_response(mut self, contains: impl Into<String>, response: impl Into<String>) -> Self {
        self.scripted_responses.push((contains.into(), response.into()));
        self
    }

    fn respond_to(&self, messages: &[ChatMessage]) -> String {
        let last_user = messages.iter().rev().find(|m| matches!(m.role, crate::llm::ChatRole::User));
        if let Some(msg) = last_user {
            for (needle, response) in &self.scripted_responses {
                if msg.content.contains(needle.as_str()) {
                    return response.clone();
                }
            }
        }
        self.default_response.clone()
    }
}

#[async_trait]
impl LlmDriver for InMemoryLlmDriver {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        model: &str,
        _options: &ChatOptions,
    ) -> Result<CompleteResponse> {
        let content = self.respond_to(messages);
        let completion_tokens = content.split_whitespace().count() as u32;
        Ok(CompleteResponse {
            content,
            model: model.to_string(),
            prompt_tokens: messages.iter().map(|m| m.content.split_whitespace().count() as u32).sum(),
            completion_tokens,
        })
    }

    async fn chat_stream(
        &self,
        messages: &[ChatMessage],
        model: &str,
        _options: &ChatOptions,
    ) -> Result<ChatStream> {
        let content = self.respond_to(messages);
        let words: Vec<String> = content.split_whitespace().map(str::to_string).collect();
        let completion_tokens = words.len() as u32;
        let model = model.to_string();

        let (tx, rx) = tokio::sync::oneshot::channel();
        let mut tx = Some(tx);
        let tokens: ChatTokenStream = Box::pin(stream::iter(words.into_iter().map(Ok)).chain(
            stream::once(async move {
                if let Some(tx) = tx.take() {
                    let _ = tx.send(StreamMetadata { model, prompt_tokens: 0, completion_tokens });
                }
                Ok(String::new())
            }),
        ));
        Ok(ChatStream { tokens, metadata: rx })
    }

    async fn health_check(&self) -> HealthStatus {
        HealthStatus::ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatRole;

    #[tokio::test]
    async fn scripted_response_matches_on_substring() {
        let driver = InMemoryLlmDriver::new("fallback")
            .with_scripted_response("vacation policy", "You get 30 days.");
        let messages = vec![ChatMessage::new(ChatRole::User, "what is the vacation policy?")];
        let response = driver.chat(&messages, "test-model", &ChatOptions::default()).await.unwrap();
        assert_eq!(response.content, "You get 30 days.");
    }

    #[tokio::test]
    async fn unscripted_query_falls_back_to_default() {
        let driver = InMemoryLlmDriver::new("fallback");
        let messages = vec![ChatMessage::new(ChatRole::User, "anything else")];
        let response = driver.chat(&messages, "test-model", &ChatOptions::default()).await.unwrap();
        assert_eq!(response.content, "fallback");
    }
}
