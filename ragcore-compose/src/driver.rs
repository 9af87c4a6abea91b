//! ABOUTME: Cancellable wrapper around the LLM driver adapter for batch and streaming generation

use futures::stream::{self, StreamExt};
use ragcore_adapters::llm::{ChatMessage, ChatOptions, ChatStream, ChatTokenStream, CompleteResponse, LlmDriver};
use ragcore_core::{RagError, RequestContext, Result};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

/// Runs one non-streaming chat completion, honoring cancellation: if the
/// request context is cancelled before the adapter call returns, the call's
/// result is discarded and `RagError::Cancelled` is returned instead.
pub async fn generate(
    llm: &Arc<dyn LlmDriver>,
    messages: &[ChatMessage],
    model: &str,
    options: &ChatOptions,
    ctx: &RequestContext,
) -> Result<CompleteResponse> {
    tokio::select! {
        biased;
        () = ctx.cancelled() => Err(RagError::Cancelled),
        result = llm.chat(messages, model, options) => result,
    }
}

/// Runs a streaming chat completion. The returned token stream stops as soon
/// as the request context is cancelled, even mid-stream; dropping it cancels
/// the upstream call per the adapter contract.
pub async fn generate_stream(
    llm: &Arc<dyn LlmDriver>,
    messages: &[ChatMessage],
    model: &str,
    options: &ChatOptions,
    ctx: &RequestContext,
) -> Result<ChatStream> {
    let chat_stream = tokio::select! {
        biased;
        () = ctx.cancelled() => return Err(RagError::Cancelled),
        result = llm.chat_stream(messages, model, options) => result?,
    };

    let cancellation = ctx.child_token();
    let tokens: ChatTokenStream = Box::pin(cancellable(chat_stream.tokens, cancellation));

    Ok(ChatStream { tokens, metadata: chat_stream.metadata })
}

/// Wraps a token stream so it stops yielding as soon as `cancellation` fires,
/// even if the inner stream still has tokens buffered.
fn cancellable(mut tokens: ChatTokenStream, cancellation: CancellationToken) -> ChatTokenStream {
    Box::pin(async_stream::stream! {
        loop {
            tokio::select! {
                biased;
                () = cancellation.cancelled() => break,
                next = tokens.next() => {
                    match next {
                        Some(item) => yield item,
                        None => break,
                    }
                }
            }
        }
    })
}

/// Drains a token stream into a single string, used by the non-streaming
/// guardrails path (§4.7) when the caller requested streaming but output
/// guardrails must see the full answer first.
pub async fn collect_stream(tokens: ChatTokenStream) -> Result<String> {
    let chunks: Vec<Result<String>> = tokens.collect().await;
    let mut answer = String::new();
    for chunk in chunks {
        answer.push_str(&chunk?);
    }
    Ok(answer)
}

/// Builds a oneshot pair for tests and adapters that need to hand back
/// `StreamMetadata` alongside a manually constructed token stream.
#[must_use]
pub fn metadata_channel<T>() -> (oneshot::Sender<T>, oneshot::Receiver<T>) {
    oneshot::channel()
}

/// Convenience constructor for an already-known token sequence, used by
/// in-memory test doubles that don't need true async generation.
#[must_use]
pub fn stream_from_tokens(tokens: Vec<String>) -> ChatTokenStream {
    Box::pin(stream::iter(tokens.into_iter().map(Ok)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragcore_adapters::memory::InMemoryLlmDriver;
    use ragcore_core::{UserContext, UserRole};

    fn ctx() -> RequestContext {
        RequestContext::new(UserContext::new("u1", UserRole::Employee, "eng"), "sess-1")
    }

    #[tokio::test]
    async fn generate_returns_cancelled_when_context_already_cancelled() {
        let llm: Arc<dyn LlmDriver> = Arc::new(InMemoryLlmDriver::new("hello"));
        let ctx = ctx();
        ctx.cancel();
        let result = generate(&llm, &[], "test-model", &ChatOptions::default(), &ctx).await;
        assert!(matches!(result, Err(RagError::Cancelled)));
    }

    #[tokio::test]
    async fn generate_succeeds_when_not_cancelled() {
        let llm: Arc<dyn LlmDriver> = Arc::new(InMemoryLlmDriver::new("hello"));
        let ctx = ctx();
        let result = generate(&llm, &[], "test-model", &ChatOptions::default(), &ctx).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn collect_stream_joins_all_tokens() {
        let tokens = stream_from_tokens(vec!["hel".to_string(), "lo".to_string()]);
        let answer = collect_stream(tokens).await.unwrap();
        assert_eq!(answer, "hello");
    }
}
