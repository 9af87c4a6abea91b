//! ABOUTME: `POST /chat` (§6): non-streaming JSON and SSE streaming answer delivery

use crate::error::ApiError;
use crate::state::AppState;
use crate::user::AuthenticatedUser;
use axum::extract::State;
use axum::http::Method;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use futures::StreamExt;
use ragcore_adapters::llm::{ChatMessage as AdapterMessage, ChatOptions, ChatRole};
use ragcore_core::{RagError, RequestContext};
use ragcore_pipeline::PipelineRequest;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageBody {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequestOptions {
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    pub num_predict: Option<u32>,
    #[serde(default)]
    pub stop: Vec<String>,
}

/// Retrieval knobs accompanying one chat turn. Only `query` (overriding the
/// query text used for retrieval, defaulting to the last user message) and
/// `enabled` are honored by this transport; the rest of the knobs are
/// accepted for forward compatibility but only take effect through the
/// server-side `rag.*` config, not per request (see DESIGN.md).
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RagOptions {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub query: Option<String>,
    pub search_limit: Option<usize>,
    pub search_threshold: Option<f32>,
    pub hybrid_alpha: Option<f32>,
    pub rerank: Option<bool>,
    pub use_graph: Option<bool>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequestBody {
    pub model: Option<String>,
    pub messages: Vec<ChatMessageBody>,
    #[serde(default = "default_true")]
    pub stream: bool,
    #[serde(default)]
    pub options: ChatRequestOptions,
    pub rag: Option<RagOptions>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponseMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponseMetadata {
    pub warnings: Vec<String>,
    pub groundedness: f32,
    pub has_citations: bool,
    pub trace_id: Option<String>,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

#[derive(Debug, Serialize)]
pub struct ChatResponseBody {
    pub message: ChatResponseMessage,
    pub done: bool,
    pub metadata: ChatResponseMetadata,
}

fn to_adapter_role(role: &str) -> ChatRole {
    match role {
        "system" => ChatRole::System,
        "assistant" => ChatRole::Assistant,
        _ => ChatRole::User,
    }
}

fn build_request(state: &AppState, user: ragcore_core::UserContext, body: &ChatRequestBody) -> Result<(PipelineRequest, String), RagError> {
    if body.messages.is_empty() {
        return Err(RagError::validation("messages must not be empty"));
    }

    let query = body
        .rag
        .as_ref()
        .and_then(|rag| rag.query.clone())
        .or_else(|| body.messages.iter().rev().find(|m| m.role == "user").map(|m| m.content.clone()))
        .ok_or_else(|| RagError::validation("no user message to answer"))?;

    let history: Vec<AdapterMessage> = body.messages[..body.messages.len().saturating_sub(1)]
        .iter()
        .map(|m| AdapterMessage::new(to_adapter_role(&m.role), m.content.clone()))
        .collect();

    let options = ChatOptions {
        temperature: body.options.temperature.unwrap_or(0.3),
        max_tokens: body.options.num_predict,
    };

    let model = body.model.clone().unwrap_or_else(|| state.config.models.default_model.clone());
    let session_id = Uuid::new_v4().to_string();

    Ok((
        PipelineRequest { query, user, session_id: session_id.clone(), history, model, options },
        session_id,
    ))
}

async fn answer_blocking(
    State(state): State<AppState>,
    method: Method,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(body): Json<ChatRequestBody>,
) -> Result<Response, ApiError> {
    let (request, session_id) = build_request(&state, user.clone(), &body).map_err(|e| ApiError::new(e, "/chat", method.to_string()))?;
    let ctx = RequestContext::new(user, session_id);

    let response = state
        .pipeline
        .answer(request, &ctx)
        .await
        .map_err(|e| ApiError::new(e, "/chat", method.to_string()))?;

    Ok(Json(ChatResponseBody {
        message: ChatResponseMessage { role: "assistant", content: response.content },
        done: true,
        metadata: ChatResponseMetadata {
            warnings: response.warnings,
            groundedness: response.groundedness,
            has_citations: response.has_citations,
            trace_id: response.trace_id.map(|id| id.to_string()),
            prompt_tokens: response.prompt_tokens,
            completion_tokens: response.completion_tokens,
        },
    })
    .into_response())
}

#[derive(Debug, Serialize)]
struct StreamTokenChunk {
    message: StreamTokenMessage,
    done: bool,
}

#[derive(Debug, Serialize)]
struct StreamTokenMessage {
    content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StreamDoneChunk {
    done: bool,
    metadata: ChatResponseMetadata,
}

async fn answer_streaming(
    State(state): State<AppState>,
    method: Method,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(body): Json<ChatRequestBody>,
) -> Result<Response, ApiError> {
    let (request, session_id) = build_request(&state, user.clone(), &body).map_err(|e| ApiError::new(e, "/chat", method.to_string()))?;
    let ctx = RequestContext::new(user, session_id);

    let mut pipeline_stream = state
        .pipeline
        .answer_stream(request, &ctx)
        .await
        .map_err(|e| ApiError::new(e, "/chat", method.to_string()))?;

    let events = async_stream::stream! {
        loop {
            match pipeline_stream.tokens.next().await {
                Some(Ok(token)) => {
                    let chunk = StreamTokenChunk { message: StreamTokenMessage { content: token }, done: false };
                    yield Ok(Event::default().data(serde_json::to_string(&chunk).unwrap_or_default()));
                }
                Some(Err(error)) => {
                    let payload = serde_json::json!({ "error": error.to_string() });
                    yield Ok(Event::default().data(payload.to_string()));
                    return;
                }
                None => break,
            }
        }

        if let Ok(outcome) = pipeline_stream.outcome.await {
            let chunk = StreamDoneChunk {
                done: true,
                metadata: ChatResponseMetadata {
                    warnings: outcome.warnings,
                    groundedness: outcome.groundedness,
                    has_citations: outcome.has_citations,
                    trace_id: outcome.trace_id.map(|id| id.to_string()),
                    prompt_tokens: 0,
                    completion_tokens: 0,
                },
            };
            yield Ok(Event::default().data(serde_json::to_string(&chunk).unwrap_or_default()));
        }
        yield Ok::<_, std::convert::Infallible>(Event::default().data("[DONE]"));
    };

    Ok(Sse::new(events).keep_alive(KeepAlive::default()).into_response())
}

pub async fn chat_handler(
    state: State<AppState>,
    method: Method,
    user: AuthenticatedUser,
    Json(body): Json<ChatRequestBody>,
) -> Result<Response, ApiError> {
    if body.stream {
        answer_streaming(state, method, user, Json(body)).await
    } else {
        answer_blocking(state, method, user, Json(body)).await
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/chat", axum::routing::post(chat_handler))
}
