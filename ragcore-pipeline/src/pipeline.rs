//! ABOUTME: Per-request orchestrator (C10): wires C2-C8 in the order data flow
//! ABOUTME: dictates, under the scoped session-context guard and one trace

use crate::session_guard::SessionContextGuard;
use futures::StreamExt;
use ragcore_adapters::llm::{ChatMessage, ChatOptions, ChatTokenStream, LlmDriver};
use ragcore_adapters::{Cache, EmbeddingService, GraphStore, RelationalStore, RerankerService, VectorStore};
use ragcore_compose::{build_messages, generate, generate_stream, ContextSource};
use ragcore_config::RagConfig;
use ragcore_core::{ChunkId, DocumentId, RagError, RequestContext, Result, SearchHit, SpanName, TraceId, UserContext};
use ragcore_guardrails::{InputGuardrails, OutputGuardrails};
use ragcore_retrieval::{RetrievalEngine, RetrieveRequest};
use ragcore_router::QueryRouter;
use ragcore_trace::{TraceHandle, Tracer};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::oneshot;

/// One turn's worth of input to the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub query: String,
    pub user: UserContext,
    pub session_id: String,
    pub history: Vec<ChatMessage>,
    pub model: String,
    pub options: ChatOptions,
}

/// Result of a non-streaming `Pipeline::answer` call.
#[derive(Debug, Clone)]
pub struct PipelineResponse {
    pub content: String,
    pub warnings: Vec<String>,
    pub groundedness: f32,
    pub has_citations: bool,
    pub trace_id: Option<TraceId>,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    /// Set when the answer is the fixed no-accessible-documents message
    /// rather than a generated one (§4.3/E2E-1); the trace for such a
    /// request is persisted with `success=false`.
    pub denied: bool,
}

/// Delivered on `PipelineStream::outcome` once the token stream is fully
/// drained. Per §4.7, output guardrails run after the terminal token; tokens
/// already handed to the caller are not retroactively redacted, so this is
/// observational (warnings, groundedness, the trace id) rather than a second
/// chance to withhold content already streamed out.
#[derive(Debug, Clone)]
pub struct StreamOutcome {
    pub warnings: Vec<String>,
    pub groundedness: f32,
    pub has_citations: bool,
    pub trace_id: Option<TraceId>,
    /// See [`PipelineResponse::denied`].
    pub denied: bool,
}

/// A streaming answer: tokens in model order, plus the post-stream outcome.
pub struct PipelineStream {
    pub tokens: ChatTokenStream,
    pub outcome: oneshot::Receiver<StreamOutcome>,
}

struct Prepared {
    context: Vec<ContextSource>,
    messages: Vec<ChatMessage>,
    warnings: Vec<String>,
    /// Set when permission resolution found no documents accessible to the
    /// requesting user (§4.3/E2E-1). Callers must short-circuit on this
    /// rather than generate over an empty context.
    no_accessible_documents: bool,
}

/// Wires C2 (router) -> C3 (input guardrails) is reversed per §2's data-flow
/// line (`Transport -> C3 -> C2 -> C4 -> C6 -> C7`): guardrails run on the
/// raw query first, then the router classifies the sanitized query, then
/// retrieval, generation, and output guardrails follow in that order. C8
/// (tracing) wraps every stage via one `TraceHandle` per request; C10 itself
/// owns the scoped relational-session-context acquisition (`SessionContextGuard`).
pub struct Pipeline {
    router: QueryRouter,
    input_guardrails: InputGuardrails,
    retrieval: RetrievalEngine,
    vector_store: Arc<dyn VectorStore>,
    relational_store: Arc<dyn RelationalStore>,
    llm: Arc<dyn LlmDriver>,
    tracer: Arc<Tracer>,
    config: RagConfig,
}

impl Pipeline {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        embedding: Arc<dyn EmbeddingService>,
        vector_store: Arc<dyn VectorStore>,
        reranker: Arc<dyn RerankerService>,
        graph_store: Arc<dyn GraphStore>,
        relational_store: Arc<dyn RelationalStore>,
        cache: Option<Arc<dyn Cache>>,
        llm: Arc<dyn LlmDriver>,
        config: RagConfig,
        tracer: Arc<Tracer>,
    ) -> Self {
        let retrieval = RetrievalEngine::new(
            embedding,
            vector_store.clone(),
            reranker,
            graph_store,
            relational_store.clone(),
            cache,
        );
        Self {
            router: QueryRouter::new(),
            input_guardrails: InputGuardrails::new(config.guardrails.clone()),
            retrieval,
            vector_store,
            relational_store,
            llm,
            tracer,
            config,
        }
    }

    /// Runs one request end to end and returns the final answer. Always
    /// clears the session-context guard and closes the trace before
    /// returning, on every path including validation failure and cancellation.
    pub async fn answer(&self, request: PipelineRequest, ctx: &RequestContext) -> Result<PipelineResponse> {
        let mut handle = self.start_trace(&request);
        let guard = match SessionContextGuard::acquire(self.relational_store.clone(), &request.user).await {
            Ok(guard) => guard,
            Err(err) => {
                self.tracer.finish_trace(handle, false);
                return Err(err);
            }
        };

        let result = self.answer_inner(&request, ctx, &mut handle).await;
        let success = matches!(&result, Ok(response) if !response.denied);
        guard.release().await;
        self.tracer.finish_trace(handle, success);
        result
    }

    async fn answer_inner(
        &self,
        request: &PipelineRequest,
        ctx: &RequestContext,
        handle: &mut TraceHandle,
    ) -> Result<PipelineResponse> {
        let prepared = self.prepare(request, ctx, handle).await?;

        if prepared.no_accessible_documents {
            handle.record_counts(0, 0, None);
            return Ok(PipelineResponse {
                content: ragcore_compose::NO_ACCESSIBLE_DOCUMENTS_MESSAGE.to_string(),
                warnings: prepared.warnings,
                groundedness: 0.0,
                has_citations: false,
                trace_id: handle.id(),
                prompt_tokens: 0,
                completion_tokens: 0,
                denied: true,
            });
        }

        let llm_span = handle.start_span(SpanName::LlmGeneration, None);
        let completion = generate(&self.llm, &prepared.messages, &request.model, &request.options, ctx).await;
        let completion = match completion {
            Ok(completion) => {
                if let Some(span_id) = llm_span {
                    handle.end_span_ok(span_id);
                }
                completion
            }
            Err(err) => {
                if let Some(span_id) = llm_span {
                    handle.end_span_error(span_id, err.to_string());
                }
                return Err(err);
            }
        };

        let context_texts: Vec<&str> = prepared.context.iter().map(|c| c.chunk_text.as_str()).collect();
        let output_guardrails = OutputGuardrails::new(self.config.guardrails.clone());
        let output_span = handle.start_span(SpanName::GuardrailsOutput, None);
        let validation = output_guardrails.validate(&completion.content, &context_texts);
        if let Some(span_id) = output_span {
            if validation.valid {
                handle.end_span_ok(span_id);
            } else {
                handle.end_span_error(span_id, validation.warnings.join("; "));
            }
        }

        let mut warnings = prepared.warnings;
        warnings.extend(validation.warnings);
        handle.record_counts(
            prepared.context.len(),
            prepared.context.len(),
            Some(completion.prompt_tokens + completion.completion_tokens),
        );

        Ok(PipelineResponse {
            content: validation.final_response,
            warnings,
            groundedness: validation.groundedness,
            has_citations: validation.has_citations,
            trace_id: handle.id(),
            prompt_tokens: completion.prompt_tokens,
            completion_tokens: completion.completion_tokens,
            denied: false,
        })
    }

    /// Streaming counterpart of [`Self::answer`]. The session guard and
    /// trace are moved into the returned stream's tail and finalized once
    /// the last token (or an error) is drained, so a caller that drops the
    /// stream mid-read (client disconnect) still releases both via
    /// `SessionContextGuard`'s `Drop` fallback and `Trace::close`'s
    /// force-close-open-spans behavior.
    pub async fn answer_stream(&self, request: PipelineRequest, ctx: &RequestContext) -> Result<PipelineStream> {
        let mut handle = self.start_trace(&request);
        let guard = match SessionContextGuard::acquire(self.relational_store.clone(), &request.user).await {
            Ok(guard) => guard,
            Err(err) => {
                self.tracer.finish_trace(handle, false);
                return Err(err);
            }
        };

        let prepared = match self.prepare(&request, ctx, &mut handle).await {
            Ok(prepared) => prepared,
            Err(err) => {
                guard.release().await;
                self.tracer.finish_trace(handle, false);
                return Err(err);
            }
        };

        if prepared.no_accessible_documents {
            let (outcome_tx, outcome_rx) = oneshot::channel();
            let tracer = self.tracer.clone();
            let warnings = prepared.warnings;
            let tokens: ChatTokenStream = Box::pin(async_stream::stream! {
                yield Ok(ragcore_compose::NO_ACCESSIBLE_DOCUMENTS_MESSAGE.to_string());
                let mut handle = handle;
                handle.record_counts(0, 0, None);
                let trace_id = handle.id();
                guard.release().await;
                tracer.finish_trace(handle, false);
                let _ = outcome_tx.send(StreamOutcome {
                    warnings,
                    groundedness: 0.0,
                    has_citations: false,
                    trace_id,
                    denied: true,
                });
            });
            return Ok(PipelineStream { tokens, outcome: outcome_rx });
        }

        let llm_span = handle.start_span(SpanName::LlmGeneration, None);
        let chat_stream = match generate_stream(&self.llm, &prepared.messages, &request.model, &request.options, ctx).await {
            Ok(stream) => stream,
            Err(err) => {
                if let Some(span_id) = llm_span {
                    handle.end_span_error(span_id, err.to_string());
                }
                guard.release().await;
                self.tracer.finish_trace(handle, false);
                return Err(err);
            }
        };

        let (outcome_tx, outcome_rx) = oneshot::channel();
        let guardrails_config = self.config.guardrails.clone();
        let tracer = self.tracer.clone();
        let chunk_count = prepared.context.len();
        let context = prepared.context;
        let mut retrieval_warnings = prepared.warnings;

        let tokens: ChatTokenStream = Box::pin(async_stream::stream! {
            let mut answer = String::new();
            let mut upstream = chat_stream.tokens;
            let mut error_message = None;

            while let Some(item) = upstream.next().await {
                match item {
                    Ok(token) => {
                        answer.push_str(&token);
                        yield Ok(token);
                    }
                    Err(err) => {
                        error_message = Some(err.to_string());
                        yield Err(err);
                        break;
                    }
                }
            }

            let mut handle = handle;
            if let Some(span_id) = llm_span {
                match &error_message {
                    Some(message) => handle.end_span_error(span_id, message.clone()),
                    None => handle.end_span_ok(span_id),
                }
            }

            let output_guardrails = OutputGuardrails::new(guardrails_config);
            let context_texts: Vec<&str> = context.iter().map(|c| c.chunk_text.as_str()).collect();
            let output_span = handle.start_span(SpanName::GuardrailsOutput, None);
            let validation = output_guardrails.validate(&answer, &context_texts);
            if let Some(span_id) = output_span {
                if validation.valid {
                    handle.end_span_ok(span_id);
                } else {
                    handle.end_span_error(span_id, validation.warnings.join("; "));
                }
            }

            handle.record_counts(chunk_count, chunk_count, None);
            let trace_id = handle.id();
            guard.release().await;
            tracer.finish_trace(handle, error_message.is_none());

            retrieval_warnings.extend(validation.warnings);
            let _ = outcome_tx.send(StreamOutcome {
                warnings: retrieval_warnings,
                groundedness: validation.groundedness,
                has_citations: validation.has_citations,
                trace_id,
                denied: false,
            });
        });

        Ok(PipelineStream { tokens, outcome: outcome_rx })
    }

    fn start_trace(&self, request: &PipelineRequest) -> TraceHandle {
        self.tracer.start_trace(&request.user.user_id, request.session_id.clone(), request.query.chars().count())
    }

    /// C3 (input guardrails on the raw query) -> C2 (router, on the
    /// sanitized query) -> C4 (retrieval) -> grounded-prompt assembly.
    async fn prepare(&self, request: &PipelineRequest, ctx: &RequestContext, handle: &mut TraceHandle) -> Result<Prepared> {
        let input_span = handle.start_span(SpanName::GuardrailsInput, None);
        let validation = self.input_guardrails.validate(&request.query, &request.user.user_id);
        if let Some(span_id) = input_span {
            if validation.valid {
                handle.end_span_ok(span_id);
            } else {
                handle.end_span_error(span_id, validation.errors.join("; "));
            }
        }
        if !validation.valid {
            return Err(RagError::validation(validation.errors.join("; ")));
        }
        if ctx.is_cancelled() {
            return Err(RagError::Cancelled);
        }

        let analysis_span = handle.start_span(SpanName::QueryAnalysis, None);
        let analysis = self.router.analyze(&validation.sanitized_query, self.config.pipeline.graph.enabled);
        if let Some(span_id) = analysis_span {
            handle.end_span_ok(span_id);
        }
        handle.record_analysis(&analysis);
        if ctx.is_cancelled() {
            return Err(RagError::Cancelled);
        }

        let retrieve_request = RetrieveRequest::from_pipeline_config(
            validation.sanitized_query.clone(),
            analysis,
            request.user.clone(),
            request.model.clone(),
            &self.config.pipeline,
        );
        let response = self.retrieval.retrieve(&retrieve_request, ctx).await?;
        for span in response.spans {
            handle.record_span(span);
        }

        let mut warnings = response.flags.warnings;
        let no_accessible_documents = response.flags.no_accessible_documents;
        if no_accessible_documents {
            warnings.push("no accessible documents for this user".to_string());
            return Ok(Prepared { context: Vec::new(), messages: Vec::new(), warnings, no_accessible_documents });
        }
        if ctx.is_cancelled() {
            return Err(RagError::Cancelled);
        }

        let context = self.build_context_sources(&response.hits).await?;
        let graph_summary = response.graph_context.as_ref().map(|g| g.summary.as_str());
        let messages = build_messages(&context, graph_summary, &request.history, &validation.sanitized_query);

        Ok(Prepared { context, messages, warnings, no_accessible_documents: false })
    }

    /// Resolves hits into `[Source i: <display name>] <text>` material,
    /// mirroring the evaluation harness's own chunk-fetch step.
    async fn build_context_sources(&self, hits: &[SearchHit]) -> Result<Vec<ContextSource>> {
        let chunk_ids: Vec<ChunkId> = hits.iter().map(|h| h.chunk_id).collect();
        let chunks = self.vector_store.chunks_by_ids(&chunk_ids).await?;
        let chunk_text: HashMap<ChunkId, String> = chunks.into_iter().map(|c| (c.id, c.text)).collect();

        let mut display_names: HashMap<DocumentId, String> = HashMap::new();
        let mut sources = Vec::with_capacity(hits.len());
        for hit in hits {
            let display_name = match display_names.get(&hit.document_id) {
                Some(name) => name.clone(),
                None => {
                    let name = self.relational_store.get_document(hit.document_id).await?.display_name;
                    display_names.insert(hit.document_id, name.clone());
                    name
                }
            };
            sources.push(ContextSource {
                document_display_name: display_name,
                chunk_text: chunk_text.get(&hit.chunk_id).cloned().unwrap_or_default(),
            });
        }
        Ok(sources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragcore_adapters::memory::{
        InMemoryCache, InMemoryEmbeddingService, InMemoryGraphStore, InMemoryLlmDriver, InMemoryRelationalStore,
        InMemoryRerankerService, InMemoryVectorStore,
    };
    use ragcore_core::{Chunk, ChunkId, Document, DocumentId, HierarchyLevel, UserRole, Visibility};
    use ragcore_trace::Tracer;

    fn user() -> UserContext {
        UserContext::new("alice", UserRole::Employee, "eng")
    }

    async fn pipeline_with_seeded_document() -> (Pipeline, DocumentId) {
        let vector_store = Arc::new(InMemoryVectorStore::new());
        let relational_store = Arc::new(InMemoryRelationalStore::new());

        let document_id = DocumentId::new();
        let document = Document {
            id: document_id,
            original_file_name: "handbook.pdf".to_string(),
            display_name: "Handbook".to_string(),
            size_bytes: 1024,
            page_count: 3,
            owner_id: "alice".to_string(),
            visibility: Visibility::Public,
            department: None,
            uploaded_at: chrono::Utc::now(),
        };
        relational_store.upsert_document(document).await.unwrap();

        let chunk = Chunk::new(ChunkId::new(), document_id, 0, HierarchyLevel::Paragraph, "Acme pays invoices net 30 days after receipt.");
        vector_store.upsert_chunks(vec![chunk]).await.unwrap();

        let tracer = Arc::new(Tracer::new(ragcore_config::TraceConfig::default(), None));
        let pipeline = Pipeline::new(
            Arc::new(InMemoryEmbeddingService::new(8)),
            vector_store,
            Arc::new(InMemoryRerankerService::new()),
            Arc::new(InMemoryGraphStore::new()),
            relational_store,
            Some(Arc::new(InMemoryCache::new())),
            Arc::new(InMemoryLlmDriver::new("Invoices are due net 30 days after receipt per the handbook.")),
            RagConfig::default(),
            tracer,
        );
        (pipeline, document_id)
    }

    /// A pipeline whose relational store has no documents at all, so any
    /// user's permission resolution comes back empty (§4.3/E2E-1). Returns
    /// the tracer too, so a test can inspect the closed trace afterward.
    fn pipeline_with_no_accessible_documents() -> (Pipeline, Arc<Tracer>) {
        let tracer = Arc::new(Tracer::new(ragcore_config::TraceConfig { enabled: true, sample_rate: 1.0, persist: false }, None));
        let pipeline = Pipeline::new(
            Arc::new(InMemoryEmbeddingService::new(8)),
            Arc::new(InMemoryVectorStore::new()),
            Arc::new(InMemoryRerankerService::new()),
            Arc::new(InMemoryGraphStore::new()),
            Arc::new(InMemoryRelationalStore::new()),
            Some(Arc::new(InMemoryCache::new())),
            Arc::new(InMemoryLlmDriver::new("should never be called")),
            RagConfig::default(),
            tracer.clone(),
        );
        (pipeline, tracer)
    }

    fn request(query: &str) -> PipelineRequest {
        PipelineRequest {
            query: query.to_string(),
            user: user(),
            session_id: "sess-1".to_string(),
            history: Vec::new(),
            model: "test-model".to_string(),
            options: ChatOptions::default(),
        }
    }

    #[tokio::test]
    async fn answers_a_valid_query_and_clears_session_context() {
        let (pipeline, _doc) = pipeline_with_seeded_document().await;
        let ctx = RequestContext::new(user(), "sess-1");
        let response = pipeline.answer(request("What is the invoice policy?"), &ctx).await.unwrap();
        assert!(response.content.contains("Invoices"));
        assert!(response.trace_id.is_some());
    }

    #[tokio::test]
    async fn empty_permission_denial_returns_fixed_message_without_calling_the_llm() {
        let (pipeline, tracer) = pipeline_with_no_accessible_documents();
        let ctx = RequestContext::new(user(), "sess-1");
        let response = pipeline.answer(request("Was sind unsere Urlaubsregeln?"), &ctx).await.unwrap();
        assert_eq!(response.content, ragcore_compose::NO_ACCESSIBLE_DOCUMENTS_MESSAGE);
        assert!(response.denied);

        let trace = tracer.recent_traces().pop().expect("trace should have been recorded");
        assert!(!trace.success);
    }

    #[tokio::test]
    async fn rejects_a_query_that_fails_input_guardrails() {
        let (pipeline, _doc) = pipeline_with_seeded_document().await;
        let ctx = RequestContext::new(user(), "sess-1");
        let result = pipeline.answer(request("hi"), &ctx).await;
        assert!(matches!(result, Err(RagError::Validation { .. })));
    }

    #[tokio::test]
    async fn cancelled_context_short_circuits_before_generation() {
        let (pipeline, _doc) = pipeline_with_seeded_document().await;
        let ctx = RequestContext::new(user(), "sess-1");
        ctx.cancel();
        let result = pipeline.answer(request("What is the invoice policy?"), &ctx).await;
        assert!(matches!(result, Err(RagError::Cancelled)));
    }

    #[tokio::test]
    async fn streaming_answer_yields_tokens_and_a_post_stream_outcome() {
        let (pipeline, _doc) = pipeline_with_seeded_document().await;
        let ctx = RequestContext::new(user(), "sess-1");
        let mut stream = pipeline.answer_stream(request("What is the invoice policy?"), &ctx).await.unwrap();

        let mut joined = String::new();
        while let Some(token) = stream.tokens.next().await {
            joined.push_str(&token.unwrap());
        }
        assert!(joined.contains("Invoices"));

        let outcome = stream.outcome.await.unwrap();
        assert!(outcome.trace_id.is_some());
    }
}
