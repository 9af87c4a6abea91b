//! ABOUTME: Trace/span lifecycle and background persistence (§4.8)
//! ABOUTME: sampled-out traces become no-ops; persistence never blocks the request path

use crate::hashing::hash_user_id;
use crate::sampling::should_sample;
use chrono::Utc;
use parking_lot::Mutex;
use ragcore_adapters::relational_store::RelationalStore;
use ragcore_config::TraceConfig;
use ragcore_core::{QueryAnalysis, RetrievalStrategy, Span, SpanId, SpanName, Trace};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;

/// How many recently-closed traces the in-process aggregator keeps around
/// for the real-time ("last 5 min" / "last 1 h") rollups. Older traces are
/// still durable in the relational store; they just drop out of this ring.
const RECENT_CAPACITY: usize = 10_000;

/// An open trace, or `None` if this request was sampled out. Every method
/// is a no-op on the sampled-out path so callers never need to branch on
/// whether tracing is active.
pub struct TraceHandle {
    trace: Option<Trace>,
}

impl TraceHandle {
    fn noop() -> Self {
        Self { trace: None }
    }

    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.trace.is_none()
    }

    #[must_use]
    pub fn id(&self) -> Option<ragcore_core::TraceId> {
        self.trace.as_ref().map(|t| t.id)
    }

    /// Opens a new span and returns its id, or `None` if this handle is a
    /// no-op. Callers are expected to pair this with `end_span_ok` or
    /// `end_span_error`; any span left running is force-closed as an error
    /// by `Trace::close` at `finish_trace` time.
    pub fn start_span(&mut self, name: SpanName, parent: Option<SpanId>) -> Option<SpanId> {
        let trace = self.trace.as_mut()?;
        let span = Span::start(name, parent);
        let id = span.id;
        trace.spans.push(span);
        Some(id)
    }

    pub fn end_span_ok(&mut self, span_id: SpanId) {
        if let Some(span) = self.span_mut(span_id) {
            span.end_ok();
        }
    }

    pub fn end_span_error(&mut self, span_id: SpanId, message: impl Into<String>) {
        if let Some(span) = self.span_mut(span_id) {
            span.end_error(message);
        }
    }

    pub fn set_span_metadata(&mut self, span_id: SpanId, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        if let Some(span) = self.span_mut(span_id) {
            span.set_metadata(key, value);
        }
    }

    fn span_mut(&mut self, span_id: SpanId) -> Option<&mut Span> {
        self.trace.as_mut()?.spans.iter_mut().find(|s| s.id == span_id)
    }

    /// Folds in a span a collaborator already ran to completion elsewhere
    /// (e.g. C4's own per-step spans, handed back via `RetrieveResponse`)
    /// rather than one opened through this handle. No-op on a noop handle.
    pub fn record_span(&mut self, span: Span) {
        if let Some(trace) = self.trace.as_mut() {
            trace.spans.push(span);
        }
    }

    /// Records the query-analysis outcome once it's known, so the trace
    /// carries `query_type`/`strategy` for later aggregation.
    pub fn record_analysis(&mut self, analysis: &QueryAnalysis) {
        if let Some(trace) = self.trace.as_mut() {
            trace.query_type = Some(analysis.query_type);
            trace.strategy = Some(analysis.strategy);
        }
    }

    pub fn set_strategy(&mut self, strategy: RetrievalStrategy) {
        if let Some(trace) = self.trace.as_mut() {
            trace.strategy = Some(strategy);
        }
    }

    pub fn record_counts(&mut self, chunks_retrieved: usize, chunks_used: usize, tokens_used: Option<u32>) {
        if let Some(trace) = self.trace.as_mut() {
            trace.chunks_retrieved = chunks_retrieved;
            trace.chunks_used = chunks_used;
            trace.tokens_used = tokens_used;
        }
    }
}

/// Owns sampling configuration, the recent-trace ring buffer used by
/// real-time aggregation, and (optionally) a background task that drains
/// finished traces into the relational store.
pub struct Tracer {
    config: TraceConfig,
    recent: Arc<Mutex<VecDeque<Trace>>>,
    persist_tx: Option<mpsc::UnboundedSender<Trace>>,
}

impl Tracer {
    /// Builds a tracer. When `config.persist` is set and a relational store
    /// is given, spawns a background task that drains finished traces into
    /// it; persistence failures are logged and swallowed, never propagated
    /// to the request path.
    #[must_use]
    pub fn new(config: TraceConfig, relational_store: Option<Arc<dyn RelationalStore>>) -> Self {
        let persist_tx = if config.persist {
            relational_store.map(|store| {
                let (tx, mut rx) = mpsc::unbounded_channel::<Trace>();
                tokio::spawn(async move {
                    while let Some(trace) = rx.recv().await {
                        let trace_id = trace.id;
                        if let Err(error) = store.persist_trace(trace).await {
                            tracing::error!(%trace_id, %error, "failed to persist trace");
                        }
                    }
                });
                tx
            })
        } else {
            None
        };

        Self { config, recent: Arc::new(Mutex::new(VecDeque::with_capacity(RECENT_CAPACITY))), persist_tx }
    }

    /// Starts a new trace for a request, or a no-op handle if sampled out
    /// or tracing is disabled. Per §4.8, a sampled-out trace returns no id
    /// and every subsequent call on the handle is inert.
    #[must_use]
    pub fn start_trace(&self, user_id: &str, session_id: impl Into<String>, query_length: usize) -> TraceHandle {
        if !self.config.enabled || !should_sample(self.config.sample_rate) {
            return TraceHandle::noop();
        }

        let trace = Trace {
            id: ragcore_core::TraceId::new(),
            timestamp: Utc::now(),
            user_id_hash: hash_user_id(user_id),
            session_id: session_id.into(),
            query_length,
            query_type: None,
            strategy: None,
            success: true,
            total_latency_ms: None,
            tokens_used: None,
            chunks_retrieved: 0,
            chunks_used: 0,
            spans: Vec::new(),
        };
        TraceHandle { trace: Some(trace) }
    }

    /// Closes a trace: force-closes any still-running span, stamps total
    /// latency, stores it in the recent ring for aggregation, and (if
    /// persistence is configured) hands it to the background writer.
    /// No-op when `handle` is a sampled-out handle.
    pub fn finish_trace(&self, mut handle: TraceHandle, success: bool) {
        let Some(mut trace) = handle.trace.take() else { return };
        trace.success = success;
        trace.close(Utc::now());

        {
            let mut recent = self.recent.lock();
            if recent.len() == RECENT_CAPACITY {
                recent.pop_front();
            }
            recent.push_back(trace.clone());
        }

        if let Some(tx) = &self.persist_tx {
            let _ = tx.send(trace);
        }
    }

    /// Snapshot of recently-closed traces, newest last, used by the
    /// aggregation queries.
    #[must_use]
    pub fn recent_traces(&self) -> Vec<Trace> {
        self.recent.lock().iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragcore_adapters::memory::InMemoryRelationalStore;

    fn always_on_config() -> TraceConfig {
        TraceConfig { enabled: true, sample_rate: 1.0, persist: false }
    }

    #[tokio::test]
    async fn disabled_tracing_produces_a_noop_handle() {
        let tracer = Tracer::new(TraceConfig { enabled: false, ..always_on_config() }, None);
        let handle = tracer.start_trace("alice", "sess-1", 10);
        assert!(handle.is_noop());
        assert!(handle.id().is_none());
    }

    #[tokio::test]
    async fn zero_sample_rate_produces_a_noop_handle() {
        let tracer = Tracer::new(TraceConfig { sample_rate: 0.0, ..always_on_config() }, None);
        let handle = tracer.start_trace("alice", "sess-1", 10);
        assert!(handle.is_noop());
    }

    #[tokio::test]
    async fn noop_handle_span_operations_are_inert() {
        let tracer = Tracer::new(TraceConfig { enabled: false, ..always_on_config() }, None);
        let mut handle = tracer.start_trace("alice", "sess-1", 10);
        let span_id = handle.start_span(SpanName::VectorSearch, None);
        assert!(span_id.is_none());
        handle.end_span_ok(SpanId::new());
    }

    #[tokio::test]
    async fn a_span_left_open_is_force_closed_as_error_on_finish() {
        let tracer = Tracer::new(always_on_config(), None);
        let mut handle = tracer.start_trace("alice", "sess-1", 10);
        let span_id = handle.start_span(SpanName::LlmGeneration, None).unwrap();
        let _ = span_id;
        tracer.finish_trace(handle, true);

        let recent = tracer.recent_traces();
        assert_eq!(recent.len(), 1);
        let span = &recent[0].spans[0];
        assert_eq!(span.status, ragcore_core::SpanStatus::Error);
        assert_eq!(span.error_message.as_deref(), Some("not properly closed"));
    }

    #[tokio::test]
    async fn properly_closed_spans_keep_their_own_status() {
        let tracer = Tracer::new(always_on_config(), None);
        let mut handle = tracer.start_trace("alice", "sess-1", 10);
        let span_id = handle.start_span(SpanName::EmbeddingGeneration, None).unwrap();
        handle.end_span_ok(span_id);
        tracer.finish_trace(handle, true);

        let recent = tracer.recent_traces();
        assert_eq!(recent[0].spans[0].status, ragcore_core::SpanStatus::Ok);
    }

    #[tokio::test]
    async fn recorded_spans_from_another_collaborator_are_folded_in() {
        let tracer = Tracer::new(always_on_config(), None);
        let mut handle = tracer.start_trace("alice", "sess-1", 10);
        let mut external = Span::start(SpanName::VectorSearch, None);
        external.end_ok();
        handle.record_span(external);
        tracer.finish_trace(handle, true);

        let recent = tracer.recent_traces();
        assert_eq!(recent[0].spans.len(), 1);
        assert_eq!(recent[0].spans[0].name, SpanName::VectorSearch);
    }

    #[tokio::test]
    async fn finished_traces_are_persisted_in_the_background() {
        let store = Arc::new(InMemoryRelationalStore::new());
        let tracer = Tracer::new(
            TraceConfig { persist: true, ..always_on_config() },
            Some(store.clone() as Arc<dyn RelationalStore>),
        );
        let handle = tracer.start_trace("alice", "sess-1", 5);
        let trace_id = handle.id().unwrap();
        tracer.finish_trace(handle, true);

        // Persistence happens on a background task; give it a moment to run.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(store.get_trace(trace_id).await.is_ok());
    }
}
