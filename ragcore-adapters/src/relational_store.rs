//! ABOUTME: Relational store trait: documents, golden dataset, entity mirror, traces, alerts, OAuth state
//! ABOUTME: Evaluation-run rows are persisted as opaque JSON so this crate has no dependency on ragcore-eval

use crate::health::HealthStatus;
use async_trait::async_trait;
use ragcore_core::{
    Alert, Document, DocumentId, Entity, GoldenQuery, GoldenQueryId, Result, Trace, TraceId,
    UserContext,
};

#[async_trait]
pub trait RelationalStore: Send + Sync {
    /// Sets the session-scoped row-level-security context. Must be called
    /// before every retrieval so server-side policies enforce document
    /// visibility; implementations typically map this to a `SET LOCAL`.
    async fn set_user_context(&self, user: &UserContext) -> Result<()>;

    async fn clear_user_context(&self) -> Result<()>;

    async fn get_document(&self, id: DocumentId) -> Result<Document>;

    async fn list_documents_for_user(&self, user: &UserContext) -> Result<Vec<Document>>;

    async fn upsert_document(&self, document: Document) -> Result<DocumentId>;

    async fn delete_document(&self, id: DocumentId) -> Result<()>;

    async fn list_golden_queries(&self) -> Result<Vec<GoldenQuery>>;

    async fn get_golden_query(&self, id: GoldenQueryId) -> Result<GoldenQuery>;

    async fn upsert_golden_query(&self, query: GoldenQuery) -> Result<GoldenQueryId>;

    async fn delete_golden_query(&self, id: GoldenQueryId) -> Result<()>;

    /// Mirrors a resolved entity (with its occurrences) for relational querying.
    async fn upsert_entity_mirror(&self, entity: Entity) -> Result<()>;

    async fn persist_trace(&self, trace: Trace) -> Result<()>;

    async fn get_trace(&self, id: TraceId) -> Result<Trace>;

    async fn persist_alert(&self, alert: Alert) -> Result<()>;

    async fn list_unacknowledged_alerts(&self) -> Result<Vec<Alert>>;

    async fn acknowledge_alert(&self, id: ragcore_core::AlertId) -> Result<()>;

    /// Opaque JSON persistence for evaluation-run rows, owned by `ragcore-eval`.
    async fn upsert_evaluation_run(
        &self,
        id: ragcore_core::EvaluationRunId,
        run: serde_json::Value,
    ) -> Result<()>;

    async fn get_evaluation_run(
        &self,
        id: ragcore_core::EvaluationRunId,
    ) -> Result<serde_json::Value>;

    async fn list_evaluation_runs(&self) -> Result<Vec<serde_json::Value>>;

    /// Stores a short-lived OAuth CSRF nonce; `consume_oauth_state` removes
    /// and returns it, so it can only be redeemed once.
    async fn store_oauth_state(&self, state: &str, value: &str) -> Result<()>;

    async fn consume_oauth_state(&self, state: &str) -> Result<Option<String>>;

    async fn health_check(&self) -> HealthStatus;
}
