use crate::health::HealthStatus;
use crate::relational_store::RelationalStore;
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use ragcore_core::{
    Alert, AlertId, Document, DocumentId, Entity, EntityId, EvaluationRunId, GoldenQuery,
    GoldenQueryId, RagError, Result, Trace, TraceId, UserContext,
};

/// In-process relational store double: no real row-level security, just a
/// recorded "current user" the visibility filter is applied against.
#[derive(Default)]
pub struct InMemoryRelationalStore {
    documents: DashMap<DocumentId, Document>,
    golden_queries: DashMap<GoldenQueryId, GoldenQuery>,
    entities: DashMap<EntityId, Entity>,
    traces: DashMap<TraceId, Trace>,
    alerts: DashMap<AlertId, Alert>,
    evaluation_runs: DashMap<EvaluationRunId, serde_json::Value>,
    oauth_state: DashMap<String, String>,
    current_user: Mutex<Option<UserContext>>,
}

impl InMemoryRelationalStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Test/introspection helper: the user context set by the most recent
    /// `set_user_context` call, or `None` if cleared.
    #[must_use]
    pub fn current_user_context(&self) -> Option<UserContext> {
        self.current_user.lock().clone()
    }
}

#[async_trait]
impl RelationalStore for InMemoryRelationalStore {
    async fn set_user_context(&self, user: &UserContext) -> Result<()> {
        *self.current_user.lock() = Some(user.clone());
        Ok(())
    }

    async fn clear_user_context(&self) -> Result<()> {
        *self.current_user.lock() = None;
        Ok(())
    }

    async fn get_document(&self, id: DocumentId) -> Result<Document> {
        self.documents
            .get(&id)
            .map(|d| d.value().clone())
            .ok_or_else(|| RagError::NotFound { resource: format!("document {id}") })
    }

    async fn list_documents_for_user(&self, user: &UserContext) -> Result<Vec<Document>> {
        Ok(self
            .documents
            .iter()
            .filter(|d| d.value().visible_to(user))
            .map(|d| d.value().clone())
            .collect())
    }

    async fn upsert_document(&self, document: Document) -> Result<DocumentId> {
        let id = document.id;
        self.documents.insert(id, document);
        Ok(id)
    }

    async fn delete_document(&self, id: DocumentId) -> Result<()> {
        self.documents.remove(&id);
        Ok(())
    }

    async fn list_golden_queries(&self) -> Result<Vec<GoldenQuery>> {
        Ok(self.golden_queries.iter().map(|q| q.value().clone()).collect())
    }

    async fn get_golden_query(&self, id: GoldenQueryId) -> Result<GoldenQuery> {
        self.golden_queries
            .get(&id)
            .map(|q| q.value().clone())
            .ok_or_else(|| RagError::NotFound { resource: format!("golden query {id}") })
    }

    async fn upsert_golden_query(&self, query: GoldenQuery) -> Result<GoldenQueryId> {
        let id = query.id;
        self.golden_queries.insert(id, query);
        Ok(id)
    }

    async fn delete_golden_query(&self, id: GoldenQueryId) -> Result<()> {
        self.golden_queries.remove(&id);
        Ok(())
    }

    async fn upsert_entity_mirror(&self, entity: Entity) -> Result<()> {
        self.entities.insert(entity.id, entity);
        Ok(())
    }

    async fn persist_trace(&self, trace: Trace) -> Result<()> {
        self.traces.insert(trace.id, trace);
        Ok(())
    }

    async fn get_trace(&self, id: TraceId) -> Result<Trace> {
        self.traces
            .get(&id)
            .map(|t| t.value().clone())
            .ok_or_else(|| RagError::NotFound { resource: format!("trace {id}") })
    }

    async fn persist_alert(&self, alert: Alert) -> Result<()> {
        self.alerts.insert(alert.id, alert);
        Ok(())
    }

    async fn list_unacknowledged_alerts(&self) -> Result<Vec<Alert>> {
        Ok(self.alerts.iter().filter(|a| !a.value().acknowledged).map(|a| a.value().clone()).collect())
    }

    async fn acknowledge_alert(&self, id: AlertId) -> Result<()> {
        if let Some(mut alert) = self.alerts.get_mut(&id) {
            alert.acknowledged = true;
        }
        Ok(())
    }

    async fn upsert_evaluation_run(&self, id: EvaluationRunId, run: serde_json::Value) -> Result<()> {
        self.evaluation_runs.insert(id, run);
        Ok(())
    }

    async fn get_evaluation_run(&self, id: EvaluationRunId) -> Result<serde_json::Value> {
        self.evaluation_runs
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or_else(|| RagError::NotFound { resource: format!("evaluation run {id}") })
    }

    async fn list_evaluation_runs(&self) -> Result<Vec<serde_json::Value>> {
        Ok(self.evaluation_runs.iter().map(|r| r.value().clone()).collect())
    }

    async fn store_oauth_state(&self, state: &str, value: &str) -> Result<()> {
        self.oauth_state.insert(state.to_string(), value.to_string());
        Ok(())
    }

    async fn consume_oauth_state(&self, state: &str) -> Result<Option<String>> {
        Ok(self.oauth_state.remove(state).map(|(_, v)| v))
    }

    async fn health_check(&self) -> HealthStatus {
        HealthStatus::ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragcore_core::UserRole;

    #[tokio::test]
    async fn oauth_state_can_only_be_consumed_once() {
        let store = InMemoryRelationalStore::new();
        store.store_oauth_state("nonce-1", "redirect=/home").await.unwrap();
        assert_eq!(store.consume_oauth_state("nonce-1").await.unwrap(), Some("redirect=/home".to_string()));
        assert_eq!(store.consume_oauth_state("nonce-1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn list_documents_for_user_applies_visibility() {
        let store = InMemoryRelationalStore::new();
        let owner = UserContext::new("alice", UserRole::Employee, "eng");
        let other = UserContext::new("bob", UserRole::Employee, "sales");
        let doc = Document {
            id: DocumentId::new(),
            original_file_name: "f.pdf".into(),
            display_name: "F".into(),
            size_bytes: 1,
            page_count: 1,
            owner_id: "alice".into(),
            visibility: ragcore_core::Visibility::Private,
            department: None,
            uploaded_at: chrono::Utc::now(),
        };
        store.upsert_document(doc).await.unwrap();
        assert_eq!(store.list_documents_for_user(&owner).await.unwrap().len(), 1);
        assert_eq!(store.list_documents_for_user(&other).await.unwrap().len(), 0);
    }
}
