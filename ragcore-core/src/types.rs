//! ABOUTME: Shared data model for documents, chunks, entities, queries, and traces
//! ABOUTME: Transient types (SearchHit, QueryAnalysis, Trace) and persistent ones (Document, Entity, ...)

use crate::ids::{ChunkId, DocumentId, EntityId, GoldenQueryId, RelationshipId, SpanId, TraceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Role attached to a caller's identity; `Admin` bypasses visibility checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UserRole {
    Employee,
    Manager,
    Admin,
}

/// Identity used to evaluate document visibility and to set relational-store
/// row-level-security session context (see [`crate::request_context::RequestContext`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: String,
    pub role: UserRole,
    pub department: String,
}

impl UserContext {
    #[must_use]
    pub fn new(user_id: impl Into<String>, role: UserRole, department: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), role, department: department.into() }
    }
}

/// Who may see a [`Document`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Visibility {
    Public,
    Department,
    SpecificUsers { user_ids: HashSet<String> },
    Private,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub original_file_name: String,
    pub display_name: String,
    pub size_bytes: u64,
    pub page_count: u32,
    pub owner_id: String,
    pub visibility: Visibility,
    pub department: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl Document {
    /// Implements the visibility invariant from the data model: a user sees a
    /// document iff they own it, it is public, it matches their department,
    /// they are named explicitly, or they are an admin.
    #[must_use]
    pub fn visible_to(&self, user: &UserContext) -> bool {
        if user.role == UserRole::Admin {
            return true;
        }
        if self.owner_id == user.user_id {
            return true;
        }
        match &self.visibility {
            Visibility::Public => true,
            Visibility::Department => {
                self.department.as_deref() == Some(user.department.as_str())
            }
            Visibility::SpecificUsers { user_ids } => user_ids.contains(&user.user_id),
            Visibility::Private => false,
        }
    }
}

/// Position of a chunk in a document's hierarchy: 0 = document summary,
/// 1 = section, 2 = paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum HierarchyLevel {
    DocumentSummary = 0,
    Section = 1,
    Paragraph = 2,
}

impl HierarchyLevel {
    #[must_use]
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub document_id: DocumentId,
    pub ordinal: u32,
    pub level: HierarchyLevel,
    pub parent_chunk_id: Option<ChunkId>,
    pub text: String,
    pub page_start: u32,
    pub page_end: u32,
    pub token_count: u32,
    pub embedding: Option<Vec<f32>>,
}

impl Chunk {
    #[must_use]
    pub fn new(
        id: ChunkId,
        document_id: DocumentId,
        ordinal: u32,
        level: HierarchyLevel,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id,
            document_id,
            ordinal,
            level,
            parent_chunk_id: None,
            text: text.into(),
            page_start: 0,
            page_end: 0,
            token_count: 0,
            embedding: None,
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent_chunk_id: ChunkId) -> Self {
        self.parent_chunk_id = Some(parent_chunk_id);
        self
    }

    #[must_use]
    pub fn with_pages(mut self, start: u32, end: u32) -> Self {
        self.page_start = start;
        self.page_end = end;
        self
    }

    #[must_use]
    pub fn with_token_count(mut self, token_count: u32) -> Self {
        self.token_count = token_count;
        self
    }

    #[must_use]
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

/// Tags a [`SearchHit`] as coming from the primary hybrid search or from
/// document-expansion (step 5 of the retrieval pipeline).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceTag {
    Primary,
    Expansion,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub chunk_id: ChunkId,
    pub document_id: DocumentId,
    pub score: f32,
    pub rerank_score: Option<f32>,
    pub source: SourceTag,
}

impl SearchHit {
    #[must_use]
    pub fn new(chunk_id: ChunkId, document_id: DocumentId, score: f32) -> Self {
        Self { chunk_id, document_id, score, rerank_score: None, source: SourceTag::Primary }
    }

    #[must_use]
    pub fn with_rerank_score(mut self, score: f32) -> Self {
        self.rerank_score = Some(score);
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: SourceTag) -> Self {
        self.source = source;
        self
    }

    /// The score used for ordering: the rerank score when present, else the fused score.
    #[must_use]
    pub fn effective_score(&self) -> f32 {
        self.rerank_score.unwrap_or(self.score)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Person,
    Organization,
    Project,
    Product,
    Document,
    Topic,
    Location,
    Date,
    Regulation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityOccurrence {
    pub document_id: DocumentId,
    pub chunk_id: ChunkId,
    pub position: u32,
    pub snippet: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub entity_type: EntityType,
    pub canonical_form: String,
    pub aliases: HashSet<String>,
    pub confidence: f32,
    pub occurrences: Vec<EntityOccurrence>,
    /// Ids of entities absorbed into this one during resolution (§4.5), as
    /// an audit trail distinct from `aliases` (alternate surface forms).
    #[serde(default)]
    pub merged_from: HashSet<EntityId>,
}

impl Entity {
    #[must_use]
    pub fn new(entity_type: EntityType, raw_text: &str, confidence: f32) -> Self {
        let canonical_form = normalize_canonical_form(raw_text);
        Self {
            id: EntityId::from_name(&format!("{entity_type:?}:{canonical_form}")),
            entity_type,
            canonical_form,
            aliases: HashSet::new(),
            confidence: confidence.clamp(0.0, 1.0),
            occurrences: Vec::new(),
            merged_from: HashSet::new(),
        }
    }

    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.insert(alias.into());
        self
    }

    #[must_use]
    pub fn with_occurrence(mut self, occurrence: EntityOccurrence) -> Self {
        self.occurrences.push(occurrence);
        self
    }
}

/// Normalizes raw extracted text into the stable canonical form required by
/// the data-model invariant: lowercase, trimmed, whitespace-collapsed, punctuation-stripped.
#[must_use]
pub fn normalize_canonical_form(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let stripped: String = lowered
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationType {
    WorksFor,
    Manages,
    Created,
    Mentions,
    References,
    About,
    PartOf,
    ReportsTo,
    CollaboratesWith,
    ApprovedBy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    Pattern,
    Llm,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub id: RelationshipId,
    pub source_entity_id: EntityId,
    pub target_entity_id: EntityId,
    pub relation_type: RelationType,
    pub confidence: f32,
    pub evidence: String,
    pub source_document_id: DocumentId,
    pub extraction_method: ExtractionMethod,
}

impl Relationship {
    #[must_use]
    pub fn new(
        source_entity_id: EntityId,
        target_entity_id: EntityId,
        relation_type: RelationType,
        source_document_id: DocumentId,
        extraction_method: ExtractionMethod,
    ) -> Self {
        Self {
            id: RelationshipId::new(),
            source_entity_id,
            target_entity_id,
            relation_type,
            confidence: 1.0,
            evidence: String::new(),
            source_document_id,
            extraction_method,
        }
    }

    #[must_use]
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = evidence.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryType {
    Factual,
    Comparative,
    Procedural,
    Relational,
    Aggregative,
    Temporal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalStrategy {
    VectorOnly,
    Hybrid,
    HybridWithGraph,
    TableFocused,
    MultiIndex,
}

/// Deterministic, I/O-free output of query analysis (see `ragcore-router`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryAnalysis {
    pub query_type: QueryType,
    pub entities: Vec<String>,
    pub is_multi_hop: bool,
    pub requires_graph: bool,
    pub requires_table: bool,
    pub strategy: RetrievalStrategy,
    pub recommended_level_filter: HashSet<u8>,
    pub confidence: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanStatus {
    Running,
    Ok,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanName {
    QueryAnalysis,
    EmbeddingGeneration,
    VectorSearch,
    GraphTraversal,
    Reranking,
    ContextCompression,
    LlmGeneration,
    GuardrailsInput,
    GuardrailsOutput,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Span {
    pub id: SpanId,
    pub parent_span_id: Option<SpanId>,
    pub name: SpanName,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub metadata: HashMap<String, serde_json::Value>,
    pub status: SpanStatus,
    pub error_message: Option<String>,
}

impl Span {
    #[must_use]
    pub fn start(name: SpanName, parent_span_id: Option<SpanId>) -> Self {
        Self {
            id: SpanId::new(),
            parent_span_id,
            name,
            started_at: Utc::now(),
            ended_at: None,
            metadata: HashMap::new(),
            status: SpanStatus::Running,
            error_message: None,
        }
    }

    pub fn end_ok(&mut self) {
        self.ended_at = Some(Utc::now());
        self.status = SpanStatus::Ok;
    }

    pub fn end_error(&mut self, message: impl Into<String>) {
        self.ended_at = Some(Utc::now());
        self.status = SpanStatus::Error;
        self.error_message = Some(message.into());
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Duration in milliseconds; `None` while the span is still running.
    #[must_use]
    pub fn duration_ms(&self) -> Option<i64> {
        self.ended_at.map(|end| (end - self.started_at).num_milliseconds())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trace {
    pub id: TraceId,
    pub timestamp: DateTime<Utc>,
    pub user_id_hash: String,
    pub session_id: String,
    pub query_length: usize,
    pub query_type: Option<QueryType>,
    pub strategy: Option<RetrievalStrategy>,
    pub success: bool,
    pub total_latency_ms: Option<i64>,
    pub tokens_used: Option<u32>,
    pub chunks_retrieved: usize,
    pub chunks_used: usize,
    pub spans: Vec<Span>,
}

impl Trace {
    /// Closes any span left `Running` with an error status, per the trace-closure invariant.
    pub fn close(&mut self, ended_at: DateTime<Utc>) {
        for span in &mut self.spans {
            if span.status == SpanStatus::Running {
                span.ended_at = Some(ended_at);
                span.status = SpanStatus::Error;
                span.error_message = Some("not properly closed".to_string());
            }
        }
        self.total_latency_ms = Some((ended_at - self.timestamp).num_milliseconds());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoldenQuery {
    pub id: GoldenQueryId,
    pub query_text: String,
    pub expected_answer: String,
    pub relevant_document_ids: HashSet<DocumentId>,
    pub relevant_chunk_ids: HashSet<ChunkId>,
    pub category: QueryType,
    pub difficulty: Difficulty,
    pub key_facts: Vec<String>,
    pub forbidden_content: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub alert_type: String,
    pub severity: AlertSeverity,
    pub message: String,
    pub metadata: HashMap<String, serde_json::Value>,
    pub acknowledged: bool,
    pub created_at: DateTime<Utc>,
}

use crate::ids::AlertId;

impl Alert {
    #[must_use]
    pub fn new(alert_type: impl Into<String>, severity: AlertSeverity, message: impl Into<String>) -> Self {
        Self {
            id: AlertId::new(),
            alert_type: alert_type.into(),
            severity,
            message: message.into(),
            metadata: HashMap::new(),
            acknowledged: false,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(owner: &str, visibility: Visibility, department: Option<&str>) -> Document {
        Document {
            id: DocumentId::new(),
            original_file_name: "handbook.pdf".to_string(),
            display_name: "Handbook".to_string(),
            size_bytes: 1024,
            page_count: 10,
            owner_id: owner.to_string(),
            visibility,
            department: department.map(str::to_string),
            uploaded_at: Utc::now(),
        }
    }

    #[test]
    fn owner_always_sees_their_document() {
        let d = doc("alice", Visibility::Private, None);
        let u = UserContext::new("alice", UserRole::Employee, "eng");
        assert!(d.visible_to(&u));
    }

    #[test]
    fn department_visibility_requires_matching_department() {
        let d = doc("alice", Visibility::Department, Some("hr"));
        let eng = UserContext::new("bob", UserRole::Employee, "eng");
        let hr = UserContext::new("carol", UserRole::Employee, "hr");
        assert!(!d.visible_to(&eng));
        assert!(d.visible_to(&hr));
    }

    #[test]
    fn admin_sees_everything() {
        let d = doc("alice", Visibility::Private, None);
        let admin = UserContext::new("root", UserRole::Admin, "it");
        assert!(d.visible_to(&admin));
    }

    #[test]
    fn specific_users_visibility_checks_membership() {
        let mut ids = HashSet::new();
        ids.insert("bob".to_string());
        let d = doc("alice", Visibility::SpecificUsers { user_ids: ids }, None);
        assert!(d.visible_to(&UserContext::new("bob", UserRole::Employee, "eng")));
        assert!(!d.visible_to(&UserContext::new("carol", UserRole::Employee, "eng")));
    }

    #[test]
    fn canonical_form_is_stable_under_normalization() {
        assert_eq!(normalize_canonical_form("  Acme-Corp,  Inc.  "), "acmecorp inc");
        assert_eq!(
            normalize_canonical_form("Acme Corp"),
            normalize_canonical_form("  acme   corp  ")
        );
    }

    #[test]
    fn trace_close_marks_running_spans_as_error() {
        let mut trace = Trace {
            id: TraceId::new(),
            timestamp: Utc::now(),
            user_id_hash: "deadbeefdeadbeef".to_string(),
            session_id: "sess-1".to_string(),
            query_length: 10,
            query_type: None,
            strategy: None,
            success: true,
            total_latency_ms: None,
            tokens_used: None,
            chunks_retrieved: 0,
            chunks_used: 0,
            spans: vec![Span::start(SpanName::VectorSearch, None)],
        };
        trace.close(Utc::now());
        assert_eq!(trace.spans[0].status, SpanStatus::Error);
        assert_eq!(trace.spans[0].error_message.as_deref(), Some("not properly closed"));
    }
}
