//! ABOUTME: `/evaluation/*` (§6): golden-dataset CRUD and the evaluation-run admin surface

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use ragcore_core::{Difficulty, EvaluationRunId, GoldenQuery, GoldenQueryId, QueryType, RagError};
use ragcore_eval::{compare_runs, EvaluationConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

fn bad_id(raw: &str, method: &Method, path: &str) -> ApiError {
    ApiError::new(RagError::validation(format!("invalid id: {raw}")), path, method.to_string())
}

#[derive(Debug, Deserialize)]
pub struct RunEvaluationBody {
    #[serde(default = "default_version_label")]
    pub version_label: String,
    pub config: Option<EvaluationConfig>,
}

fn default_version_label() -> String {
    "unlabeled".to_string()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunStartedBody {
    run_id: String,
    status: &'static str,
}

/// `POST /evaluation/run`: generates the run id up front, dispatches the
/// harness on a background task, and returns immediately per §6's 202
/// contract rather than blocking on a full dataset pass.
pub async fn run_evaluation(State(state): State<AppState>, Json(body): Json<RunEvaluationBody>) -> Response {
    let id = EvaluationRunId::new();
    let config = body.config.unwrap_or_else(|| EvaluationConfig {
        pipeline: state.config.pipeline.clone(),
        embedding_model: state.config.models.default_model.clone(),
        llm_model: state.config.models.default_model.clone(),
        evaluate_generation: true,
    });

    let harness = state.eval_harness.clone();
    let version_label = body.version_label;
    tokio::spawn(async move {
        if let Err(error) = harness.run(id, version_label, config).await {
            tracing::error!(%id, %error, "evaluation run failed");
        }
    });

    (StatusCode::ACCEPTED, Json(RunStartedBody { run_id: id.to_string(), status: "started" })).into_response()
}

#[derive(Debug, Deserialize)]
pub struct ListRunsQuery {
    pub limit: Option<usize>,
}

pub async fn list_runs(State(state): State<AppState>, Query(query): Query<ListRunsQuery>, method: Method) -> Result<Json<Vec<serde_json::Value>>, ApiError> {
    let mut runs = state
        .relational_store
        .list_evaluation_runs()
        .await
        .map_err(|e| ApiError::new(e, "/evaluation/runs", method.to_string()))?;
    runs.sort_by(|a, b| b["started_at"].as_str().cmp(&a["started_at"].as_str()));
    if let Some(limit) = query.limit {
        runs.truncate(limit);
    }
    Ok(Json(runs))
}

fn parse_run_id(raw: &str, method: &Method, path: &str) -> Result<EvaluationRunId, ApiError> {
    EvaluationRunId::from_str(raw).map_err(|_| bad_id(raw, method, path))
}

pub async fn get_run(State(state): State<AppState>, Path(id): Path<String>, method: Method) -> Result<Json<serde_json::Value>, ApiError> {
    let run_id = parse_run_id(&id, &method, "/evaluation/runs/:id")?;
    let run = state
        .relational_store
        .get_evaluation_run(run_id)
        .await
        .map_err(|e| ApiError::new(e, "/evaluation/runs/:id", method.to_string()))?;
    Ok(Json(run))
}

pub async fn get_run_results(State(state): State<AppState>, Path(id): Path<String>, method: Method) -> Result<Json<serde_json::Value>, ApiError> {
    let run_id = parse_run_id(&id, &method, "/evaluation/runs/:id/results")?;
    let run = state
        .relational_store
        .get_evaluation_run(run_id)
        .await
        .map_err(|e| ApiError::new(e, "/evaluation/runs/:id/results", method.to_string()))?;
    Ok(Json(run["results"].clone()))
}

#[derive(Debug, Deserialize)]
pub struct CompareQuery {
    pub run1: String,
    pub run2: String,
}

pub async fn compare(State(state): State<AppState>, Query(query): Query<CompareQuery>, method: Method) -> Result<Json<serde_json::Value>, ApiError> {
    let path = "/evaluation/compare";
    let baseline_id = parse_run_id(&query.run1, &method, path)?;
    let candidate_id = parse_run_id(&query.run2, &method, path)?;

    let baseline_value = state.relational_store.get_evaluation_run(baseline_id).await.map_err(|e| ApiError::new(e, path, method.to_string()))?;
    let candidate_value = state.relational_store.get_evaluation_run(candidate_id).await.map_err(|e| ApiError::new(e, path, method.to_string()))?;

    let baseline = serde_json::from_value(baseline_value).map_err(|e| ApiError::new(RagError::validation(e.to_string()), path, method.to_string()))?;
    let candidate = serde_json::from_value(candidate_value).map_err(|e| ApiError::new(RagError::validation(e.to_string()), path, method.to_string()))?;

    let comparison = compare_runs(&baseline, &candidate).map_err(|e| ApiError::new(e, path, method.to_string()))?;
    Ok(Json(serde_json::to_value(comparison).unwrap_or(serde_json::Value::Null)))
}

#[derive(Debug, Serialize)]
pub struct GoldenQueryBody {
    pub id: String,
    pub query_text: String,
    pub expected_answer: String,
    pub relevant_document_ids: Vec<String>,
    pub relevant_chunk_ids: Vec<String>,
    pub category: QueryType,
    pub difficulty: Difficulty,
    pub key_facts: Vec<String>,
    pub forbidden_content: Vec<String>,
}

impl From<&GoldenQuery> for GoldenQueryBody {
    fn from(q: &GoldenQuery) -> Self {
        Self {
            id: q.id.to_string(),
            query_text: q.query_text.clone(),
            expected_answer: q.expected_answer.clone(),
            relevant_document_ids: q.relevant_document_ids.iter().map(ToString::to_string).collect(),
            relevant_chunk_ids: q.relevant_chunk_ids.iter().map(ToString::to_string).collect(),
            category: q.category,
            difficulty: q.difficulty,
            key_facts: q.key_facts.clone(),
            forbidden_content: q.forbidden_content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpsertGoldenQueryBody {
    pub query_text: String,
    pub expected_answer: String,
    #[serde(default)]
    pub relevant_document_ids: Vec<String>,
    #[serde(default)]
    pub relevant_chunk_ids: Vec<String>,
    pub category: QueryType,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub key_facts: Vec<String>,
    #[serde(default)]
    pub forbidden_content: Vec<String>,
}

fn to_golden_query(id: GoldenQueryId, body: UpsertGoldenQueryBody) -> Result<GoldenQuery, RagError> {
    let relevant_document_ids: HashSet<_> = body
        .relevant_document_ids
        .iter()
        .map(|raw| raw.parse().map_err(|_| RagError::validation(format!("invalid document id: {raw}"))))
        .collect::<Result<_, _>>()?;
    let relevant_chunk_ids: HashSet<_> = body
        .relevant_chunk_ids
        .iter()
        .map(|raw| raw.parse().map_err(|_| RagError::validation(format!("invalid chunk id: {raw}"))))
        .collect::<Result<_, _>>()?;

    Ok(GoldenQuery {
        id,
        query_text: body.query_text,
        expected_answer: body.expected_answer,
        relevant_document_ids,
        relevant_chunk_ids,
        category: body.category,
        difficulty: body.difficulty,
        key_facts: body.key_facts,
        forbidden_content: body.forbidden_content,
    })
}

pub async fn list_golden_queries(State(state): State<AppState>, method: Method) -> Result<Json<Vec<GoldenQueryBody>>, ApiError> {
    let queries = state
        .relational_store
        .list_golden_queries()
        .await
        .map_err(|e| ApiError::new(e, "/evaluation/golden-dataset", method.to_string()))?;
    Ok(Json(queries.iter().map(GoldenQueryBody::from).collect()))
}

pub async fn get_golden_query(State(state): State<AppState>, Path(id): Path<String>, method: Method) -> Result<Json<GoldenQueryBody>, ApiError> {
    let path = "/evaluation/golden-dataset/:id";
    let query_id = GoldenQueryId::from_str(&id).map_err(|_| bad_id(&id, &method, path))?;
    let query = state.relational_store.get_golden_query(query_id).await.map_err(|e| ApiError::new(e, path, method.to_string()))?;
    Ok(Json(GoldenQueryBody::from(&query)))
}

pub async fn create_golden_query(
    State(state): State<AppState>,
    method: Method,
    Json(body): Json<UpsertGoldenQueryBody>,
) -> Result<Response, ApiError> {
    let path = "/evaluation/golden-dataset";
    let query = to_golden_query(GoldenQueryId::new(), body).map_err(|e| ApiError::new(e, path, method.to_string()))?;
    let id = state.relational_store.upsert_golden_query(query).await.map_err(|e| ApiError::new(e, path, method.to_string()))?;
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id.to_string() }))).into_response())
}

pub async fn update_golden_query(
    State(state): State<AppState>,
    Path(id): Path<String>,
    method: Method,
    Json(body): Json<UpsertGoldenQueryBody>,
) -> Result<Response, ApiError> {
    let path = "/evaluation/golden-dataset/:id";
    let query_id = GoldenQueryId::from_str(&id).map_err(|_| bad_id(&id, &method, path))?;
    let query = to_golden_query(query_id, body).map_err(|e| ApiError::new(e, path, method.to_string()))?;
    state.relational_store.upsert_golden_query(query).await.map_err(|e| ApiError::new(e, path, method.to_string()))?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn delete_golden_query(State(state): State<AppState>, Path(id): Path<String>, method: Method) -> Result<StatusCode, ApiError> {
    let path = "/evaluation/golden-dataset/:id";
    let query_id = GoldenQueryId::from_str(&id).map_err(|_| bad_id(&id, &method, path))?;
    state.relational_store.delete_golden_query(query_id).await.map_err(|e| ApiError::new(e, path, method.to_string()))?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn bulk_create_golden_queries(
    State(state): State<AppState>,
    method: Method,
    Json(bodies): Json<Vec<UpsertGoldenQueryBody>>,
) -> Result<Response, ApiError> {
    let path = "/evaluation/golden-dataset/bulk";
    let mut ids = Vec::with_capacity(bodies.len());
    for body in bodies {
        let query = to_golden_query(GoldenQueryId::new(), body).map_err(|e| ApiError::new(e, path, method.to_string()))?;
        let id = state.relational_store.upsert_golden_query(query).await.map_err(|e| ApiError::new(e, path, method.to_string()))?;
        ids.push(id.to_string());
    }
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "ids": ids }))).into_response())
}

pub fn router() -> Router<AppState> {
    use axum::routing::{get, post};
    Router::new()
        .route("/evaluation/run", post(run_evaluation))
        .route("/evaluation/runs", get(list_runs))
        .route("/evaluation/runs/:id", get(get_run))
        .route("/evaluation/runs/:id/results", get(get_run_results))
        .route("/evaluation/compare", get(compare))
        .route("/evaluation/golden-dataset", get(list_golden_queries).post(create_golden_query))
        .route("/evaluation/golden-dataset/bulk", post(bulk_create_golden_queries))
        .route(
            "/evaluation/golden-dataset/:id",
            get(get_golden_query).put(update_golden_query).delete(delete_golden_query),
        )
}
