//! ABOUTME: `/monitoring/*` (§6): dashboard metrics, alerts, cache, and recent-trace inspection

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::{Method, StatusCode};
use axum::{Json, Router};
use chrono::Utc;
use ragcore_adapters::CacheStats;
use ragcore_core::{AlertId, RagError};
use ragcore_trace::{component_latencies, daily_metrics, query_distribution, real_time_metrics, AlertInputs};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DashboardResponse {
    real_time: ragcore_trace::RealTimeMetrics,
    daily: ragcore_trace::DailyMetrics,
    component_latencies_ms: std::collections::HashMap<String, f64>,
    query_type_distribution: std::collections::HashMap<String, usize>,
    strategy_distribution: std::collections::HashMap<String, usize>,
}

pub async fn dashboard(State(state): State<AppState>) -> Json<DashboardResponse> {
    let traces = state.tracer.recent_traces();
    let now = Utc::now();
    let (query_types, strategies) = query_distribution(&traces, now);
    Json(DashboardResponse {
        real_time: real_time_metrics(&traces, now),
        daily: daily_metrics(&traces, now),
        component_latencies_ms: component_latencies(&traces, now).into_iter().map(|(k, v)| (format!("{k:?}"), v)).collect(),
        query_type_distribution: query_types.into_iter().map(|(k, v)| (format!("{k:?}"), v)).collect(),
        strategy_distribution: strategies.into_iter().map(|(k, v)| (format!("{k:?}"), v)).collect(),
    })
}

#[derive(Debug, Deserialize)]
pub struct HourlyQuery {
    #[serde(default = "default_hours")]
    pub hours: i64,
}

fn default_hours() -> i64 {
    24
}

pub async fn hourly(State(state): State<AppState>, Query(query): Query<HourlyQuery>) -> Json<ragcore_trace::DailyMetrics> {
    let traces = state.tracer.recent_traces();
    let now = Utc::now();
    let window = traces.into_iter().filter(|t| t.timestamp >= now - chrono::Duration::hours(query.hours)).collect::<Vec<_>>();
    Json(daily_metrics(&window, now))
}

/// Reuses the `/health` adapter checks to give operators the same view
/// under `/monitoring/health` that the public health probe reports.
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let (vector, llm, graph, database) = tokio::join!(
        state.vector_store.health_check(),
        state.llm.health_check(),
        state.graph_store.health_check(),
        state.relational_store.health_check(),
    );
    Json(serde_json::json!({
        "vector": format!("{:?}", vector.state),
        "llm": format!("{:?}", llm.state),
        "graph": format!("{:?}", graph.state),
        "database": format!("{:?}", database.state),
        "cache": state.cache.is_some(),
    }))
}

pub async fn list_alerts(State(state): State<AppState>, method: Method) -> Result<Json<Vec<ragcore_core::Alert>>, ApiError> {
    let alerts = state
        .relational_store
        .list_unacknowledged_alerts()
        .await
        .map_err(|e| ApiError::new(e, "/monitoring/alerts", method.to_string()))?;
    Ok(Json(alerts))
}

pub async fn acknowledge_alert(State(state): State<AppState>, Path(id): Path<String>, method: Method) -> Result<StatusCode, ApiError> {
    let path = "/monitoring/alerts/:id/acknowledge";
    let alert_id = AlertId::from_str(&id).map_err(|_| ApiError::new(RagError::validation(format!("invalid id: {id}")), path, method.to_string()))?;
    state.relational_store.acknowledge_alert(alert_id).await.map_err(|e| ApiError::new(e, path, method.to_string()))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Evaluates alert thresholds against the current dashboard snapshot and the
/// cache's live hit rate, persisting and returning anything newly raised.
pub async fn check_alerts(State(state): State<AppState>, method: Method) -> Result<Json<Vec<ragcore_core::Alert>>, ApiError> {
    let path = "/monitoring/alerts/check";
    let traces = state.tracer.recent_traces();
    let now = Utc::now();
    let daily = daily_metrics(&traces, now);
    let cache_hit_rate = state.cache.as_ref().map(|c| c.stats().hit_rate()).unwrap_or(1.0);

    let inputs = AlertInputs { p95_latency_ms: daily.p95_latency_ms, error_rate: daily.error_rate, cache_hit_rate };
    let alerts = state.alerts.check(inputs, now).await.map_err(|e| ApiError::new(e, path, method.to_string()))?;
    Ok(Json(alerts))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CacheResponse {
    hits: u64,
    misses: u64,
    hit_rate: f64,
    enabled: bool,
}

pub async fn cache_stats(State(state): State<AppState>) -> Json<CacheResponse> {
    let stats = state.cache.as_ref().map(|c| c.stats()).unwrap_or_else(CacheStats::default);
    Json(CacheResponse { hits: stats.hits, misses: stats.misses, hit_rate: stats.hit_rate(), enabled: state.cache.is_some() })
}

pub async fn cache_flush(State(state): State<AppState>, method: Method) -> Result<StatusCode, ApiError> {
    if let Some(cache) = &state.cache {
        cache.flush().await.map_err(|e| ApiError::new(e, "/monitoring/cache/flush", method.to_string()))?;
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct RecentTracesQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

pub async fn recent_traces(State(state): State<AppState>, Query(query): Query<RecentTracesQuery>) -> Json<Vec<ragcore_core::Trace>> {
    let mut traces = state.tracer.recent_traces();
    traces.reverse();
    traces.truncate(query.limit);
    Json(traces)
}

pub async fn trace_stats(State(state): State<AppState>, Query(query): Query<HourlyQuery>) -> Json<ragcore_trace::DailyMetrics> {
    let traces = state.tracer.recent_traces();
    let now = Utc::now();
    let window = traces.into_iter().filter(|t| t.timestamp >= now - chrono::Duration::hours(query.hours)).collect::<Vec<_>>();
    Json(daily_metrics(&window, now))
}

pub fn router() -> Router<AppState> {
    use axum::routing::{get, post};
    Router::new()
        .route("/monitoring/dashboard", get(dashboard))
        .route("/monitoring/hourly", get(hourly))
        .route("/monitoring/health", get(health))
        .route("/monitoring/alerts", get(list_alerts))
        .route("/monitoring/alerts/:id/acknowledge", post(acknowledge_alert))
        .route("/monitoring/alerts/check", post(check_alerts))
        .route("/monitoring/cache", get(cache_stats))
        .route("/monitoring/cache/flush", post(cache_flush))
        .route("/monitoring/traces/recent", get(recent_traces))
        .route("/monitoring/traces/stats", get(trace_stats))
}
