//! ABOUTME: `GET /health` (§6): aggregate status across every external adapter

use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use ragcore_adapters::HealthState;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ServiceHealth {
    vector: &'static str,
    llm: &'static str,
    graph: &'static str,
    cache: &'static str,
    database: &'static str,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    services: ServiceHealth,
    #[serde(rename = "uptimeSeconds")]
    uptime_seconds: u64,
}

fn label(state: HealthState) -> &'static str {
    match state {
        HealthState::Ok => "ok",
        HealthState::Degraded => "degraded",
        HealthState::Down => "down",
    }
}

pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let (vector, llm, graph, database) = tokio::join!(
        state.vector_store.health_check(),
        state.llm.health_check(),
        state.graph_store.health_check(),
        state.relational_store.health_check(),
    );
    // The cache is an optional accelerator (§4.1): its absence downgrades
    // nothing, it just means every lookup falls through to the adapter.
    let cache = if state.cache.is_some() { HealthState::Ok } else { HealthState::Degraded };

    let required = [vector.state, llm.state, graph.state, database.state];
    let overall_ok = required.iter().all(|s| matches!(s, HealthState::Ok));

    let body = HealthResponse {
        status: if overall_ok { "ok" } else { "degraded" },
        services: ServiceHealth {
            vector: label(vector.state),
            llm: label(llm.state),
            graph: label(graph.state),
            cache: label(cache),
            database: label(database.state),
        },
        uptime_seconds: state.started_at.elapsed().as_secs(),
    };

    let status_code = if overall_ok { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(body))
}
