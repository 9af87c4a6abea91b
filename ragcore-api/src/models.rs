//! ABOUTME: `GET /models` (§6): searchable static catalog plus the configured default

use crate::state::AppState;
use axum::extract::{Query, State};
use axum::Json;
use ragcore_config::ModelDescriptor;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ModelsQuery {
    pub search: Option<String>,
    pub family: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelDescriptor>,
    #[serde(rename = "defaultModel")]
    pub default_model: String,
    #[serde(rename = "totalCount")]
    pub total_count: usize,
}

pub async fn list_models(State(state): State<AppState>, Query(query): Query<ModelsQuery>) -> Json<ModelsResponse> {
    let models = state.config.models.search(query.search.as_deref(), query.family.as_deref());
    Json(ModelsResponse {
        total_count: models.len(),
        default_model: state.config.models.default_model.clone(),
        models,
    })
}
