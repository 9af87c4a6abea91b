//! ABOUTME: Input/output guardrail thresholds (§4.3, §4.7, §6 `guardrails.*` keys)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardrailsConfig {
    pub enabled: bool,
    pub max_query_length: usize,
    pub min_query_length: usize,
    pub max_queries_per_minute: u32,
    pub groundedness_threshold: f32,
    pub require_citations: bool,
    pub max_response_length: usize,
}

impl Default for GuardrailsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_query_length: 2000,
            min_query_length: 3,
            max_queries_per_minute: 30,
            groundedness_threshold: 0.7,
            require_citations: false,
            max_response_length: 8000,
        }
    }
}
