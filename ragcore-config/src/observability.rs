//! ABOUTME: Tracing and alerting thresholds (§4.8, §6 `trace.*`/`alert.*` keys)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    pub enabled: bool,
    pub sample_rate: f64,
    pub persist: bool,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self { enabled: true, sample_rate: 1.0, persist: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub p95_latency_ms: i64,
    pub error_rate: f64,
    pub cache_hit_rate: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self { p95_latency_ms: 5000, error_rate: 0.05, cache_hit_rate: 0.5 }
    }
}
