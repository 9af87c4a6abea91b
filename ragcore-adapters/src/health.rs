//! ABOUTME: Shared health-check result type returned by every adapter

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Ok,
    Degraded,
    Down,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub state: HealthState,
    pub latency_ms: Option<u64>,
    pub version: Option<String>,
}

impl HealthStatus {
    #[must_use]
    pub fn ok(latency_ms: u64) -> Self {
        Self { state: HealthState::Ok, latency_ms: Some(latency_ms), version: None }
    }

    #[must_use]
    pub fn degraded(latency_ms: u64) -> Self {
        Self { state: HealthState::Degraded, latency_ms: Some(latency_ms), version: None }
    }

    #[must_use]
    pub fn down() -> Self {
        Self { state: HealthState::Down, latency_ms: None, version: None }
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}
