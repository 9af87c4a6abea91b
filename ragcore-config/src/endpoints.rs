//! ABOUTME: External-adapter endpoint URLs, credentials, and timeouts (§4.1, §6)

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
}

impl EndpointConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self { url: String::new(), api_key: None, timeout_ms: 30_000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    pub llm: EndpointConfig,
    pub embedding: EndpointConfig,
    pub reranker: EndpointConfig,
    pub vector_store: EndpointConfig,
    pub graph_store: EndpointConfig,
    pub relational_store: EndpointConfig,
    pub cache: EndpointConfig,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            llm: EndpointConfig { timeout_ms: 60_000, ..EndpointConfig::default() },
            embedding: EndpointConfig { timeout_ms: 10_000, ..EndpointConfig::default() },
            reranker: EndpointConfig { timeout_ms: 2_000, ..EndpointConfig::default() },
            vector_store: EndpointConfig::default(),
            graph_store: EndpointConfig::default(),
            relational_store: EndpointConfig::default(),
            cache: EndpointConfig { timeout_ms: 1_000, ..EndpointConfig::default() },
        }
    }
}
