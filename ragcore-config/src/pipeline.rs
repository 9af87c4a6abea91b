//! ABOUTME: Retrieval-pipeline tuning knobs (§4.4, §6 `rag.*` keys)
//! ABOUTME: Defaults mirror the spec's documented knob defaults

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RagVersion {
    V1,
    V2,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankConfig {
    pub enabled: bool,
    pub top_k: usize,
    pub timeout_ms: u64,
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self { enabled: true, top_k: 5, timeout_ms: 2000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionConfig {
    pub enabled: bool,
    pub max_docs: usize,
    pub max_chunks_per_doc: usize,
    pub threshold: f32,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self { enabled: true, max_docs: 3, max_chunks_per_doc: 3, threshold: 0.5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub enabled: bool,
    pub max_depth: u32,
    pub max_nodes: u32,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self { enabled: true, max_depth: 2, max_nodes: 50 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub version: RagVersion,
    pub hybrid_alpha: f32,
    pub search_limit: usize,
    pub search_threshold: f32,
    pub rerank: RerankConfig,
    pub expansion: ExpansionConfig,
    pub graph: GraphConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            version: RagVersion::V2,
            hybrid_alpha: 0.5,
            search_limit: 20,
            search_threshold: 0.3,
            rerank: RerankConfig::default(),
            expansion: ExpansionConfig::default(),
            graph: GraphConfig::default(),
        }
    }
}

impl Default for RagVersion {
    fn default() -> Self {
        Self::V2
    }
}
