//! ABOUTME: Aggregate configuration for the RAG pipeline, layered defaults → file → env
//! ABOUTME: Environment variables use prefix RAGCORE_ with `__` as the nesting separator

pub mod endpoints;
pub mod guardrails;
pub mod models;
pub mod observability;
pub mod pipeline;
pub mod profile;

pub use endpoints::{EndpointConfig, EndpointsConfig};
pub use guardrails::GuardrailsConfig;
pub use models::{ModelCatalogConfig, ModelDescriptor};
pub use observability::{AlertConfig, TraceConfig};
pub use pipeline::{ExpansionConfig, GraphConfig, PipelineConfig, RagVersion, RerankConfig};
pub use profile::Profile;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub trace: TraceConfig,
    pub alert: AlertConfig,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { trace: TraceConfig::default(), alert: AlertConfig::default() }
    }
}

/// Root configuration object threaded into every component's constructor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub pipeline: PipelineConfig,
    pub guardrails: GuardrailsConfig,
    pub observability: ObservabilityConfig,
    pub endpoints: EndpointsConfig,
    pub models: ModelCatalogConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

impl RagConfig {
    /// Loads configuration by layering built-in defaults, an optional TOML
    /// file, and `RAGCORE_`-prefixed environment variables (`__` nests
    /// fields, e.g. `RAGCORE_PIPELINE__HYBRID_ALPHA=0.7`).
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let mut builder = config::Config::builder().add_source(
            config::Config::try_from(&defaults).map_err(ConfigError::Load)?,
        );

        if let Some(path) = config_file {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("RAGCORE").separator("__").try_parsing(true),
        );

        let settled = builder.build()?;
        settled.try_deserialize().map_err(ConfigError::Load)
    }

    #[must_use]
    pub fn with_profile(mut self, profile: Profile) -> Self {
        profile.apply_to(&mut self);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_spec_defaults() {
        let config = RagConfig::default();
        assert_eq!(config.pipeline.search_limit, 20);
        assert_eq!(config.guardrails.max_queries_per_minute, 30);
        assert!((config.observability.trace.sample_rate - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn load_without_file_falls_back_to_defaults() {
        let config = RagConfig::load(None).unwrap();
        assert_eq!(config.pipeline.search_limit, 20);
    }

    #[test]
    #[serial_test::serial]
    fn env_override_nests_through_double_underscore() {
        std::env::set_var("RAGCORE_PIPELINE__HYBRID_ALPHA", "0.9");
        let config = RagConfig::load(None).unwrap();
        std::env::remove_var("RAGCORE_PIPELINE__HYBRID_ALPHA");
        assert!((config.pipeline.hybrid_alpha - 0.9).abs() < 1e-6);
    }
}
