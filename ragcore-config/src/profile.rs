//! ABOUTME: Named config profiles that apply bulk overrides to a base RagConfig
//! ABOUTME: Grounded on llmspell-config's RAGProfile::apply_to_config pattern

use crate::RagConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    Dev,
    Staging,
    Prod,
}

impl Profile {
    /// Applies this profile's overrides on top of an already-loaded config.
    pub fn apply_to(self, config: &mut RagConfig) {
        match self {
            Self::Dev => {
                config.observability.trace.sample_rate = 1.0;
                config.guardrails.max_queries_per_minute = 1000;
            }
            Self::Staging => {
                config.observability.trace.sample_rate = 0.5;
            }
            Self::Prod => {
                config.observability.trace.sample_rate = 0.1;
                config.guardrails.require_citations = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_profile_maximizes_sampling() {
        let mut config = RagConfig::default();
        Profile::Dev.apply_to(&mut config);
        assert_eq!(config.observability.trace.sample_rate, 1.0);
    }

    #[test]
    fn prod_profile_lowers_sampling_and_requires_citations() {
        let mut config = RagConfig::default();
        Profile::Prod.apply_to(&mut config);
        assert_eq!(config.observability.trace.sample_rate, 0.1);
        assert!(config.guardrails.require_citations);
    }
}
