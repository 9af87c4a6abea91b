//! ABOUTME: Static model catalog served by the `/models` endpoint (§6)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub id: String,
    pub family: String,
    pub display_name: String,
}

impl ModelDescriptor {
    #[must_use]
    pub fn new(id: impl Into<String>, family: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self { id: id.into(), family: family.into(), display_name: display_name.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelCatalogConfig {
    pub default_model: String,
    pub available: Vec<ModelDescriptor>,
}

impl Default for ModelCatalogConfig {
    fn default() -> Self {
        Self {
            default_model: "llama3.1:8b".to_string(),
            available: vec![
                ModelDescriptor::new("llama3.1:8b", "llama", "Llama 3.1 8B"),
                ModelDescriptor::new("llama3.1:70b", "llama", "Llama 3.1 70B"),
                ModelDescriptor::new("gpt-4o-mini", "gpt", "GPT-4o mini"),
                ModelDescriptor::new("claude-3-5-sonnet", "claude", "Claude 3.5 Sonnet"),
            ],
        }
    }
}

impl ModelCatalogConfig {
    /// Filters by case-insensitive substring match on id/display name and by
    /// exact family, as used by `GET /models?search=&family=`.
    #[must_use]
    pub fn search(&self, query: Option<&str>, family: Option<&str>) -> Vec<ModelDescriptor> {
        self.available
            .iter()
            .filter(|m| match query {
                Some(q) if !q.is_empty() => {
                    let q = q.to_lowercase();
                    m.id.to_lowercase().contains(&q) || m.display_name.to_lowercase().contains(&q)
                }
                _ => true,
            })
            .filter(|m| match family {
                Some(f) if !f.is_empty() => m.family.eq_ignore_ascii_case(f),
                _ => true,
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_filters_by_substring_and_family() {
        let catalog = ModelCatalogConfig::default();
        let results = catalog.search(Some("llama3.1:8b"), None);
        assert_eq!(results.len(), 1);

        let family_results = catalog.search(None, Some("llama"));
        assert_eq!(family_results.len(), 2);
    }

    #[test]
    fn empty_filters_return_everything() {
        let catalog = ModelCatalogConfig::default();
        assert_eq!(catalog.search(None, None).len(), catalog.available.len());
    }
}
