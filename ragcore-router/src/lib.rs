//! ABOUTME: Deterministic, I/O-free query analysis — type classification, entity
//! ABOUTME: extraction, multi-hop/graph-need detection, strategy selection, confidence scoring

mod patterns;

use ragcore_core::{QueryAnalysis, QueryType, RetrievalStrategy};
use std::collections::HashSet;

/// Stateless analyzer. A zero-field struct holding only associated functions,
/// so construction is free and there is nothing to configure beyond the
/// caller-supplied `graph_enabled` flag passed to [`QueryRouter::analyze`].
#[derive(Debug, Default, Clone, Copy)]
pub struct QueryRouter;

impl QueryRouter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Analyze `query` and recommend a retrieval strategy. `graph_enabled`
    /// reflects whether the graph adapter is configured/healthy for this
    /// deployment; when false, `requires_graph` is always false regardless
    /// of what the query itself would otherwise warrant.
    #[must_use]
    pub fn analyze(&self, query: &str, graph_enabled: bool) -> QueryAnalysis {
        analyze(query, graph_enabled)
    }
}

/// Free-function form of [`QueryRouter::analyze`], matching the spec's
/// `analyze(query) -> QueryAnalysis` entry point.
#[must_use]
pub fn analyze(query: &str, graph_enabled: bool) -> QueryAnalysis {
    let (query_type, matched_patterns) = classify_type(query);
    let entities = extract_entities(query);
    let is_multi_hop = detect_multi_hop(query, &entities, query_type);
    let requires_graph =
        graph_enabled && (is_multi_hop || query_type == QueryType::Relational || entities.len() >= 2);
    let requires_table = patterns::TABLE_PATTERNS.iter().any(|p| p.is_match(query));
    let recommended_level_filter = recommended_level_filter(query_type);
    let strategy = select_strategy(requires_graph, requires_table, query_type);
    let confidence = compute_confidence(query, matched_patterns);

    QueryAnalysis {
        query_type,
        entities,
        is_multi_hop,
        requires_graph,
        requires_table,
        strategy,
        recommended_level_filter,
        confidence,
    }
}

/// Count matches per query-type group; the group with the most matches wins.
/// Ties favor the earlier group in `TYPE_PATTERNS` (Factual is listed first
/// and is also the default when nothing matches at all). Returns the total
/// number of matched patterns across all groups, used by `compute_confidence`.
fn classify_type(query: &str) -> (QueryType, usize) {
    let mut best = QueryType::Factual;
    let mut best_count = 0usize;
    let mut total_matches = 0usize;

    for (query_type, group) in patterns::TYPE_PATTERNS.iter() {
        let count = group.iter().filter(|p| p.is_match(query)).count();
        total_matches += count;
        if count > best_count {
            best_count = count;
            best = *query_type;
        }
    }

    (best, total_matches)
}

/// Capitalized noun phrases, quoted substrings, company-suffix, and
/// `Projekt X`/`Project X` patterns, truncated to 50 chars and deduplicated
/// while preserving first-seen order.
fn extract_entities(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut entities = Vec::new();

    for pattern in patterns::ENTITY_PATTERNS.iter() {
        for captures in pattern.captures_iter(query) {
            let Some(candidate) = captures.get(1).or_else(|| captures.get(0)) else {
                continue;
            };
            let mut text = candidate.as_str().trim().to_string();
            text.truncate(50);
            if text.is_empty() || seen.contains(&text) {
                continue;
            }
            seen.insert(text.clone());
            entities.push(text);
        }
    }

    entities
}

fn detect_multi_hop(query: &str, entities: &[String], query_type: QueryType) -> bool {
    let has_fixed_indicator = patterns::MULTI_HOP_PATTERNS.iter().any(|p| p.is_match(query));
    let relational_multi_entity = query_type == QueryType::Relational && entities.len() >= 2;
    has_fixed_indicator || relational_multi_entity
}

fn recommended_level_filter(query_type: QueryType) -> HashSet<u8> {
    if query_type == QueryType::Aggregative {
        [0, 1, 2].into_iter().collect()
    } else {
        [1, 2].into_iter().collect()
    }
}

fn select_strategy(
    requires_graph: bool,
    requires_table: bool,
    query_type: QueryType,
) -> RetrievalStrategy {
    if requires_graph {
        RetrievalStrategy::HybridWithGraph
    } else if requires_table {
        RetrievalStrategy::TableFocused
    } else if query_type == QueryType::Aggregative {
        RetrievalStrategy::MultiIndex
    } else {
        RetrievalStrategy::Hybrid
    }
}

fn compute_confidence(query: &str, matched_patterns: usize) -> f32 {
    let mut confidence = 0.7_f32;
    confidence += 0.05 * matched_patterns as f32;

    let char_count = query.chars().count();
    if char_count > 50 {
        confidence += 0.05 * ((char_count - 50) as f32 / 50.0);
    }

    let token_count = query.split_whitespace().count();
    if char_count < 20 || token_count < 4 {
        confidence -= 0.1;
    }

    confidence.clamp(0.3, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factual_query_is_classified_factual() {
        let analysis = analyze("What is the onboarding process?", false);
        assert_eq!(analysis.query_type, QueryType::Factual);
    }

    #[test]
    fn relational_query_with_two_entities_requires_graph_when_enabled() {
        let analysis = analyze(
            "Who reports to Maria Schmidt and the latter also leads Projekt Atlas?",
            true,
        );
        assert_eq!(analysis.query_type, QueryType::Relational);
        assert!(analysis.requires_graph);
        assert!(analysis.is_multi_hop);
    }

    #[test]
    fn requires_graph_is_false_when_graph_disabled_even_if_relational() {
        let analysis = analyze("Who reports to Maria Schmidt?", false);
        assert!(!analysis.requires_graph);
    }

    #[test]
    fn temporal_query_is_classified_temporal() {
        let analysis = analyze("When is the deadline for the Q3 report?", false);
        assert_eq!(analysis.query_type, QueryType::Temporal);
    }

    #[test]
    fn aggregative_query_selects_multi_index_strategy() {
        let analysis = analyze("List all active vendor contracts", false);
        assert_eq!(analysis.query_type, QueryType::Aggregative);
        assert_eq!(analysis.strategy, RetrievalStrategy::MultiIndex);
        assert!(analysis.recommended_level_filter.contains(&0));
    }

    #[test]
    fn procedural_query_is_classified_procedural() {
        let analysis = analyze("How do I request a new laptop?", false);
        assert_eq!(analysis.query_type, QueryType::Procedural);
        assert!(!analysis.recommended_level_filter.contains(&0));
    }

    #[test]
    fn comparative_query_is_classified_comparative() {
        let analysis = analyze("Compare the 2023 and 2024 budgets", false);
        assert_eq!(analysis.query_type, QueryType::Comparative);
    }

    #[test]
    fn table_indicator_selects_table_focused_when_graph_not_required() {
        let analysis = analyze("Show me the table with all department budgets", false);
        assert_eq!(analysis.strategy, RetrievalStrategy::TableFocused);
    }

    #[test]
    fn quoted_entity_is_extracted_verbatim() {
        let analysis = analyze(r#"What does "Project Phoenix" cover?"#, false);
        assert!(analysis.entities.iter().any(|e| e == "Project Phoenix"));
    }

    #[test]
    fn short_query_loses_confidence() {
        let analysis = analyze("Hi there", false);
        assert!(analysis.confidence < 0.7);
    }

    #[test]
    fn long_query_gains_confidence() {
        let long_query =
            "Could you please explain in detail what the onboarding process looks like for new remote employees joining next quarter";
        let analysis = analyze(long_query, false);
        assert!(analysis.confidence > 0.7);
    }

    #[test]
    fn confidence_is_always_within_bounds() {
        for query in [
            "",
            "a",
            "What is the relationship between Acme GmbH and Projekt Atlas, and the latter indirectly connected with Beta AG?",
        ] {
            let analysis = analyze(query, true);
            assert!((0.3..=1.0).contains(&analysis.confidence));
        }
    }

    #[test]
    fn german_factual_pattern_is_recognized() {
        let analysis = analyze("Was ist der Urlaubsantragsprozess?", false);
        assert_eq!(analysis.query_type, QueryType::Factual);
    }
}
