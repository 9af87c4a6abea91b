//! ABOUTME: Deterministic natural-language summary of a traversed sub-graph

use ragcore_adapters::SubGraph;
use ragcore_core::{EntityType, RelationType};
use std::collections::HashMap;

/// Renders a fixed-template summary over the node and edge types present in
/// `sub_graph`, with no LLM call involved. Grouped counts are sorted by type
/// name so output is stable across runs with the same graph content.
#[must_use]
pub fn summarize(sub_graph: &SubGraph) -> String {
    if sub_graph.entities.is_empty() {
        return "No related entities were found in the knowledge graph.".to_string();
    }

    let mut entity_counts: HashMap<EntityType, usize> = HashMap::new();
    for entity in &sub_graph.entities {
        *entity_counts.entry(entity.entity_type).or_insert(0) += 1;
    }
    let mut entity_lines: Vec<String> = entity_counts
        .into_iter()
        .map(|(t, n)| format!("{n} {}", entity_type_label(t, n)))
        .collect();
    entity_lines.sort();

    let mut relation_counts: HashMap<RelationType, usize> = HashMap::new();
    for relationship in &sub_graph.relationships {
        *relation_counts.entry(relationship.relation_type).or_insert(0) += 1;
    }
    let mut relation_lines: Vec<String> = relation_counts
        .into_iter()
        .map(|(t, n)| format!("{n} {}", relation_type_label(t, n)))
        .collect();
    relation_lines.sort();

    let entity_summary = entity_lines.join(", ");
    if relation_lines.is_empty() {
        format!("Found {entity_summary} with no relationships among them.")
    } else {
        let relation_summary = relation_lines.join(", ");
        format!("Found {entity_summary}, connected by {relation_summary}.")
    }
}

fn entity_type_label(entity_type: EntityType, count: usize) -> String {
    let label = match entity_type {
        EntityType::Person => "person",
        EntityType::Organization => "organization",
        EntityType::Project => "project",
        EntityType::Product => "product",
        EntityType::Document => "document",
        EntityType::Topic => "topic",
        EntityType::Location => "location",
        EntityType::Date => "date",
        EntityType::Regulation => "regulation",
    };
    pluralize(label, count)
}

fn relation_type_label(relation_type: RelationType, count: usize) -> String {
    let label = match relation_type {
        RelationType::WorksFor => "works-for relationship",
        RelationType::Manages => "manages relationship",
        RelationType::Created => "created relationship",
        RelationType::Mentions => "mentions relationship",
        RelationType::References => "references relationship",
        RelationType::About => "about relationship",
        RelationType::PartOf => "part-of relationship",
        RelationType::ReportsTo => "reports-to relationship",
        RelationType::CollaboratesWith => "collaborates-with relationship",
        RelationType::ApprovedBy => "approved-by relationship",
    };
    pluralize(label, count)
}

fn pluralize(label: &str, count: usize) -> String {
    if count == 1 {
        label.to_string()
    } else {
        format!("{label}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragcore_core::{DocumentId, Entity, ExtractionMethod, Relationship};

    #[test]
    fn empty_graph_reports_no_entities() {
        let sub_graph = SubGraph { entities: vec![], relationships: vec![] };
        assert_eq!(summarize(&sub_graph), "No related entities were found in the knowledge graph.");
    }

    #[test]
    fn summarizes_entities_and_relationships() {
        let a = Entity::new(EntityType::Person, "Maria Schmidt", 0.9);
        let b = Entity::new(EntityType::Project, "Projekt Atlas", 0.9);
        let relationship = Relationship::new(
            a.id,
            b.id,
            RelationType::Manages,
            DocumentId::new(),
            ExtractionMethod::Pattern,
        );
        let sub_graph = SubGraph { entities: vec![a, b], relationships: vec![relationship] };
        let summary = summarize(&sub_graph);
        assert!(summary.contains("person"));
        assert!(summary.contains("project"));
        assert!(summary.contains("manages relationship"));
    }

    #[test]
    fn entities_without_relationships_are_reported_as_unconnected() {
        let a = Entity::new(EntityType::Organization, "Acme GmbH", 0.9);
        let sub_graph = SubGraph { entities: vec![a], relationships: vec![] };
        assert!(summarize(&sub_graph).contains("no relationships"));
    }
}
