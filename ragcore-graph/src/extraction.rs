//! ABOUTME: Offline entity/relationship extraction: fixed pattern set plus optional LLM augmentation

use crate::patterns::{co_occurrence_relation, ENTITY_PATTERNS, STOPWORDS};
use ragcore_adapters::llm::{ChatMessage, ChatOptions, ChatRole, LlmDriver};
use ragcore_core::{Chunk, Entity, EntityOccurrence, EntityType, ExtractionMethod, RelationType, Relationship, Result};
use std::collections::HashSet;

const PATTERN_CONFIDENCE: f32 = 0.75;
const CO_OCCURRENCE_CONFIDENCE: f32 = 0.5;

/// Stateless pattern-based extractor run at ingestion time over every chunk.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternExtractor;

impl PatternExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Extracts entities and co-occurrence relationships from one chunk,
    /// deduplicated within the chunk. Relationships are weak edges inferred
    /// purely from two entities sharing a chunk, per the fixed type-pair table.
    #[must_use]
    pub fn extract(&self, chunk: &Chunk) -> (Vec<Entity>, Vec<Relationship>) {
        let entities = self.extract_entities(chunk);
        let relationships = Self::co_occurrence_relationships(chunk, &entities);
        (entities, relationships)
    }

    fn extract_entities(&self, chunk: &Chunk) -> Vec<Entity> {
        let mut entities = Vec::new();
        let mut seen: HashSet<(EntityType, String)> = HashSet::new();

        for (entity_type, patterns) in ENTITY_PATTERNS.iter() {
            for pattern in patterns {
                for (position, capture) in pattern.captures_iter(&chunk.text).enumerate() {
                    let Some(matched) = capture.get(1).or_else(|| capture.get(0)) else { continue };
                    let raw = matched.as_str().trim();
                    if !Self::passes_filters(raw) {
                        continue;
                    }
                    let entity = Entity::new(*entity_type, raw, PATTERN_CONFIDENCE).with_occurrence(
                        EntityOccurrence {
                            document_id: chunk.document_id,
                            chunk_id: chunk.id,
                            position: u32::try_from(position).unwrap_or(u32::MAX),
                            snippet: raw.to_string(),
                        },
                    );
                    if seen.insert((*entity_type, entity.canonical_form.clone())) {
                        entities.push(entity);
                    }
                }
            }
        }
        entities
    }

    fn passes_filters(raw: &str) -> bool {
        if raw.chars().count() < 2 {
            return false;
        }
        let first_word = raw.split_whitespace().next().unwrap_or(raw).to_lowercase();
        !STOPWORDS.contains(&first_word.as_str())
    }

    fn co_occurrence_relationships(chunk: &Chunk, entities: &[Entity]) -> Vec<Relationship> {
        let mut relationships = Vec::new();
        let mut seen: HashSet<(ragcore_core::EntityId, ragcore_core::EntityId, RelationType)> = HashSet::new();

        for (i, a) in entities.iter().enumerate() {
            for b in &entities[i + 1..] {
                if a.id == b.id {
                    continue;
                }
                let Some(relation_type) = co_occurrence_relation(a.entity_type, b.entity_type) else { continue };
                let key = (a.id, b.id, relation_type);
                if !seen.insert(key) {
                    continue;
                }
                relationships.push(
                    Relationship::new(a.id, b.id, relation_type, chunk.document_id, ExtractionMethod::Pattern)
                        .with_confidence(CO_OCCURRENCE_CONFIDENCE)
                        .with_evidence(format!("co-occurrence in chunk {}", chunk.ordinal)),
                );
            }
        }
        relationships
    }
}

/// LLM-augmented entity shape returned by the extraction prompt.
#[derive(Debug, serde::Deserialize)]
struct LlmEntity {
    #[serde(rename = "type")]
    entity_type: String,
    text: String,
    confidence: f32,
}

#[derive(Debug, serde::Deserialize)]
struct LlmRelationship {
    source: String,
    target: String,
    #[serde(rename = "type")]
    relation_type: String,
    evidence: String,
}

#[derive(Debug, serde::Deserialize)]
struct LlmExtractionResult {
    entities: Vec<LlmEntity>,
    relationships: Vec<LlmRelationship>,
}

const EXTRACTION_SYSTEM_PROMPT: &str = "Extract entities and relationships from the given text. \
Respond with JSON only, matching exactly: \
{\"entities\":[{\"type\":\"PERSON|ORGANIZATION|PROJECT|PRODUCT|DOCUMENT|TOPIC|LOCATION|DATE|REGULATION\",\"text\":\"...\",\"confidence\":0.0}], \
\"relationships\":[{\"source\":\"...\",\"target\":\"...\",\"type\":\"WORKS_FOR|MANAGES|CREATED|MENTIONS|REFERENCES|ABOUT|PART_OF|REPORTS_TO|COLLABORATES_WITH|APPROVED_BY\",\"evidence\":\"...\"}]}";

/// Augments pattern extraction with an LLM call, discarding anything below
/// `min_confidence`. Relationships reference entities by raw extracted text;
/// callers resolve them against the pattern-extracted (or newly created)
/// entities by canonical form.
pub async fn extract_with_llm(
    llm: &dyn LlmDriver,
    chunk: &Chunk,
    model: &str,
    min_confidence: f32,
) -> Result<(Vec<Entity>, Vec<(String, String, RelationType, String)>)> {
    let messages = vec![
        ChatMessage::new(ChatRole::System, EXTRACTION_SYSTEM_PROMPT),
        ChatMessage::new(ChatRole::User, chunk.text.clone()),
    ];
    let response = llm.chat(&messages, model, &ChatOptions { temperature: 0.0, max_tokens: Some(1024) }).await?;

    let parsed: LlmExtractionResult = match serde_json::from_str(&response.content) {
        Ok(parsed) => parsed,
        Err(_) => return Ok((Vec::new(), Vec::new())),
    };

    let entities: Vec<Entity> = parsed
        .entities
        .into_iter()
        .filter(|e| e.confidence >= min_confidence)
        .filter_map(|e| {
            entity_type_from_str(&e.entity_type).map(|entity_type| {
                Entity::new(entity_type, &e.text, e.confidence).with_occurrence(EntityOccurrence {
                    document_id: chunk.document_id,
                    chunk_id: chunk.id,
                    position: 0,
                    snippet: e.text,
                })
            })
        })
        .collect();

    let relationships = parsed
        .relationships
        .into_iter()
        .filter_map(|r| relation_type_from_str(&r.relation_type).map(|t| (r.source, r.target, t, r.evidence)))
        .collect();

    Ok((entities, relationships))
}

fn entity_type_from_str(raw: &str) -> Option<EntityType> {
    match raw {
        "PERSON" => Some(EntityType::Person),
        "ORGANIZATION" => Some(EntityType::Organization),
        "PROJECT" => Some(EntityType::Project),
        "PRODUCT" => Some(EntityType::Product),
        "DOCUMENT" => Some(EntityType::Document),
        "TOPIC" => Some(EntityType::Topic),
        "LOCATION" => Some(EntityType::Location),
        "DATE" => Some(EntityType::Date),
        "REGULATION" => Some(EntityType::Regulation),
        _ => None,
    }
}

fn relation_type_from_str(raw: &str) -> Option<RelationType> {
    match raw {
        "WORKS_FOR" => Some(RelationType::WorksFor),
        "MANAGES" => Some(RelationType::Manages),
        "CREATED" => Some(RelationType::Created),
        "MENTIONS" => Some(RelationType::Mentions),
        "REFERENCES" => Some(RelationType::References),
        "ABOUT" => Some(RelationType::About),
        "PART_OF" => Some(RelationType::PartOf),
        "REPORTS_TO" => Some(RelationType::ReportsTo),
        "COLLABORATES_WITH" => Some(RelationType::CollaboratesWith),
        "APPROVED_BY" => Some(RelationType::ApprovedBy),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragcore_core::{ChunkId, DocumentId, HierarchyLevel};

    fn chunk(text: &str) -> Chunk {
        Chunk::new(ChunkId::new(), DocumentId::new(), 0, HierarchyLevel::Paragraph, text)
    }

    #[test]
    fn extracts_person_from_title_prefix() {
        let extractor = PatternExtractor::new();
        let (entities, _) = extractor.extract(&chunk("Frau Maria Schmidt leitet das Projekt Atlas."));
        assert!(entities.iter().any(|e| e.entity_type == EntityType::Person));
        assert!(entities.iter().any(|e| e.entity_type == EntityType::Project));
    }

    #[test]
    fn extracts_organization_suffix() {
        let extractor = PatternExtractor::new();
        let (entities, _) = extractor.extract(&chunk("Acme Corp signed the contract with Atlas GmbH."));
        assert!(entities.iter().any(|e| e.entity_type == EntityType::Organization));
    }

    #[test]
    fn deduplicates_entities_within_a_chunk() {
        let extractor = PatternExtractor::new();
        let (entities, _) = extractor.extract(&chunk("Herr Klaus Weber met Herr Klaus Weber again."));
        let count = entities.iter().filter(|e| e.entity_type == EntityType::Person).count();
        assert_eq!(count, 1);
    }

    #[test]
    fn filters_stopword_led_phrases() {
        let extractor = PatternExtractor::new();
        let (entities, _) = extractor.extract(&chunk("However Projects are delayed this quarter."));
        assert!(!entities.iter().any(|e| e.canonical_form.starts_with("however")));
    }

    #[test]
    fn co_occurring_person_and_organization_get_a_works_for_edge() {
        let extractor = PatternExtractor::new();
        let (_, relationships) = extractor.extract(&chunk("Herr Klaus Weber works at Atlas GmbH."));
        assert!(relationships.iter().any(|r| r.relation_type == RelationType::WorksFor));
    }
}
