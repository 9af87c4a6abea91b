use crate::graph_store::{GraphStore, SubGraph, TraversalQuery, TraversalStrategy};
use crate::health::HealthStatus;
use async_trait::async_trait;
use dashmap::DashMap;
use ragcore_core::{DocumentId, Entity, EntityId, Relationship, Result};
use std::collections::{HashSet, VecDeque};

#[derive(Default)]
pub struct InMemoryGraphStore {
    entities: DashMap<EntityId, Entity>,
    relationships: DashMap<ragcore_core::RelationshipId, Relationship>,
}

impl InMemoryGraphStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn neighbors(&self, id: EntityId, rel_types: Option<&[ragcore_core::RelationType]>) -> Vec<EntityId> {
        self.relationships
            .iter()
            .filter(|r| rel_types.map_or(true, |types| types.contains(&r.value().relation_type)))
            .filter_map(|r| {
                if r.value().source_entity_id == id {
                    Some(r.value().target_entity_id)
                } else if r.value().target_entity_id == id {
                    Some(r.value().source_entity_id)
                } else {
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn upsert_entities(&self, entities: Vec<Entity>) -> Result<Vec<EntityId>> {
        let ids = entities.iter().map(|e| e.id).collect();
        for entity in entities {
            self.entities.insert(entity.id, entity);
        }
        Ok(ids)
    }

    async fn upsert_relationships(&self, relationships: Vec<Relationship>) -> Result<()> {
        for relationship in relationships {
            self.relationships.insert(relationship.id, relationship);
        }
        Ok(())
    }

    async fn find_by_text(&self, texts: &[String]) -> Result<Vec<Entity>> {
        let needles: Vec<String> = texts.iter().map(|t| ragcore_core::normalize_canonical_form(t)).collect();
        Ok(self
            .entities
            .iter()
            .filter(|e| {
                needles.iter().any(|n| {
                    &e.value().canonical_form == n || e.value().aliases.iter().any(|a| a == n)
                })
            })
            .map(|e| e.value().clone())
            .collect())
    }

    async fn traverse(&self, query: &TraversalQuery) -> Result<SubGraph> {
        let rel_types = query.relationship_types.as_deref();
        // `ShortestPath` stops expanding at the first depth that reaches any
        // non-start entity; `Community` ignores the depth bound entirely and
        // is capped purely by `max_nodes`. `Neighborhood` is a plain bounded BFS.
        let effective_max_depth = match query.strategy {
            TraversalStrategy::Neighborhood => query.max_depth,
            TraversalStrategy::ShortestPath => 1,
            TraversalStrategy::Community => u32::MAX,
        };

        let mut visited: HashSet<EntityId> = query.start_entities.iter().copied().collect();
        let mut frontier: VecDeque<(EntityId, u32)> =
            query.start_entities.iter().map(|id| (*id, 0)).collect();
        let mut collected_entities = Vec::new();
        let mut collected_relationship_ids = HashSet::new();

        while let Some((current, depth)) = frontier.pop_front() {
            if collected_entities.len() >= query.max_nodes {
                break;
            }
            if let Some(entity) = self.entities.get(&current) {
                collected_entities.push(entity.value().clone());
            }
            if depth >= effective_max_depth {
                continue;
            }
            for neighbor in self.neighbors(current, rel_types) {
                if visited.insert(neighbor) {
                    frontier.push_back((neighbor, depth + 1));
                }
            }
        }

        for r in self.relationships.iter() {
            let rel = r.value();
            if visited.contains(&rel.source_entity_id) && visited.contains(&rel.target_entity_id) {
                collected_relationship_ids.insert(rel.id);
            }
        }
        let collected_relationships = collected_relationship_ids
            .into_iter()
            .filter_map(|id| self.relationships.get(&id).map(|r| r.value().clone()))
            .collect();

        Ok(SubGraph { entities: collected_entities, relationships: collected_relationships })
    }

    async fn delete_for_document(&self, document_id: DocumentId) -> Result<()> {
        self.entities.retain(|_, e| !e.occurrences.iter().any(|o| o.document_id == document_id));
        self.relationships.retain(|_, r| r.source_document_id != document_id);
        Ok(())
    }

    async fn health_check(&self) -> HealthStatus {
        HealthStatus::ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragcore_core::{DocumentId, EntityType, ExtractionMethod, RelationType};

    fn entity(entity_type: EntityType, name: &str) -> Entity {
        Entity::new(entity_type, name, 0.9)
    }

    #[tokio::test]
    async fn traverse_neighborhood_respects_max_depth() {
        let store = InMemoryGraphStore::new();
        let a = entity(EntityType::Person, "Alice");
        let b = entity(EntityType::Organization, "Acme");
        let c = entity(EntityType::Project, "Phoenix");
        let (a_id, b_id, c_id) = (a.id, b.id, c.id);
        store.upsert_entities(vec![a, b, c]).await.unwrap();
        let doc = DocumentId::new();
        store
            .upsert_relationships(vec![
                Relationship::new(a_id, b_id, RelationType::WorksFor, doc, ExtractionMethod::Pattern),
                Relationship::new(b_id, c_id, RelationType::Manages, doc, ExtractionMethod::Pattern),
            ])
            .await
            .unwrap();

        let query = TraversalQuery::new(vec![a_id], TraversalStrategy::Neighborhood).with_max_depth(1);
        let result = store.traverse(&query).await.unwrap();
        let ids: HashSet<EntityId> = result.entities.iter().map(|e| e.id).collect();
        assert!(ids.contains(&a_id));
        assert!(ids.contains(&b_id));
        assert!(!ids.contains(&c_id));
    }

    #[tokio::test]
    async fn delete_for_document_removes_relationships_from_that_document() {
        let store = InMemoryGraphStore::new();
        let a = entity(EntityType::Person, "Bob");
        let b = entity(EntityType::Organization, "Globex");
        let (a_id, b_id) = (a.id, b.id);
        store.upsert_entities(vec![a, b]).await.unwrap();
        let doc = DocumentId::new();
        store
            .upsert_relationships(vec![Relationship::new(
                a_id,
                b_id,
                RelationType::WorksFor,
                doc,
                ExtractionMethod::Pattern,
            )])
            .await
            .unwrap();
        store.delete_for_document(doc).await.unwrap();
        let query = TraversalQuery::new(vec![a_id], TraversalStrategy::Neighborhood);
        let result = store.traverse(&query).await.unwrap();
        assert!(result.relationships.is_empty());
    }
}
