//! ABOUTME: Graph store trait: entity/relationship upserts, text lookup, bounded traversal

use crate::health::HealthStatus;
use async_trait::async_trait;
use ragcore_core::{DocumentId, Entity, EntityId, RelationType, Relationship, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalStrategy {
    Neighborhood,
    ShortestPath,
    Community,
}

#[derive(Debug, Clone)]
pub struct TraversalQuery {
    pub start_entities: Vec<EntityId>,
    pub strategy: TraversalStrategy,
    pub max_depth: u32,
    pub max_nodes: usize,
    pub relationship_types: Option<Vec<RelationType>>,
}

impl TraversalQuery {
    #[must_use]
    pub fn new(start_entities: Vec<EntityId>, strategy: TraversalStrategy) -> Self {
        Self { start_entities, strategy, max_depth: 2, max_nodes: 50, relationship_types: None }
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    #[must_use]
    pub fn with_relationship_types(mut self, types: Vec<RelationType>) -> Self {
        self.relationship_types = Some(types);
        self
    }
}

#[derive(Debug, Clone)]
pub struct SubGraph {
    pub entities: Vec<Entity>,
    pub relationships: Vec<Relationship>,
}

#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn upsert_entities(&self, entities: Vec<Entity>) -> Result<Vec<EntityId>>;

    async fn upsert_relationships(&self, relationships: Vec<Relationship>) -> Result<()>;

    /// Finds entities whose canonical form or aliases match any of `texts`.
    async fn find_by_text(&self, texts: &[String]) -> Result<Vec<Entity>>;

    async fn traverse(&self, query: &TraversalQuery) -> Result<SubGraph>;

    async fn delete_for_document(&self, document_id: DocumentId) -> Result<()>;

    async fn health_check(&self) -> HealthStatus;
}
