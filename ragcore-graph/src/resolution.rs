//! ABOUTME: Offline entity resolution: type-scoped blocking, pairwise similarity clustering, merge

use ragcore_adapters::EmbeddingService;
use ragcore_core::{Entity, EntityOccurrence};
use std::collections::HashMap;

/// Default similarity threshold above which two entities are merged.
pub const DEFAULT_THRESHOLD: f32 = 0.85;
const EMBEDDING_FLOOR: f32 = 0.85;
const FUZZY_FLOOR: f32 = 0.8;
const ABBREVIATION_SCORE: f32 = 0.85;

/// Groups entities by type (clusters never cross types), then by the first
/// three characters of their canonical form, then clusters within each block
/// by pairwise similarity, merging any pair at or above `threshold`.
///
/// `embedding` is optional: when absent, the embedding-cosine similarity
/// signal is skipped and clustering relies on exact/alias/fuzzy/abbreviation
/// similarity alone.
pub async fn resolve(
    entities: Vec<Entity>,
    embedding: Option<&dyn EmbeddingService>,
    embedding_model: &str,
    threshold: f32,
) -> Vec<Entity> {
    let mut by_type: HashMap<_, Vec<Entity>> = HashMap::new();
    for entity in entities {
        by_type.entry(entity.entity_type).or_default().push(entity);
    }

    let mut merged = Vec::new();
    for (_entity_type, type_entities) in by_type {
        merged.extend(resolve_within_type(type_entities, embedding, embedding_model, threshold).await);
    }
    merged
}

async fn resolve_within_type(
    entities: Vec<Entity>,
    embedding: Option<&dyn EmbeddingService>,
    embedding_model: &str,
    threshold: f32,
) -> Vec<Entity> {
    let mut blocks: HashMap<String, Vec<Entity>> = HashMap::new();
    for entity in entities {
        let key: String = entity.canonical_form.chars().take(3).collect();
        blocks.entry(key).or_default().push(entity);
    }

    let mut resolved = Vec::new();
    for (_block_key, block_entities) in blocks {
        resolved.extend(cluster_block(block_entities, embedding, embedding_model, threshold).await);
    }
    resolved
}

async fn cluster_block(
    entities: Vec<Entity>,
    embedding: Option<&dyn EmbeddingService>,
    embedding_model: &str,
    threshold: f32,
) -> Vec<Entity> {
    let mut clusters: Vec<Entity> = Vec::new();

    'entity: for candidate in entities {
        for representative in &mut clusters {
            let score = similarity(representative, &candidate, embedding, embedding_model).await;
            if score >= threshold {
                merge_into(representative, candidate);
                continue 'entity;
            }
        }
        clusters.push(candidate);
    }
    clusters
}

/// Max over exact/alias/embedding/fuzzy/abbreviation similarity, per the
/// resolution algorithm: each signal only contributes above its own floor.
async fn similarity(
    a: &Entity,
    b: &Entity,
    embedding: Option<&dyn EmbeddingService>,
    embedding_model: &str,
) -> f32 {
    if a.canonical_form == b.canonical_form {
        return 1.0;
    }
    if a.aliases.contains(&b.canonical_form) || b.aliases.contains(&a.canonical_form) {
        return 0.95;
    }

    let mut best = 0.0f32;

    if let Some(embedding_service) = embedding {
        if let (Ok(vec_a), Ok(vec_b)) = (
            embedding_service.embed(&a.canonical_form, embedding_model).await,
            embedding_service.embed(&b.canonical_form, embedding_model).await,
        ) {
            let cosine = cosine_similarity(&vec_a, &vec_b);
            if cosine >= EMBEDDING_FLOOR {
                best = best.max(cosine);
            }
        }
    }

    let fuzzy = fuzzy_similarity(&a.canonical_form, &b.canonical_form);
    if fuzzy >= FUZZY_FLOOR {
        best = best.max(fuzzy);
    }

    if is_abbreviation_of(&a.canonical_form, &b.canonical_form)
        || is_abbreviation_of(&b.canonical_form, &a.canonical_form)
    {
        best = best.max(ABBREVIATION_SCORE);
    }

    best
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// `1 - levenshtein(a, b) / max(len(a), len(b))`.
fn fuzzy_similarity(a: &str, b: &str) -> f32 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    let distance = levenshtein_distance(a, b);
    1.0 - (distance as f32 / max_len as f32)
}

/// Standard dynamic-programming edit distance over `char`s. No crate in the
/// pack imports a distance library for this, so it is hand-rolled.
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (rows, cols) = (a.len() + 1, b.len() + 1);
    let mut dp = vec![vec![0usize; cols]; rows];

    for (i, row) in dp.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..cols {
        dp[0][j] = j;
    }

    for i in 1..rows {
        for j in 1..cols {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            dp[i][j] = (dp[i - 1][j] + 1).min(dp[i][j - 1] + 1).min(dp[i - 1][j - 1] + cost);
        }
    }
    dp[rows - 1][cols - 1]
}

/// True iff `short`'s uppercased initials spell out the first letters of
/// `long`'s words (e.g. "ibm" is an abbreviation of "international business machines").
fn is_abbreviation_of(long: &str, short: &str) -> bool {
    let words: Vec<&str> = long.split_whitespace().collect();
    if words.len() < 2 || short.chars().count() != words.len() {
        return false;
    }
    let initials: String = words.iter().filter_map(|w| w.chars().next()).collect::<String>().to_lowercase();
    initials == short.to_lowercase()
}

fn merge_into(representative: &mut Entity, incoming: Entity) {
    if incoming.confidence > representative.confidence {
        representative.canonical_form = incoming.canonical_form.clone();
    }
    representative.aliases.insert(incoming.canonical_form.clone());
    representative.aliases.extend(incoming.aliases);
    representative.confidence = representative.confidence.max(incoming.confidence);
    representative.occurrences.extend(incoming.occurrences);
    dedup_occurrences(&mut representative.occurrences);

    representative.merged_from.insert(incoming.id);
    representative.merged_from.extend(incoming.merged_from);
}

fn dedup_occurrences(occurrences: &mut Vec<EntityOccurrence>) {
    let mut seen = std::collections::HashSet::new();
    occurrences.retain(|o| seen.insert((o.document_id, o.chunk_id, o.position)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragcore_core::EntityType;

    #[tokio::test]
    async fn exact_match_merges() {
        let a = Entity::new(EntityType::Person, "Maria Schmidt", 0.8);
        let b = Entity::new(EntityType::Person, "Maria Schmidt", 0.9);
        let resolved = resolve(vec![a, b], None, "test-model", DEFAULT_THRESHOLD).await;
        assert_eq!(resolved.len(), 1);
    }

    #[tokio::test]
    async fn merge_records_absorbed_entity_ids_separately_from_aliases() {
        let a = Entity::new(EntityType::Organization, "Acme Corp", 0.8).with_alias("acme corporation");
        let b = Entity::new(EntityType::Organization, "acme corporation", 0.7);
        let b_id = b.id;
        assert_ne!(a.id, b_id, "test entities must have distinct ids for this assertion to be meaningful");

        let resolved = resolve(vec![a, b], None, "test-model", DEFAULT_THRESHOLD).await;
        assert_eq!(resolved.len(), 1);
        assert!(resolved[0].merged_from.contains(&b_id));
        assert!(resolved[0].aliases.contains("acme corporation"));
    }

    #[tokio::test]
    async fn different_types_never_merge() {
        let a = Entity::new(EntityType::Person, "Atlas", 0.9);
        let b = Entity::new(EntityType::Project, "Atlas", 0.9);
        let resolved = resolve(vec![a, b], None, "test-model", DEFAULT_THRESHOLD).await;
        assert_eq!(resolved.len(), 2);
    }

    #[tokio::test]
    async fn alias_match_merges() {
        let a = Entity::new(EntityType::Organization, "Acme Corp", 0.8).with_alias("acme corporation");
        let b = Entity::new(EntityType::Organization, "acme corporation", 0.7);
        let resolved = resolve(vec![a, b], None, "test-model", DEFAULT_THRESHOLD).await;
        assert_eq!(resolved.len(), 1);
    }

    #[test]
    fn fuzzy_similarity_catches_minor_typos() {
        let score = fuzzy_similarity("maria schmidt", "maria schmit");
        assert!(score >= FUZZY_FLOOR, "expected >= {FUZZY_FLOOR}, got {score}");
    }

    #[test]
    fn abbreviation_detection_matches_initials() {
        assert!(is_abbreviation_of("international business machines", "ibm"));
        assert!(!is_abbreviation_of("international business machines", "ibx"));
    }

    #[tokio::test]
    async fn unrelated_entities_stay_separate() {
        let a = Entity::new(EntityType::Person, "Maria Schmidt", 0.9);
        let b = Entity::new(EntityType::Person, "Klaus Weber", 0.9);
        let resolved = resolve(vec![a, b], None, "test-model", DEFAULT_THRESHOLD).await;
        assert_eq!(resolved.len(), 2);
    }
}
