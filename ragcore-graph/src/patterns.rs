use ragcore_core::{EntityType, RelationType};
use regex::Regex;
use std::sync::LazyLock;

/// Per-type patterns, German + English, checked in declaration order; the
/// first type whose pattern set matches a capitalized phrase wins. `Topic` is
/// deliberately last, since it is the catch-all for a bare capitalized phrase.
pub static ENTITY_PATTERNS: LazyLock<Vec<(EntityType, Vec<Regex>)>> = LazyLock::new(|| {
    vec![
        (
            EntityType::Person,
            vec![
                Regex::new(r"\b(?:Herr|Frau|Dr\.|Prof\.|Mr\.|Ms\.|Mrs\.)\s+([A-ZÄÖÜ][\p{L}]+(?:\s+[A-ZÄÖÜ][\p{L}]+)?)").unwrap(),
                Regex::new(r"\b([A-ZÄÖÜ][\p{L}]+\s+[A-ZÄÖÜ][\p{L}]+)\b").unwrap(),
            ],
        ),
        (
            EntityType::Organization,
            vec![
                Regex::new(r"\b([A-ZÄÖÜ][\p{L}0-9&\s]*?\s?(?:GmbH|AG|KG|SE|Inc\.?|Ltd\.?|Corp\.?|LLC))\b").unwrap(),
            ],
        ),
        (
            EntityType::Project,
            vec![Regex::new(r"\b(?:Projekt|Project)\s+([A-ZÄÖÜ][\p{L}0-9]*)").unwrap()],
        ),
        (
            EntityType::Product,
            vec![Regex::new(r#"["„]([^"“”]{2,40})["“”]"#).unwrap()],
        ),
        (
            EntityType::Regulation,
            vec![
                Regex::new(r"§\s?\d+[a-z]?(?:\s+\p{L}+)?").unwrap(),
                Regex::new(r"\b(?:DSGVO|GDPR|Verordnung\s+\(EU\)\s+\d+/\d+|Artikel\s+\d+)\b").unwrap(),
            ],
        ),
        (
            EntityType::Date,
            vec![
                Regex::new(r"\b\d{1,2}\.\s?\d{1,2}\.\s?\d{2,4}\b").unwrap(),
                Regex::new(r"\b\d{4}-\d{2}-\d{2}\b").unwrap(),
                Regex::new(r"\b(?:Januar|Februar|März|April|Mai|Juni|Juli|August|September|Oktober|November|Dezember|January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2},?\s+\d{4}\b").unwrap(),
            ],
        ),
        (
            EntityType::Location,
            vec![Regex::new(r"\bin\s+([A-ZÄÖÜ][\p{L}]+(?:\s+[A-ZÄÖÜ][\p{L}]+)?)\b").unwrap()],
        ),
        (
            EntityType::Document,
            vec![Regex::new(r"\b([\p{L}][\p{L}0-9\s]*\.(?:pdf|docx?|xlsx?|pptx?))\b").unwrap()],
        ),
        (
            EntityType::Topic,
            vec![Regex::new(r"\b([A-ZÄÖÜ][\p{L}]{2,}(?:\s+[A-ZÄÖÜ][\p{L}]{2,})*)\b").unwrap()],
        ),
    ]
});

/// Words that must never stand alone as an extracted entity, regardless of
/// capitalization; checked case-insensitively against the first word of a match.
pub static STOPWORDS: &[&str] = &[
    "the", "this", "that", "these", "those", "it", "they", "he", "she", "we", "you", "however",
    "therefore", "also", "but", "and", "or", "so", "der", "die", "das", "dieser", "diese",
    "dieses", "er", "sie", "es", "wir", "jedoch", "deshalb", "auch", "aber", "und", "oder",
];

/// `(first-type, second-type) -> relationship-type` weak edges added between
/// any two entities that co-occur in the same chunk; order-insensitive (both
/// directions of a pair resolve to the same entry).
pub static CO_OCCURRENCE_TABLE: LazyLock<Vec<(EntityType, EntityType, RelationType)>> = LazyLock::new(|| {
    vec![
        (EntityType::Person, EntityType::Organization, RelationType::WorksFor),
        (EntityType::Person, EntityType::Person, RelationType::CollaboratesWith),
        (EntityType::Person, EntityType::Project, RelationType::Manages),
        (EntityType::Organization, EntityType::Project, RelationType::PartOf),
        (EntityType::Person, EntityType::Document, RelationType::Created),
        (EntityType::Person, EntityType::Topic, RelationType::Mentions),
        (EntityType::Document, EntityType::Topic, RelationType::About),
        (EntityType::Document, EntityType::Regulation, RelationType::References),
        (EntityType::Project, EntityType::Product, RelationType::PartOf),
        (EntityType::Organization, EntityType::Regulation, RelationType::ApprovedBy),
    ]
});

/// Looks up the co-occurrence relationship type for an unordered type pair.
#[must_use]
pub fn co_occurrence_relation(a: EntityType, b: EntityType) -> Option<RelationType> {
    CO_OCCURRENCE_TABLE
        .iter()
        .find(|(t1, t2, _)| (*t1 == a && *t2 == b) || (*t1 == b && *t2 == a))
        .map(|(_, _, relation)| *relation)
}
