//! ABOUTME: Graph subsystem (C5): offline entity/relationship extraction and resolution
//! ABOUTME: Online traversal lives in `ragcore-retrieval`, which talks to `GraphStore` directly

mod extraction;
mod patterns;
mod resolution;

pub use extraction::{extract_with_llm, PatternExtractor};
pub use patterns::{co_occurrence_relation, CO_OCCURRENCE_TABLE, ENTITY_PATTERNS, STOPWORDS};
pub use resolution::{resolve, DEFAULT_THRESHOLD};
