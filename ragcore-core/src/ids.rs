//! ABOUTME: Typed identifier newtypes for every persistent and transient entity
//! ABOUTME: Each id wraps a Uuid; v4 for fresh ids, v5 for deterministic ones

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Declares a `Copy` newtype wrapper around `Uuid` with the conventions used
/// throughout the pipeline: random construction, deterministic construction
/// from a stable name, and transparent `Display`/serde.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random id.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Deterministic id derived from a stable name (used for idempotent upserts).
            #[must_use]
            pub fn from_name(name: &str) -> Self {
                Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()))
            }

            #[must_use]
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            #[must_use]
            pub fn uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

define_id!(
    /// Identifies an uploaded document.
    DocumentId
);
define_id!(
    /// Identifies a chunk within a document.
    ChunkId
);
define_id!(
    /// Identifies a resolved entity in the knowledge graph.
    EntityId
);
define_id!(
    /// Identifies a directed relationship between two entities.
    RelationshipId
);
define_id!(
    /// Identifies a single request trace.
    TraceId
);
define_id!(
    /// Identifies one span within a trace.
    SpanId
);
define_id!(
    /// Identifies a golden-dataset evaluation query.
    GoldenQueryId
);
define_id!(
    /// Identifies one run of the evaluation harness.
    EvaluationRunId
);
define_id!(
    /// Identifies a monitoring alert.
    AlertId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_ids_are_unique() {
        assert_ne!(DocumentId::new(), DocumentId::new());
    }

    #[test]
    fn deterministic_ids_match_for_same_name() {
        assert_eq!(ChunkId::from_name("doc-1/chunk-3"), ChunkId::from_name("doc-1/chunk-3"));
        assert_ne!(ChunkId::from_name("doc-1/chunk-3"), ChunkId::from_name("doc-1/chunk-4"));
    }

    #[test]
    fn display_round_trips_through_parse() {
        let id = TraceId::new();
        let parsed: TraceId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    proptest::proptest! {
        /// `from_name` is a pure function of its input: identical names
        /// always derive the same id, regardless of what else ran first.
        #[test]
        fn from_name_is_deterministic(name in ".{0,100}") {
            prop_assert_eq!(ChunkId::from_name(&name), ChunkId::from_name(&name));
        }
    }
}
