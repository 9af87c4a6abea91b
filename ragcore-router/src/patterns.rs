//! ABOUTME: Compiled regex pattern tables for query-type classification, entity
//! ABOUTME: extraction, multi-hop detection, and table-indicator detection (German + English)

use ragcore_core::QueryType;
use regex::Regex;
use std::sync::LazyLock;

/// Query-type pattern groups, in the priority order spec'd for display; ties
/// in match count are broken in favor of the earlier group (Factual wins).
pub static TYPE_PATTERNS: LazyLock<Vec<(QueryType, Vec<Regex>)>> = LazyLock::new(|| {
    vec![
        (
            QueryType::Factual,
            vec![
                Regex::new(r"(?i)\bwhat\s+is\b").unwrap(),
                Regex::new(r"(?i)\bwho\s+is\b").unwrap(),
                Regex::new(r"(?i)\bdefinier\w*\b").unwrap(),
                Regex::new(r"(?i)\bwas\s+ist\b").unwrap(),
                Regex::new(r"(?i)\bwer\s+ist\b").unwrap(),
            ],
        ),
        (
            QueryType::Relational,
            vec![
                Regex::new(r"(?i)\bwho\s+leads\b").unwrap(),
                Regex::new(r"(?i)\breports?\s+to\b").unwrap(),
                Regex::new(r"(?i)\brelationship\s+between\b").unwrap(),
                Regex::new(r"(?i)\bwer\s+leitet\b").unwrap(),
                Regex::new(r"(?i)\bberichtet\s+an\b").unwrap(),
                Regex::new(r"(?i)\bbeziehung\s+zwischen\b").unwrap(),
            ],
        ),
        (
            QueryType::Temporal,
            vec![
                Regex::new(r"(?i)\bwhen\b").unwrap(),
                Regex::new(r"(?i)\bdeadline\b").unwrap(),
                Regex::new(r"(?i)\bdate\b").unwrap(),
                Regex::new(r"(?i)\bwann\b").unwrap(),
                Regex::new(r"(?i)\bfrist\b").unwrap(),
                Regex::new(r"(?i)\bdatum\b").unwrap(),
            ],
        ),
        (
            QueryType::Aggregative,
            vec![
                Regex::new(r"(?i)\blist\b").unwrap(),
                Regex::new(r"(?i)\bhow\s+many\b").unwrap(),
                Regex::new(r"(?i)\ball\b").unwrap(),
                Regex::new(r"(?i)\boverview\b").unwrap(),
                Regex::new(r"(?i)\bliste\b").unwrap(),
                Regex::new(r"(?i)\bwie\s+viele\b").unwrap(),
                Regex::new(r"(?i)\buebersicht|übersicht\b").unwrap(),
            ],
        ),
        (
            QueryType::Procedural,
            vec![
                Regex::new(r"(?i)\bhow\s+do\s+i\b").unwrap(),
                Regex::new(r"(?i)\bsteps?\b").unwrap(),
                Regex::new(r"(?i)\bprocess\b").unwrap(),
                Regex::new(r"(?i)\bwie\s+kann\s+ich\b").unwrap(),
                Regex::new(r"(?i)\bschritte\b").unwrap(),
                Regex::new(r"(?i)\bvorgehen\b").unwrap(),
            ],
        ),
        (
            QueryType::Comparative,
            vec![
                Regex::new(r"(?i)\bcompare\b").unwrap(),
                Regex::new(r"(?i)\bdifference\b").unwrap(),
                Regex::new(r"(?i)\bvs\.?\b").unwrap(),
                Regex::new(r"(?i)\bvergleich\b").unwrap(),
                Regex::new(r"(?i)\bunterschied\b").unwrap(),
            ],
        ),
    ]
});

/// Fixed multi-hop indicator set (German + English).
pub static MULTI_HOP_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)and\s+the\s+latter").unwrap(),
        Regex::new(r"(?i)\bindirectly\b").unwrap(),
        Regex::new(r"(?i)connected\s+with").unwrap(),
        Regex::new(r"(?i)und\s+letzter[ree]?").unwrap(),
        Regex::new(r"(?i)\bindirekt\b").unwrap(),
        Regex::new(r"(?i)verbunden\s+mit").unwrap(),
        Regex::new(r"(?i)in\s+verbindung\s+mit").unwrap(),
    ]
});

/// Table-presentation indicators (German + English); drives `table_focused`.
pub static TABLE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\btable\b").unwrap(),
        Regex::new(r"(?i)\bcolumn\b").unwrap(),
        Regex::new(r"(?i)\brow\b").unwrap(),
        Regex::new(r"(?i)\btabelle\b").unwrap(),
        Regex::new(r"(?i)\bspalte\b").unwrap(),
        Regex::new(r"(?i)\bzeile\b").unwrap(),
        Regex::new(r"(?i)\btabellarisch\w*\b").unwrap(),
    ]
});

/// Candidate-entity patterns: capitalized noun phrases, quoted substrings,
/// company-suffix patterns, and `Projekt X`/`Project X` patterns.
pub static ENTITY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r#""([^"]{1,50})""#).unwrap(),
        Regex::new(r"„([^“]{1,50})“").unwrap(),
        Regex::new(
            r"\b([A-ZÄÖÜ][\wÄÖÜäöüß&.\-]*(?:\s+[A-ZÄÖÜ][\wÄÖÜäöüß&.\-]*)*\s+(?:GmbH|AG|KG|SE|Inc\.?|Ltd\.?|Corp\.?|LLC))\b",
        )
        .unwrap(),
        Regex::new(r"\b(?:Projekt|Project)\s+([A-ZÄÖÜ][\w\-]*)\b").unwrap(),
        Regex::new(r"\b([A-ZÄÖÜ][a-zäöüß]+(?:\s+[A-ZÄÖÜ][a-zäöüß]+){0,3})\b").unwrap(),
    ]
});
