//! ABOUTME: Per-query retrieval and generation-quality metrics (§4.9 step 3)

use ragcore_graph::STOPWORDS;
use std::collections::HashSet;
use std::hash::Hash;

/// `|retrieved[:k] ∩ relevant| / k`. Works over either document or chunk ids
/// depending on what the caller passes; the document/chunk-level switch per
/// golden query (no relevant chunks defined → document-level) is the
/// caller's responsibility.
#[must_use]
pub fn precision_at_k<T: Eq + Hash>(retrieved_in_order: &[T], relevant: &HashSet<T>, k: usize) -> f32 {
    if k == 0 {
        return 0.0;
    }
    let hits = retrieved_in_order.iter().take(k).filter(|id| relevant.contains(id)).count();
    hits as f32 / k as f32
}

/// `|retrieved[:k] ∩ relevant| / |relevant|`; `1.0` when nothing is relevant
/// (trivially fully recalled).
#[must_use]
pub fn recall_at_k<T: Eq + Hash>(retrieved_in_order: &[T], relevant: &HashSet<T>, k: usize) -> f32 {
    if relevant.is_empty() {
        return 1.0;
    }
    let hits = retrieved_in_order.iter().take(k).filter(|id| relevant.contains(id)).count();
    hits as f32 / relevant.len() as f32
}

/// `1/rank` of the first relevant id, `0.0` if none of the retrieved ids
/// are relevant.
#[must_use]
pub fn mrr<T: Eq + Hash>(retrieved_in_order: &[T], relevant: &HashSet<T>) -> f32 {
    for (rank, id) in retrieved_in_order.iter().enumerate() {
        if relevant.contains(id) {
            return 1.0 / (rank as f32 + 1.0);
        }
    }
    0.0
}

fn content_words(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .filter(|w| !w.is_empty() && !STOPWORDS.contains(&w.as_str()))
        .collect()
}

/// Fraction of the query's non-stopword content words that also appear in
/// the answer, normalized to `[0, 1]`. `1.0` when the query has no content
/// words (nothing to check relevance against).
#[must_use]
pub fn answer_relevance(answer: &str, query: &str) -> f32 {
    let query_words = content_words(query);
    if query_words.is_empty() {
        return 1.0;
    }
    let answer_words = content_words(answer);
    let overlap = query_words.intersection(&answer_words).count();
    overlap as f32 / query_words.len() as f32
}

/// Fraction of `key_facts` found (case-insensitive substring match) in the
/// answer; `1.0` when there are no key facts to check.
#[must_use]
pub fn key_facts_covered(answer: &str, key_facts: &[String]) -> f32 {
    if key_facts.is_empty() {
        return 1.0;
    }
    let answer_lower = answer.to_lowercase();
    let covered = key_facts.iter().filter(|fact| answer_lower.contains(&fact.to_lowercase())).count();
    covered as f32 / key_facts.len() as f32
}

/// Whether any forbidden-content string appears (case-insensitive) in the answer.
#[must_use]
pub fn hallucination_detected(answer: &str, forbidden_content: &[String]) -> bool {
    let answer_lower = answer.to_lowercase();
    forbidden_content.iter().any(|forbidden| answer_lower.contains(&forbidden.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precision_counts_hits_within_top_k() {
        let retrieved = vec![1, 2, 3, 4, 5];
        let relevant: HashSet<i32> = [2, 4].into_iter().collect();
        assert!((precision_at_k(&retrieved, &relevant, 5) - 0.4).abs() < f32::EPSILON);
        assert!((precision_at_k(&retrieved, &relevant, 2) - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn recall_is_one_when_nothing_is_relevant() {
        let retrieved = vec![1, 2, 3];
        let relevant: HashSet<i32> = HashSet::new();
        assert_eq!(recall_at_k(&retrieved, &relevant, 5), 1.0);
    }

    #[test]
    fn mrr_finds_first_relevant_rank() {
        let retrieved = vec![1, 2, 3];
        let relevant: HashSet<i32> = [3].into_iter().collect();
        assert!((mrr(&retrieved, &relevant) - (1.0 / 3.0)).abs() < 1e-6);
    }

    #[test]
    fn mrr_is_zero_when_nothing_relevant_is_retrieved() {
        let retrieved = vec![1, 2];
        let relevant: HashSet<i32> = [9].into_iter().collect();
        assert_eq!(mrr(&retrieved, &relevant), 0.0);
    }

    #[test]
    fn answer_relevance_measures_query_word_overlap() {
        let relevance = answer_relevance("The onboarding process requires paperwork.", "onboarding paperwork process");
        assert!(relevance > 0.9);
    }

    #[test]
    fn key_facts_covered_counts_case_insensitive_matches() {
        let facts = vec!["five business days".to_string(), "direct deposit".to_string()];
        let covered = key_facts_covered("Paperwork takes Five Business Days to clear.", &facts);
        assert!((covered - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn hallucination_flags_forbidden_content() {
        let forbidden = vec!["unlimited vacation".to_string()];
        assert!(hallucination_detected("We offer unlimited vacation to all staff.", &forbidden));
        assert!(!hallucination_detected("We offer 25 days of vacation.", &forbidden));
    }

    proptest::proptest! {
        /// §8 invariant 8: precision@k is always in [0, 1], and recall is
        /// monotonically non-decreasing as k grows, for any retrieved order
        /// and any relevant set drawn from the same small id space.
        #[test]
        fn precision_is_bounded_and_recall_is_monotonic(
            retrieved in proptest::collection::vec(0u32..20, 0..20),
            relevant in proptest::collection::hash_set(0u32..20, 0..10),
            k in 1usize..20,
        ) {
            let precision = precision_at_k(&retrieved, &relevant, k);
            prop_assert!((0.0..=1.0).contains(&precision));

            let recall_k = recall_at_k(&retrieved, &relevant, k);
            let recall_k_minus_1 = recall_at_k(&retrieved, &relevant, k - 1);
            prop_assert!(recall_k + f32::EPSILON >= recall_k_minus_1);

            let score = mrr(&retrieved, &relevant);
            prop_assert!((0.0..=1.0).contains(&score));
        }
    }
}
