//! ABOUTME: Post-generation checks: groundedness, citation presence, secret
//! ABOUTME: redaction, and response length capping

use crate::patterns::{CITATION_PATTERN, SENSITIVE_PATTERNS};
use ragcore_config::GuardrailsConfig;

/// Outcome of validating an assembled answer.
#[derive(Debug, Clone)]
pub struct OutputValidation {
    pub valid: bool,
    pub warnings: Vec<String>,
    pub groundedness: f32,
    pub has_citations: bool,
    pub final_response: String,
}

pub struct OutputGuardrails {
    config: GuardrailsConfig,
}

impl OutputGuardrails {
    #[must_use]
    pub fn new(config: GuardrailsConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn validate(&self, answer: &str, context: &[&str]) -> OutputValidation {
        let mut warnings = Vec::new();

        let groundedness = compute_groundedness(answer, context);
        if groundedness < self.config.groundedness_threshold {
            warnings.push(format!(
                "groundedness {groundedness:.2} below threshold {:.2}",
                self.config.groundedness_threshold
            ));
        }

        let has_citations = CITATION_PATTERN.is_match(answer);
        if self.config.require_citations && !has_citations {
            warnings.push("response is missing required citations".to_string());
        }

        let redacted = redact(answer);
        let final_response = if redacted.chars().count() > self.config.max_response_length {
            warnings.push("response truncated to max_response_length".to_string());
            redacted.chars().take(self.config.max_response_length).collect()
        } else {
            redacted
        };

        OutputValidation {
            valid: warnings.is_empty(),
            warnings,
            groundedness,
            has_citations,
            final_response,
        }
    }
}

/// Fraction of long-enough sentences whose content words mostly appear in the
/// retrieved context. Shared with `ragcore-eval`'s generation-quality scoring.
#[must_use]
pub fn compute_groundedness(answer: &str, context: &[&str]) -> f32 {
    let context_lower = context.join(" ").to_lowercase();

    let sentences: Vec<&str> = answer
        .split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| s.chars().count() > 20)
        .collect();

    if sentences.is_empty() {
        return 1.0;
    }

    let grounded_count = sentences.iter().filter(|s| is_grounded(s, &context_lower)).count();
    grounded_count as f32 / sentences.len() as f32
}

fn is_grounded(sentence: &str, context_lower: &str) -> bool {
    let words: Vec<String> = sentence
        .to_lowercase()
        .split_whitespace()
        .filter(|w| w.chars().count() > 4)
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .filter(|w| !w.is_empty())
        .collect();

    if words.is_empty() {
        return true;
    }

    let matched = words.iter().filter(|w| context_lower.contains(w.as_str())).count();
    matched as f32 / words.len() as f32 >= 0.5
}

fn redact(answer: &str) -> String {
    let mut result = answer.to_string();
    for pattern in SENSITIVE_PATTERNS.iter() {
        result = pattern.replace_all(&result, "[REDACTED]").into_owned();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GuardrailsConfig {
        GuardrailsConfig::default()
    }

    #[test]
    fn fully_grounded_answer_scores_one() {
        let guardrails = OutputGuardrails::new(config());
        let context = ["The onboarding process requires completing paperwork within five days."];
        let answer = "The onboarding process requires completing paperwork within five days.";
        let result = guardrails.validate(answer, &context);
        assert_eq!(result.groundedness, 1.0);
    }

    #[test]
    fn ungrounded_answer_scores_low() {
        let guardrails = OutputGuardrails::new(config());
        let context = ["The onboarding process requires completing paperwork."];
        let answer = "Quantum entanglement enables faster than light communication allegedly.";
        let result = guardrails.validate(answer, &context);
        assert!(result.groundedness < 0.5);
        assert!(!result.valid);
    }

    #[test]
    fn short_sentences_are_not_scored_and_default_grounded() {
        let guardrails = OutputGuardrails::new(config());
        let result = guardrails.validate("Yes.", &[]);
        assert_eq!(result.groundedness, 1.0);
    }

    #[test]
    fn missing_required_citations_warns() {
        let mut cfg = config();
        cfg.require_citations = true;
        let guardrails = OutputGuardrails::new(cfg);
        let result = guardrails.validate("The process takes five business days to complete fully.", &[]);
        assert!(!result.has_citations);
        assert!(result.warnings.iter().any(|w| w.contains("citation")));
    }

    #[test]
    fn citation_marker_is_detected() {
        let guardrails = OutputGuardrails::new(config());
        let result = guardrails.validate("See [Source 1: handbook.pdf] for details.", &[]);
        assert!(result.has_citations);
    }

    #[test]
    fn sensitive_data_is_redacted() {
        let guardrails = OutputGuardrails::new(config());
        let result = guardrails.validate("api_key = sk_live_abcdef1234567890", &[]);
        assert!(result.final_response.contains("[REDACTED]"));
    }

    #[test]
    fn long_response_is_truncated() {
        let mut cfg = config();
        cfg.max_response_length = 10;
        let guardrails = OutputGuardrails::new(cfg);
        let result = guardrails.validate("this response is much longer than ten characters", &[]);
        assert_eq!(result.final_response.chars().count(), 10);
        assert!(result.warnings.iter().any(|w| w.contains("truncated")));
    }

    proptest::proptest! {
        /// §8 invariant 6: re-validating an already-validated `final_response`
        /// settles immediately, since redaction and truncation are themselves
        /// idempotent over their own output.
        #[test]
        fn validate_settles_after_one_pass(answer in ".{0,300}") {
            let guardrails = OutputGuardrails::new(config());
            let once = guardrails.validate(&answer, &[]).final_response;
            let twice = guardrails.validate(&once, &[]).final_response;
            prop_assert_eq!(once, twice);
        }
    }
}
