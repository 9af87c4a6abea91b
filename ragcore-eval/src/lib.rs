//! ABOUTME: Evaluation harness (C9): runs the golden dataset through the pipeline under a
//! ABOUTME: privileged identity, scores retrieval and generation quality, aggregates, and compares runs

mod metrics;
mod run;

pub use metrics::{answer_relevance, hallucination_detected, key_facts_covered, mrr, precision_at_k, recall_at_k};
pub use run::{
    compare_runs, AggregateMetrics, EvalHarness, EvaluationConfig, EvaluationRun, PerQueryResult, RunComparison,
};
