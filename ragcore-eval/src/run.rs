//! ABOUTME: Golden-dataset evaluation harness (C9): runs every golden query through
//! ABOUTME: C2/C4/C6 with a privileged identity, scores, aggregates, and persists the run

use crate::metrics::{answer_relevance, hallucination_detected, key_facts_covered, mrr, precision_at_k, recall_at_k};
use chrono::{DateTime, Utc};
use ragcore_adapters::llm::{ChatMessage, ChatOptions, LlmDriver};
use ragcore_adapters::{Cache, EmbeddingService, GraphStore, RelationalStore, RerankerService, VectorStore};
use ragcore_compose::{build_messages, collect_stream, generate_stream, ContextSource};
use ragcore_config::PipelineConfig;
use ragcore_core::{ChunkId, DocumentId, EvaluationRunId, EvaluationStatus, GoldenQuery, QueryType, RagError, Result, RequestContext, UserContext, UserRole};
use ragcore_guardrails::compute_groundedness;
use ragcore_retrieval::{RetrieveRequest, RetrievalEngine};
use ragcore_router::QueryRouter;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Tuning knobs and flags for one evaluation run (§4.9 `EvaluationConfig`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    pub pipeline: PipelineConfig,
    pub embedding_model: String,
    pub llm_model: String,
    pub evaluate_generation: bool,
}

/// One golden query's recorded outcome and computed scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerQueryResult {
    pub golden_query_id: String,
    pub category: QueryType,
    pub retrieved_chunk_ids: Vec<String>,
    pub retrieved_document_ids: Vec<String>,
    pub response_preview: String,
    pub latency_ms: i64,
    pub precision_at: HashMap<usize, f32>,
    pub recall_at: HashMap<usize, f32>,
    pub mrr: f32,
    pub groundedness: Option<f32>,
    pub answer_relevance: Option<f32>,
    pub key_facts_covered: Option<f32>,
    pub hallucination_detected: Option<bool>,
}

/// Averages over a set of per-query results, either overall or within one category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateMetrics {
    pub query_count: usize,
    pub avg_precision_at: HashMap<usize, f32>,
    pub avg_recall_at: HashMap<usize, f32>,
    pub avg_mrr: f32,
    pub avg_groundedness: Option<f32>,
    pub avg_latency_ms: f64,
}

/// A completed or in-progress benchmark of the pipeline against the golden dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRun {
    pub id: EvaluationRunId,
    pub version_label: String,
    pub config: EvaluationConfig,
    pub status: EvaluationStatus,
    pub results: Vec<PerQueryResult>,
    pub aggregate: Option<AggregateMetrics>,
    pub per_category: HashMap<QueryType, AggregateMetrics>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl EvaluationRun {
    #[must_use]
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

const PRECISION_KS: &[usize] = &[1, 3, 5, 10, 20];
const RECALL_KS: &[usize] = &[5, 20];

/// The privileged identity golden-query evaluation runs under, bypassing
/// per-document visibility filtering per §4.9 step 2.
fn privileged_user() -> UserContext {
    UserContext::new("eval-harness", UserRole::Admin, "eval")
}

/// Collaborators the harness drives directly; mirrors `RetrievalEngine`'s own
/// constructor arguments plus the LLM driver needed for the generation step.
#[allow(clippy::too_many_arguments)]
pub struct EvalHarness {
    retrieval: RetrievalEngine,
    vector_store: Arc<dyn VectorStore>,
    llm: Arc<dyn LlmDriver>,
    relational_store: Arc<dyn RelationalStore>,
    router: QueryRouter,
}

impl EvalHarness {
    #[must_use]
    pub fn new(
        embedding: Arc<dyn EmbeddingService>,
        vector_store: Arc<dyn VectorStore>,
        reranker: Arc<dyn RerankerService>,
        graph_store: Arc<dyn GraphStore>,
        relational_store: Arc<dyn RelationalStore>,
        cache: Option<Arc<dyn Cache>>,
        llm: Arc<dyn LlmDriver>,
    ) -> Self {
        let retrieval =
            RetrievalEngine::new(embedding, vector_store.clone(), reranker, graph_store, relational_store.clone(), cache);
        Self { retrieval, vector_store, llm, relational_store, router: QueryRouter::new() }
    }

    /// Runs every `GoldenQuery` the relational store knows about through the
    /// pipeline, scores each, aggregates, and persists the completed run.
    /// On an uncaught error mid-run, persists `failed` with the message and
    /// returns the error. `id` is generated by the caller (rather than here)
    /// so an async dispatcher can report it back before the run completes.
    pub async fn run(&self, id: EvaluationRunId, version_label: impl Into<String>, config: EvaluationConfig) -> Result<EvaluationRun> {
        let mut run = EvaluationRun {
            id,
            version_label: version_label.into(),
            config: config.clone(),
            status: EvaluationStatus::Pending,
            results: Vec::new(),
            aggregate: None,
            per_category: HashMap::new(),
            started_at: None,
            completed_at: None,
            error_message: None,
        };
        self.persist(&run).await;

        run.status = EvaluationStatus::Running;
        run.started_at = Some(Utc::now());
        self.persist(&run).await;

        let golden_queries = match self.relational_store.list_golden_queries().await {
            Ok(queries) => queries,
            Err(err) => {
                run.status = EvaluationStatus::Failed;
                run.error_message = Some(err.to_string());
                self.persist(&run).await;
                return Err(err);
            }
        };

        for golden_query in &golden_queries {
            match self.run_one(golden_query, &config).await {
                Ok(result) => run.results.push(result),
                Err(err) => {
                    run.status = EvaluationStatus::Failed;
                    run.error_message = Some(err.to_string());
                    self.persist(&run).await;
                    return Err(err);
                }
            }
        }

        run.aggregate = Some(aggregate(&run.results));
        run.per_category = aggregate_by_category(&run.results);
        run.status = EvaluationStatus::Completed;
        run.completed_at = Some(Utc::now());
        self.persist(&run).await;
        Ok(run)
    }

    async fn run_one(&self, golden_query: &GoldenQuery, config: &EvaluationConfig) -> Result<PerQueryResult> {
        let started = Instant::now();
        let user = privileged_user();
        let ctx = RequestContext::new(user.clone(), format!("eval-{}", golden_query.id));

        let analysis = self.router.analyze(&golden_query.query_text, config.pipeline.graph.enabled);
        let request = RetrieveRequest::from_pipeline_config(
            golden_query.query_text.as_str(),
            analysis,
            user,
            config.embedding_model.clone(),
            &config.pipeline,
        );
        let response = self.retrieval.retrieve(&request, &ctx).await?;

        let retrieved_chunk_ids: Vec<ChunkId> = response.hits.iter().map(|h| h.chunk_id).collect();
        let retrieved_document_ids: Vec<DocumentId> = response.hits.iter().map(|h| h.document_id).collect();

        let chunk_level = !golden_query.relevant_chunk_ids.is_empty();
        let (precision_at, recall_at, rank_mrr) = if chunk_level {
            score(&retrieved_chunk_ids, &golden_query.relevant_chunk_ids)
        } else {
            score(&retrieved_document_ids, &golden_query.relevant_document_ids)
        };

        let mut response_preview = String::new();
        let mut groundedness = None;
        let mut relevance = None;
        let mut facts_covered = None;
        let mut hallucinated = None;

        if config.evaluate_generation {
            let context = self.build_context_sources(&response.hits).await?;
            let graph_summary = response.graph_context.as_ref().map(|g| g.summary.as_str());
            let messages = build_messages(&context, graph_summary, &[], &golden_query.query_text);
            let answer = generate_answer(&self.llm, &messages, &config.llm_model, &ctx).await?;

            response_preview = answer.chars().take(500).collect();
            let context_texts: Vec<&str> = context.iter().map(|c| c.chunk_text.as_str()).collect();
            groundedness = Some(compute_groundedness(&answer, &context_texts));
            relevance = Some(answer_relevance(&answer, &golden_query.query_text));
            facts_covered = Some(key_facts_covered(&answer, &golden_query.key_facts));
            hallucinated = Some(hallucination_detected(&answer, &golden_query.forbidden_content));
        }

        Ok(PerQueryResult {
            golden_query_id: golden_query.id.to_string(),
            category: golden_query.category,
            retrieved_chunk_ids: retrieved_chunk_ids.iter().map(ToString::to_string).collect(),
            retrieved_document_ids: retrieved_document_ids.iter().map(ToString::to_string).collect(),
            response_preview,
            latency_ms: started.elapsed().as_millis() as i64,
            precision_at,
            recall_at,
            mrr: rank_mrr,
            groundedness,
            answer_relevance: relevance,
            key_facts_covered: facts_covered,
            hallucination_detected: hallucinated,
        })
    }

    /// Resolves retrieved hits into `[Source i: <display name>] <text>`
    /// material for the prompt, matching the pipeline's own chunk-fetch step.
    async fn build_context_sources(&self, hits: &[ragcore_core::SearchHit]) -> Result<Vec<ContextSource>> {
        let chunk_ids: Vec<ChunkId> = hits.iter().map(|h| h.chunk_id).collect();
        let chunks = self.vector_store.chunks_by_ids(&chunk_ids).await?;
        let chunk_text: HashMap<ChunkId, String> = chunks.into_iter().map(|c| (c.id, c.text)).collect();

        let mut display_names: HashMap<DocumentId, String> = HashMap::new();
        let mut sources = Vec::with_capacity(hits.len());
        for hit in hits {
            let display_name = match display_names.get(&hit.document_id) {
                Some(name) => name.clone(),
                None => {
                    let name = self.relational_store.get_document(hit.document_id).await?.display_name;
                    display_names.insert(hit.document_id, name.clone());
                    name
                }
            };
            sources.push(ContextSource {
                document_display_name: display_name,
                chunk_text: chunk_text.get(&hit.chunk_id).cloned().unwrap_or_default(),
            });
        }
        Ok(sources)
    }

    async fn persist(&self, run: &EvaluationRun) {
        if let Err(err) = self.relational_store.upsert_evaluation_run(run.id, run.to_value()).await {
            tracing::error!(run_id = %run.id, %err, "failed to persist evaluation run");
        }
    }
}

async fn generate_answer(
    llm: &Arc<dyn LlmDriver>,
    messages: &[ChatMessage],
    model: &str,
    ctx: &RequestContext,
) -> Result<String> {
    let stream = generate_stream(llm, messages, model, &ChatOptions::default(), ctx).await?;
    collect_stream(stream.tokens).await
}

fn score<T: Eq + std::hash::Hash + Clone>(
    retrieved_in_order: &[T],
    relevant: &std::collections::HashSet<T>,
) -> (HashMap<usize, f32>, HashMap<usize, f32>, f32) {
    let precision_at = PRECISION_KS.iter().map(|&k| (k, precision_at_k(retrieved_in_order, relevant, k))).collect();
    let recall_at = RECALL_KS.iter().map(|&k| (k, recall_at_k(retrieved_in_order, relevant, k))).collect();
    (precision_at, recall_at, mrr(retrieved_in_order, relevant))
}

fn aggregate(results: &[PerQueryResult]) -> AggregateMetrics {
    let query_count = results.len();
    if query_count == 0 {
        return AggregateMetrics::default();
    }

    let mut avg_precision_at = HashMap::new();
    for &k in PRECISION_KS {
        let sum: f32 = results.iter().filter_map(|r| r.precision_at.get(&k)).sum();
        avg_precision_at.insert(k, sum / query_count as f32);
    }

    let mut avg_recall_at = HashMap::new();
    for &k in RECALL_KS {
        let sum: f32 = results.iter().filter_map(|r| r.recall_at.get(&k)).sum();
        avg_recall_at.insert(k, sum / query_count as f32);
    }

    let avg_mrr = results.iter().map(|r| r.mrr).sum::<f32>() / query_count as f32;
    let avg_latency_ms = results.iter().map(|r| r.latency_ms as f64).sum::<f64>() / query_count as f64;

    let groundedness_scores: Vec<f32> = results.iter().filter_map(|r| r.groundedness).collect();
    let avg_groundedness =
        if groundedness_scores.is_empty() { None } else { Some(groundedness_scores.iter().sum::<f32>() / groundedness_scores.len() as f32) };

    AggregateMetrics { query_count, avg_precision_at, avg_recall_at, avg_mrr, avg_groundedness, avg_latency_ms }
}

fn aggregate_by_category(results: &[PerQueryResult]) -> HashMap<QueryType, AggregateMetrics> {
    let mut by_category: HashMap<QueryType, Vec<PerQueryResult>> = HashMap::new();
    for result in results {
        by_category.entry(result.category).or_default().push(result.clone());
    }
    by_category.into_iter().map(|(category, results)| (category, aggregate(&results))).collect()
}

/// Delta between two completed runs' aggregate metrics (§4.9 step 4).
/// Every field except latency follows a candidate-minus-baseline, higher-is-
/// better convention. `delta_latency_ms` is the odd one out: per the
/// lower-is-better convention it reports `baseline.latency - candidate.latency`,
/// so a candidate that got slower yields a negative delta.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunComparison {
    pub delta_precision_at_5: f32,
    pub delta_recall_at_20: f32,
    pub delta_groundedness: Option<f32>,
    pub delta_latency_ms: f64,
}

/// Compares `baseline` against `candidate`; errors if either run has no
/// aggregate metrics (i.e. wasn't completed).
pub fn compare_runs(baseline: &EvaluationRun, candidate: &EvaluationRun) -> Result<RunComparison> {
    let base = baseline.aggregate.as_ref().ok_or_else(|| RagError::validation("baseline run has no aggregate metrics"))?;
    let candidate_agg =
        candidate.aggregate.as_ref().ok_or_else(|| RagError::validation("candidate run has no aggregate metrics"))?;

    let delta_groundedness = match (base.avg_groundedness, candidate_agg.avg_groundedness) {
        (Some(b), Some(c)) => Some(c - b),
        _ => None,
    };

    Ok(RunComparison {
        delta_precision_at_5: candidate_agg.avg_precision_at.get(&5).copied().unwrap_or(0.0)
            - base.avg_precision_at.get(&5).copied().unwrap_or(0.0),
        delta_recall_at_20: candidate_agg.avg_recall_at.get(&20).copied().unwrap_or(0.0)
            - base.avg_recall_at.get(&20).copied().unwrap_or(0.0),
        delta_groundedness,
        delta_latency_ms: base.avg_latency_ms - candidate_agg.avg_latency_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(precision5: f32, recall20: f32, groundedness: Option<f32>, latency_ms: i64) -> PerQueryResult {
        PerQueryResult {
            golden_query_id: "q".to_string(),
            category: QueryType::Factual,
            retrieved_chunk_ids: Vec::new(),
            retrieved_document_ids: Vec::new(),
            response_preview: String::new(),
            latency_ms,
            precision_at: HashMap::from([(5, precision5)]),
            recall_at: HashMap::from([(20, recall20)]),
            mrr: 0.5,
            groundedness,
            answer_relevance: None,
            key_facts_covered: None,
            hallucination_detected: None,
        }
    }

    #[test]
    fn aggregate_averages_across_queries() {
        let results = vec![result(1.0, 1.0, Some(1.0), 100), result(0.0, 0.0, Some(0.0), 200)];
        let agg = aggregate(&results);
        assert!((agg.avg_precision_at[&5] - 0.5).abs() < f32::EPSILON);
        assert!((agg.avg_recall_at[&20] - 0.5).abs() < f32::EPSILON);
        assert!((agg.avg_latency_ms - 150.0).abs() < f64::EPSILON);
        assert!((agg.avg_groundedness.unwrap() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn empty_results_produce_a_zeroed_aggregate() {
        let agg = aggregate(&[]);
        assert_eq!(agg.query_count, 0);
        assert!(agg.avg_groundedness.is_none());
    }

    #[test]
    fn compare_runs_reports_latency_and_precision_deltas() {
        // Candidate is faster than baseline (150ms vs 200ms): under the
        // lower-is-better convention (baseline - candidate), that is a
        // positive delta.
        let mut baseline = bare_run();
        baseline.aggregate = Some(aggregate(&[result(0.5, 0.5, Some(0.5), 200)]));
        let mut candidate = bare_run();
        candidate.aggregate = Some(aggregate(&[result(0.8, 0.6, Some(0.7), 150)]));

        let comparison = compare_runs(&baseline, &candidate).unwrap();
        assert!((comparison.delta_precision_at_5 - 0.3).abs() < f32::EPSILON);
        assert!((comparison.delta_recall_at_20 - 0.1).abs() < f32::EPSILON);
        assert!((comparison.delta_latency_ms - 50.0).abs() < f64::EPSILON);
        assert!((comparison.delta_groundedness.unwrap() - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn compare_runs_reports_a_negative_latency_delta_when_candidate_is_slower() {
        let mut baseline = bare_run();
        baseline.aggregate = Some(aggregate(&[result(0.5, 0.5, None, 100)]));
        let mut candidate = bare_run();
        candidate.aggregate = Some(aggregate(&[result(0.5, 0.5, None, 250)]));

        let comparison = compare_runs(&baseline, &candidate).unwrap();
        assert!(comparison.delta_latency_ms < 0.0);
    }

    #[test]
    fn comparing_an_incomplete_run_is_an_error() {
        let baseline = bare_run();
        let candidate = bare_run();
        assert!(compare_runs(&baseline, &candidate).is_err());
    }

    fn bare_run() -> EvaluationRun {
        EvaluationRun {
            id: EvaluationRunId::new(),
            version_label: "v1".to_string(),
            config: EvaluationConfig {
                pipeline: PipelineConfig::default(),
                embedding_model: "test-embed".to_string(),
                llm_model: "test-llm".to_string(),
                evaluate_generation: false,
            },
            status: EvaluationStatus::Completed,
            results: Vec::new(),
            aggregate: None,
            per_category: HashMap::new(),
            started_at: None,
            completed_at: None,
            error_message: None,
        }
    }
}
