//! ABOUTME: `ragcore eval run` / `ragcore eval compare` (§4.9): seeds the golden dataset,
//! ABOUTME: runs it to completion, and prints the result or the baseline/candidate delta

use super::wiring;
use crate::cli::OutputFormat;
use ragcore_adapters::RelationalStore;
use ragcore_core::{EvaluationRunId, GoldenQuery};
use ragcore_eval::{compare_runs, EvalHarness, EvaluationConfig, EvaluationRun};
use ragcore_config::RagConfig;
use std::path::Path;

/// Loads a JSON array of [`GoldenQuery`] and upserts each into the harness's
/// relational store so `EvalHarness::run` finds them via `list_golden_queries`.
async fn seed_dataset(
    relational_store: &dyn RelationalStore,
    dataset: &Path,
) -> anyhow::Result<usize> {
    let raw = tokio::fs::read_to_string(dataset).await.map_err(|e| anyhow::anyhow!("reading {dataset:?}: {e}"))?;
    let queries: Vec<GoldenQuery> =
        serde_json::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {dataset:?} as a golden-query array: {e}"))?;
    let count = queries.len();
    for query in queries {
        relational_store.upsert_golden_query(query).await?;
    }
    Ok(count)
}

pub async fn run(
    config: RagConfig,
    dataset: &Path,
    version_label: String,
    evaluate_generation: bool,
    output: OutputFormat,
) -> anyhow::Result<()> {
    let adapters = wiring::build(&config)?;
    let seeded = seed_dataset(adapters.relational_store.as_ref(), dataset).await?;
    tracing::info!(count = seeded, dataset = %dataset.display(), "seeded golden dataset");

    let harness = EvalHarness::new(
        adapters.embedding,
        adapters.vector_store,
        adapters.reranker,
        adapters.graph_store,
        adapters.relational_store,
        adapters.cache,
        adapters.llm,
    );

    let eval_config = EvaluationConfig {
        pipeline: config.pipeline.clone(),
        embedding_model: config.models.default_model.clone(),
        llm_model: config.models.default_model.clone(),
        evaluate_generation,
    };

    let run = harness.run(EvaluationRunId::new(), version_label, eval_config).await?;
    print_run(&run, output);
    Ok(())
}

pub async fn compare(config: RagConfig, baseline: &str, candidate: &str, output: OutputFormat) -> anyhow::Result<()> {
    let adapters = wiring::build(&config)?;
    let baseline_run = fetch_run(adapters.relational_store.as_ref(), baseline).await?;
    let candidate_run = fetch_run(adapters.relational_store.as_ref(), candidate).await?;
    let comparison = compare_runs(&baseline_run, &candidate_run)?;

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&comparison)?),
        OutputFormat::Text => {
            println!("baseline={baseline} candidate={candidate}");
            println!("  delta precision@5:  {:+.4}", comparison.delta_precision_at_5);
            println!("  delta recall@20:    {:+.4}", comparison.delta_recall_at_20);
            println!("  delta groundedness: {}", fmt_opt(comparison.delta_groundedness));
            println!("  delta latency (ms): {:+.1}", comparison.delta_latency_ms);
        }
    }
    Ok(())
}

async fn fetch_run(relational_store: &dyn RelationalStore, raw_id: &str) -> anyhow::Result<EvaluationRun> {
    let id: EvaluationRunId = raw_id.parse().map_err(|_| anyhow::anyhow!("invalid run id: {raw_id}"))?;
    let value = relational_store.get_evaluation_run(id).await?;
    Ok(serde_json::from_value(value)?)
}

fn print_run(run: &EvaluationRun, output: OutputFormat) {
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(run).unwrap_or_default()),
        OutputFormat::Text => {
            println!("run {} [{}] status={:?}", run.id, run.version_label, run.status);
            if let Some(agg) = &run.aggregate {
                println!("  queries:      {}", agg.query_count);
                println!("  avg mrr:      {:.4}", agg.avg_mrr);
                println!("  avg latency:  {:.1}ms", agg.avg_latency_ms);
                println!("  groundedness: {}", fmt_opt(agg.avg_groundedness));
            }
            if let Some(error) = &run.error_message {
                println!("  error: {error}");
            }
        }
    }
}

fn fmt_opt(value: Option<f32>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.4}"))
}
