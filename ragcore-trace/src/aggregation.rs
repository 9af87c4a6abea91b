//! ABOUTME: Dashboard aggregation queries (§4.8) over recently-closed traces
//! ABOUTME: windows are computed over the tracer's in-memory ring buffer, the same
//! ABOUTME: source durable persistence draws from, so there is no separate query path

use chrono::{DateTime, Duration, Utc};
use ragcore_core::{QueryType, RetrievalStrategy, SpanName, Trace};
use std::collections::HashMap;

/// Real-time window metrics (§4.8 "last 5 min").
#[derive(Debug, Clone, serde::Serialize)]
pub struct RealTimeMetrics {
    pub queries_per_second: f64,
    pub mean_latency_ms: f64,
    pub error_rate: f64,
    pub sample_count: usize,
}

/// Daily rollup metrics (§4.8 "24h").
#[derive(Debug, Clone, serde::Serialize)]
pub struct DailyMetrics {
    pub total_queries: usize,
    pub mean_latency_ms: f64,
    pub p50_latency_ms: i64,
    pub p95_latency_ms: i64,
    pub p99_latency_ms: i64,
    pub error_rate: f64,
}

fn traces_since(traces: &[Trace], since: DateTime<Utc>) -> Vec<&Trace> {
    traces.iter().filter(|t| t.timestamp >= since).collect()
}

/// Queries-per-second, mean latency, and error rate over the last 5 minutes.
#[must_use]
pub fn real_time_metrics(traces: &[Trace], now: DateTime<Utc>) -> RealTimeMetrics {
    let window = traces_since(traces, now - Duration::minutes(5));
    let sample_count = window.len();
    if sample_count == 0 {
        return RealTimeMetrics { queries_per_second: 0.0, mean_latency_ms: 0.0, error_rate: 0.0, sample_count: 0 };
    }

    let latencies: Vec<i64> = window.iter().filter_map(|t| t.total_latency_ms).collect();
    let mean_latency_ms = mean(&latencies);
    let errors = window.iter().filter(|t| !t.success).count();

    RealTimeMetrics {
        queries_per_second: sample_count as f64 / (5.0 * 60.0),
        mean_latency_ms,
        error_rate: errors as f64 / sample_count as f64,
        sample_count,
    }
}

/// Total/mean/p50/p95/p99 latency and error rate over the last 24 hours.
#[must_use]
pub fn daily_metrics(traces: &[Trace], now: DateTime<Utc>) -> DailyMetrics {
    let window = traces_since(traces, now - Duration::hours(24));
    let total_queries = window.len();
    if total_queries == 0 {
        return DailyMetrics {
            total_queries: 0,
            mean_latency_ms: 0.0,
            p50_latency_ms: 0,
            p95_latency_ms: 0,
            p99_latency_ms: 0,
            error_rate: 0.0,
        };
    }

    let mut latencies: Vec<i64> = window.iter().filter_map(|t| t.total_latency_ms).collect();
    latencies.sort_unstable();
    let errors = window.iter().filter(|t| !t.success).count();

    DailyMetrics {
        total_queries,
        mean_latency_ms: mean(&latencies),
        p50_latency_ms: percentile(&latencies, 0.50),
        p95_latency_ms: percentile(&latencies, 0.95),
        p99_latency_ms: percentile(&latencies, 0.99),
        error_rate: errors as f64 / total_queries as f64,
    }
}

/// Mean duration per span name over the last hour, used to spot which
/// pipeline stage is driving overall latency.
#[must_use]
pub fn component_latencies(traces: &[Trace], now: DateTime<Utc>) -> HashMap<SpanName, f64> {
    let window = traces_since(traces, now - Duration::hours(1));
    let mut sums: HashMap<SpanName, (i64, usize)> = HashMap::new();
    for trace in window {
        for span in &trace.spans {
            if let Some(duration) = span.duration_ms() {
                let entry = sums.entry(span.name).or_insert((0, 0));
                entry.0 += duration;
                entry.1 += 1;
            }
        }
    }
    sums.into_iter().map(|(name, (sum, count))| (name, sum as f64 / count as f64)).collect()
}

/// Distribution of query types and retrieval strategies over the last 24h,
/// used to spot drift in what users ask versus how the router routes it.
#[must_use]
pub fn query_distribution(traces: &[Trace], now: DateTime<Utc>) -> (HashMap<QueryType, usize>, HashMap<RetrievalStrategy, usize>) {
    let window = traces_since(traces, now - Duration::hours(24));
    let mut query_types: HashMap<QueryType, usize> = HashMap::new();
    let mut strategies: HashMap<RetrievalStrategy, usize> = HashMap::new();
    for trace in window {
        if let Some(qt) = trace.query_type {
            *query_types.entry(qt).or_insert(0) += 1;
        }
        if let Some(strategy) = trace.strategy {
            *strategies.entry(strategy).or_insert(0) += 1;
        }
    }
    (query_types, strategies)
}

fn mean(values: &[i64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<i64>() as f64 / values.len() as f64
    }
}

/// Nearest-rank percentile over an already-sorted slice.
fn percentile(sorted: &[i64], p: f64) -> i64 {
    if sorted.is_empty() {
        return 0;
    }
    let rank = ((p * sorted.len() as f64).ceil() as usize).saturating_sub(1);
    sorted[rank.min(sorted.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragcore_core::{SpanStatus, TraceId};

    fn trace(minutes_ago: i64, latency_ms: i64, success: bool) -> Trace {
        let now = Utc::now();
        Trace {
            id: TraceId::new(),
            timestamp: now - Duration::minutes(minutes_ago),
            user_id_hash: "abc".to_string(),
            session_id: "s".to_string(),
            query_length: 10,
            query_type: Some(QueryType::Factual),
            strategy: Some(RetrievalStrategy::Hybrid),
            success,
            total_latency_ms: Some(latency_ms),
            tokens_used: None,
            chunks_retrieved: 3,
            chunks_used: 3,
            spans: Vec::new(),
        }
    }

    #[test]
    fn real_time_metrics_ignore_traces_outside_the_five_minute_window() {
        let now = Utc::now();
        let traces = vec![trace(1, 100, true), trace(30, 5000, false)];
        let metrics = real_time_metrics(&traces, now);
        assert_eq!(metrics.sample_count, 1);
        assert!((metrics.mean_latency_ms - 100.0).abs() < f64::EPSILON);
        assert!((metrics.error_rate - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn daily_metrics_compute_percentiles_over_the_24h_window() {
        let now = Utc::now();
        let traces: Vec<Trace> = (1..=100).map(|i| trace(10, i, true)).collect();
        let metrics = daily_metrics(&traces, now);
        assert_eq!(metrics.total_queries, 100);
        assert_eq!(metrics.p50_latency_ms, 50);
        assert_eq!(metrics.p95_latency_ms, 95);
        assert_eq!(metrics.p99_latency_ms, 99);
    }

    #[test]
    fn error_rate_reflects_failed_traces() {
        let now = Utc::now();
        let traces = vec![trace(5, 100, true), trace(5, 100, false), trace(5, 100, false)];
        let metrics = daily_metrics(&traces, now);
        assert!((metrics.error_rate - (2.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn component_latencies_average_per_span_name() {
        let now = Utc::now();
        let mut t = trace(10, 100, true);
        let mut span_a = ragcore_core::Span::start(SpanName::VectorSearch, None);
        span_a.started_at = now - Duration::milliseconds(100);
        span_a.ended_at = Some(now - Duration::milliseconds(50));
        span_a.status = SpanStatus::Ok;
        t.spans.push(span_a);
        let traces = vec![t];

        let latencies = component_latencies(&traces, now);
        assert_eq!(latencies.get(&SpanName::VectorSearch), Some(&50.0));
    }

    #[test]
    fn query_distribution_counts_types_and_strategies() {
        let now = Utc::now();
        let traces = vec![trace(5, 100, true), trace(5, 100, true)];
        let (query_types, strategies) = query_distribution(&traces, now);
        assert_eq!(query_types.get(&QueryType::Factual), Some(&2));
        assert_eq!(strategies.get(&RetrievalStrategy::Hybrid), Some(&2));
    }
}
