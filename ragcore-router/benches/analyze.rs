//! Performance benchmark for the query-analysis hot path.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ragcore_router::analyze;

const QUERIES: &[&str] = &[
    "What is the onboarding process?",
    "Who reports to Maria Schmidt and the latter also leads Projekt Atlas?",
    "List all active vendor contracts for this quarter across departments",
    "Show me the table with all department budgets broken down by row and column",
    "Compare the 2023 and 2024 budgets for the marketing and sales departments",
];

fn bench_analyze(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze");

    for (i, query) in QUERIES.iter().enumerate() {
        group.bench_with_input(BenchmarkId::new("query", i), query, |b, query| {
            b.iter(|| analyze(black_box(query), black_box(true)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_analyze);
criterion_main!(benches);
