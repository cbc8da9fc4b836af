//! Engine benchmarks
//!
//! Three workloads:
//! 1. Left recursion - R ::= R 'a' | 'a' over growing inputs
//! 2. Expressions - a left-recursive sum grammar over numeric terms
//! 3. Batch - many small documents against one shared grammar
//!
//! Run with: cargo bench --bench engine
//! Parallel batch: cargo bench --bench engine --features parallel

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lingwah::{parse_batch, parse_batch_parallel, Choice, Grammar, GrammarBuilder, ParseContext, ParserId};

// ============================================================================
// Grammars
// ============================================================================

fn left_recursive() -> (Grammar, ParserId) {
    let mut b = GrammarBuilder::new();
    let r = b.declare("R");
    let a = b.literal("a");
    let r_a = b.sequence([r, a]);
    b.define(r, Choice::new([r_a, a])).unwrap();
    (b.build().unwrap(), r)
}

fn sums() -> (Grammar, ParserId) {
    let mut b = GrammarBuilder::new();
    let expr = b.declare("expr");
    let ws = b.regex(r"\s*").unwrap();
    let num = b.regex("[0-9]+").unwrap();
    let plus = b.literal("+");
    let term = b.sequence([ws, num, ws]);
    let sum = b.sequence([expr, plus, term]);
    b.define(expr, Choice::new([sum, term])).unwrap();
    (b.build().unwrap(), expr)
}

fn sum_input(terms: usize) -> String {
    (0..terms)
        .map(|i| (i * 37 % 1000).to_string())
        .collect::<Vec<_>>()
        .join(" + ")
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_left_recursion(c: &mut Criterion) {
    let (grammar, root) = left_recursive();
    let grammar = Arc::new(grammar);

    let mut group = c.benchmark_group("left_recursion");
    for n in [16, 64, 256] {
        let input = "a".repeat(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &input, |b, input| {
            b.iter(|| {
                let ctx = ParseContext::new(Arc::clone(&grammar), input.as_str()).unwrap();
                black_box(ctx.parse_complete(root).unwrap())
            })
        });
    }
    group.finish();
}

fn bench_expressions(c: &mut Criterion) {
    let (grammar, root) = sums();
    let grammar = Arc::new(grammar);

    let mut group = c.benchmark_group("expressions");
    for terms in [8, 32, 128] {
        let input = sum_input(terms);
        group.bench_with_input(BenchmarkId::from_parameter(terms), &input, |b, input| {
            b.iter(|| {
                let ctx = ParseContext::new(Arc::clone(&grammar), input.as_str()).unwrap();
                black_box(ctx.parse_complete(root).unwrap())
            })
        });
    }
    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let (grammar, root) = sums();
    let grammar = Arc::new(grammar);
    let inputs: Vec<String> = (1..=64).map(sum_input).collect();
    let docs: Vec<&str> = inputs.iter().map(String::as_str).collect();

    let mut group = c.benchmark_group("batch");
    group.bench_function("sequential", |b| {
        b.iter(|| black_box(parse_batch(&grammar, root, &docs)))
    });
    group.bench_function("parallel", |b| {
        b.iter(|| black_box(parse_batch_parallel(&grammar, root, &docs)))
    });
    group.finish();
}

criterion_group!(benches, bench_left_recursion, bench_expressions, bench_batch);
criterion_main!(benches);
