//! D-FUMT Performance Benchmarks
//!
//! Critical paths:
//! - Zero extension (cached and uncached)
//! - Fixed-point reduction of synthesized formulas
//! - Selection over growing populations
//! - The full pipeline

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

use dfumt_common::FormulaNode;
use dfumt_engine::{EngineConfig, FormulaEngine, PipelineOptions};
use dfumt_metabolism::{Metabolism, SynthesisMode};
use dfumt_seed::SeedEngine;
use dfumt_selection::{FitnessCalculator, SelectionConfig, SelectionEngine};

// ============ SEED BENCHMARKS ============

fn bench_extension(c: &mut Criterion) {
    let mut group = c.benchmark_group("seed");

    for depth in [4usize, 16, 64].iter() {
        group.bench_with_input(BenchmarkId::new("extend_uncached", depth), depth, |b, &depth| {
            b.iter(|| {
                let mut seed = SeedEngine::default();
                black_box(seed.extend(black_box(1.5), depth).ok())
            });
        });
    }

    group.bench_function("extend_cached", |b| {
        let mut seed = SeedEngine::default();
        b.iter(|| black_box(seed.extend(black_box(1.5), 32).ok()));
    });

    group.finish();
}

// ============ METABOLISM BENCHMARKS ============

fn bench_reduction(c: &mut Criterion) {
    let mut group = c.benchmark_group("metabolism");
    let metabolism = Metabolism::default();

    for width in [4usize, 16, 64].iter() {
        let formula = (1..=*width)
            .map(|i| FormulaNode::constant(i as f64))
            .reduce(|acc, leaf| FormulaNode::binary("+", acc, leaf))
            .unwrap_or_else(|| FormulaNode::constant(0.0));

        group.throughput(Throughput::Elements(*width as u64));
        group.bench_with_input(BenchmarkId::new("reduce_sum", width), &formula, |b, formula| {
            b.iter(|| black_box(metabolism.reduce(black_box(formula), 100)));
        });
    }

    group.bench_function("synthesize_dual", |b| {
        let a = FormulaNode::constant(2.0);
        let n = FormulaNode::constant(-2.0);
        b.iter(|| black_box(metabolism.synthesize(&a, &n, SynthesisMode::Dual)));
    });

    group.finish();
}

// ============ SELECTION BENCHMARKS ============

fn bench_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection");
    group.measurement_time(Duration::from_secs(10));
    let metabolism = Metabolism::default();

    for size in [10usize, 100, 500].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("select", size), size, |b, &size| {
            b.iter(|| {
                let mut engine = match SelectionEngine::new(SelectionConfig::default()) {
                    Ok(engine) => engine,
                    Err(_) => return,
                };
                let population = (0..size)
                    .map(|i| {
                        let synthesis = metabolism.analyze(&FormulaNode::constant(i as f64 * 0.1));
                        let fitness = FitnessCalculator::initial(&synthesis);
                        engine.candidate(synthesis, fitness)
                    })
                    .collect();
                black_box(engine.select(population));
            });
        });
    }

    group.finish();
}

// ============ PIPELINE BENCHMARKS ============

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");

    for len in [2usize, 8, 32].iter() {
        let input: Vec<f64> = (0..*len).map(|i| (i as f64 + 1.0) * 0.75).collect();
        group.bench_with_input(BenchmarkId::new("run", len), &input, |b, input| {
            b.iter(|| {
                let mut engine = match FormulaEngine::new(EngineConfig::default()) {
                    Ok(engine) => engine,
                    Err(_) => return,
                };
                black_box(engine.run(black_box(input), PipelineOptions::default()).ok());
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_extension,
    bench_reduction,
    bench_selection,
    bench_pipeline,
);
criterion_main!(benches);
