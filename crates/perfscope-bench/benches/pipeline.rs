//! Pipeline benchmarks: assembly, aggregation and selection.
//!
//! Run with: cargo bench -p perfscope-bench --bench pipeline

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use perfscope_analysis::coverage::CoverageSelector;
use perfscope_analysis::profile::{OutlierFilter, ProfileAnalyzer};
use perfscope_analysis::trace::TraceAssembler;
use perfscope_bench::fixtures::{generate_coverage, generate_trace_family, FixtureSize};

fn trace_assembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("trace_assembly");
    group.sample_size(10);

    for size in [FixtureSize::Micro, FixtureSize::Small] {
        let dir = tempfile::tempdir().unwrap();
        let fixture = generate_trace_family(dir.path(), "Bench", size, 42);
        let assembler = TraceAssembler::new();
        group.bench_with_input(
            BenchmarkId::new("assemble", fixture.total_events()),
            &fixture.base_path,
            |b, base| b.iter(|| assembler.assemble(base)),
        );
    }
    group.finish();
}

fn aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregation");
    group.sample_size(10);

    let dir = tempfile::tempdir().unwrap();
    let fixture = generate_trace_family(dir.path(), "Bench", FixtureSize::Small, 42);
    let assembled = TraceAssembler::new().assemble(&fixture.base_path).data;

    let plain = ProfileAnalyzer::new(None);
    group.bench_function("running_totals", |b| b.iter(|| plain.analyze_assembled(&assembled)));

    let filtered = ProfileAnalyzer::new(Some(OutlierFilter::default()));
    group.bench_function("outlier_filtered", |b| b.iter(|| filtered.analyze_assembled(&assembled)));
    group.finish();
}

fn selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("coverage_selection");
    let selector = CoverageSelector::default();

    for benchmarks in [50, 500] {
        let fixture = generate_coverage(10, 50, benchmarks, 7);
        group.bench_with_input(BenchmarkId::new("greedy", benchmarks), &fixture, |b, f| {
            b.iter(|| selector.select(&f.targets, &f.benchmarks))
        });
    }
    group.finish();
}

criterion_group!(benches, trace_assembly, aggregation, selection);
criterion_main!(benches);
