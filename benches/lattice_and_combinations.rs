//! Benchmarks for the two combinatorially-sensitive hot paths: segment
//! lattice enumeration and the recommendation engine's rule-combination
//! search.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pricing_intel_core::prelude::*;

fn bench_lattice_enumeration(c: &mut Criterion) {
    c.bench_function("segment_lattice_enumerate", |b| {
        b.iter(|| black_box(SegmentLattice::enumerate()))
    });
}

fn bench_rule_generation_and_recommendation(c: &mut Criterion) {
    let engine = ForecastEngine::without_model(SegmentLattice::default());
    let baselines = engine.compute_baselines(&[], &[]);
    let rules = RuleGenerator::new().generate(&baselines).unwrap();
    let recommendation_engine = RecommendationEngine::default();

    c.bench_function("recommendation_combination_search", |b| {
        b.iter(|| black_box(recommendation_engine.recommend(&rules, &baselines).unwrap()))
    });
}

criterion_group!(benches, bench_lattice_enumeration, bench_rule_generation_and_recommendation);
criterion_main!(benches);
