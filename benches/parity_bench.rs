use chrono::{Duration, TimeZone, Utc};
use criterion::{Criterion, criterion_group, criterion_main};
use serde_json::{Map, Value, json};
use series_parity::core::{CanonicalSeries, TimeAxis, TimeRange};
use series_parity::parity::{ComputationRequest, ComputationResult, ParityContext, ParityHarness};
use series_parity::structure::{HierarchyNode, recompute_reference_value};
use std::hint::black_box;

fn wide_document(width: usize, depth: usize) -> Value {
    if depth == 0 {
        return json!(1.5);
    }
    let children: Map<String, Value> = (0..width)
        .map(|i| (format!("field_{i}"), wide_document(width, depth - 1)))
        .collect();
    Value::Object(children)
}

fn bench_reference_value_wide_tree(c: &mut Criterion) {
    let node = HierarchyNode::from_json(&wide_document(12, 3));

    c.bench_function("reference_value_wide_tree_1.7k", |b| {
        b.iter(|| {
            let _ = recompute_reference_value(black_box(&node));
        })
    });
}

fn bench_parity_compare_10k(c: &mut Criterion) {
    let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let series = CanonicalSeries::builder("heart_rate", TimeAxis::daily_utc())
        .points((0..10_000).map(|i| {
            let value = if i % 97 == 0 {
                None
            } else {
                Some(60.0 + (i % 40) as f64 * 0.5)
            };
            (start + Duration::minutes(i), value)
        }))
        .build()
        .expect("valid series");
    let range = TimeRange::new(start, start + Duration::minutes(10_000)).expect("valid range");
    let request = ComputationRequest::new("heart_rate", range).expect("valid request");
    let legacy = ComputationResult::from_canonical_series(
        request.clone(),
        std::slice::from_ref(&series),
    )
        .with_aggregate("total", series.sum());
    let canonical = legacy.clone();
    let context = ParityContext::new(request);
    let harness = ParityHarness::new();

    c.bench_function("parity_compare_10k", |b| {
        b.iter(|| {
            let verdict = harness.compare(
                black_box(&context),
                black_box(&legacy),
                black_box(&canonical),
            );
            assert!(verdict.passed);
        })
    });
}

criterion_group!(
    benches,
    bench_reference_value_wide_tree,
    bench_parity_compare_10k
);
criterion_main!(benches);
