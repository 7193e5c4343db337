//! Per-layer comparison rules. Each check returns every mismatch it finds;
//! legacy is the expected side and canonical the actual side.

use indexmap::IndexMap;

use crate::structure::first_divergence;

use super::{ComputationResult, Mismatch, ParityContext, ResultSeries, ToleranceConfig};

pub(super) fn check_input(
    context: &ParityContext,
    legacy: &ComputationResult,
    canonical: &ComputationResult,
) -> Vec<Mismatch> {
    let expected = &context.request;
    let mut mismatches = Vec::new();
    for (side, result) in [("legacy", legacy), ("canonical", canonical)] {
        if result.request.metric_id != expected.metric_id {
            mismatches.push(
                Mismatch::new(
                    format!("{side} result answers a different metric"),
                    &expected.metric_id,
                    &result.request.metric_id,
                )
                .in_series(side),
            );
        }
        if result.request.range != expected.range {
            mismatches.push(
                Mismatch::new(
                    format!("{side} result covers a different time range"),
                    expected.range,
                    result.request.range,
                )
                .in_series(side),
            );
        }
    }
    mismatches
}

pub(super) fn check_structure(
    legacy: &ComputationResult,
    canonical: &ComputationResult,
) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();
    if legacy.series.len() != canonical.series.len() {
        mismatches.push(Mismatch::new(
            "series count differs",
            legacy.series.len(),
            canonical.series.len(),
        ));
    }

    for (index, (left, right)) in legacy.series.iter().zip(&canonical.series).enumerate() {
        if left.key != right.key {
            mismatches.push(
                Mismatch::new("series key differs", &left.key, &right.key).at_index(index),
            );
        }
        if left.samples.len() != right.samples.len() {
            mismatches.push(
                Mismatch::new(
                    "sample count differs",
                    left.samples.len(),
                    right.samples.len(),
                )
                .in_series(&left.key),
            );
        }
    }

    match (&legacy.structure, &canonical.structure) {
        (Some(left), Some(right)) => {
            if let Some(divergence) = first_divergence(left, right) {
                mismatches.push(
                    Mismatch::new(
                        "hierarchical structure differs",
                        divergence.expected,
                        divergence.actual,
                    )
                    .at_path(divergence.path),
                );
            }
        }
        (Some(left), None) => mismatches.push(
            Mismatch::new("hierarchical structure missing", left.describe(), "absent")
                .at_path("$"),
        ),
        (None, Some(right)) => mismatches.push(
            Mismatch::new("unexpected hierarchical structure", "absent", right.describe())
                .at_path("$"),
        ),
        (None, None) => {}
    }
    mismatches
}

fn paired_series<'a>(
    legacy: &'a ComputationResult,
    canonical: &'a ComputationResult,
) -> impl Iterator<Item = (&'a ResultSeries, &'a ResultSeries)> {
    legacy.series.iter().zip(&canonical.series)
}

pub(super) fn check_temporal(
    legacy: &ComputationResult,
    canonical: &ComputationResult,
) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();
    for (left, right) in paired_series(legacy, canonical) {
        for (index, (expected, actual)) in left.samples.iter().zip(&right.samples).enumerate() {
            if expected.time != actual.time {
                mismatches.push(
                    Mismatch::new("sample time misaligned", expected.time, actual.time)
                        .in_series(&left.key)
                        .at_index(index),
                );
            }
        }
    }
    mismatches
}

fn describe_value(value: Option<f64>) -> String {
    value.map_or_else(|| "null".to_owned(), |value| value.to_string())
}

pub(super) fn check_values(
    legacy: &ComputationResult,
    canonical: &ComputationResult,
    tolerance: ToleranceConfig,
) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();
    for (left, right) in paired_series(legacy, canonical) {
        for (index, (expected, actual)) in left.samples.iter().zip(&right.samples).enumerate() {
            if tolerance.optional_values_match(expected.value, actual.value) {
                continue;
            }
            let reason = match (expected.value, actual.value) {
                (Some(a), Some(b)) => format!("value differs by {}", (a - b).abs()),
                _ => "null versus value".to_owned(),
            };
            mismatches.push(
                Mismatch::new(
                    reason,
                    describe_value(expected.value),
                    describe_value(actual.value),
                )
                .in_series(&left.key)
                .at_index(index),
            );
        }
    }
    mismatches
}

pub(super) fn check_semantics(
    legacy: &ComputationResult,
    canonical: &ComputationResult,
    tolerance: ToleranceConfig,
) -> Vec<Mismatch> {
    let mut mismatches = compare_maps(
        &legacy.aggregates,
        &canonical.aggregates,
        "aggregate",
        |a, b| tolerance.values_match(*a, *b),
    );

    for (left, right) in paired_series(legacy, canonical) {
        let (expected, actual) = (left.non_null_count(), right.non_null_count());
        if expected != actual {
            mismatches.push(
                Mismatch::new("non-null sample count differs", expected, actual)
                    .in_series(&left.key),
            );
        }
    }
    mismatches
}

pub(super) fn check_presentation(
    legacy: &ComputationResult,
    canonical: &ComputationResult,
) -> Vec<Mismatch> {
    compare_maps(
        &legacy.presentation,
        &canonical.presentation,
        "label",
        |a, b| a == b,
    )
}

/// Compares two keyed maps: key sets must be equal and shared entries must agree.
fn compare_maps<V: ToString>(
    expected: &IndexMap<String, V>,
    actual: &IndexMap<String, V>,
    noun: &str,
    agree: impl Fn(&V, &V) -> bool,
) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();
    for (name, left) in expected {
        match actual.get(name) {
            Some(right) if agree(left, right) => {}
            Some(right) => mismatches.push(
                Mismatch::new(format!("{noun} differs"), left.to_string(), right.to_string())
                    .in_series(name),
            ),
            None => mismatches.push(
                Mismatch::new(format!("{noun} missing"), left.to_string(), "absent")
                    .in_series(name),
            ),
        }
    }
    for (name, right) in actual {
        if !expected.contains_key(name) {
            mismatches.push(
                Mismatch::new(format!("unexpected {noun}"), "absent", right.to_string())
                    .in_series(name),
            );
        }
    }
    mismatches
}
