use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use approx::assert_relative_eq;
use chrono::{TimeZone, Utc};
use series_parity::core::TimeRange;
use series_parity::reachability::{
    CutoverRecord, InMemoryProbe, InputAvailability, NoopProbe, ReachabilityProbe,
};

fn record(kind: &str, canonical_used: bool, available: bool) -> CutoverRecord {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
    CutoverRecord {
        computation_kind: kind.to_owned(),
        canonical_used,
        outcome: if canonical_used {
            "use_canonical_validated".to_owned()
        } else {
            "use_legacy:canonical_unavailable".to_owned()
        },
        inputs: vec![InputAvailability {
            metric_id: "weight".to_owned(),
            canonical_available: available,
            canonical_samples: if available { 31 } else { 0 },
            legacy_samples: 31,
        }],
        legacy_sample_count: 31,
        canonical_sample_count: if available { 31 } else { 0 },
        requested_range: TimeRange::new(start, end).unwrap(),
        parity_passed: None,
        result_ok: true,
        captured_at: Utc::now(),
    }
}

#[test]
fn probe_keeps_records_in_arrival_order() {
    let probe = InMemoryProbe::new();
    assert!(probe.is_empty());
    probe.record(record("trend", true, true));
    probe.record(record("histogram", false, false));

    let snapshot = probe.snapshot();
    assert_eq!(probe.len(), 2);
    assert_eq!(snapshot[0].computation_kind, "trend");
    assert_eq!(snapshot[1].computation_kind, "histogram");
    assert!(!snapshot[1].canonical_available());
}

#[test]
fn snapshot_is_isolated_from_later_writes() {
    let probe = InMemoryProbe::new();
    probe.record(record("trend", true, true));
    let snapshot = probe.snapshot();
    probe.record(record("trend", false, true));
    assert_eq!(snapshot.len(), 1);
    assert_eq!(probe.len(), 2);
}

#[test]
fn clear_discards_every_record() {
    let probe = InMemoryProbe::new();
    probe.record(record("trend", true, true));
    probe.clear();
    assert!(probe.is_empty());
    assert!(probe.snapshot().is_empty());
}

#[test]
fn summary_counts_paths_per_kind() {
    let probe = InMemoryProbe::new();
    probe.record(record("trend", true, true));
    probe.record(record("trend", true, true));
    probe.record(record("trend", false, false));
    probe.record(record("histogram", false, false));

    let summary = probe.summary();
    assert_eq!(summary.total, 4);
    let trend = summary.by_kind["trend"];
    assert_eq!((trend.canonical, trend.legacy, trend.canonical_unavailable), (2, 1, 1));
    assert_relative_eq!(trend.canonical_ratio(), 2.0 / 3.0);
    assert_relative_eq!(summary.by_kind["histogram"].canonical_ratio(), 0.0);
}

#[test]
fn concurrent_writers_lose_no_records() {
    let probe = Arc::new(InMemoryProbe::new());
    let writers: Vec<_> = (0..8)
        .map(|writer| {
            let probe = Arc::clone(&probe);
            thread::spawn(move || {
                for index in 0..250 {
                    probe.record(record(&format!("kind_{writer}"), index % 2 == 0, true));
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().expect("writer thread");
    }

    assert_eq!(probe.len(), 2000);
    let summary = probe.summary();
    assert_eq!(summary.by_kind.len(), 8);
    for counts in summary.by_kind.values() {
        assert_eq!(counts.canonical, 125);
        assert_eq!(counts.legacy, 125);
    }
}

#[test]
fn snapshots_taken_during_writes_only_grow() {
    let probe = Arc::new(InMemoryProbe::new());
    let done = Arc::new(AtomicBool::new(false));
    let reader = {
        let probe = Arc::clone(&probe);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut last = 0;
            let mut reads = 0;
            while !done.load(Ordering::Acquire) || reads == 0 {
                let seen = probe.snapshot().len();
                assert!(seen >= last, "snapshot shrank from {last} to {seen}");
                last = seen;
                reads += 1;
            }
            reads
        })
    };
    let writers: Vec<_> = (0..4)
        .map(|writer| {
            let probe = Arc::clone(&probe);
            thread::spawn(move || {
                for _ in 0..500 {
                    probe.record(record(&format!("kind_{writer}"), true, true));
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().expect("writer thread");
    }
    done.store(true, Ordering::Release);

    assert!(reader.join().expect("reader thread") > 0);
    assert_eq!(probe.snapshot().len(), 2000);
    assert_eq!(probe.summary().total, 2000);
}

#[test]
fn records_after_clear_remain_visible() {
    let probe = InMemoryProbe::new();
    probe.record(record("trend", true, true));
    probe.record(record("trend", true, true));
    probe.clear();
    probe.record(record("histogram", false, false));

    let kept = probe.snapshot();
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].computation_kind, "histogram");
}

#[test]
fn summary_counts_failed_results() {
    let probe = InMemoryProbe::new();
    probe.record(record("trend", true, true));
    probe.record(CutoverRecord {
        result_ok: false,
        ..record("trend", false, true)
    });
    assert_eq!(probe.summary().by_kind["trend"].failed, 1);
}

#[test]
fn shared_probe_handle_records_through_arc() {
    let probe = Arc::new(InMemoryProbe::new());
    let handle: Arc<dyn ReachabilityProbe> = Arc::clone(&probe) as _;
    handle.record(record("trend", true, true));
    NoopProbe.record(record("trend", true, true));
    assert_eq!(probe.len(), 1);
}

#[test]
fn records_serialize_for_export() {
    let text = serde_json::to_string(&record("trend", true, true)).expect("serialize");
    let back: CutoverRecord = serde_json::from_str(&text).expect("deserialize");
    assert_eq!(back.computation_kind, "trend");
    assert!(!text.contains("parity_passed"));
    assert!(back.result_ok);
}
