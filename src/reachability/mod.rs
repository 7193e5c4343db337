//! Passive telemetry recording which computation path actually ran.
//!
//! Probes only observe: a recorded entry never feeds back into the decision
//! it describes.

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::TimeRange;

/// Availability snapshot of one canonical input at decision time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputAvailability {
    pub metric_id: String,
    pub canonical_available: bool,
    pub canonical_samples: usize,
    pub legacy_samples: usize,
}

/// Reachability record for one executed computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutoverRecord {
    pub computation_kind: String,
    pub canonical_used: bool,
    pub outcome: String,
    pub inputs: Vec<InputAvailability>,
    pub legacy_sample_count: usize,
    pub canonical_sample_count: usize,
    pub requested_range: TimeRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parity_passed: Option<bool>,
    /// `false` when the call ended in an error after the decision.
    #[serde(default = "default_result_ok")]
    pub result_ok: bool,
    pub captured_at: DateTime<Utc>,
}

fn default_result_ok() -> bool {
    true
}

impl CutoverRecord {
    #[must_use]
    pub fn canonical_available(&self) -> bool {
        self.inputs.iter().all(|input| input.canonical_available)
    }
}

pub trait ReachabilityProbe: Send + Sync {
    fn record(&self, entry: CutoverRecord);
}

/// Probe for environments where telemetry must stay disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProbe;

impl ReachabilityProbe for NoopProbe {
    fn record(&self, _entry: CutoverRecord) {}
}

/// Append-only in-memory probe for tests and inspection.
///
/// Writers append without taking a lock and readers walk the published
/// entries, so a snapshot never blocks a concurrent `record`. `clear` moves a
/// watermark; storage is released when the probe is dropped.
#[derive(Default)]
pub struct InMemoryProbe {
    records: boxcar::Vec<CutoverRecord>,
    retained_from: AtomicUsize,
}

impl std::fmt::Debug for InMemoryProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryProbe")
            .field("len", &self.len())
            .finish()
    }
}

/// Per-kind count of canonical versus legacy executions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindReachability {
    pub canonical: usize,
    pub legacy: usize,
    pub canonical_unavailable: usize,
    #[serde(default)]
    pub failed: usize,
}

impl KindReachability {
    /// Share of executions served by the canonical path, `0.0` when empty.
    #[must_use]
    pub fn canonical_ratio(self) -> f64 {
        let total = self.canonical + self.legacy;
        if total == 0 {
            0.0
        } else {
            self.canonical as f64 / total as f64
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReachabilitySummary {
    pub total: usize,
    pub by_kind: IndexMap<String, KindReachability>,
}

impl InMemoryProbe {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn retained(&self) -> impl Iterator<Item = &CutoverRecord> + '_ {
        let from = self.retained_from.load(Ordering::Acquire);
        self.records
            .iter()
            .filter(move |(index, _)| *index >= from)
            .map(|(_, record)| record)
    }

    /// Point-in-time copy of every record captured so far.
    #[must_use]
    pub fn snapshot(&self) -> Vec<CutoverRecord> {
        self.retained().cloned().collect()
    }

    /// Drops every record captured before this call from later reads.
    pub fn clear(&self) {
        self.retained_from
            .fetch_max(self.records.count(), Ordering::AcqRel);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.retained().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn summary(&self) -> ReachabilitySummary {
        let records = self.snapshot();
        let mut summary = ReachabilitySummary {
            total: records.len(),
            by_kind: IndexMap::new(),
        };
        for record in &records {
            let entry = summary
                .by_kind
                .entry(record.computation_kind.clone())
                .or_default();
            if record.canonical_used {
                entry.canonical += 1;
            } else {
                entry.legacy += 1;
            }
            if !record.canonical_available() {
                entry.canonical_unavailable += 1;
            }
            if !record.result_ok {
                entry.failed += 1;
            }
        }
        summary
    }
}

impl ReachabilityProbe for InMemoryProbe {
    fn record(&self, entry: CutoverRecord) {
        trace!(
            kind = %entry.computation_kind,
            canonical_used = entry.canonical_used,
            "reachability record"
        );
        self.records.push(entry);
    }
}

impl<P: ReachabilityProbe + ?Sized> ReachabilityProbe for std::sync::Arc<P> {
    fn record(&self, entry: CutoverRecord) {
        (**self).record(entry);
    }
}
