use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::core::{CanonicalSeries, TimeRange};
use crate::parity::ComputationRequest;
use crate::reachability::InputAvailability;

/// Sample counts available to each path for a metric over a range.
pub trait AvailabilitySource: Send + Sync {
    fn canonical_samples(&self, metric_id: &str, range: TimeRange) -> usize;
    fn legacy_samples(&self, metric_id: &str, range: TimeRange) -> usize;
}

/// Request and required inputs of one logical computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutoverContext {
    pub request: ComputationRequest,
    pub inputs: Vec<String>,
}

impl CutoverContext {
    /// Context whose only required input is the requested metric.
    #[must_use]
    pub fn new(request: ComputationRequest) -> Self {
        let inputs = vec![request.metric_id.clone()];
        Self { request, inputs }
    }

    #[must_use]
    pub fn with_inputs<S: Into<String>>(mut self, inputs: impl IntoIterator<Item = S>) -> Self {
        self.inputs = inputs.into_iter().map(Into::into).collect();
        self
    }

    pub(crate) fn snapshot(&self, source: &dyn AvailabilitySource) -> Vec<InputAvailability> {
        let range = self.request.range;
        self.inputs
            .iter()
            .map(|metric_id| {
                let canonical_samples = source.canonical_samples(metric_id, range);
                InputAvailability {
                    metric_id: metric_id.clone(),
                    canonical_available: canonical_samples > 0,
                    canonical_samples,
                    legacy_samples: source.legacy_samples(metric_id, range),
                }
            })
            .collect()
    }
}

/// In-memory availability index over canonical series and legacy record times.
#[derive(Debug, Clone, Default)]
pub struct SeriesCatalog {
    canonical: IndexMap<String, Vec<CanonicalSeries>>,
    legacy: IndexMap<String, Vec<DateTime<Utc>>>,
}

impl SeriesCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_canonical(mut self, metric_id: impl Into<String>, series: CanonicalSeries) -> Self {
        self.canonical
            .entry(metric_id.into())
            .or_default()
            .push(series);
        self
    }

    #[must_use]
    pub fn with_legacy_records(
        mut self,
        metric_id: impl Into<String>,
        times: impl IntoIterator<Item = DateTime<Utc>>,
    ) -> Self {
        self.legacy
            .entry(metric_id.into())
            .or_default()
            .extend(times);
        self
    }

    #[must_use]
    pub fn canonical_series(&self, metric_id: &str) -> &[CanonicalSeries] {
        self.canonical
            .get(metric_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl AvailabilitySource for SeriesCatalog {
    fn canonical_samples(&self, metric_id: &str, range: TimeRange) -> usize {
        self.canonical_series(metric_id)
            .iter()
            .map(|series| series.samples_in(range))
            .sum()
    }

    fn legacy_samples(&self, metric_id: &str, range: TimeRange) -> usize {
        self.legacy.get(metric_id).map_or(0, |times| {
            times.iter().filter(|time| range.contains(**time)).count()
        })
    }
}
