use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::{CanonicalSeries, TimeRange};
use crate::error::{ParityError, ParityResult};
use crate::structure::HierarchyNode;

/// Logical request both computation paths were asked to answer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComputationRequest {
    pub metric_id: String,
    pub range: TimeRange,
}

impl ComputationRequest {
    pub fn new(metric_id: impl Into<String>, range: TimeRange) -> ParityResult<Self> {
        let metric_id = metric_id.into();
        if metric_id.trim().is_empty() {
            return Err(ParityError::InvalidData(
                "computation metric id must not be empty".to_owned(),
            ));
        }
        Ok(Self { metric_id, range })
    }
}

/// Position of a sample on the time axis: an instant or a bucket index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleTime {
    Instant(DateTime<Utc>),
    Bucket(i64),
}

impl fmt::Display for SampleTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instant(time) => f.write_str(&time.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Self::Bucket(index) => write!(f, "bucket#{index}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResultSample {
    pub time: SampleTime,
    pub value: Option<f64>,
}

impl ResultSample {
    #[must_use]
    pub fn at(time: DateTime<Utc>, value: Option<f64>) -> Self {
        Self {
            time: SampleTime::Instant(time),
            value,
        }
    }

    #[must_use]
    pub fn bucket(index: i64, value: Option<f64>) -> Self {
        Self {
            time: SampleTime::Bucket(index),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSeries {
    pub key: String,
    pub samples: Vec<ResultSample>,
}

impl ResultSeries {
    #[must_use]
    pub fn new(key: impl Into<String>, samples: Vec<ResultSample>) -> Self {
        Self {
            key: key.into(),
            samples,
        }
    }

    #[must_use]
    pub fn non_null_count(&self) -> usize {
        self.samples
            .iter()
            .filter(|sample| sample.value.is_some())
            .count()
    }
}

/// Already-computed output of one computation path.
///
/// The harness only judges agreement between two of these; how each side
/// produced its numbers is opaque here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputationResult {
    pub request: ComputationRequest,
    #[serde(default)]
    pub series: Vec<ResultSeries>,
    #[serde(default)]
    pub aggregates: IndexMap<String, f64>,
    #[serde(default)]
    pub presentation: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure: Option<HierarchyNode>,
}

impl ComputationResult {
    #[must_use]
    pub fn new(request: ComputationRequest) -> Self {
        Self {
            request,
            series: Vec::new(),
            aggregates: IndexMap::new(),
            presentation: IndexMap::new(),
            structure: None,
        }
    }

    /// Result over canonical series, keeping only samples inside the requested range.
    #[must_use]
    pub fn from_canonical_series(request: ComputationRequest, series: &[CanonicalSeries]) -> Self {
        let range = request.range;
        let series = series
            .iter()
            .map(|entry| {
                ResultSeries::new(
                    entry.id().as_str(),
                    entry
                        .points()
                        .filter(|(time, _)| range.contains(*time))
                        .map(|(time, value)| ResultSample::at(time, value))
                        .collect(),
                )
            })
            .collect();
        Self {
            series,
            ..Self::new(request)
        }
    }

    #[must_use]
    pub fn with_series(mut self, series: ResultSeries) -> Self {
        self.series.push(series);
        self
    }

    #[must_use]
    pub fn with_aggregate(mut self, name: impl Into<String>, value: f64) -> Self {
        self.aggregates.insert(name.into(), value);
        self
    }

    #[must_use]
    pub fn with_presentation(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.presentation.insert(name.into(), text.into());
        self
    }

    #[must_use]
    pub fn with_structure(mut self, structure: HierarchyNode) -> Self {
        self.structure = Some(structure);
        self
    }

    /// Total sample count across every series.
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.series.iter().map(|series| series.samples.len()).sum()
    }
}
