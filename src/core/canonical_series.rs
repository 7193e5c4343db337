use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{ParityError, ParityResult};
use crate::extensions::{CreationEvent, ObserverRegistry};

use super::{TimeAxis, TimeRange};

/// Opaque, non-empty identity token of a canonical series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SeriesId(String);

impl SeriesId {
    pub fn new(token: impl Into<String>) -> ParityResult<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ParityError::InvalidData(
                "series id must not be empty".to_owned(),
            ));
        }
        Ok(Self(token))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SeriesId {
    type Error = ParityError;

    fn try_from(token: String) -> ParityResult<Self> {
        Self::new(token)
    }
}

impl From<SeriesId> for String {
    fn from(id: SeriesId) -> Self {
        id.0
    }
}

impl std::fmt::Display for SeriesId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalized time series produced by the normalization pipeline.
///
/// Timestamps and values are parallel sequences of equal, non-zero length.
/// `None` values mark gaps. Instances cannot be mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CanonicalSeriesRecord")]
pub struct CanonicalSeries {
    id: SeriesId,
    time_axis: TimeAxis,
    dimensions: IndexMap<String, String>,
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<Option<f64>>,
    provenance: IndexMap<String, String>,
}

#[derive(Deserialize)]
struct CanonicalSeriesRecord {
    id: SeriesId,
    time_axis: TimeAxis,
    #[serde(default)]
    dimensions: IndexMap<String, String>,
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<Option<f64>>,
    #[serde(default)]
    provenance: IndexMap<String, String>,
}

impl TryFrom<CanonicalSeriesRecord> for CanonicalSeries {
    type Error = ParityError;

    fn try_from(record: CanonicalSeriesRecord) -> ParityResult<Self> {
        Self::new(
            record.id,
            record.time_axis,
            record.dimensions,
            record.timestamps,
            record.values,
            record.provenance,
        )
    }
}

impl CanonicalSeries {
    pub fn new(
        id: SeriesId,
        time_axis: TimeAxis,
        dimensions: IndexMap<String, String>,
        timestamps: Vec<DateTime<Utc>>,
        values: Vec<Option<f64>>,
        provenance: IndexMap<String, String>,
    ) -> ParityResult<Self> {
        if timestamps.len() != values.len() {
            return Err(ParityError::LengthMismatch {
                timestamps: timestamps.len(),
                values: values.len(),
            });
        }
        if timestamps.is_empty() {
            return Err(ParityError::InvalidData(format!(
                "series `{id}` must contain at least one sample"
            )));
        }
        if let Some(index) = values
            .iter()
            .position(|value| value.is_some_and(|v| !v.is_finite()))
        {
            return Err(ParityError::InvalidData(format!(
                "series `{id}` value at index {index} must be finite"
            )));
        }

        Ok(Self {
            id,
            time_axis,
            dimensions,
            timestamps,
            values,
            provenance,
        })
    }

    #[must_use]
    pub fn builder(id: impl Into<String>, time_axis: TimeAxis) -> CanonicalSeriesBuilder {
        CanonicalSeriesBuilder::new(id, time_axis)
    }

    #[must_use]
    pub fn id(&self) -> &SeriesId {
        &self.id
    }

    #[must_use]
    pub fn time_axis(&self) -> TimeAxis {
        self.time_axis
    }

    #[must_use]
    pub fn dimensions(&self) -> &IndexMap<String, String> {
        &self.dimensions
    }

    #[must_use]
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    #[must_use]
    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    #[must_use]
    pub fn provenance(&self) -> &IndexMap<String, String> {
        &self.provenance
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Always `false`: construction rejects empty series.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = (DateTime<Utc>, Option<f64>)> + '_ {
        self.timestamps
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }

    /// Range spanned by the earliest and latest timestamp.
    #[must_use]
    pub fn time_range(&self) -> TimeRange {
        let mut start = self.timestamps[0];
        let mut end = self.timestamps[0];
        for &time in &self.timestamps[1..] {
            start = start.min(time);
            end = end.max(time);
        }
        TimeRange::spanning(start, end)
    }

    #[must_use]
    pub fn non_null_count(&self) -> usize {
        self.values.iter().filter(|value| value.is_some()).count()
    }

    #[must_use]
    pub fn sum(&self) -> f64 {
        self.values.iter().flatten().sum()
    }

    /// Number of samples whose timestamp falls inside `range`.
    #[must_use]
    pub fn samples_in(&self, range: TimeRange) -> usize {
        self.timestamps
            .iter()
            .filter(|time| range.contains(**time))
            .count()
    }
}

/// Point-by-point assembler for [`CanonicalSeries`].
#[derive(Debug, Clone)]
pub struct CanonicalSeriesBuilder {
    id: String,
    time_axis: TimeAxis,
    dimensions: IndexMap<String, String>,
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<Option<f64>>,
    provenance: IndexMap<String, String>,
}

impl CanonicalSeriesBuilder {
    #[must_use]
    pub fn new(id: impl Into<String>, time_axis: TimeAxis) -> Self {
        Self {
            id: id.into(),
            time_axis,
            dimensions: IndexMap::new(),
            timestamps: Vec::new(),
            values: Vec::new(),
            provenance: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn dimension(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.dimensions.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn provenance(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.provenance.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn point(mut self, time: DateTime<Utc>, value: Option<f64>) -> Self {
        self.push_point(time, value);
        self
    }

    #[must_use]
    pub fn points(mut self, points: impl IntoIterator<Item = (DateTime<Utc>, Option<f64>)>) -> Self {
        for (time, value) in points {
            self.push_point(time, value);
        }
        self
    }

    /// Adds provenance entries whose keys are not already present.
    pub fn merge_provenance<'a>(
        &mut self,
        entries: impl IntoIterator<Item = (&'a String, &'a String)>,
    ) {
        for (key, value) in entries {
            if !self.provenance.contains_key(key) {
                self.provenance.insert(key.clone(), value.clone());
            }
        }
    }

    pub fn push_point(&mut self, time: DateTime<Utc>, value: Option<f64>) {
        self.timestamps.push(time);
        self.values.push(value);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn build(self) -> ParityResult<CanonicalSeries> {
        let series = CanonicalSeries::new(
            SeriesId::new(self.id)?,
            self.time_axis,
            self.dimensions,
            self.timestamps,
            self.values,
            self.provenance,
        )?;
        trace!(series_id = %series.id, points = series.len(), "built canonical series");
        Ok(series)
    }

    /// Builds the series and reports its creation to every registered observer.
    pub fn build_observed(self, observers: &ObserverRegistry) -> ParityResult<CanonicalSeries> {
        let series = self.build()?;
        observers.notify(&CreationEvent::SeriesCreated {
            series_id: series.id.to_string(),
            points: series.len(),
        });
        Ok(series)
    }
}
