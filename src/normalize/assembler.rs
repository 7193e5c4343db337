use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::debug;

use crate::core::primitives::parse_rfc3339_utc;
use crate::core::{
    CanonicalSeries, CanonicalSeriesBuilder, FieldValue, RawObservation, SeriesTimeZone, TimeAxis,
};
use crate::error::{ParityError, ParityResult};

use super::{ExecutionContext, SeriesAssembler};

pub const PARAM_RESOLUTION_MS: &str = "resolution_ms";
pub const PARAM_INTERVAL_BASED: &str = "interval_based";
pub const PARAM_TIMEZONE_OFFSET_MINUTES: &str = "timezone_offset_minutes";

const DEFAULT_RESOLUTION_MS: i64 = 86_400_000;

/// Assembler that produces no series.
///
/// Zero canonical series is a valid result while only early staging logic is
/// in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyAssembler;

impl SeriesAssembler for EmptyAssembler {
    fn name(&self) -> &str {
        "empty"
    }

    fn assemble(
        &self,
        observations: Vec<RawObservation>,
        _context: &ExecutionContext,
    ) -> ParityResult<Vec<CanonicalSeries>> {
        debug!(
            input_count = observations.len(),
            "empty assembler discards staged observations"
        );
        Ok(Vec::new())
    }
}

/// Builds one series per `source_id[/group]` from explicitly named fields.
///
/// The time axis comes from the context parameters `resolution_ms`
/// (default one day), `interval_based` (default `true`) and
/// `timezone_offset_minutes` (default UTC). Non-numeric or non-finite
/// readings become gaps.
#[derive(Debug, Clone)]
pub struct FieldSeriesAssembler {
    value_field: String,
    time_field: Option<String>,
}

impl FieldSeriesAssembler {
    /// Reads sample times from each observation's raw timestamp.
    #[must_use]
    pub fn new(value_field: impl Into<String>) -> Self {
        Self {
            value_field: value_field.into(),
            time_field: None,
        }
    }

    /// Reads sample times from a timestamp or RFC 3339 text field instead.
    #[must_use]
    pub fn with_time_field(mut self, time_field: impl Into<String>) -> Self {
        self.time_field = Some(time_field.into());
        self
    }

    fn time_axis(context: &ExecutionContext) -> ParityResult<TimeAxis> {
        let resolution_ms = context
            .parse::<i64>(PARAM_RESOLUTION_MS)?
            .unwrap_or(DEFAULT_RESOLUTION_MS);
        let interval_based = context.parse::<bool>(PARAM_INTERVAL_BASED)?.unwrap_or(true);
        let timezone = match context.parse::<i16>(PARAM_TIMEZONE_OFFSET_MINUTES)? {
            Some(0) | None => SeriesTimeZone::Utc,
            Some(minutes) => SeriesTimeZone::FixedOffsetMinutes { minutes },
        };
        TimeAxis::new(interval_based, resolution_ms, timezone)
    }

    fn sample_time(&self, observation: &RawObservation) -> ParityResult<DateTime<Utc>> {
        let missing = || ParityError::Stage {
            stage: self.name().to_owned(),
            message: format!(
                "observation from `{}` has no sample time",
                observation.series_key()
            ),
        };
        match &self.time_field {
            Some(field) => match observation.field(field) {
                Some(FieldValue::Timestamp(time)) => Ok(*time),
                Some(FieldValue::Text(raw)) => parse_rfc3339_utc(raw),
                _ => Err(missing()),
            },
            None => observation
                .raw_timestamp()
                .ok_or_else(missing)
                .and_then(parse_rfc3339_utc),
        }
    }
}

impl SeriesAssembler for FieldSeriesAssembler {
    fn name(&self) -> &str {
        "field_series"
    }

    fn assemble(
        &self,
        observations: Vec<RawObservation>,
        context: &ExecutionContext,
    ) -> ParityResult<Vec<CanonicalSeries>> {
        let time_axis = Self::time_axis(context)?;
        let mut builders: IndexMap<String, CanonicalSeriesBuilder> = IndexMap::new();

        for observation in &observations {
            let time = self.sample_time(observation)?;
            let value = observation
                .field(&self.value_field)
                .map(|field| field.as_f64(&self.value_field))
                .transpose()?
                .flatten()
                .filter(|reading| reading.is_finite());

            let key = observation.series_key();
            let builder = builders.entry(key.clone()).or_insert_with(|| {
                let mut builder = CanonicalSeriesBuilder::new(key, time_axis)
                    .dimension("metric", self.value_field.clone())
                    .provenance("source_id", observation.source_id());
                if let Some(group) = observation.group() {
                    builder = builder.dimension("group", group);
                }
                builder
            });
            builder.merge_provenance(observation.provenance());
            builder.push_point(time, value);
        }

        builders
            .into_values()
            .map(CanonicalSeriesBuilder::build)
            .collect()
    }
}
