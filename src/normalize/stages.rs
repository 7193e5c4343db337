//! Built-in normalization stages.

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, warn};

use crate::core::RawObservation;
use crate::core::primitives::parse_rfc3339_utc;
use crate::error::{ParityError, ParityResult};

use super::{ExecutionContext, NormalizationStage};

/// Keeps observations matching a predicate.
pub struct FilterStage<F> {
    name: String,
    predicate: F,
}

impl<F> FilterStage<F>
where
    F: Fn(&RawObservation) -> bool + Send + Sync,
{
    #[must_use]
    pub fn new(name: impl Into<String>, predicate: F) -> Self {
        Self {
            name: name.into(),
            predicate,
        }
    }
}

impl<F> NormalizationStage for FilterStage<F>
where
    F: Fn(&RawObservation) -> bool + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn process(
        &self,
        mut observations: Vec<RawObservation>,
        _context: &ExecutionContext,
    ) -> ParityResult<Vec<RawObservation>> {
        observations.retain(|observation| (self.predicate)(observation));
        Ok(observations)
    }
}

/// Moves a field to a new name. Observations without the field pass through.
#[derive(Debug, Clone)]
pub struct RenameFieldStage {
    from: String,
    to: String,
}

impl RenameFieldStage {
    #[must_use]
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl NormalizationStage for RenameFieldStage {
    fn name(&self) -> &str {
        "rename_field"
    }

    fn process(
        &self,
        observations: Vec<RawObservation>,
        _context: &ExecutionContext,
    ) -> ParityResult<Vec<RawObservation>> {
        Ok(observations
            .into_iter()
            .map(|observation| match observation.field(&self.from).cloned() {
                Some(value) => observation
                    .without_field(&self.from)
                    .with_field(self.to.clone(), value),
                None => observation,
            })
            .collect())
    }
}

/// Drops observations whose numeric field is missing, non-numeric or non-finite.
#[derive(Debug, Clone)]
pub struct DropNonFiniteStage {
    field: String,
}

impl DropNonFiniteStage {
    #[must_use]
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

impl NormalizationStage for DropNonFiniteStage {
    fn name(&self) -> &str {
        "drop_non_finite"
    }

    fn process(
        &self,
        observations: Vec<RawObservation>,
        _context: &ExecutionContext,
    ) -> ParityResult<Vec<RawObservation>> {
        let mut kept = Vec::with_capacity(observations.len());
        for observation in observations {
            let reading = match observation.field(&self.field) {
                Some(value) => value.as_f64(&self.field).map_err(|err| ParityError::Stage {
                    stage: self.name().to_owned(),
                    message: err.to_string(),
                })?,
                None => None,
            };
            if reading.is_some_and(f64::is_finite) {
                kept.push(observation);
            }
        }
        Ok(kept)
    }
}

/// Orders observations by series key and parsed raw timestamp.
///
/// Unparsable or missing timestamps are dropped. Duplicate timestamps within
/// one series keep the last observation in input order. Surviving raw
/// timestamps are rewritten in RFC 3339 UTC form.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalOrderStage;

impl NormalizationStage for CanonicalOrderStage {
    fn name(&self) -> &str {
        "canonical_order"
    }

    fn process(
        &self,
        observations: Vec<RawObservation>,
        _context: &ExecutionContext,
    ) -> ParityResult<Vec<RawObservation>> {
        let original_count = observations.len();
        let mut timed: Vec<(String, DateTime<Utc>, RawObservation)> = observations
            .into_iter()
            .filter_map(|observation| {
                let time = observation
                    .raw_timestamp()
                    .and_then(|raw| parse_rfc3339_utc(raw).ok())?;
                Some((observation.series_key(), time, observation))
            })
            .collect();
        let dropped = original_count - timed.len();
        if dropped > 0 {
            warn!(dropped, "dropping observations without a parsable timestamp");
        }

        // Stable sort keeps input order among equal (key, time) pairs.
        timed.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        let mut deduped: Vec<(String, DateTime<Utc>, RawObservation)> =
            Vec::with_capacity(timed.len());
        for entry in timed {
            if let Some(last) = deduped.last_mut() {
                if last.0 == entry.0 && last.1 == entry.1 {
                    *last = entry;
                    continue;
                }
            }
            deduped.push(entry);
        }

        debug!(
            original_count,
            canonical_count = deduped.len(),
            "canonical order applied"
        );
        Ok(deduped
            .into_iter()
            .map(|(_, time, observation)| {
                observation.with_raw_timestamp(time.to_rfc3339_opts(SecondsFormat::Millis, true))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FieldValue;

    fn observation(source: &str, time: &str, weight: f64) -> RawObservation {
        RawObservation::new(source)
            .with_raw_timestamp(time)
            .with_field("weight", weight)
    }

    #[test]
    fn canonical_order_sorts_and_keeps_last_duplicate() {
        let input = vec![
            observation("scale", "2024-01-02T00:00:00Z", 2.0),
            observation("scale", "2024-01-01T00:00:00Z", 1.0),
            observation("scale", "2024-01-02T00:00:00Z", 2.5),
            observation("scale", "not a time", 9.0),
        ];
        let output = CanonicalOrderStage
            .process(input, &ExecutionContext::new())
            .expect("stage runs");

        assert_eq!(output.len(), 2);
        assert_eq!(output[0].raw_timestamp(), Some("2024-01-01T00:00:00.000Z"));
        assert_eq!(output[1].field("weight"), Some(&FieldValue::Number(2.5)));
    }

    #[test]
    fn drop_non_finite_removes_missing_and_nan_readings() {
        let input = vec![
            observation("scale", "2024-01-01T00:00:00Z", f64::NAN),
            observation("scale", "2024-01-02T00:00:00Z", 70.0),
            RawObservation::new("scale").with_field("weight", "heavy"),
            RawObservation::new("scale"),
        ];
        let output = DropNonFiniteStage::new("weight")
            .process(input, &ExecutionContext::new())
            .expect("stage runs");
        assert_eq!(output.len(), 1);
    }

    #[test]
    fn rename_moves_field_value() {
        let input = vec![RawObservation::new("scale").with_field("kg", 70.0)];
        let output = RenameFieldStage::new("kg", "weight")
            .process(input, &ExecutionContext::new())
            .expect("stage runs");
        assert!(output[0].field("kg").is_none());
        assert_eq!(output[0].field("weight"), Some(&FieldValue::Number(70.0)));
    }
}
