use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::error::{ParityError, ParityResult};

const MAX_OFFSET_MINUTES: i16 = 14 * 60;

/// Timezone attached to a canonical time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SeriesTimeZone {
    #[default]
    Utc,
    FixedOffsetMinutes {
        minutes: i16,
    },
}

impl SeriesTimeZone {
    #[must_use]
    pub fn offset_minutes(self) -> i16 {
        match self {
            Self::Utc => 0,
            Self::FixedOffsetMinutes { minutes } => minutes,
        }
    }

    pub fn fixed_offset(self) -> ParityResult<FixedOffset> {
        let seconds = i32::from(self.offset_minutes()) * 60;
        FixedOffset::east_opt(seconds).ok_or_else(|| {
            ParityError::InvalidData(format!(
                "timezone offset of {} minutes is out of range",
                self.offset_minutes()
            ))
        })
    }

    fn validate(self) -> ParityResult<Self> {
        if !(-MAX_OFFSET_MINUTES..=MAX_OFFSET_MINUTES).contains(&self.offset_minutes()) {
            return Err(ParityError::InvalidData(
                "timezone offset must be between -840 and 840 minutes".to_owned(),
            ));
        }
        Ok(self)
    }
}

/// Time axis description shared by every sample of a canonical series.
///
/// `interval_based` marks samples as the start of a bucket of width
/// `resolution_ms` rather than instantaneous readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "TimeAxisRecord")]
pub struct TimeAxis {
    interval_based: bool,
    resolution_ms: i64,
    timezone: SeriesTimeZone,
}

#[derive(Deserialize)]
struct TimeAxisRecord {
    interval_based: bool,
    resolution_ms: i64,
    #[serde(default)]
    timezone: SeriesTimeZone,
}

impl TryFrom<TimeAxisRecord> for TimeAxis {
    type Error = ParityError;

    fn try_from(record: TimeAxisRecord) -> ParityResult<Self> {
        Self::new(record.interval_based, record.resolution_ms, record.timezone)
    }
}

impl TimeAxis {
    pub fn new(
        interval_based: bool,
        resolution_ms: i64,
        timezone: SeriesTimeZone,
    ) -> ParityResult<Self> {
        if resolution_ms <= 0 {
            return Err(ParityError::InvalidResolution { resolution_ms });
        }
        Ok(Self {
            interval_based,
            resolution_ms,
            timezone: timezone.validate()?,
        })
    }

    /// Daily buckets in UTC.
    #[must_use]
    pub fn daily_utc() -> Self {
        Self {
            interval_based: true,
            resolution_ms: 86_400_000,
            timezone: SeriesTimeZone::Utc,
        }
    }

    #[must_use]
    pub fn interval_based(self) -> bool {
        self.interval_based
    }

    #[must_use]
    pub fn resolution_ms(self) -> i64 {
        self.resolution_ms
    }

    #[must_use]
    pub fn timezone(self) -> SeriesTimeZone {
        self.timezone
    }
}
