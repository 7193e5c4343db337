use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ParityError, ParityResult};

/// Inclusive UTC time range requested by a computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "TimeRangeRecord")]
pub struct TimeRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct TimeRangeRecord {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<TimeRangeRecord> for TimeRange {
    type Error = ParityError;

    fn try_from(record: TimeRangeRecord) -> ParityResult<Self> {
        Self::new(record.start, record.end)
    }
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> ParityResult<Self> {
        if start > end {
            return Err(ParityError::InvalidData(format!(
                "time range start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Builds the range covering both instants regardless of argument order.
    #[must_use]
    pub fn spanning(a: DateTime<Utc>, b: DateTime<Utc>) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    #[must_use]
    pub fn start(self) -> DateTime<Utc> {
        self.start
    }

    #[must_use]
    pub fn end(self) -> DateTime<Utc> {
        self.end
    }

    #[must_use]
    pub fn contains(self, time: DateTime<Utc>) -> bool {
        time >= self.start && time <= self.end
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}
