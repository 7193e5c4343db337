use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::{ParityError, ParityResult};

pub fn decimal_to_f64(value: Decimal, field_name: &str) -> ParityResult<f64> {
    value.to_f64().ok_or_else(|| {
        ParityError::InvalidData(format!("{field_name} cannot be represented as f64"))
    })
}

/// Parses an RFC 3339 timestamp and normalizes it to UTC.
pub fn parse_rfc3339_utc(raw: &str) -> ParityResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|time| time.with_timezone(&Utc))
        .map_err(|err| ParityError::InvalidData(format!("invalid RFC 3339 timestamp `{raw}`: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parse_rfc3339_normalizes_offsets_to_utc() {
        let parsed = parse_rfc3339_utc("2024-03-01T02:00:00+02:00").expect("valid timestamp");
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn parse_rfc3339_rejects_garbage() {
        assert!(parse_rfc3339_utc("yesterday").is_err());
    }

    #[test]
    fn decimal_conversion_keeps_magnitude() {
        let value = decimal_to_f64(Decimal::new(12_345, 2), "weight").expect("convertible");
        assert!((value - 123.45).abs() < 1e-12);
    }
}
