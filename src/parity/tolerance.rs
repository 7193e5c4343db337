use serde::{Deserialize, Serialize};

use crate::error::{ParityError, ParityResult};

/// Default epsilon used when floating-point drift is allowed.
pub const DEFAULT_VALUE_EPSILON: f64 = 1e-9;

/// Whether a failing layer blocks cut-over or is only recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ParityMode {
    /// Any failing layer fails the verdict; evaluation stops at the first failure.
    #[default]
    Strict,
    /// Every layer is evaluated and reported; used for non-blocking observation.
    Diagnostic,
}

impl ParityMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Diagnostic => "diagnostic",
        }
    }
}

/// Numeric tolerance for value and aggregate comparisons.
///
/// Without drift, values must be exactly equal. With drift, two values match
/// when `|a - b| <= value_epsilon * max(1, |a|, |b|)`: an absolute bound near
/// zero that becomes relative for large magnitudes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ToleranceRecord")]
pub struct ToleranceConfig {
    allow_floating_point_drift: bool,
    value_epsilon: f64,
}

#[derive(Deserialize)]
struct ToleranceRecord {
    allow_floating_point_drift: bool,
    value_epsilon: f64,
}

impl TryFrom<ToleranceRecord> for ToleranceConfig {
    type Error = ParityError;

    fn try_from(record: ToleranceRecord) -> ParityResult<Self> {
        Self::new(record.allow_floating_point_drift, record.value_epsilon)
    }
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            allow_floating_point_drift: false,
            value_epsilon: DEFAULT_VALUE_EPSILON,
        }
    }
}

impl ToleranceConfig {
    pub fn new(allow_floating_point_drift: bool, value_epsilon: f64) -> ParityResult<Self> {
        if !value_epsilon.is_finite() || value_epsilon < 0.0 {
            return Err(ParityError::InvalidData(
                "value epsilon must be finite and >= 0".to_owned(),
            ));
        }
        Ok(Self {
            allow_floating_point_drift,
            value_epsilon,
        })
    }

    #[must_use]
    pub fn exact() -> Self {
        Self::default()
    }

    pub fn with_drift(value_epsilon: f64) -> ParityResult<Self> {
        Self::new(true, value_epsilon)
    }

    #[must_use]
    pub fn allow_floating_point_drift(self) -> bool {
        self.allow_floating_point_drift
    }

    #[must_use]
    pub fn value_epsilon(self) -> f64 {
        self.value_epsilon
    }

    #[must_use]
    pub fn values_match(self, expected: f64, actual: f64) -> bool {
        if expected == actual {
            return true;
        }
        if !self.allow_floating_point_drift || !expected.is_finite() || !actual.is_finite() {
            return false;
        }
        let scale = 1.0_f64.max(expected.abs()).max(actual.abs());
        (expected - actual).abs() <= self.value_epsilon * scale
    }

    /// Null matches null; null never matches a value.
    #[must_use]
    pub fn optional_values_match(self, expected: Option<f64>, actual: Option<f64>) -> bool {
        match (expected, actual) {
            (None, None) => true,
            (Some(expected), Some(actual)) => self.values_match(expected, actual),
            (None, Some(_)) | (Some(_), None) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_mode_ignores_epsilon() {
        let tolerance = ToleranceConfig::new(false, 1.0).expect("valid tolerance");
        assert!(tolerance.values_match(100.0, 100.0));
        assert!(!tolerance.values_match(100.0, 100.01));
    }

    #[test]
    fn drift_scales_with_magnitude() {
        let tolerance = ToleranceConfig::with_drift(1e-6).expect("valid tolerance");
        assert!(tolerance.values_match(1.0e9, 1.0e9 + 100.0));
        assert!(!tolerance.values_match(1.0e9, 1.0e9 + 10_000.0));
        assert!(tolerance.values_match(0.0, 5e-7));
        assert!(!tolerance.values_match(0.0, 5e-6));
    }

    #[test]
    fn rejects_negative_or_nan_epsilon() {
        assert!(ToleranceConfig::new(true, -1.0).is_err());
        assert!(ToleranceConfig::new(true, f64::NAN).is_err());
    }

    #[test]
    fn null_handling() {
        let tolerance = ToleranceConfig::exact();
        assert!(tolerance.optional_values_match(None, None));
        assert!(!tolerance.optional_values_match(None, Some(0.0)));
        assert!(!tolerance.optional_values_match(Some(0.0), None));
    }
}
