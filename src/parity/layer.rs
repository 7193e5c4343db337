use std::fmt;

use serde::{Deserialize, Serialize};

/// Independent comparison dimensions, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParityLayer {
    InputParity,
    StructuralParity,
    TemporalParity,
    ValueParity,
    SemanticIntegrity,
    PresentationParity,
}

impl ParityLayer {
    pub const ALL: [Self; 6] = [
        Self::InputParity,
        Self::StructuralParity,
        Self::TemporalParity,
        Self::ValueParity,
        Self::SemanticIntegrity,
        Self::PresentationParity,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InputParity => "input_parity",
            Self::StructuralParity => "structural_parity",
            Self::TemporalParity => "temporal_parity",
            Self::ValueParity => "value_parity",
            Self::SemanticIntegrity => "semantic_integrity",
            Self::PresentationParity => "presentation_parity",
        }
    }
}

impl fmt::Display for ParityLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerStatus {
    Passed,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerOutcome {
    pub layer: ParityLayer,
    pub status: LayerStatus,
    pub mismatch_count: usize,
}

/// One disagreement found by a layer. `expected` is the legacy side,
/// `actual` the canonical side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mismatch {
    pub reason: String,
    pub expected: String,
    pub actual: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Mismatch {
    #[must_use]
    pub fn new(
        reason: impl Into<String>,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        Self {
            reason: reason.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
            series: None,
            index: None,
            path: None,
        }
    }

    #[must_use]
    pub fn in_series(mut self, series: impl Into<String>) -> Self {
        self.series = Some(series.into());
        self
    }

    #[must_use]
    pub fn at_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    #[must_use]
    pub fn at_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Compact location such as `weight[3]`, `$.meta.unit` or `*`.
    #[must_use]
    pub fn location(&self) -> String {
        match (&self.series, self.index, &self.path) {
            (_, _, Some(path)) => path.clone(),
            (Some(series), Some(index), None) => format!("{series}[{index}]"),
            (Some(series), None, None) => series.clone(),
            (None, Some(index), None) => format!("[{index}]"),
            (None, None, None) => "*".to_owned(),
        }
    }
}

/// Failure report for one layer: its first mismatch plus the total count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerFailure {
    pub layer: ParityLayer,
    pub first: Mismatch,
    pub mismatch_count: usize,
}

impl LayerFailure {
    #[must_use]
    pub fn explanation(&self) -> String {
        let more = match self.mismatch_count {
            0 | 1 => String::new(),
            count => format!(" (+{} more)", count - 1),
        };
        format!(
            "{}: {} at {} (expected {}, actual {}){more}",
            self.layer,
            self.first.reason,
            self.first.location(),
            self.first.expected,
            self.first.actual,
        )
    }
}
