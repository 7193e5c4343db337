use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::{LayerFailure, LayerOutcome, LayerStatus, ParityLayer, ParityMode};

/// Outcome of one parity comparison. Produced fresh per call, never persisted
/// by the harness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParityVerdict {
    pub passed: bool,
    pub mode: ParityMode,
    pub message: String,
    pub details: IndexMap<ParityLayer, LayerFailure>,
    pub outcomes: SmallVec<[LayerOutcome; 6]>,
}

impl ParityVerdict {
    pub(super) fn from_outcomes(
        mode: ParityMode,
        outcomes: SmallVec<[LayerOutcome; 6]>,
        details: IndexMap<ParityLayer, LayerFailure>,
    ) -> Self {
        let passed = details.is_empty();
        let message = if passed {
            let evaluated = outcomes
                .iter()
                .filter(|outcome| outcome.status == LayerStatus::Passed)
                .count();
            format!("parity passed: {evaluated} layer(s) agree ({})", mode.as_str())
        } else {
            let explanations: Vec<String> =
                details.values().map(LayerFailure::explanation).collect();
            format!(
                "parity failed in {} layer(s) ({}): {}",
                details.len(),
                mode.as_str(),
                explanations.join("; ")
            )
        };
        Self {
            passed,
            mode,
            message,
            details,
            outcomes,
        }
    }

    #[must_use]
    pub fn failure(&self, layer: ParityLayer) -> Option<&LayerFailure> {
        self.details.get(&layer)
    }

    #[must_use]
    pub fn status(&self, layer: ParityLayer) -> Option<LayerStatus> {
        self.outcomes
            .iter()
            .find(|outcome| outcome.layer == layer)
            .map(|outcome| outcome.status)
    }

    pub fn failed_layers(&self) -> impl Iterator<Item = ParityLayer> + '_ {
        self.details.keys().copied()
    }

    /// Stable identifier of what failed and where, for regression tracking
    /// across migration runs. `pass` for passing verdicts.
    #[must_use]
    pub fn failure_signature(&self) -> String {
        if self.passed {
            return "pass".to_owned();
        }
        self.details
            .values()
            .map(|failure| format!("{}@{}", failure.layer, failure.first.location()))
            .collect::<Vec<_>>()
            .join(";")
    }
}
