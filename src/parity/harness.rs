use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::error::{ParityError, ParityResult};

use super::layers::{
    check_input, check_presentation, check_semantics, check_structure, check_temporal,
    check_values,
};
use super::{
    ComputationRequest, ComputationResult, LayerFailure, LayerOutcome, LayerStatus, Mismatch,
    ParityLayer, ParityMode, ParityVerdict, ToleranceConfig,
};

/// Comparison settings supplied by the caller at verification time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParityContext {
    pub request: ComputationRequest,
    #[serde(default)]
    pub mode: ParityMode,
    #[serde(default)]
    pub tolerance: ToleranceConfig,
}

impl ParityContext {
    #[must_use]
    pub fn new(request: ComputationRequest) -> Self {
        Self {
            request,
            mode: ParityMode::default(),
            tolerance: ToleranceConfig::default(),
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: ParityMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_tolerance(mut self, tolerance: ToleranceConfig) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// Layered comparator for legacy and canonical results.
///
/// Stateless; concurrent comparisons can share one instance freely.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParityHarness;

impl ParityHarness {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Obtains both results and compares them.
    ///
    /// A supplier returning `Err` means that side has no result; the verdict
    /// fails at the input layer and the error text is kept in the detail.
    pub fn validate<L, C>(
        &self,
        context: &ParityContext,
        legacy: L,
        canonical: C,
    ) -> ParityVerdict
    where
        L: FnOnce() -> ParityResult<ComputationResult>,
        C: FnOnce() -> ParityResult<ComputationResult>,
    {
        let legacy = legacy();
        let canonical = canonical();
        self.validate_results(context, legacy.as_ref(), canonical.as_ref())
    }

    /// Compares results that may already have failed to compute.
    pub fn validate_results(
        &self,
        context: &ParityContext,
        legacy: Result<&ComputationResult, &ParityError>,
        canonical: Result<&ComputationResult, &ParityError>,
    ) -> ParityVerdict {
        match (legacy, canonical) {
            (Ok(legacy), Ok(canonical)) => self.compare(context, legacy, canonical),
            (legacy, canonical) => {
                let mut unavailable = Vec::new();
                for (side, outcome) in [("legacy", legacy.err()), ("canonical", canonical.err())] {
                    if let Some(err) = outcome {
                        warn!(side, error = %err, "computation produced no result");
                        unavailable.push(
                            Mismatch::new(
                                format!("{side} computation produced no result"),
                                "result",
                                err,
                            )
                            .in_series(side),
                        );
                    }
                }
                let mut evaluation = Evaluation::default();
                evaluation.record(ParityLayer::InputParity, unavailable);
                evaluation.finish(context.mode)
            }
        }
    }

    /// Runs the layers over two computed results.
    #[must_use]
    pub fn compare(
        &self,
        context: &ParityContext,
        legacy: &ComputationResult,
        canonical: &ComputationResult,
    ) -> ParityVerdict {
        let mut evaluation = Evaluation::default();

        for layer in ParityLayer::ALL {
            let mismatches = match layer {
                ParityLayer::InputParity => check_input(context, legacy, canonical),
                ParityLayer::StructuralParity => check_structure(legacy, canonical),
                ParityLayer::TemporalParity => check_temporal(legacy, canonical),
                ParityLayer::ValueParity => check_values(legacy, canonical, context.tolerance),
                ParityLayer::SemanticIntegrity => {
                    check_semantics(legacy, canonical, context.tolerance)
                }
                ParityLayer::PresentationParity => check_presentation(legacy, canonical),
            };
            let failed = evaluation.record(layer, mismatches);
            debug!(layer = %layer, failed, "parity layer evaluated");

            // Input disagreement makes every later comparison meaningless.
            let fatal = layer == ParityLayer::InputParity;
            if failed && (fatal || context.mode == ParityMode::Strict) {
                break;
            }
        }

        let verdict = evaluation.finish(context.mode);
        if !verdict.passed {
            warn!(
                metric = %context.request.metric_id,
                mode = context.mode.as_str(),
                signature = %verdict.failure_signature(),
                "parity verdict failed"
            );
        }
        verdict
    }
}

#[derive(Default)]
struct Evaluation {
    outcomes: SmallVec<[LayerOutcome; 6]>,
    details: IndexMap<ParityLayer, LayerFailure>,
}

impl Evaluation {
    fn record(&mut self, layer: ParityLayer, mismatches: Vec<Mismatch>) -> bool {
        let mismatch_count = mismatches.len();
        let status = match mismatches.into_iter().next() {
            Some(first) => {
                self.details.insert(
                    layer,
                    LayerFailure {
                        layer,
                        first,
                        mismatch_count,
                    },
                );
                LayerStatus::Failed
            }
            None => LayerStatus::Passed,
        };
        self.outcomes.push(LayerOutcome {
            layer,
            status,
            mismatch_count,
        });
        status == LayerStatus::Failed
    }

    fn finish(mut self, mode: ParityMode) -> ParityVerdict {
        for layer in ParityLayer::ALL {
            if !self.outcomes.iter().any(|outcome| outcome.layer == layer) {
                self.outcomes.push(LayerOutcome {
                    layer,
                    status: LayerStatus::Skipped,
                    mismatch_count: 0,
                });
            }
        }
        ParityVerdict::from_outcomes(mode, self.outcomes, self.details)
    }
}
