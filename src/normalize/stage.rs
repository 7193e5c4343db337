use crate::core::{CanonicalSeries, RawObservation};
use crate::error::ParityResult;

use super::ExecutionContext;

/// One ordered transformation step of the normalization pipeline.
///
/// Stages are pure with respect to their inputs: the output depends only on
/// the observations and the context handed to `process`.
pub trait NormalizationStage: Send + Sync {
    fn name(&self) -> &str;

    fn process(
        &self,
        observations: Vec<RawObservation>,
        context: &ExecutionContext,
    ) -> ParityResult<Vec<RawObservation>>;
}

/// Terminal step turning staged observations into canonical series.
pub trait SeriesAssembler: Send + Sync {
    fn name(&self) -> &str;

    fn assemble(
        &self,
        observations: Vec<RawObservation>,
        context: &ExecutionContext,
    ) -> ParityResult<Vec<CanonicalSeries>>;
}
