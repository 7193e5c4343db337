use tracing::{debug, info};

use crate::core::{CanonicalSeries, RawObservation};
use crate::error::{ParityError, ParityResult};
use crate::extensions::{CreationEvent, ObserverRegistry};

use super::{EmptyAssembler, ExecutionContext, NormalizationStage, SeriesAssembler};

/// Ordered sequence of normalization stages plus a terminal assembler.
///
/// The pipeline only sequences stages and owns the shared context; it never
/// interprets fields itself. Stage errors are returned unchanged.
pub struct NormalizationPipeline {
    stages: Vec<Box<dyn NormalizationStage>>,
    assembler: Box<dyn SeriesAssembler>,
    context: ExecutionContext,
    observers: ObserverRegistry,
}

impl Default for NormalizationPipeline {
    fn default() -> Self {
        Self::new(ExecutionContext::default())
    }
}

impl std::fmt::Debug for NormalizationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NormalizationPipeline")
            .field("stages", &self.stage_names())
            .field("assembler", &self.assembler.name())
            .field("context", &self.context)
            .field("observers", &self.observers)
            .finish()
    }
}

impl NormalizationPipeline {
    #[must_use]
    pub fn new(context: ExecutionContext) -> Self {
        Self {
            stages: Vec::new(),
            assembler: Box::new(EmptyAssembler),
            context,
            observers: ObserverRegistry::default(),
        }
    }

    /// Appends a stage; stages run in insertion order.
    #[must_use]
    pub fn with_stage(mut self, stage: impl NormalizationStage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    #[must_use]
    pub fn with_assembler(mut self, assembler: impl SeriesAssembler + 'static) -> Self {
        self.assembler = Box::new(assembler);
        self
    }

    #[must_use]
    pub fn with_observers(mut self, observers: ObserverRegistry) -> Self {
        self.observers = observers;
        self
    }

    #[must_use]
    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Runs every stage in order, then the assembler.
    pub fn normalize(
        &self,
        observations: Vec<RawObservation>,
    ) -> ParityResult<Vec<CanonicalSeries>> {
        let input_count = observations.len();
        let mut staged = observations;
        for stage in &self.stages {
            let before = staged.len();
            staged = stage.process(staged, &self.context)?;
            debug!(
                stage = stage.name(),
                input_count = before,
                output_count = staged.len(),
                "normalization stage completed"
            );
        }

        let series = self.assembler.assemble(staged, &self.context)?;
        for entry in &series {
            self.observers.notify(&CreationEvent::SeriesCreated {
                series_id: entry.id().to_string(),
                points: entry.len(),
            });
        }
        info!(
            input_count,
            series_count = series.len(),
            assembler = self.assembler.name(),
            "normalization finished"
        );
        Ok(series)
    }

    /// Variant for callers holding a possibly absent collection; `None` fails fast.
    pub fn try_normalize(
        &self,
        observations: Option<Vec<RawObservation>>,
    ) -> ParityResult<Vec<CanonicalSeries>> {
        let observations = observations.ok_or(ParityError::MissingInput("observations"))?;
        self.normalize(observations)
    }
}
