use std::sync::Arc;

use chrono::Utc;
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::{ParityError, ParityResult};
use crate::normalize::ExecutionContext;
use crate::parity::{
    ComputationRequest, ComputationResult, ParityContext, ParityHarness, ParityVerdict,
};
use crate::reachability::{CutoverRecord, InputAvailability, NoopProbe, ReachabilityProbe};

use super::decision::{self, CutoverOutcome, ExecutionPlan, ExecutionReport, LegacyReason};
use super::{AvailabilitySource, ComputationKind, CutoverConfig, CutoverContext, ValidationPolicy};

/// One way of computing a result: the legacy per-record path or the
/// canonical time-series path.
pub trait ComputationPath: Send + Sync {
    fn compute(
        &self,
        request: &ComputationRequest,
        params: &ExecutionContext,
    ) -> ParityResult<ComputationResult>;
}

impl<F> ComputationPath for F
where
    F: Fn(&ComputationRequest, &ExecutionContext) -> ParityResult<ComputationResult> + Send + Sync,
{
    fn compute(
        &self,
        request: &ComputationRequest,
        params: &ExecutionContext,
    ) -> ParityResult<ComputationResult> {
        self(request, params)
    }
}

#[derive(Clone)]
struct ComputationPaths {
    legacy: Arc<dyn ComputationPath>,
    canonical: Arc<dyn ComputationPath>,
}

/// Chooses, per call, between the legacy and canonical computation paths.
pub struct CutoverService {
    config: CutoverConfig,
    availability: Arc<dyn AvailabilitySource>,
    paths: IndexMap<ComputationKind, ComputationPaths>,
    probe: Arc<dyn ReachabilityProbe>,
    harness: ParityHarness,
}

impl std::fmt::Debug for CutoverService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CutoverService")
            .field("config", &self.config)
            .field("kinds", &self.paths.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl CutoverService {
    #[must_use]
    pub fn new(config: CutoverConfig, availability: Arc<dyn AvailabilitySource>) -> Self {
        Self {
            config,
            availability,
            paths: IndexMap::new(),
            probe: Arc::new(NoopProbe),
            harness: ParityHarness::new(),
        }
    }

    #[must_use]
    pub fn with_probe(mut self, probe: Arc<dyn ReachabilityProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Registers the pair of paths implementing `kind`, replacing any previous pair.
    #[must_use]
    pub fn with_paths(
        mut self,
        kind: impl Into<ComputationKind>,
        legacy: Arc<dyn ComputationPath>,
        canonical: Arc<dyn ComputationPath>,
    ) -> Self {
        self.paths
            .insert(kind.into(), ComputationPaths { legacy, canonical });
        self
    }

    #[must_use]
    pub fn config(&self) -> &CutoverConfig {
        &self.config
    }

    #[must_use]
    pub fn availability_snapshot(&self, context: &CutoverContext) -> Vec<InputAvailability> {
        context.snapshot(self.availability.as_ref())
    }

    #[must_use]
    pub fn plan(&self, kind: &ComputationKind, context: &CutoverContext) -> ExecutionPlan {
        decision::plan(&self.config, kind, &self.availability_snapshot(context))
    }

    /// `true` when the canonical path would run for this call.
    #[must_use]
    pub fn should_use_canonical(&self, kind: &ComputationKind, context: &CutoverContext) -> bool {
        self.plan(kind, context).runs_canonical()
    }

    /// Builds the executable strategy for one call.
    pub fn create_strategy(
        &self,
        kind: &ComputationKind,
        context: &CutoverContext,
        params: ExecutionContext,
    ) -> ParityResult<CutoverStrategy> {
        let paths = self
            .paths
            .get(kind)
            .cloned()
            .ok_or_else(|| ParityError::UnknownComputation(kind.to_string()))?;
        let availability = self.availability_snapshot(context);
        let plan = decision::plan(&self.config, kind, &availability);
        debug!(kind = %kind, ?plan, "cutover plan");

        Ok(CutoverStrategy {
            kind: kind.clone(),
            plan,
            request: context.request.clone(),
            params,
            availability,
            validation: self.config.validation(),
            paths,
            probe: Arc::clone(&self.probe),
            harness: self.harness,
        })
    }
}

/// Result handed back by an executed strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct CutoverExecution {
    pub result: ComputationResult,
    pub outcome: CutoverOutcome,
    pub verdict: Option<ParityVerdict>,
}

/// Executable handle returned by [`CutoverService::create_strategy`].
pub struct CutoverStrategy {
    kind: ComputationKind,
    plan: ExecutionPlan,
    request: ComputationRequest,
    params: ExecutionContext,
    availability: Vec<InputAvailability>,
    validation: ValidationPolicy,
    paths: ComputationPaths,
    probe: Arc<dyn ReachabilityProbe>,
    harness: ParityHarness,
}

impl std::fmt::Debug for CutoverStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CutoverStrategy")
            .field("kind", &self.kind)
            .field("plan", &self.plan)
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

impl CutoverStrategy {
    #[must_use]
    pub fn kind(&self) -> &ComputationKind {
        &self.kind
    }

    #[must_use]
    pub fn plan(&self) -> ExecutionPlan {
        self.plan
    }

    #[must_use]
    pub fn availability(&self) -> &[InputAvailability] {
        &self.availability
    }

    /// Runs the planned paths and returns the gated result.
    ///
    /// Canonical failures fall back to legacy. Dual runs always produce a
    /// verdict; in strict mode a failed legacy run fails it, so the legacy
    /// error is returned rather than an unvalidated canonical result. The
    /// reachability record is written once the returned result is known.
    pub fn execute(self) -> ParityResult<CutoverExecution> {
        let mut report = ExecutionReport::default();
        let mut verdict = None;

        let (legacy, canonical) = match self.plan {
            ExecutionPlan::LegacyOnly(_) => (Some(self.run_legacy()), None),
            ExecutionPlan::CanonicalOnly => (None, Some(self.run_canonical())),
            ExecutionPlan::DualValidate => {
                let (legacy, canonical) = self.run_both();
                let context = ParityContext::new(self.request.clone())
                    .with_mode(self.validation.mode)
                    .with_tolerance(self.validation.tolerance);
                let outcome = self.harness.validate_results(
                    &context,
                    legacy.as_ref(),
                    canonical.as_ref(),
                );
                report.parity_passed = Some(outcome.passed);
                verdict = Some(outcome);
                (Some(legacy), Some(canonical))
            }
        };
        report.legacy_ok = legacy.as_ref().map(Result::is_ok);
        report.canonical_ok = canonical.as_ref().map(Result::is_ok);

        let outcome = decision::settle(self.plan, self.validation.mode, report);
        let result = if outcome.canonical_used() {
            canonical.unwrap_or_else(|| self.run_canonical())
        } else {
            warn_on_fallback(&self.kind, outcome);
            legacy.unwrap_or_else(|| self.run_legacy())
        };
        self.record(outcome, verdict.as_ref(), result.is_ok());

        Ok(CutoverExecution {
            result: result?,
            outcome,
            verdict,
        })
    }

    fn run_legacy(&self) -> ParityResult<ComputationResult> {
        self.paths
            .legacy
            .compute(&self.request, &self.params)
            .inspect_err(|err| {
                warn!(kind = %self.kind, path = "legacy", error = %err, "computation failed");
            })
    }

    fn run_canonical(&self) -> ParityResult<ComputationResult> {
        self.paths
            .canonical
            .compute(&self.request, &self.params)
            .inspect_err(|err| {
                warn!(kind = %self.kind, path = "canonical", error = %err, "computation failed");
            })
    }

    #[cfg(feature = "parallel-validation")]
    fn run_both(
        &self,
    ) -> (
        ParityResult<ComputationResult>,
        ParityResult<ComputationResult>,
    ) {
        rayon::join(|| self.run_legacy(), || self.run_canonical())
    }

    #[cfg(not(feature = "parallel-validation"))]
    fn run_both(
        &self,
    ) -> (
        ParityResult<ComputationResult>,
        ParityResult<ComputationResult>,
    ) {
        (self.run_legacy(), self.run_canonical())
    }

    fn record(
        &self,
        outcome: CutoverOutcome,
        verdict: Option<&ParityVerdict>,
        result_ok: bool,
    ) {
        debug!(kind = %self.kind, %outcome, result_ok, "cutover decision");
        self.probe.record(CutoverRecord {
            computation_kind: self.kind.to_string(),
            canonical_used: outcome.canonical_used(),
            outcome: outcome.label(),
            inputs: self.availability.clone(),
            legacy_sample_count: self.availability.iter().map(|i| i.legacy_samples).sum(),
            canonical_sample_count: self.availability.iter().map(|i| i.canonical_samples).sum(),
            requested_range: self.request.range,
            parity_passed: verdict.map(|verdict| verdict.passed),
            result_ok,
            captured_at: Utc::now(),
        });
    }
}

fn warn_on_fallback(kind: &ComputationKind, outcome: CutoverOutcome) {
    if let CutoverOutcome::UseLegacy(reason) = outcome {
        match reason {
            LegacyReason::GloballyDisabled | LegacyReason::KindDisabled => {}
            _ => warn!(kind = %kind, reason = reason.as_str(), "falling back to legacy path"),
        }
    }
}
