//! Cut-over state machine.
//!
//! A decision is first planned from configuration and data availability, then
//! settled once the planned paths have run. Both steps are pure functions so
//! their full matrix can be tested without running any computation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::parity::ParityMode;
use crate::reachability::InputAvailability;

use super::{ComputationKind, CutoverConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegacyReason {
    GloballyDisabled,
    KindDisabled,
    CanonicalUnavailable,
    CanonicalFailed,
    ParityFailed,
}

impl LegacyReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GloballyDisabled => "globally_disabled",
            Self::KindDisabled => "kind_disabled",
            Self::CanonicalUnavailable => "canonical_unavailable",
            Self::CanonicalFailed => "canonical_failed",
            Self::ParityFailed => "parity_failed",
        }
    }
}

/// Which paths will run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionPlan {
    LegacyOnly(LegacyReason),
    /// Canonical path without parity validation.
    CanonicalOnly,
    /// Both paths, with the harness gating the returned result.
    DualValidate,
}

impl ExecutionPlan {
    #[must_use]
    pub fn runs_canonical(self) -> bool {
        !matches!(self, Self::LegacyOnly(_))
    }
}

/// Terminal outcome: which result was handed back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutoverOutcome {
    UseLegacy(LegacyReason),
    UseCanonicalValidated,
    UseCanonicalUnvalidated,
}

impl CutoverOutcome {
    #[must_use]
    pub fn canonical_used(self) -> bool {
        !matches!(self, Self::UseLegacy(_))
    }

    #[must_use]
    pub fn label(self) -> String {
        match self {
            Self::UseLegacy(reason) => format!("use_legacy:{}", reason.as_str()),
            Self::UseCanonicalValidated => "use_canonical_validated".to_owned(),
            Self::UseCanonicalUnvalidated => "use_canonical_unvalidated".to_owned(),
        }
    }
}

impl fmt::Display for CutoverOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// What happened when the planned paths ran. `None` means the path did not run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    pub legacy_ok: Option<bool>,
    pub canonical_ok: Option<bool>,
    pub parity_passed: Option<bool>,
}

/// Plans execution. Configuration is checked before availability so a
/// disabled kind is reported as disabled even when data is missing too.
#[must_use]
pub fn plan(
    config: &CutoverConfig,
    kind: &ComputationKind,
    availability: &[InputAvailability],
) -> ExecutionPlan {
    if !config.canonical_enabled() {
        return ExecutionPlan::LegacyOnly(LegacyReason::GloballyDisabled);
    }
    if !config.kind_enabled(kind) {
        return ExecutionPlan::LegacyOnly(LegacyReason::KindDisabled);
    }
    if availability.is_empty() || !availability.iter().all(|input| input.canonical_available) {
        return ExecutionPlan::LegacyOnly(LegacyReason::CanonicalUnavailable);
    }
    if config.validation().enabled {
        ExecutionPlan::DualValidate
    } else {
        ExecutionPlan::CanonicalOnly
    }
}

/// Settles a plan into its terminal outcome.
#[must_use]
pub fn settle(plan: ExecutionPlan, mode: ParityMode, report: ExecutionReport) -> CutoverOutcome {
    match plan {
        ExecutionPlan::LegacyOnly(reason) => CutoverOutcome::UseLegacy(reason),
        ExecutionPlan::CanonicalOnly => match report.canonical_ok {
            Some(true) => CutoverOutcome::UseCanonicalUnvalidated,
            _ => CutoverOutcome::UseLegacy(LegacyReason::CanonicalFailed),
        },
        ExecutionPlan::DualValidate => {
            if report.canonical_ok != Some(true) {
                return CutoverOutcome::UseLegacy(LegacyReason::CanonicalFailed);
            }
            // A failed legacy run reaches here as a failed verdict.
            match (report.parity_passed, mode) {
                (Some(true), _) => CutoverOutcome::UseCanonicalValidated,
                (_, ParityMode::Strict) => CutoverOutcome::UseLegacy(LegacyReason::ParityFailed),
                (_, ParityMode::Diagnostic) => CutoverOutcome::UseCanonicalUnvalidated,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cutover::ValidationPolicy;

    fn available(flag: bool) -> Vec<InputAvailability> {
        vec![InputAvailability {
            metric_id: "weight".to_owned(),
            canonical_available: flag,
            canonical_samples: usize::from(flag) * 10,
            legacy_samples: 10,
        }]
    }

    fn enabled_config() -> CutoverConfig {
        CutoverConfig::new()
            .with_canonical_enabled(true)
            .with_kind("weight_trend", true)
    }

    #[test]
    fn plan_checks_global_then_kind_then_data() {
        let kind = ComputationKind::new("weight_trend");
        assert_eq!(
            plan(&CutoverConfig::new(), &kind, &available(false)),
            ExecutionPlan::LegacyOnly(LegacyReason::GloballyDisabled)
        );
        assert_eq!(
            plan(
                &CutoverConfig::new().with_canonical_enabled(true),
                &kind,
                &available(true)
            ),
            ExecutionPlan::LegacyOnly(LegacyReason::KindDisabled)
        );
        assert_eq!(
            plan(&enabled_config(), &kind, &available(false)),
            ExecutionPlan::LegacyOnly(LegacyReason::CanonicalUnavailable)
        );
        assert_eq!(
            plan(&enabled_config(), &kind, &available(true)),
            ExecutionPlan::DualValidate
        );
        assert_eq!(
            plan(
                &enabled_config().with_validation(ValidationPolicy::disabled()),
                &kind,
                &available(true)
            ),
            ExecutionPlan::CanonicalOnly
        );
    }

    #[test]
    fn plan_without_inputs_is_unavailable() {
        let kind = ComputationKind::new("weight_trend");
        assert_eq!(
            plan(&enabled_config(), &kind, &[]),
            ExecutionPlan::LegacyOnly(LegacyReason::CanonicalUnavailable)
        );
    }

    #[test]
    fn settle_dual_validation_matrix() {
        let ok = |parity| ExecutionReport {
            legacy_ok: Some(true),
            canonical_ok: Some(true),
            parity_passed: Some(parity),
        };
        let dual = ExecutionPlan::DualValidate;
        assert_eq!(
            settle(dual, ParityMode::Strict, ok(true)),
            CutoverOutcome::UseCanonicalValidated
        );
        assert_eq!(
            settle(dual, ParityMode::Strict, ok(false)),
            CutoverOutcome::UseLegacy(LegacyReason::ParityFailed)
        );
        assert_eq!(
            settle(dual, ParityMode::Diagnostic, ok(false)),
            CutoverOutcome::UseCanonicalUnvalidated
        );
        assert_eq!(
            settle(dual, ParityMode::Diagnostic, ok(true)),
            CutoverOutcome::UseCanonicalValidated
        );

        let canonical_failed = ExecutionReport {
            legacy_ok: Some(true),
            canonical_ok: Some(false),
            parity_passed: None,
        };
        assert_eq!(
            settle(dual, ParityMode::Diagnostic, canonical_failed),
            CutoverOutcome::UseLegacy(LegacyReason::CanonicalFailed)
        );

        let legacy_failed = ExecutionReport {
            legacy_ok: Some(false),
            canonical_ok: Some(true),
            parity_passed: Some(false),
        };
        assert_eq!(
            settle(dual, ParityMode::Strict, legacy_failed),
            CutoverOutcome::UseLegacy(LegacyReason::ParityFailed)
        );
        assert_eq!(
            settle(dual, ParityMode::Diagnostic, legacy_failed),
            CutoverOutcome::UseCanonicalUnvalidated
        );
        assert_eq!(
            settle(
                dual,
                ParityMode::Strict,
                ExecutionReport {
                    parity_passed: None,
                    ..legacy_failed
                }
            ),
            CutoverOutcome::UseLegacy(LegacyReason::ParityFailed)
        );
    }

    #[test]
    fn settle_canonical_only_falls_back_on_failure() {
        let failed = ExecutionReport {
            canonical_ok: Some(false),
            ..ExecutionReport::default()
        };
        assert_eq!(
            settle(ExecutionPlan::CanonicalOnly, ParityMode::Strict, failed),
            CutoverOutcome::UseLegacy(LegacyReason::CanonicalFailed)
        );
    }
}
