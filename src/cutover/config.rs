use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::parity::{ParityMode, ToleranceConfig};

/// Logical computation identity, e.g. `weight_trend` or `sleep_histogram`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComputationKind(String);

impl ComputationKind {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ComputationKind {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for ComputationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether and how both paths are compared before the canonical result is used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationPolicy {
    pub enabled: bool,
    #[serde(default)]
    pub mode: ParityMode,
    #[serde(default)]
    pub tolerance: ToleranceConfig,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: ParityMode::Strict,
            tolerance: ToleranceConfig::default(),
        }
    }
}

impl ValidationPolicy {
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
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

/// Immutable enablement flags handed to the cutover service at construction.
///
/// Kinds missing from the map are disabled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CutoverConfig {
    canonical_enabled: bool,
    #[serde(default)]
    kinds: IndexMap<ComputationKind, bool>,
    #[serde(default)]
    validation: ValidationPolicy,
}

impl CutoverConfig {
    /// Everything disabled: the legacy path is always chosen.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_canonical_enabled(mut self, enabled: bool) -> Self {
        self.canonical_enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<ComputationKind>, enabled: bool) -> Self {
        self.kinds.insert(kind.into(), enabled);
        self
    }

    #[must_use]
    pub fn with_validation(mut self, validation: ValidationPolicy) -> Self {
        self.validation = validation;
        self
    }

    #[must_use]
    pub fn canonical_enabled(&self) -> bool {
        self.canonical_enabled
    }

    #[must_use]
    pub fn kind_enabled(&self, kind: &ComputationKind) -> bool {
        self.kinds.get(kind).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn validation(&self) -> ValidationPolicy {
        self.validation
    }
}
