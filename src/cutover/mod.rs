//! Cut-over decisions between the legacy and canonical computation paths.

pub mod availability;
pub mod config;
pub mod decision;
pub mod service;

pub use availability::{AvailabilitySource, CutoverContext, SeriesCatalog};
pub use config::{ComputationKind, CutoverConfig, ValidationPolicy};
pub use decision::{CutoverOutcome, ExecutionPlan, ExecutionReport, LegacyReason, plan, settle};
pub use service::{ComputationPath, CutoverExecution, CutoverService, CutoverStrategy};
