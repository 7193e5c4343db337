//! Layered parity comparison between legacy and canonical results.
//!
//! Layers run in a fixed order: input, structure, time, values, semantics,
//! presentation. Strict mode stops at the first failing layer; diagnostic mode
//! evaluates them all. An input mismatch always stops evaluation.

pub mod harness;
pub mod json_contract;
mod layers;
pub mod layer;
pub mod result;
pub mod tolerance;
pub mod verdict;

pub use harness::{ParityContext, ParityHarness};
pub use json_contract::{PARITY_VERDICT_JSON_SCHEMA_V1, ParityVerdictJsonContractV1};
pub use layer::{LayerFailure, LayerOutcome, LayerStatus, Mismatch, ParityLayer};
pub use result::{ComputationRequest, ComputationResult, ResultSample, ResultSeries, SampleTime};
pub use tolerance::{DEFAULT_VALUE_EPSILON, ParityMode, ToleranceConfig};
pub use verdict::ParityVerdict;
