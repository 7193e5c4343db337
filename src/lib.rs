//! series-parity: verification machinery for migrating computations from a
//! legacy per-record path to a canonical time-series path.
//!
//! The crate decides whether two hierarchical records have the same shape,
//! judges whether two computed results agree layer by layer, and gates at call
//! time which of the two paths serves a computation.

pub mod core;
pub mod cutover;
pub mod error;
pub mod extensions;
pub mod normalize;
pub mod parity;
pub mod reachability;
pub mod structure;
pub mod telemetry;

pub use crate::core::{CanonicalSeries, RawObservation, TimeRange};
pub use cutover::{ComputationKind, CutoverConfig, CutoverService};
pub use error::{ParityError, ParityResult};
pub use normalize::NormalizationPipeline;
pub use parity::{ParityHarness, ParityVerdict};
pub use structure::{HierarchyNode, ReferenceValue, reference_value};
