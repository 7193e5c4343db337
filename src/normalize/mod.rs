//! Normalization of raw observations into canonical series.

pub mod assembler;
pub mod context;
pub mod pipeline;
pub mod stage;
pub mod stages;

pub use assembler::{EmptyAssembler, FieldSeriesAssembler};
pub use context::ExecutionContext;
pub use pipeline::NormalizationPipeline;
pub use stage::{NormalizationStage, SeriesAssembler};
pub use stages::{CanonicalOrderStage, DropNonFiniteStage, FilterStage, RenameFieldStage};
