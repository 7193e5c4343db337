pub mod canonical_series;
pub mod primitives;
pub mod raw_observation;
pub mod time_axis;
pub mod time_range;
pub mod value;

pub use canonical_series::{CanonicalSeries, CanonicalSeriesBuilder, SeriesId};
pub use raw_observation::RawObservation;
pub use time_axis::{SeriesTimeZone, TimeAxis};
pub use time_range::TimeRange;
pub use value::FieldValue;
