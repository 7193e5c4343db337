//! Injectable observers for construction events.

pub mod observers;

pub use observers::{CreationEvent, CreationObserver, ObserverRegistry};
