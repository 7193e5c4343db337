use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{ParityError, ParityResult};
use crate::structure::ReferenceValue;

/// Construction events exposed to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreationEvent {
    SeriesCreated {
        series_id: String,
        points: usize,
    },
    HierarchyBuilt {
        reference: ReferenceValue,
        node_count: usize,
    },
}

/// Injectable hook that observes object creation.
///
/// Observers see events after the object exists and cannot influence or
/// reject construction.
pub trait CreationObserver: Send + Sync {
    fn id(&self) -> &str;
    fn on_event(&self, event: &CreationEvent);
}

/// Ordered set of observers with unique identifiers.
#[derive(Clone, Default)]
pub struct ObserverRegistry {
    observers: Vec<Arc<dyn CreationObserver>>,
}

impl std::fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field(
                "observers",
                &self.observers.iter().map(|o| o.id()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl ObserverRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an observer with unique identifier.
    pub fn register(&mut self, observer: Arc<dyn CreationObserver>) -> ParityResult<()> {
        let observer_id = observer.id().to_owned();
        if observer_id.is_empty() {
            return Err(ParityError::InvalidData(
                "observer id must not be empty".to_owned(),
            ));
        }
        if self.has_observer(&observer_id) {
            return Err(ParityError::InvalidData(format!(
                "observer with id `{observer_id}` is already registered"
            )));
        }
        self.observers.push(observer);
        Ok(())
    }

    /// Unregisters an observer by id. Returns `true` when removed.
    pub fn unregister(&mut self, observer_id: &str) -> bool {
        if let Some(position) = self
            .observers
            .iter()
            .position(|entry| entry.id() == observer_id)
        {
            self.observers.remove(position);
            return true;
        }
        false
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    #[must_use]
    pub fn has_observer(&self, observer_id: &str) -> bool {
        self.observers
            .iter()
            .any(|observer| observer.id() == observer_id)
    }

    pub fn notify(&self, event: &CreationEvent) {
        for observer in &self.observers {
            trace!(observer = observer.id(), ?event, "dispatch creation event");
            observer.on_event(event);
        }
    }
}
