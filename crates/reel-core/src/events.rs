//! Change notifications fanned out to an unordered set of listeners.

use crate::config::{Property, PropertyValue};
use parking_lot::RwLock;
use std::{
    collections::HashMap,
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

#[derive(Clone, Debug, PartialEq)]
pub enum SpinnerEvent {
    /// The position moved. Carries no payload; query the engine instead.
    StateChanged,
    /// The item sequence was replaced and the position reset.
    DataChanged,
    PropertyChanged {
        property: Property,
        old: PropertyValue,
        new: PropertyValue,
    },
}

pub trait SpinnerListener: Send + Sync {
    fn on_event(&self, event: &SpinnerEvent);
}

impl<F> SpinnerListener for F
where
    F: Fn(&SpinnerEvent) + Send + Sync,
{
    fn on_event(&self, event: &SpinnerEvent) {
        self(event)
    }
}

/// Handle returned by [`Listeners::add`], used to unregister.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Registry of listeners. Invocation order is unspecified.
#[derive(Default)]
pub struct Listeners {
    next_id: AtomicU64,
    entries: RwLock<HashMap<ListenerId, Arc<dyn SpinnerListener>>>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: Arc<dyn SpinnerListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.write().insert(id, listener);
        id
    }

    pub fn remove(&self, id: ListenerId) -> bool {
        self.entries.write().remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `event` to every registered listener.
    ///
    /// The registry is snapshotted first, so listeners may add or remove
    /// listeners (or call back into the engine) while being notified.
    pub fn emit(&self, event: &SpinnerEvent) {
        let snapshot: Vec<_> = self.entries.read().values().cloned().collect();
        for listener in snapshot {
            listener.on_event(event);
        }
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.len())
            .finish()
    }
}
