//! Build lifecycle events.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::manifest::ManifestMap;

/// Named lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    /// A build finished and its manifest was written.
    Build,
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Event::Build => write!(f, "build"),
        }
    }
}

type Listener = Box<dyn FnMut(&ManifestMap) + Send>;

/// Fire-and-forget callbacks keyed by event.
///
/// Clones share the same listeners.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Arc<Mutex<HashMap<Event, Vec<Listener>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listen<F>(&self, event: Event, listener: F)
    where
        F: FnMut(&ManifestMap) + Send + 'static,
    {
        self.listeners
            .lock()
            .entry(event)
            .or_default()
            .push(Box::new(listener));
    }

    /// Invoke every listener of `event` in registration order.
    ///
    /// The lock is not held while listeners run, so a listener may use the
    /// bus. Listeners it registers for `event` run from the next fire on.
    pub fn fire(&self, event: Event, manifest: &ManifestMap) -> usize {
        let Some(mut callbacks) = self.listeners.lock().remove(&event) else {
            return 0;
        };
        for callback in callbacks.iter_mut() {
            callback(manifest);
        }
        let count = callbacks.len();

        let mut listeners = self.listeners.lock();
        let added = listeners.remove(&event).unwrap_or_default();
        callbacks.extend(added);
        listeners.insert(event, callbacks);
        drop(listeners);

        tracing::debug!(%event, listeners = count, "event fired");
        count
    }

    pub fn listener_count(&self, event: Event) -> usize {
        self.listeners.lock().get(&event).map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("build_listeners", &self.listener_count(Event::Build))
            .finish()
    }
}
