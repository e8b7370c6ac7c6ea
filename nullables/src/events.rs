//! Nullable event sink: record notifications instead of delivering them.

use std::sync::Mutex;

/// A subscriber that keeps every event it receives, for assertions.
pub struct NullEventSink<E> {
    received: Mutex<Vec<E>>,
}

impl<E: Clone> NullEventSink<E> {
    pub fn new() -> Self {
        Self {
            received: Mutex::new(Vec::new()),
        }
    }

    /// Record an event as delivered.
    pub fn record(&self, event: &E) {
        self.received
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event.clone());
    }

    /// All events received so far, in delivery order.
    pub fn received(&self) -> Vec<E> {
        self.received
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Forget everything received so far.
    pub fn reset(&self) {
        self.received
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

impl<E: Clone> Default for NullEventSink<E> {
    fn default() -> Self {
        Self::new()
    }
}
