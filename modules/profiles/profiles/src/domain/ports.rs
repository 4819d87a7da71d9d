//! Outbound ports of the domain layer.

use parking_lot::Mutex;

/// Sink for domain events. Publishing never fails the calling workflow.
pub trait EventPublisher<E>: Send + Sync + 'static {
    fn publish(&self, event: &E);
}

/// Drops every event.
pub struct NoopPublisher;

impl<E> EventPublisher<E> for NoopPublisher {
    fn publish(&self, _event: &E) {}
}

/// Keeps every published event in memory, in publishing order.
pub struct EventLog<E> {
    events: Mutex<Vec<E>>,
}

impl<E> Default for EventLog<E> {
    fn default() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }
}

impl<E: Clone> EventLog<E> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<E> {
        self.events.lock().clone()
    }
}

impl<E: Clone + Send + 'static> EventPublisher<E> for EventLog<E> {
    fn publish(&self, event: &E) {
        self.events.lock().push(event.clone());
    }
}
