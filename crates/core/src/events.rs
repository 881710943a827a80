use std::panic::{catch_unwind, AssertUnwindSafe};

const LOG_TARGET: &str = "events";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Synchronous typed publish/subscribe channel.
///
/// Listeners are invoked in registration order. A panicking listener is
/// isolated: the panic is caught, logged, and delivery continues with the
/// remaining listeners.
pub struct EventBus<T> {
    listeners: Vec<(SubscriptionId, Box<dyn Fn(&T) + Send>)>,
    next_id: u64,
}

impl<T> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EventBus<T> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn emit(&self, event: &T) {
        for (id, listener) in &self.listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
                tracing::warn!(
                    target: LOG_TARGET,
                    subscription = id.0,
                    "event listener panicked; continuing delivery"
                );
            }
        }
    }
}
