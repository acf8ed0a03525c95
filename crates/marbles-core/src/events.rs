//! Explicit observer lists.
//!
//! Each component that emits notifications owns an `ObserverList` and
//! exposes `subscribe`/`unsubscribe` on its own API. Delivery is synchronous,
//! on the owning thread, in registration order.

/// Handle returned by `subscribe`. Pass it back to `unsubscribe` to stop
/// delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// An ordered list of notification handlers for events of type `E`.
pub struct ObserverList<E> {
    next_id: u64,
    entries: Vec<(SubscriptionId, Box<dyn FnMut(&E)>)>,
}

impl<E> ObserverList<E> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    /// Register a handler. Handlers fire in registration order.
    pub fn subscribe(&mut self, handler: impl FnMut(&E) + 'static) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.entries.push((id, Box::new(handler)));
        id
    }

    /// Remove a handler. Returns false if the handle was already removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    /// Deliver `event` to every registered handler, synchronously.
    pub fn emit(&mut self, event: &E) {
        for (_, handler) in &mut self.entries {
            handler(event);
        }
    }
}

impl<E> Default for ObserverList<E> {
    fn default() -> Self {
        Self::new()
    }
}
