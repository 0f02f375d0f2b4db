use std::fmt;

use skyline_runner_core::Event;

/// Handle returned by [`EventBus::subscribe`] used to drop the listener again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

type Listener = Box<dyn FnMut(&Event)>;

/// Typed fan-out of session events to registered listeners.
///
/// Listeners are invoked in subscription order for every published event.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl EventBus {
    /// Creates a bus without listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` and returns the handle that removes it.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&Event) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes the listener registered under `id`.
    ///
    /// Returns `false` when the handle was already removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(candidate, _)| *candidate != id);
        self.listeners.len() != before
    }

    /// Delivers `events` in order to every listener.
    pub fn publish(&mut self, events: &[Event]) {
        for event in events {
            for (_, listener) in &mut self.listeners {
                listener(event);
            }
        }
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Reports whether no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;

    #[test]
    fn listeners_receive_events_in_order() {
        let mut bus = EventBus::new();
        let received = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&received);
        let _ = bus.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        bus.publish(&[
            Event::SegmentsCleared,
            Event::DistanceUpdated { distance: 1.0 },
        ]);

        assert_eq!(
            *received.borrow(),
            vec![
                Event::SegmentsCleared,
                Event::DistanceUpdated { distance: 1.0 },
            ]
        );
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let mut bus = EventBus::new();
        let count = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&count);
        let id = bus.subscribe(move |_| *counter.borrow_mut() += 1);
        let other = bus.subscribe(|_| {});
        assert_ne!(id, other);

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(&[Event::SegmentsCleared]);

        assert_eq!(*count.borrow(), 0);
        assert_eq!(bus.len(), 1);
    }
}
