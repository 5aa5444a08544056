//! In-process observer list the store notifies after each committed mutation.

use std::fmt;

/// Event kinds a subscriber can register for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    DataChanged,
}

/// What a committed mutation touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    Added(String),
    Updated(String),
    Deleted(String),
    Imported(usize),
    /// Records dropped to fit the storage quota.
    Truncated(usize),
    Cleared,
    Restored,
    Categories,
    Budgets,
    Settings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEvent {
    pub kind: EventKind,
    pub change: ChangeKind,
}

impl StoreEvent {
    pub fn data_changed(change: ChangeKind) -> Self {
        Self {
            kind: EventKind::DataChanged,
            change,
        }
    }
}

/// Receives store events synchronously, on the mutating call's thread.
pub trait StoreObserver: Send {
    fn on_event(&mut self, event: &StoreEvent);
}

impl<F> StoreObserver for F
where
    F: FnMut(&StoreEvent) + Send,
{
    fn on_event(&mut self, event: &StoreEvent) {
        self(event)
    }
}

/// Handle returned by `subscribe`; pass it back to `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

struct Registration {
    id: SubscriptionId,
    kind: EventKind,
    observer: Box<dyn StoreObserver>,
}

#[derive(Default)]
pub(crate) struct Observers {
    next_id: u64,
    registrations: Vec<Registration>,
}

impl Observers {
    pub(crate) fn subscribe(
        &mut self,
        kind: EventKind,
        observer: Box<dyn StoreObserver>,
    ) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.registrations.push(Registration { id, kind, observer });
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.registrations.len();
        self.registrations.retain(|entry| entry.id != id);
        self.registrations.len() != before
    }

    /// Delivers in subscription order.
    pub(crate) fn notify(&mut self, event: &StoreEvent) {
        for entry in self
            .registrations
            .iter_mut()
            .filter(|entry| entry.kind == event.kind)
        {
            entry.observer.on_event(event);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.registrations.len()
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("subscribers", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn notifies_in_order_and_unsubscribes() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut observers = Observers::default();

        let first = Arc::clone(&seen);
        let id = observers.subscribe(
            EventKind::DataChanged,
            Box::new(move |_: &StoreEvent| first.lock().unwrap().push("first")),
        );
        let second = Arc::clone(&seen);
        observers.subscribe(
            EventKind::DataChanged,
            Box::new(move |_: &StoreEvent| second.lock().unwrap().push("second")),
        );

        observers.notify(&StoreEvent::data_changed(ChangeKind::Cleared));
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);

        assert!(observers.unsubscribe(id));
        assert!(!observers.unsubscribe(id));
        observers.notify(&StoreEvent::data_changed(ChangeKind::Cleared));
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second", "second"]);
        assert_eq!(observers.len(), 1);
    }
}
