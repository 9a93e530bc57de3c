//! The shape every store shares: an owned aggregate, the durable slot it
//! persists to, and an explicit set of change listeners.
//!
//! A successful update persists the whole aggregate, then calls every
//! listener with the new state, in subscription order. Listeners therefore
//! never see a half-applied update.

use std::sync::Arc;

use crate::save::{self, MemoryStorage, SaveData, StorageBackend};
use crate::shared::Rejection;

pub type ListenerId = u64;

type Listener<T> = Box<dyn Fn(&T) + Send + Sync>;

pub struct Listeners<T> {
    next_id: ListenerId,
    entries: Vec<(ListenerId, Listener<T>)>,
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

impl<T> Listeners<T> {
    pub fn subscribe(&mut self, listener: impl Fn(&T) + Send + Sync + 'static) -> ListenerId {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push((id, Box::new(listener)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub fn notify(&self, state: &T) {
        for (_, listener) in &self.entries {
            listener(state);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct Store<T> {
    slot: String,
    state: T,
    storage: Arc<dyn StorageBackend>,
    listeners: Listeners<T>,
}

impl<T: SaveData> Store<T> {
    /// Load `slot` from `storage` (defaults when missing or corrupt).
    pub fn open(slot: impl Into<String>, storage: Arc<dyn StorageBackend>) -> Self {
        let slot = slot.into();
        let state = save::load_or_default(storage.as_ref(), &slot);
        Self {
            slot,
            state,
            storage,
            listeners: Listeners::default(),
        }
    }

    /// A store over a private in-memory slot.
    pub fn in_memory(slot: impl Into<String>) -> Self {
        Self::open(slot, Arc::new(MemoryStorage::new()))
    }

    pub fn state(&self) -> &T {
        &self.state
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    pub fn subscribe(&mut self, listener: impl Fn(&T) + Send + Sync + 'static) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    /// Run `op` against the aggregate; commit only if it succeeds.
    ///
    /// `op` must validate before it mutates: a rejected update is not
    /// persisted and listeners are not called.
    pub fn update<R>(
        &mut self,
        op: impl FnOnce(&mut T) -> Result<R, Rejection>,
    ) -> Result<R, Rejection> {
        let result = op(&mut self.state)?;
        self.commit();
        Ok(result)
    }

    /// Run an infallible `op` and commit.
    pub fn mutate<R>(&mut self, op: impl FnOnce(&mut T) -> R) -> R {
        let result = op(&mut self.state);
        self.commit();
        result
    }

    /// Persist the aggregate, then notify listeners.
    fn commit(&mut self) {
        save::persist(self.storage.as_ref(), &self.slot, &self.state);
        self.listeners.notify(&self.state);
    }
}

impl<T: Clone> Store<T> {
    pub fn snapshot(&self) -> T {
        self.state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Counter {
        value: u64,
    }

    impl SaveData for Counter {}

    fn increment(store: &mut Store<Counter>) -> Result<u64, Rejection> {
        store.update(|c| {
            c.value += 1;
            Ok(c.value)
        })
    }

    #[test]
    fn test_update_persists_and_notifies() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store: Store<Counter> = Store::open("counter", storage.clone());

        let seen = Arc::new(AtomicU64::new(0));
        let seen_by_listener = seen.clone();
        store.subscribe(move |c: &Counter| seen_by_listener.store(c.value, Ordering::SeqCst));

        assert_eq!(increment(&mut store), Ok(1));
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        let reopened: Store<Counter> = Store::open("counter", storage);
        assert_eq!(reopened.state().value, 1);
    }

    #[test]
    fn test_rejected_update_is_not_committed() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store: Store<Counter> = Store::open("counter", storage.clone());
        let calls = Arc::new(AtomicU64::new(0));
        let calls_by_listener = calls.clone();
        store.subscribe(move |_: &Counter| {
            calls_by_listener.fetch_add(1, Ordering::SeqCst);
        });

        let result: Result<(), Rejection> = store.update(|_| Err(Rejection::ZeroAmount));
        assert_eq!(result, Err(Rejection::ZeroAmount));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(storage.get("counter").unwrap().is_none());
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let mut store: Store<Counter> = Store::in_memory("counter");
        let calls = Arc::new(AtomicU64::new(0));
        let calls_by_listener = calls.clone();
        let id = store.subscribe(move |_: &Counter| {
            calls_by_listener.fetch_add(1, Ordering::SeqCst);
        });

        increment(&mut store).unwrap();
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        increment(&mut store).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn test_listeners_see_committed_state_in_order() {
        let mut store: Store<Counter> = Store::in_memory("counter");
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        for tag in 0..3u64 {
            let order = order.clone();
            store.subscribe(move |c: &Counter| order.lock().unwrap().push((tag, c.value)));
        }
        increment(&mut store).unwrap();
        assert_eq!(*order.lock().unwrap(), vec![(0, 1), (1, 1), (2, 1)]);
    }

    #[test]
    fn test_independent_stores_do_not_share_state() {
        let mut a: Store<Counter> = Store::in_memory("counter");
        let b: Store<Counter> = Store::in_memory("counter");
        increment(&mut a).unwrap();
        assert_eq!(a.state().value, 1);
        assert_eq!(b.state().value, 0);
        assert_eq!(a.snapshot(), Counter { value: 1 });
    }
}
