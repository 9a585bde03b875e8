//! The external state container seam.
//!
//! The bus never owns application state. It reads snapshots from a
//! [`StateStore`] and asks the store to apply merge-style updates. When an
//! update lands is up to the store: [`MemoryStore`] applies it at once,
//! [`DeferredStore`] queues it until [`DeferredStore::flush`].

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::snapshot::StateSnapshot;

/// A requested state transformation: previous snapshot in, next out.
pub type StateUpdater = Box<dyn FnOnce(StateSnapshot) -> StateSnapshot + Send>;

/// A state container the bus can read from and request updates on.
pub trait StateStore {
    /// The current state snapshot.
    fn snapshot(&self) -> StateSnapshot;

    /// Request an update. Completion order relative to later reads is
    /// defined by the implementation.
    fn update(&self, updater: StateUpdater);
}

impl<S: StateStore + ?Sized> StateStore for Arc<S> {
    fn snapshot(&self) -> StateSnapshot {
        (**self).snapshot()
    }

    fn update(&self, updater: StateUpdater) {
        (**self).update(updater)
    }
}

/// In-memory store applying updates immediately.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<StateSnapshot>,
}

impl MemoryStore {
    /// Create a store holding the given initial state.
    pub fn new(initial: StateSnapshot) -> Self {
        Self {
            state: RwLock::new(initial),
        }
    }

    /// Replace the whole state, returning the previous snapshot.
    pub fn replace(&self, next: StateSnapshot) -> StateSnapshot {
        std::mem::replace(&mut *self.state.write(), next)
    }
}

impl StateStore for MemoryStore {
    fn snapshot(&self) -> StateSnapshot {
        self.state.read().clone()
    }

    fn update(&self, updater: StateUpdater) {
        let mut state = self.state.write();
        let previous = std::mem::take(&mut *state);
        *state = updater(previous);
    }
}

/// Store that queues update requests until flushed.
#[derive(Default)]
pub struct DeferredStore {
    state: RwLock<StateSnapshot>,
    pending: Mutex<Vec<StateUpdater>>,
}

impl DeferredStore {
    /// Create a store holding the given initial state.
    pub fn new(initial: StateSnapshot) -> Self {
        Self {
            state: RwLock::new(initial),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Number of queued updates.
    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }

    /// Apply every queued update in request order.
    ///
    /// Returns the snapshots before and after, ready to be handed to
    /// [`EventBus::handle_state_change`](crate::EventBus::handle_state_change).
    pub fn flush(&self) -> (StateSnapshot, StateSnapshot) {
        let updaters = std::mem::take(&mut *self.pending.lock());

        let mut state = self.state.write();
        let old = state.clone();
        let mut next = std::mem::take(&mut *state);
        let applied = updaters.len();
        for updater in updaters {
            next = updater(next);
        }
        *state = next.clone();

        tracing::trace!(applied, "deferred store flushed");

        (old, next)
    }
}

impl StateStore for DeferredStore {
    fn snapshot(&self) -> StateSnapshot {
        self.state.read().clone()
    }

    fn update(&self, updater: StateUpdater) {
        self.pending.lock().push(updater);
    }
}

impl std::fmt::Debug for DeferredStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredStore")
            .field("state", &*self.state.read())
            .field("pending", &self.pending())
            .finish()
    }
}
