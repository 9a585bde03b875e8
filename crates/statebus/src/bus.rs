//! Event bus bridging a state store with named change events.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, trace, warn};

use crate::config::{BusConfig, DispatchMode};
use crate::error::{Error, Result};
use crate::record::{EventRecord, ListenerId};
use crate::snapshot::{changed_keys, StateSnapshot};
use crate::store::{StateStore, StateUpdater};

/// Outcome of [`EventBus::sync_events`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Events created for state keys seen for the first time.
    pub created: usize,
    /// Existing events whose data was refreshed from the store.
    pub refreshed: usize,
}

/// One event notified during a dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// The state key that changed.
    pub state_key: String,
    /// The event bound to that key.
    pub event_name: String,
    /// Number of listeners invoked.
    pub listeners: usize,
}

/// Outcome of [`EventBus::dispatch`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchReport {
    /// Every key whose value differs, in enumeration order.
    pub changed_keys: Vec<String>,
    /// Events that were updated and notified, in dispatch order.
    pub notified: Vec<Notification>,
}

impl DispatchReport {
    /// Total number of listener invocations.
    pub fn listeners_invoked(&self) -> usize {
        self.notified.iter().map(|n| n.listeners).sum()
    }

    /// Check whether any event was notified.
    pub fn is_empty(&self) -> bool {
        self.notified.is_empty()
    }
}

/// Publish/subscribe bus over a [`StateStore`].
///
/// Every state key gets an event named by the configured
/// [`EventNaming`](crate::EventNaming) rule. Listeners attach to events by
/// name and fire when [`dispatch`](Self::dispatch) sees the bound key
/// change. Events can also be declared explicitly with
/// [`create_event`](Self::create_event), in which case the event name is
/// itself the state key.
pub struct EventBus<S: StateStore> {
    /// External state container.
    store: S,
    /// Bus configuration.
    config: BusConfig,
    /// Event records keyed by event name.
    events: HashMap<String, EventRecord>,
    /// State keys declared through `create_event`; each binds to the event
    /// of the same name.
    created: HashSet<String>,
    /// Index of listeners by the event they are attached to.
    listener_index: HashMap<ListenerId, String>,
    /// Next listener ID.
    next_listener_id: u64,
}

impl<S: StateStore> EventBus<S> {
    /// Create a bus with the default configuration. Events are derived for
    /// every key of the store's current state.
    pub fn new(store: S) -> Self {
        Self::with_config(store, BusConfig::default())
    }

    /// Create a bus with an explicit configuration.
    pub fn with_config(store: S, config: BusConfig) -> Self {
        let mut bus = Self {
            store,
            config,
            events: HashMap::new(),
            created: HashSet::new(),
            listener_index: HashMap::new(),
            next_listener_id: 0,
        };
        bus.sync_events();
        bus
    }

    /// Reconcile event records with the store's current state.
    ///
    /// New keys get a fresh record; known events get their data refreshed.
    /// Listeners are never discarded.
    pub fn sync_events(&mut self) -> SyncReport {
        let snapshot = self.store.snapshot();
        let mut report = SyncReport::default();

        for binding in self.config.naming.derive(&snapshot) {
            // Declared keys and declared events are owned by `create_event`.
            if self.created.contains(&binding.state_key)
                || self.created.contains(&binding.event_name)
            {
                continue;
            }

            let data = snapshot
                .get(&binding.state_key)
                .cloned()
                .unwrap_or(Value::Null);

            match self.events.entry(binding.event_name) {
                Entry::Occupied(mut entry) => {
                    entry.get_mut().set_data(data);
                    report.refreshed += 1;
                }
                Entry::Vacant(entry) => {
                    let record = EventRecord::new(entry.key().clone(), data);
                    entry.insert(record);
                    report.created += 1;
                }
            }
        }

        trace!(
            created = report.created,
            refreshed = report.refreshed,
            "events synced"
        );

        report
    }

    /// Register a listener on an event.
    ///
    /// Fails with [`Error::EventNotFound`] if no event carries this name.
    /// The callback is attached to this event only.
    pub fn add_listener<F>(&mut self, event_name: &str, callback: F) -> Result<ListenerId>
    where
        F: FnMut(&Value) + Send + 'static,
    {
        if self.config.auto_sync {
            self.sync_events();
        }

        let record = self
            .events
            .get_mut(event_name)
            .ok_or_else(|| Error::event_not_found(event_name))?;

        let listener_id = ListenerId::new(self.next_listener_id);
        self.next_listener_id += 1;

        record.add_listener(listener_id, Box::new(callback));
        self.listener_index.insert(listener_id, event_name.into());

        debug!(
            listener_id = %listener_id,
            event = event_name,
            listeners = record.listener_count(),
            "listener registered"
        );

        Ok(listener_id)
    }

    /// Remove a listener.
    pub fn remove_listener(&mut self, listener_id: ListenerId) -> Result<()> {
        let event_name = self
            .listener_index
            .remove(&listener_id)
            .ok_or(Error::ListenerNotFound(listener_id))?;

        let removed = self
            .events
            .get_mut(&event_name)
            .is_some_and(|record| record.remove_listener(listener_id));
        if !removed {
            return Err(Error::ListenerNotFound(listener_id));
        }

        debug!(listener_id = %listener_id, event = %event_name, "listener removed");

        Ok(())
    }

    /// Declare an event explicitly.
    ///
    /// The record is stored under `event_name`, which also becomes the state
    /// key it is bound to. The store is asked to merge
    /// `{ event_name: { "eventName": .., "data": .. } }` into its state.
    ///
    /// An existing event with the same name is replaced and its listeners
    /// are dropped. If `event_name` is already a state key, the event derived
    /// from it stops receiving that key's changes; it is removed, along with
    /// its listeners, unless another key still binds to it.
    pub fn create_event(&mut self, event_name: impl Into<String>, initial_data: impl Into<Value>) {
        let event_name = event_name.into();
        let data = initial_data.into();

        let record = EventRecord::new(event_name.clone(), data.clone());
        if let Some(previous) = self.events.insert(event_name.clone(), record) {
            let dropped = previous.listener_ids();
            if !dropped.is_empty() {
                warn!(
                    event = %event_name,
                    listeners = dropped.len(),
                    "event replaced, listeners dropped"
                );
            }
            for id in dropped {
                self.listener_index.remove(&id);
            }
        }
        self.retire_shadowed_event(&event_name);
        self.created.insert(event_name.clone());

        let update = StateSnapshot::new().with(
            event_name.clone(),
            json!({ "eventName": event_name, "data": data }),
        );
        let updater: StateUpdater = Box::new(move |previous: StateSnapshot| previous.merge(update));
        self.store.update(updater);

        debug!(event = %event_name, "event created");
    }

    /// Drop the derived event of `state_key` once the key is rebound to an
    /// explicit event of the same name.
    fn retire_shadowed_event(&mut self, state_key: &str) {
        if self.created.contains(state_key) {
            return;
        }
        let snapshot = self.store.snapshot();
        if !snapshot.contains_key(state_key) {
            return;
        }

        let derived = self.config.naming.event_name_for(state_key);
        if derived == state_key || self.created.contains(&derived) {
            return;
        }
        let still_bound = snapshot.keys().any(|key| {
            key != state_key
                && !self.created.contains(key)
                && self.config.naming.event_name_for(key) == derived
        });
        if still_bound {
            return;
        }

        let Some(record) = self.events.remove(&derived) else {
            return;
        };
        let dropped = record.listener_ids();
        if dropped.is_empty() {
            debug!(state_key, event = %derived, "derived event retired");
        } else {
            warn!(
                state_key,
                event = %derived,
                listeners = dropped.len(),
                "state key rebound to an explicit event, listeners dropped"
            );
        }
        for id in dropped {
            self.listener_index.remove(&id);
        }
    }

    /// Notify listeners of the events whose state keys changed between
    /// `old` and `new`.
    ///
    /// Which changed keys are dispatched depends on
    /// [`BusConfig::dispatch_mode`]. Keys without an event are skipped.
    /// Listeners run synchronously; a panicking listener propagates to the
    /// caller.
    pub fn dispatch(&mut self, old: &StateSnapshot, new: &StateSnapshot) -> DispatchReport {
        let changed = changed_keys(old, new);
        let dispatched = match self.config.dispatch_mode {
            DispatchMode::FirstChange => &changed[..changed.len().min(1)],
            DispatchMode::EachChange => &changed[..],
        };

        let mut notified = Vec::with_capacity(dispatched.len());
        for &state_key in dispatched {
            let event_name = self.resolve_event_name(state_key);
            let Some(record) = self.events.get_mut(&event_name) else {
                trace!(state_key, event = %event_name, "no event bound to changed key");
                continue;
            };

            let value = new.get(state_key).cloned().unwrap_or(Value::Null);
            let listeners = record.publish(value);

            trace!(state_key, event = %event_name, listeners, "event dispatched");

            notified.push(Notification {
                state_key: state_key.to_string(),
                event_name,
                listeners,
            });
        }

        DispatchReport {
            changed_keys: changed.into_iter().map(str::to_string).collect(),
            notified,
        }
    }

    /// State-change observer hook; same as [`dispatch`](Self::dispatch).
    pub fn handle_state_change(
        &mut self,
        old: &StateSnapshot,
        new: &StateSnapshot,
    ) -> DispatchReport {
        self.dispatch(old, new)
    }

    /// The event name a state key is bound to.
    pub fn resolve_event_name(&self, state_key: &str) -> String {
        if self.created.contains(state_key) {
            state_key.to_string()
        } else {
            self.config.naming.event_name_for(state_key)
        }
    }

    /// Get an event record by name.
    pub fn event(&self, event_name: &str) -> Option<&EventRecord> {
        self.events.get(event_name)
    }

    /// Check whether an event exists.
    pub fn contains_event(&self, event_name: &str) -> bool {
        self.events.contains_key(event_name)
    }

    /// All event records, in no particular order.
    pub fn events(&self) -> impl Iterator<Item = (&str, &EventRecord)> {
        self.events.iter().map(|(name, record)| (name.as_str(), record))
    }

    /// Event names, sorted.
    pub fn event_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.events.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of events.
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Number of listeners on an event, if it exists.
    pub fn listener_count(&self, event_name: &str) -> Option<usize> {
        self.events.get(event_name).map(EventRecord::listener_count)
    }

    /// JSON view of every event, keyed by name in sorted order.
    pub fn events_json(&self) -> Value {
        let sorted: BTreeMap<&str, &EventRecord> = self.events().collect();
        serde_json::to_value(sorted).unwrap_or(Value::Null)
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The bus configuration.
    pub fn config(&self) -> &BusConfig {
        &self.config
    }
}

impl<S: StateStore> std::fmt::Debug for EventBus<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("config", &self.config)
            .field("events", &self.event_names())
            .field("listeners", &self.listener_index.len())
            .finish()
    }
}
