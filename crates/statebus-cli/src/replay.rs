//! Replay of recorded state transitions.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use statebus::{BusConfig, Error, EventBus, MemoryStore, StateSnapshot};

/// A value delivered to a listener.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    /// Event the listener was attached to.
    pub event_name: String,
    /// Value passed to the listener.
    pub value: Value,
}

/// What happened for one transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayStep {
    /// 1-based transition number.
    pub index: usize,
    /// Keys that differ from the previous snapshot.
    pub changed_keys: Vec<String>,
    /// Listener deliveries, in invocation order.
    pub deliveries: Vec<Delivery>,
}

type DeliveryLog = Arc<Mutex<Vec<Delivery>>>;

/// Dispatch every consecutive pair of snapshots through a fresh bus.
///
/// With an empty `listen` list every event gets a listener, including
/// events for keys that first appear mid-replay. Otherwise only the named
/// events are listened on, and an unknown name is an error.
pub fn replay(
    snapshots: Vec<StateSnapshot>,
    config: BusConfig,
    listen: &[String],
) -> Result<Vec<ReplayStep>, Error> {
    let mut snapshots = snapshots.into_iter();
    let initial = snapshots
        .next()
        .ok_or_else(|| Error::InvalidSnapshot("no snapshots in input".to_string()))?;

    let store = Arc::new(MemoryStore::new(initial));
    let mut bus = EventBus::with_config(Arc::clone(&store), config);
    let log: DeliveryLog = Arc::new(Mutex::new(Vec::new()));
    let mut listened = HashSet::new();

    if listen.is_empty() {
        listen_all(&mut bus, &log, &mut listened)?;
    } else {
        for event_name in listen {
            attach(&mut bus, &log, event_name)?;
        }
    }

    let mut steps = Vec::new();
    for (i, next) in snapshots.enumerate() {
        let old = store.replace(next.clone());
        if listen.is_empty() {
            bus.sync_events();
            listen_all(&mut bus, &log, &mut listened)?;
        }

        let report = bus.handle_state_change(&old, &next);
        let deliveries = std::mem::take(&mut *log.lock());

        tracing::debug!(
            step = i + 1,
            changed = report.changed_keys.len(),
            delivered = deliveries.len(),
            "transition replayed"
        );

        steps.push(ReplayStep {
            index: i + 1,
            changed_keys: report.changed_keys,
            deliveries,
        });
    }

    Ok(steps)
}

fn listen_all(
    bus: &mut EventBus<Arc<MemoryStore>>,
    log: &DeliveryLog,
    listened: &mut HashSet<String>,
) -> Result<(), Error> {
    let fresh: Vec<String> = bus
        .event_names()
        .into_iter()
        .filter(|name| !listened.contains(*name))
        .map(str::to_string)
        .collect();

    for event_name in fresh {
        attach(bus, log, &event_name)?;
        listened.insert(event_name);
    }
    Ok(())
}

fn attach(
    bus: &mut EventBus<Arc<MemoryStore>>,
    log: &DeliveryLog,
    event_name: &str,
) -> Result<(), Error> {
    let log = Arc::clone(log);
    let name = event_name.to_string();
    bus.add_listener(event_name, move |value: &Value| {
        log.lock().push(Delivery {
            event_name: name.clone(),
            value: value.clone(),
        })
    })?;
    Ok(())
}
