//! Event records and their listeners.

use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// A listener callback, invoked with the event's new data.
pub type Callback = Box<dyn FnMut(&Value) + Send>;

/// Unique identifier of a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Wrap a raw listener number.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw listener number.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "callback_{}", self.0)
    }
}

struct Listener {
    id: ListenerId,
    callback: Callback,
}

/// A named event: its last-known data and the listeners to notify.
pub struct EventRecord {
    event_name: String,
    data: Value,
    listeners: Vec<Listener>,
}

impl EventRecord {
    /// Create a record with no listeners.
    pub fn new(event_name: impl Into<String>, data: Value) -> Self {
        Self {
            event_name: event_name.into(),
            data,
            listeners: Vec::new(),
        }
    }

    /// The event name.
    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    /// The last-known data value.
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Replace the data value without notifying.
    pub fn set_data(&mut self, data: Value) {
        self.data = data;
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Listener IDs in registration order.
    pub fn listener_ids(&self) -> Vec<ListenerId> {
        self.listeners.iter().map(|l| l.id).collect()
    }

    /// Append a listener.
    pub fn add_listener(&mut self, id: ListenerId, callback: Callback) {
        self.listeners.push(Listener { id, callback });
    }

    /// Remove a listener. Returns false if it was not registered here.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.id != id);
        self.listeners.len() != before
    }

    /// Store `data` and invoke every listener with it, in registration
    /// order. Returns the number of listeners invoked.
    pub fn publish(&mut self, data: Value) -> usize {
        self.data = data;
        let data = &self.data;
        for listener in &mut self.listeners {
            (listener.callback)(data);
        }
        self.listeners.len()
    }
}

impl fmt::Debug for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRecord")
            .field("event_name", &self.event_name)
            .field("data", &self.data)
            .field("listeners", &self.listener_ids())
            .finish()
    }
}

impl Serialize for EventRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("EventRecord", 3)?;
        state.serialize_field("eventName", &self.event_name)?;
        state.serialize_field("data", &self.data)?;
        state.serialize_field("listeners", &self.listener_ids())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::Arc;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&'static str) -> Callback) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let log_clone = log.clone();
        let make = move |tag: &'static str| -> Callback {
            let log = log_clone.clone();
            Box::new(move |data: &Value| log.lock().push(format!("{tag}:{data}")))
        };
        (log, make)
    }

    #[test]
    fn test_new_record() {
        let record = EventRecord::new("countChanged", json!(1));
        assert_eq!(record.event_name(), "countChanged");
        assert_eq!(record.data(), &json!(1));
        assert_eq!(record.listener_count(), 0);
    }

    #[test]
    fn test_publish_in_registration_order() {
        let (log, make) = recorder();
        let mut record = EventRecord::new("countChanged", json!(1));
        record.add_listener(ListenerId::new(0), make("first"));
        record.add_listener(ListenerId::new(1), make("second"));

        let invoked = record.publish(json!(2));

        assert_eq!(invoked, 2);
        assert_eq!(record.data(), &json!(2));
        assert_eq!(*log.lock(), vec!["first:2", "second:2"]);
    }

    #[test]
    fn test_remove_listener() {
        let (log, make) = recorder();
        let mut record = EventRecord::new("countChanged", json!(1));
        record.add_listener(ListenerId::new(0), make("a"));
        record.add_listener(ListenerId::new(1), make("b"));

        assert!(record.remove_listener(ListenerId::new(0)));
        assert!(!record.remove_listener(ListenerId::new(0)));
        assert_eq!(record.listener_ids(), vec![ListenerId::new(1)]);

        record.publish(json!(5));
        assert_eq!(*log.lock(), vec!["b:5"]);
    }

    #[test]
    fn test_listener_id_display() {
        assert_eq!(ListenerId::new(3).to_string(), "callback_3");
        assert_eq!(ListenerId::new(3).get(), 3);
    }

    #[test]
    fn test_serialize_record() {
        let mut record = EventRecord::new("userNameChanged", json!("ann"));
        record.add_listener(ListenerId::new(4), Box::new(|_: &Value| {}));

        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({ "eventName": "userNameChanged", "data": "ann", "listeners": [4] })
        );
    }

    #[test]
    fn test_debug_omits_closures() {
        let mut record = EventRecord::new("flagChanged", json!(true));
        record.add_listener(ListenerId::new(9), Box::new(|_: &Value| {}));

        let debug = format!("{record:?}");
        assert!(debug.contains("flagChanged"));
        assert!(debug.contains("ListenerId(9)"));
    }
}
