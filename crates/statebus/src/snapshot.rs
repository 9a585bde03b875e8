//! Ordered key/value state snapshots and change detection.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// An ordered mapping of state keys to JSON values.
///
/// Keys enumerate in insertion order, so "first changed key" is well
/// defined and stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateSnapshot(Map<String, Value>);

impl StateSnapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build a snapshot from a JSON value, which must be an object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(Error::InvalidSnapshot(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }

    /// Parse a snapshot from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Get the value for a key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Check whether a key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Keys in enumeration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Key/value pairs in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the snapshot has no keys.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Shallow merge: every key of `other` overwrites or extends `self`.
    pub fn merge(mut self, other: StateSnapshot) -> Self {
        for (key, value) in other.0 {
            self.0.insert(key, value);
        }
        self
    }
}

impl From<Map<String, Value>> for StateSnapshot {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for StateSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Keys of `new` whose value differs from `old`, in `new`'s enumeration
/// order. A key missing from `old` counts as changed; keys present only
/// in `old` are not reported.
pub fn changed_keys<'a>(old: &StateSnapshot, new: &'a StateSnapshot) -> Vec<&'a str> {
    new.iter()
        .filter(|(key, value)| old.get(key) != Some(*value))
        .map(|(key, _)| key)
        .collect()
}

/// The first key of `new` whose value differs from `old`, if any.
pub fn first_changed_key<'a>(old: &StateSnapshot, new: &'a StateSnapshot) -> Option<&'a str> {
    new.iter()
        .find(|(key, value)| old.get(key) != Some(*value))
        .map(|(key, _)| key)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_requires_object() {
        assert!(StateSnapshot::from_value(json!({ "a": 1 })).is_ok());

        let err = StateSnapshot::from_value(json!([1, 2])).unwrap_err();
        assert!(matches!(err, Error::InvalidSnapshot(_)));
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn test_from_json_keeps_key_order() {
        let snapshot = StateSnapshot::from_json(r#"{"z": 1, "a": 2, "m": 3}"#).unwrap();
        assert_eq!(snapshot.keys().collect::<Vec<_>>(), vec!["z", "a", "m"]);
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(matches!(
            StateSnapshot::from_json("{not json").unwrap_err(),
            Error::Json(_)
        ));
    }

    #[test]
    fn test_merge_overwrites_and_extends() {
        let base = StateSnapshot::new().with("count", 1).with("name", "ann");
        let merged = base.merge(StateSnapshot::new().with("count", 2).with("flag", true));

        assert_eq!(merged.get("count"), Some(&json!(2)));
        assert_eq!(merged.get("name"), Some(&json!("ann")));
        assert_eq!(merged.get("flag"), Some(&json!(true)));
        assert_eq!(merged.keys().collect::<Vec<_>>(), vec!["count", "name", "flag"]);
    }

    #[test]
    fn test_changed_keys() {
        let old = StateSnapshot::new().with("a", 1).with("b", 2).with("gone", 0);
        let new = StateSnapshot::new().with("a", 1).with("b", 3).with("c", 4);

        assert_eq!(changed_keys(&old, &new), vec!["b", "c"]);
        assert_eq!(first_changed_key(&old, &new), Some("b"));
    }

    #[test]
    fn test_no_changes() {
        let old = StateSnapshot::new().with("a", json!({ "nested": [1, 2] }));
        let new = old.clone();

        assert!(changed_keys(&old, &new).is_empty());
        assert_eq!(first_changed_key(&old, &new), None);
    }

    #[test]
    fn test_removed_key_is_not_a_change() {
        let old = StateSnapshot::new().with("a", 1).with("b", 2);
        let new = StateSnapshot::new().with("a", 1);

        assert_eq!(first_changed_key(&old, &new), None);
    }

    #[test]
    fn test_serde_transparent() {
        let snapshot = StateSnapshot::new().with("count", 1);
        assert_eq!(serde_json::to_value(&snapshot).unwrap(), json!({ "count": 1 }));

        let back: StateSnapshot = serde_json::from_value(json!({ "count": 1 })).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn test_from_iterator() {
        let snapshot: StateSnapshot = vec![("a", 1), ("b", 2)].into_iter().collect();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("b"), Some(&json!(2)));
    }
}
