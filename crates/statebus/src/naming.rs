//! Event name derivation from state keys.
//!
//! Every state key maps to exactly one event name:
//!
//! - `$UserName` -> `userNameChanged` (sigil stripped, first letter lowered)
//! - `count` -> `countChanged`
//!
//! Names are not deduplicated. Two keys that normalize to the same name
//! bind to the same event.

use serde::{Deserialize, Serialize};

use crate::snapshot::StateSnapshot;

/// Default prefix marking a sigil key.
pub const DEFAULT_SIGIL: char = '$';

/// Default suffix appended to every derived event name.
pub const DEFAULT_SUFFIX: &str = "Changed";

/// Naming rule turning state keys into event names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventNaming {
    /// Prefix stripped from sigil keys.
    pub sigil: char,
    /// Suffix appended to the normalized key.
    pub suffix: String,
}

/// A state key together with the event name derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventBinding {
    /// The state key as it appears in the snapshot.
    pub state_key: String,
    /// The derived event name.
    pub event_name: String,
}

impl EventNaming {
    /// Create a naming rule with a custom sigil and suffix.
    pub fn new(sigil: char, suffix: impl Into<String>) -> Self {
        Self {
            sigil,
            suffix: suffix.into(),
        }
    }

    /// Derive the event name for a single state key.
    pub fn event_name_for(&self, state_key: &str) -> String {
        let base = if state_key.starts_with(self.sigil) {
            // Segment between the leading sigil and the next one.
            state_key.split(self.sigil).nth(1).unwrap_or_default()
        } else {
            state_key
        };

        let mut name = lower_first(base);
        name.push_str(&self.suffix);
        name
    }

    /// Derive one binding per key of the snapshot, in enumeration order.
    pub fn derive(&self, snapshot: &StateSnapshot) -> Vec<EventBinding> {
        snapshot
            .keys()
            .map(|key| EventBinding {
                state_key: key.to_string(),
                event_name: self.event_name_for(key),
            })
            .collect()
    }
}

impl Default for EventNaming {
    fn default() -> Self {
        Self::new(DEFAULT_SIGIL, DEFAULT_SUFFIX)
    }
}

/// Derive event bindings for a snapshot with the default naming rule.
pub fn derive_event_names(snapshot: &StateSnapshot) -> Vec<EventBinding> {
    EventNaming::default().derive(snapshot)
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(value: serde_json::Value) -> StateSnapshot {
        StateSnapshot::from_value(value).unwrap()
    }

    #[test]
    fn test_sigil_key() {
        let naming = EventNaming::default();
        assert_eq!(naming.event_name_for("$UserName"), "userNameChanged");
        assert_eq!(naming.event_name_for("$count"), "countChanged");
    }

    #[test]
    fn test_plain_key() {
        let naming = EventNaming::default();
        assert_eq!(naming.event_name_for("count"), "countChanged");
        assert_eq!(naming.event_name_for("Total"), "totalChanged");
    }

    #[test]
    fn test_sigil_key_stops_at_next_sigil() {
        let naming = EventNaming::default();
        assert_eq!(naming.event_name_for("$Cart$items"), "cartChanged");
    }

    #[test]
    fn test_degenerate_keys() {
        let naming = EventNaming::default();
        assert_eq!(naming.event_name_for(""), "Changed");
        assert_eq!(naming.event_name_for("$"), "Changed");
    }

    #[test]
    fn test_non_ascii_first_char() {
        let naming = EventNaming::default();
        assert_eq!(naming.event_name_for("Ärger"), "ärgerChanged");
    }

    #[test]
    fn test_custom_rule() {
        let naming = EventNaming::new('#', "Updated");
        assert_eq!(naming.event_name_for("#Theme"), "themeUpdated");
        assert_eq!(naming.event_name_for("$Theme"), "$ThemeUpdated");
    }

    #[test]
    fn test_derive_follows_key_order() {
        let state = snapshot(json!({ "count": 1, "$UserName": "ann", "Flag": true }));
        let bindings = derive_event_names(&state);

        let pairs: Vec<(&str, &str)> = bindings
            .iter()
            .map(|b| (b.state_key.as_str(), b.event_name.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("count", "countChanged"),
                ("$UserName", "userNameChanged"),
                ("Flag", "flagChanged"),
            ]
        );
    }

    #[test]
    fn test_derive_is_deterministic() {
        let state = snapshot(json!({ "$A": 1, "b": 2, "C": 3 }));
        assert_eq!(derive_event_names(&state), derive_event_names(&state));
    }

    #[test]
    fn test_colliding_names_are_kept() {
        let state = snapshot(json!({ "$count": 1, "count": 2 }));
        let bindings = derive_event_names(&state);

        assert_eq!(bindings.len(), 2);
        assert!(bindings.iter().all(|b| b.event_name == "countChanged"));
    }

    #[test]
    fn test_binding_serializes_camel_case() {
        let binding = EventBinding {
            state_key: "count".to_string(),
            event_name: "countChanged".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&binding).unwrap(),
            json!({ "stateKey": "count", "eventName": "countChanged" })
        );
    }
}
