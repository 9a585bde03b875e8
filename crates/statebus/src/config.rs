//! Event bus configuration.

use serde::{Deserialize, Serialize};

use crate::naming::EventNaming;

/// How a dispatch treats a state update that changed more than one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// Notify only the first changed key, in enumeration order.
    FirstChange,
    /// Notify every changed key independently, in enumeration order.
    #[default]
    EachChange,
}

/// Event bus configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Rule used to derive event names from state keys.
    pub naming: EventNaming,

    /// Multi-key dispatch behavior.
    pub dispatch_mode: DispatchMode,

    /// Re-sync events from the store before every listener lookup.
    pub auto_sync: bool,
}

impl BusConfig {
    /// Create a configuration with the default naming rule and dispatch mode.
    pub fn new() -> Self {
        Self {
            naming: EventNaming::default(),
            dispatch_mode: DispatchMode::default(),
            auto_sync: true,
        }
    }

    /// Configuration reproducing the legacy behavior: only the first
    /// changed key of an update is dispatched.
    pub fn legacy() -> Self {
        Self::new().with_dispatch_mode(DispatchMode::FirstChange)
    }

    /// Set the naming rule.
    pub fn with_naming(mut self, naming: EventNaming) -> Self {
        self.naming = naming;
        self
    }

    /// Set the dispatch mode.
    pub fn with_dispatch_mode(mut self, mode: DispatchMode) -> Self {
        self.dispatch_mode = mode;
        self
    }

    /// Enable or disable syncing before listener lookups.
    pub fn with_auto_sync(mut self, auto_sync: bool) -> Self {
        self.auto_sync = auto_sync;
        self
    }

    /// Parse a configuration from a JSON document. Missing fields take
    /// their defaults.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::{DEFAULT_SIGIL, DEFAULT_SUFFIX};

    #[test]
    fn test_default_config() {
        let config = BusConfig::default();
        assert_eq!(config.naming.sigil, DEFAULT_SIGIL);
        assert_eq!(config.naming.suffix, DEFAULT_SUFFIX);
        assert_eq!(config.dispatch_mode, DispatchMode::EachChange);
        assert!(config.auto_sync);
    }

    #[test]
    fn test_config_builder() {
        let config = BusConfig::new()
            .with_naming(EventNaming::new('@', "Updated"))
            .with_dispatch_mode(DispatchMode::FirstChange)
            .with_auto_sync(false);

        assert_eq!(config.naming.sigil, '@');
        assert_eq!(config.naming.suffix, "Updated");
        assert_eq!(config.dispatch_mode, DispatchMode::FirstChange);
        assert!(!config.auto_sync);
    }

    #[test]
    fn test_legacy_config() {
        assert_eq!(BusConfig::legacy().dispatch_mode, DispatchMode::FirstChange);
    }

    #[test]
    fn test_from_json_partial() {
        let config = BusConfig::from_json(r#"{"dispatch_mode": "first_change"}"#).unwrap();
        assert_eq!(config.dispatch_mode, DispatchMode::FirstChange);
        assert_eq!(config.naming, EventNaming::default());
        assert!(config.auto_sync);
    }

    #[test]
    fn test_from_json_rejects_unknown_mode() {
        assert!(BusConfig::from_json(r#"{"dispatch_mode": "sometimes"}"#).is_err());
    }
}
