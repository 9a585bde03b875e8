//! statebus - Named change events over key/value state.
//!
//! Every key of a state snapshot gets an event (`count` -> `countChanged`,
//! `$UserName` -> `userNameChanged`). Listeners attach to events by name and
//! fire with the new value whenever a dispatch sees the bound key change.
//!
//! # Quick Start
//!
//! ```
//! use statebus::{EventBus, MemoryStore, StateSnapshot};
//! use serde_json::json;
//!
//! let initial = StateSnapshot::new().with("count", 1);
//! let mut bus = EventBus::new(MemoryStore::new(initial.clone()));
//!
//! bus.add_listener("countChanged", |value: &serde_json::Value| {
//!     println!("count is now {value}");
//! })?;
//!
//! let next = initial.clone().with("count", 2);
//! let report = bus.dispatch(&initial, &next);
//! assert_eq!(report.listeners_invoked(), 1);
//! assert_eq!(bus.event("countChanged").unwrap().data(), &json!(2));
//! # Ok::<(), statebus::Error>(())
//! ```

pub mod bus;
pub mod config;
pub mod error;
pub mod naming;
pub mod record;
pub mod snapshot;
pub mod store;

pub use bus::{DispatchReport, EventBus, Notification, SyncReport};
pub use config::{BusConfig, DispatchMode};
pub use error::{Error, Result};
pub use naming::{derive_event_names, EventBinding, EventNaming};
pub use record::{Callback, EventRecord, ListenerId};
pub use snapshot::{changed_keys, first_changed_key, StateSnapshot};
pub use store::{DeferredStore, MemoryStore, StateStore, StateUpdater};
