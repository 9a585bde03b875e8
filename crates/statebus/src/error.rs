//! Event bus error types.

use thiserror::Error;

use crate::record::ListenerId;

/// Event bus errors.
#[derive(Debug, Error)]
pub enum Error {
    /// No event record carries the requested name.
    #[error(
        "event \"{event_name}\" does not exist; create it with create_event or add a matching state item first"
    )]
    EventNotFound {
        /// The name that was looked up.
        event_name: String,
    },

    /// The listener was never registered or has already been removed.
    #[error("listener {0} not found")]
    ListenerNotFound(ListenerId),

    /// A JSON document could not be used as a state snapshot.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// JSON (de)serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an [`Error::EventNotFound`] for the given name.
    pub fn event_not_found(event_name: impl Into<String>) -> Self {
        Error::EventNotFound {
            event_name: event_name.into(),
        }
    }
}

/// Result alias for event bus operations.
pub type Result<T> = std::result::Result<T, Error>;
