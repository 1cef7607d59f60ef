//! Event manager error types

use contracts::HandlerId;
use thiserror::Error;

/// Registry errors
#[derive(Debug, Error)]
pub enum EventManagerError {
    /// The same handler identity is already registered under this name
    #[error("handler already registered: '{handler}' ({id}) under event '{event_name}'")]
    DuplicateHandler {
        event_name: String,
        handler: String,
        id: HandlerId,
    },

    /// Empty routing key
    #[error("event name must not be empty")]
    EmptyEventName,

    /// Handler creation error
    #[error("failed to create handler '{name}': {message}")]
    HandlerCreation { name: String, message: String },
}

impl EventManagerError {
    /// Create a handler creation error
    pub fn handler_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HandlerCreation {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Whether this is the duplicate-registration case
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateHandler { .. })
    }
}
