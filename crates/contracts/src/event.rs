//! Event - the unit routed by the event manager
//!
//! Immutable once created. The payload is opaque to the dispatcher; its shape
//! is a convention between producer and handlers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named occurrence with a creation instant and an opaque payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Routing key
    name: String,

    /// Creation instant (defaults to decode time when absent on the wire)
    #[serde(default = "Utc::now")]
    timestamp: DateTime<Utc>,

    /// Opaque event data
    #[serde(default)]
    payload: Value,
}

impl Event {
    /// Create an event stamped with the current instant
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self::with_timestamp(name, Utc::now(), payload)
    }

    /// Create an event with an explicit timestamp
    pub fn with_timestamp(name: impl Into<String>, timestamp: DateTime<Utc>, payload: Value) -> Self {
        Self {
            name: name.into(),
            timestamp,
            payload,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }
}
