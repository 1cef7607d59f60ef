//! Layered error definitions
//!
//! Categorized by source: config / broker / payload

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Broker Errors =====
    /// Connection or channel already closed
    #[error("broker connection closed")]
    BrokerClosed,

    /// Destination queue no longer accepts messages
    #[error("broker queue '{queue}' closed")]
    QueueClosed { queue: String },

    /// Publish failed
    #[error("broker publish to '{destination}' failed: {message}")]
    Publish {
        destination: String,
        message: String,
    },

    // ===== Payload Errors =====
    /// Message body is not a valid event
    #[error("payload decode error for delivery {delivery_tag}: {message}")]
    PayloadDecode { delivery_tag: u64, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create queue closed error
    pub fn queue_closed(queue: impl Into<String>) -> Self {
        Self::QueueClosed {
            queue: queue.into(),
        }
    }

    /// Create publish error
    pub fn publish(destination: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Publish {
            destination: destination.into(),
            message: message.into(),
        }
    }

    /// Create payload decode error
    pub fn payload_decode(delivery_tag: u64, message: impl Into<String>) -> Self {
        Self::PayloadDecode {
            delivery_tag,
            message: message.into(),
        }
    }
}
