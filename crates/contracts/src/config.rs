//! AppConfig - Config Loader output
//!
//! Describes the broker queue, the handlers to build and which events they
//! subscribe to.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub version: ConfigVersion,

    /// Broker transport settings
    #[serde(default)]
    pub broker: BrokerConfig,

    /// Handler definitions
    #[serde(default)]
    pub handlers: Vec<HandlerConfig>,

    /// Event name -> handler names routing
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
}

impl AppConfig {
    /// Look up a handler definition by name
    pub fn handler(&self, name: &str) -> Option<&HandlerConfig> {
        self.handlers.iter().find(|h| h.name == name)
    }
}

/// In-memory broker settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Queue consumed by the bridge
    #[serde(default = "default_queue")]
    pub queue: String,

    /// Per-queue capacity
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            queue: default_queue(),
            capacity: default_capacity(),
        }
    }
}

fn default_queue() -> String {
    "events".to_string()
}

fn default_capacity() -> usize {
    1024
}

/// Handler definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerConfig {
    /// Unique handler name
    pub name: String,

    /// Handler kind
    pub handler_type: HandlerType,

    /// Kind-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

/// Built-in handler kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerType {
    /// Logs an event summary
    Log,
    /// Appends events as JSON lines (param: `path`)
    File,
}

/// Handlers subscribed to one event name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub event: String,
    pub handlers: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broker_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.broker.queue, "events");
        assert_eq!(config.broker.capacity, 1024);
        assert!(config.handlers.is_empty());
    }

    #[test]
    fn test_handler_lookup() {
        let config: AppConfig = serde_json::from_str(
            r#"{"handlers":[{"name":"audit","handler_type":"log"}]}"#,
        )
        .unwrap();
        assert_eq!(config.handler("audit").unwrap().handler_type, HandlerType::Log);
        assert!(config.handler("missing").is_none());
    }
}
