//! Built-in handler implementations
//!
//! Contains LogHandler and FileHandler, plus the config-driven factory.

mod file;
mod log;

pub use self::file::FileHandler;
pub use self::log::LogHandler;

use std::collections::HashMap;

use contracts::{AppConfig, HandlerConfig, HandlerRef, HandlerType};
use tracing::{info, instrument};

use crate::error::EventManagerError;
use crate::manager::EventManager;

/// Create a handler from configuration
#[instrument(
    name = "event_manager_create_handler",
    skip(config),
    fields(handler = %config.name, handler_type = ?config.handler_type)
)]
pub fn create_handler(config: &HandlerConfig) -> Result<HandlerRef, EventManagerError> {
    match config.handler_type {
        HandlerType::Log => Ok(HandlerRef::new(LogHandler::new(&config.name))),
        HandlerType::File => {
            let handler = FileHandler::from_params(&config.name, &config.params)
                .map_err(|e| EventManagerError::handler_creation(&config.name, e.to_string()))?;
            Ok(HandlerRef::new(handler))
        }
    }
}

/// Build every configured handler and register it per subscription
///
/// Each handler is created once, so a handler subscribed to several events
/// keeps a single identity (and a single open file). Returns the number of
/// registrations made.
#[instrument(name = "event_manager_register_from_config", skip_all)]
pub fn register_from_config(
    manager: &EventManager,
    config: &AppConfig,
) -> Result<usize, EventManagerError> {
    let mut built: HashMap<&str, HandlerRef> = HashMap::with_capacity(config.handlers.len());
    for handler_config in &config.handlers {
        built.insert(handler_config.name.as_str(), create_handler(handler_config)?);
    }

    let mut registrations = 0;
    for subscription in &config.subscriptions {
        for name in &subscription.handlers {
            let handler = built.get(name.as_str()).ok_or_else(|| {
                EventManagerError::handler_creation(name, "not defined in [[handlers]]")
            })?;
            manager.register(&subscription.event, handler.clone())?;
            registrations += 1;
        }
    }

    info!(
        handlers = built.len(),
        events = manager.len(),
        registrations,
        "Handlers registered from config"
    );
    Ok(registrations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{BrokerConfig, ConfigVersion, Subscription};

    #[test]
    fn test_create_log_handler() {
        let config = HandlerConfig {
            name: "audit".to_string(),
            handler_type: HandlerType::Log,
            params: HashMap::new(),
        };
        let handler = create_handler(&config).unwrap();
        assert_eq!(handler.name(), "audit");
    }

    #[test]
    fn test_create_file_handler_requires_path() {
        let config = HandlerConfig {
            name: "journal".to_string(),
            handler_type: HandlerType::File,
            params: HashMap::new(),
        };
        let err = create_handler(&config).unwrap_err();
        assert!(err.to_string().contains("journal"));
        assert!(err.to_string().contains("path"));
    }

    #[test]
    fn test_each_creation_is_a_new_identity() {
        let config = HandlerConfig {
            name: "audit".to_string(),
            handler_type: HandlerType::Log,
            params: HashMap::new(),
        };
        assert_ne!(create_handler(&config).unwrap(), create_handler(&config).unwrap());
    }

    #[test]
    fn test_register_from_config_shares_identity() {
        let config = AppConfig {
            version: ConfigVersion::V1,
            broker: BrokerConfig::default(),
            handlers: vec![HandlerConfig {
                name: "audit".to_string(),
                handler_type: HandlerType::Log,
                params: HashMap::new(),
            }],
            subscriptions: vec![
                Subscription {
                    event: "order.created".to_string(),
                    handlers: vec!["audit".to_string()],
                },
                Subscription {
                    event: "order.cancelled".to_string(),
                    handlers: vec!["audit".to_string()],
                },
            ],
        };
        let manager = EventManager::new();

        assert_eq!(register_from_config(&manager, &config).unwrap(), 2);

        let created = manager.handlers("order.created");
        let cancelled = manager.handlers("order.cancelled");
        assert_eq!(created[0], cancelled[0]);
    }

    #[test]
    fn test_register_from_config_rejects_repeat_subscription() {
        let config = AppConfig {
            version: ConfigVersion::V1,
            broker: BrokerConfig::default(),
            handlers: vec![HandlerConfig {
                name: "audit".to_string(),
                handler_type: HandlerType::Log,
                params: HashMap::new(),
            }],
            subscriptions: vec![Subscription {
                event: "order.created".to_string(),
                handlers: vec!["audit".to_string(), "audit".to_string()],
            }],
        };
        let err = register_from_config(&EventManager::new(), &config).unwrap_err();
        assert!(err.is_duplicate());
    }
}
