//! 配置校验模块
//!
//! 校验规则：
//! - handler name 非空且唯一
//! - file handler 必须提供 path 参数
//! - subscription 的 event name 非空
//! - subscription 引用的 handler 必须存在，且同一事件下不可重复
//! - broker queue 非空，capacity > 0

use std::collections::HashSet;

use contracts::{AppConfig, ContractError, HandlerType};

/// 校验 AppConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &AppConfig) -> Result<(), ContractError> {
    validate_broker(config)?;
    validate_handlers(config)?;
    validate_subscriptions(config)?;
    Ok(())
}

/// 校验 broker 配置
fn validate_broker(config: &AppConfig) -> Result<(), ContractError> {
    if config.broker.queue.is_empty() {
        return Err(ContractError::config_validation(
            "broker.queue",
            "queue name cannot be empty",
        ));
    }
    if config.broker.capacity == 0 {
        return Err(ContractError::config_validation(
            "broker.capacity",
            "capacity must be > 0",
        ));
    }
    Ok(())
}

/// 校验 handler 定义
fn validate_handlers(config: &AppConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, handler) in config.handlers.iter().enumerate() {
        if handler.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("handlers[{}].name", idx),
                "handler name cannot be empty",
            ));
        }
        if !seen.insert(handler.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("handlers[name={}]", handler.name),
                "duplicate handler name",
            ));
        }
        if handler.handler_type == HandlerType::File
            && handler.params.get("path").is_none_or(|p| p.is_empty())
        {
            return Err(ContractError::config_validation(
                format!("handlers[name={}].params.path", handler.name),
                "file handler requires a 'path' parameter",
            ));
        }
    }
    Ok(())
}

/// 校验订阅关系
fn validate_subscriptions(config: &AppConfig) -> Result<(), ContractError> {
    let known: HashSet<_> = config.handlers.iter().map(|h| h.name.as_str()).collect();
    // (event, handler) pairs across all entries; one event may span several entries
    let mut listed = HashSet::new();

    for (idx, subscription) in config.subscriptions.iter().enumerate() {
        if subscription.event.is_empty() {
            return Err(ContractError::config_validation(
                format!("subscriptions[{}].event", idx),
                "event name cannot be empty",
            ));
        }

        for name in &subscription.handlers {
            if !known.contains(name.as_str()) {
                return Err(ContractError::config_validation(
                    format!("subscriptions[event={}].handlers", subscription.event),
                    format!("unknown handler '{}'", name),
                ));
            }
            if !listed.insert((subscription.event.as_str(), name.as_str())) {
                return Err(ContractError::config_validation(
                    format!("subscriptions[event={}].handlers", subscription.event),
                    format!("duplicate handler '{}' for the same event", name),
                ));
            }
        }
    }
    Ok(())
}
