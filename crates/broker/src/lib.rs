//! # Broker
//!
//! Broker transport and the bridge from deliveries to dispatched events.
//!
//! 负责：
//! - 进程内消息队列（连接 / 通道 / 逐条确认）
//! - 解码 delivery -> `Event`，分发后 ack
//! - 无法解码的消息 reject，不重新入队

pub mod bridge;
pub mod memory;

pub use bridge::{publish_event, BridgeStats, EventBridge};
pub use contracts::{BrokerChannel, Delivery, DeliveryStream, Settlement};
pub use memory::{BrokerStats, InMemoryBroker, InMemoryChannel, InMemoryConnection, InMemoryConsumer};
