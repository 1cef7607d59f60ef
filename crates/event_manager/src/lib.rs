//! # Event Manager
//!
//! 事件注册与分发模块。
//!
//! 负责：
//! - 维护 event name -> handlers 注册表（按身份去重）
//! - Fan-out 到所有 handler，每个 handler 独立任务
//! - 等待全部 handler 完成后返回（完成屏障）

pub mod error;
pub mod handlers;
pub mod manager;
pub mod metrics;

pub use contracts::{Event, EventHandler, HandlerId, HandlerRef};
pub use error::EventManagerError;
pub use handlers::{create_handler, register_from_config, FileHandler, LogHandler};
pub use manager::{DispatchOutcome, EventManager};
pub use metrics::{DispatchMetrics, MetricsSnapshot};
