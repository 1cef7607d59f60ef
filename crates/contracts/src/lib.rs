//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Identity Model
//! - Events are routed by `name`
//! - Handlers are compared by identity (`HandlerRef` address), never by value

mod broker;
mod config;
mod error;
mod event;
mod handler;

pub use broker::*;
pub use config::*;
pub use error::*;
pub use event::Event;
pub use handler::{EventHandler, HandlerId, HandlerRef};
