//! EventHandler trait - the capability invoked on dispatch
//!
//! Handlers are owned by the caller that registers them. The registry only
//! keeps shared references (`HandlerRef`) and compares them by identity.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::Event;

/// Event handler trait
///
/// Handlers run as independent tasks and return nothing. A handler that can
/// fail must contain the failure itself (log it, count it); the dispatcher
/// never sees it.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handler name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Handle one event
    async fn handle(&self, event: &Event);
}

/// Stable identity token of a registered handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(usize);

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Shared, identity-compared reference to an event handler
///
/// Clones of one `HandlerRef` are the same handler. Two `HandlerRef::new`
/// calls always yield distinct handlers, even for equal values.
///
/// # Example
///
/// ```ignore
/// let audit = HandlerRef::new(AuditHandler::default());
/// manager.register("order.created", audit.clone())?;
/// assert!(manager.has("order.created", &audit));
/// ```
#[derive(Clone)]
pub struct HandlerRef(Arc<dyn EventHandler>);

impl HandlerRef {
    /// Wrap a handler value into a fresh identity
    pub fn new<H: EventHandler + 'static>(handler: H) -> Self {
        Self(Arc::new(handler))
    }

    /// Reuse an existing shared handler; identity follows the `Arc`
    pub fn from_arc(handler: Arc<dyn EventHandler>) -> Self {
        Self(handler)
    }

    /// Identity token (address of the shared allocation)
    pub fn id(&self) -> HandlerId {
        HandlerId(Arc::as_ptr(&self.0) as *const () as usize)
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub async fn handle(&self, event: &Event) {
        self.0.handle(event).await
    }
}

impl PartialEq for HandlerRef {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for HandlerRef {}

impl fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRef")
            .field("name", &self.name())
            .field("id", &self.id())
            .finish()
    }
}

impl From<Arc<dyn EventHandler>> for HandlerRef {
    fn from(handler: Arc<dyn EventHandler>) -> Self {
        Self::from_arc(handler)
    }
}
