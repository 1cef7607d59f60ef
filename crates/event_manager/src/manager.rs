//! EventManager - handler registry and concurrent fan-out dispatch

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use tracing::{debug, debug_span, error, instrument, trace, Instrument};

use contracts::{Event, HandlerRef};

use crate::error::EventManagerError;
use crate::metrics::DispatchMetrics;

/// Event name -> handlers in registration order
type Registry = HashMap<String, Vec<HandlerRef>>;

/// Result of a single dispatch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Handlers in the snapshot; every one of them has finished
    pub handlers: usize,
    /// Handler tasks that panicked
    pub panicked: usize,
}

impl DispatchOutcome {
    /// No handler was registered for the event name
    pub fn is_unrouted(&self) -> bool {
        self.handlers == 0
    }
}

/// Central registry + dispatcher for named events
///
/// All registry access goes through one `RwLock`. Dispatch snapshots the
/// handler list under the read lock and releases it before any handler runs.
#[derive(Debug, Default)]
pub struct EventManager {
    handlers: RwLock<Registry>,
    metrics: Arc<DispatchMetrics>,
}

impl EventManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Get metrics
    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        &self.metrics
    }

    /// Register a handler under an event name
    ///
    /// Appends to the end of the name's handler list.
    ///
    /// # Errors
    /// - `DuplicateHandler` if this handler identity is already registered
    ///   under `event_name` (registry unchanged)
    /// - `EmptyEventName` for an empty routing key
    #[instrument(
        name = "event_manager_register",
        skip(self, handler),
        fields(handler = %handler.name())
    )]
    pub fn register(&self, event_name: &str, handler: HandlerRef) -> Result<(), EventManagerError> {
        if event_name.is_empty() {
            return Err(EventManagerError::EmptyEventName);
        }

        let mut registry = self.write();
        let entry = registry.entry(event_name.to_string()).or_default();
        if entry.contains(&handler) {
            return Err(EventManagerError::DuplicateHandler {
                event_name: event_name.to_string(),
                handler: handler.name().to_string(),
                id: handler.id(),
            });
        }
        entry.push(handler);
        let position = entry.len();
        let event_names = registry.len();
        drop(registry);

        self.metrics.inc_registrations();
        observability::record_registry_size(event_names);
        debug!(event = %event_name, position, "Handler registered");
        Ok(())
    }

    /// Dispatch an event to every handler registered under its name
    ///
    /// Each handler runs as its own Tokio task. Returns once all of them have
    /// finished. An unknown name is a no-op. A panicking handler is logged and
    /// counted; it never fails the dispatch.
    ///
    /// No timeout is applied: a handler that never completes stalls this call.
    /// Dropping the returned future before it resolves leaves the started
    /// handlers running to completion.
    #[instrument(name = "event_manager_dispatch", skip(self, event), fields(event = %event.name()))]
    pub async fn dispatch(&self, event: Event) -> DispatchOutcome {
        let started = Instant::now();
        let snapshot = self.handlers(event.name());
        self.metrics.record_dispatch(snapshot.len());

        if snapshot.is_empty() {
            trace!("No handlers registered");
            observability::record_event_dispatched(event.name(), 0, 0.0);
            return DispatchOutcome::default();
        }

        // Detached tasks: dropping this future stops the wait, not the handlers.
        let event = Arc::new(event);
        let tasks: Vec<_> = snapshot
            .into_iter()
            .map(|handler| {
                let span =
                    debug_span!("event_handler", handler = %handler.name(), id = %handler.id());
                let event = Arc::clone(&event);
                tokio::spawn(async move { handler.handle(&event).await }.instrument(span))
            })
            .collect();

        let mut outcome = DispatchOutcome {
            handlers: tasks.len(),
            panicked: 0,
        };

        for task in tasks {
            if let Err(e) = task.await {
                outcome.panicked += 1;
                self.metrics.inc_handler_panics();
                observability::record_handler_panic(event.name());
                error!(error = %e, "Event handler task failed");
            }
        }

        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        observability::record_event_dispatched(event.name(), outcome.handlers, latency_ms);
        debug!(
            handlers = outcome.handlers,
            panicked = outcome.panicked,
            latency_ms,
            "Dispatch complete"
        );

        outcome
    }

    /// Whether `handler` is registered under `event_name`
    pub fn has(&self, event_name: &str, handler: &HandlerRef) -> bool {
        self.read()
            .get(event_name)
            .is_some_and(|handlers| handlers.contains(handler))
    }

    /// Ensure `handler` is not registered under `event_name`
    ///
    /// Removes every match; absent handler or unknown name is a no-op.
    #[instrument(
        name = "event_manager_remove",
        skip(self, handler),
        fields(handler = %handler.name())
    )]
    pub fn remove(&self, event_name: &str, handler: &HandlerRef) {
        let mut registry = self.write();
        let Some(entry) = registry.get_mut(event_name) else {
            return;
        };

        let before = entry.len();
        entry.retain(|h| h != handler);
        let removed = before - entry.len();
        if entry.is_empty() {
            registry.remove(event_name);
        }
        let event_names = registry.len();
        drop(registry);

        if removed > 0 {
            self.metrics.add_removals(removed);
            observability::record_registry_size(event_names);
            debug!(event = %event_name, removed, "Handler removed");
        }
    }

    /// Clear every event name and handler
    #[instrument(name = "event_manager_remove_all", skip(self))]
    pub fn remove_all(&self) {
        let cleared = std::mem::take(&mut *self.write());
        let removed: usize = cleared.values().map(Vec::len).sum();

        self.metrics.add_removals(removed);
        observability::record_registry_size(0);
        debug!(events = cleared.len(), removed, "Registry cleared");
    }

    /// Snapshot of the handlers under `event_name`, in registration order
    pub fn handlers(&self, event_name: &str) -> Vec<HandlerRef> {
        self.read().get(event_name).cloned().unwrap_or_default()
    }

    /// Registered event names, sorted
    pub fn event_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of event names with at least one handler
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// True when no event name has a handler
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // The map is consistent after every mutation, so a poisoned lock is
    // still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.handlers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.handlers.write().unwrap_or_else(PoisonError::into_inner)
    }
}
