//! LogHandler - logs event summary via tracing

use async_trait::async_trait;
use contracts::{Event, EventHandler};
use tracing::info;

/// Handler that logs event summaries for debugging
pub struct LogHandler {
    name: String,
}

impl LogHandler {
    /// Create a new LogHandler with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl EventHandler for LogHandler {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, event: &Event) {
        info!(
            handler = %self.name,
            event = %event.name(),
            timestamp = %event.timestamp(),
            payload_bytes = event.payload().to_string().len(),
            "Event received"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_log_handler_handle() {
        let handler = LogHandler::new("test_log");
        handler.handle(&Event::new("ping", json!({ "n": 1 }))).await;
    }

    #[test]
    fn test_log_handler_name() {
        let handler = LogHandler::new("my_logger");
        assert_eq!(handler.name(), "my_logger");
    }
}
