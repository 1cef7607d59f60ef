//! EventBridge - turns consumed deliveries into dispatched events

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use contracts::{BrokerChannel, ContractError, Delivery, DeliveryStream, Event};
use event_manager::EventManager;
use observability::DispatchAggregator;
use tracing::{debug, info, instrument, warn};

/// Counters for one bridge run
#[derive(Debug, Clone, Default)]
pub struct BridgeStats {
    /// Deliveries pulled from the stream
    pub received: u64,
    /// Deliveries decoded, dispatched and acked
    pub dispatched: u64,
    /// Deliveries rejected as undecodable
    pub rejected: u64,
    /// Per-dispatch aggregation
    pub dispatch: DispatchAggregator,
}

/// Drains a delivery stream into an EventManager
///
/// Each delivery is acknowledged individually, after its dispatch has
/// completed. Bodies that are not a JSON `Event` are rejected without requeue.
pub struct EventBridge {
    manager: Arc<EventManager>,
}

impl EventBridge {
    pub fn new(manager: Arc<EventManager>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &Arc<EventManager> {
        &self.manager
    }

    /// Encode an event as a message body
    pub fn encode(event: &Event) -> Result<Bytes, ContractError> {
        serde_json::to_vec(event)
            .map(Bytes::from)
            .map_err(|e| ContractError::Other(format!("event encode error: {e}")))
    }

    /// Decode a delivery body into an event
    pub fn decode(delivery: &Delivery) -> Result<Event, ContractError> {
        serde_json::from_slice(delivery.body())
            .map_err(|e| ContractError::payload_decode(delivery.delivery_tag(), e.to_string()))
    }

    /// Run until the stream ends
    #[instrument(name = "bridge_run", skip_all)]
    pub async fn run<S: DeliveryStream + Send>(&self, mut stream: S) -> BridgeStats {
        info!("Event bridge started");

        let mut stats = BridgeStats::default();
        while let Some(delivery) = stream.next_delivery().await {
            stats.received += 1;
            self.process(delivery, &mut stats).await;

            if stats.received.is_multiple_of(100) {
                debug!(received = stats.received, "Bridge progress");
            }
        }

        info!(
            received = stats.received,
            dispatched = stats.dispatched,
            rejected = stats.rejected,
            "Event bridge stream ended"
        );
        stats
    }

    async fn process(&self, delivery: Delivery, stats: &mut BridgeStats) {
        let event = match Self::decode(&delivery) {
            Ok(event) => event,
            Err(e) => {
                warn!(
                    queue = %delivery.destination(),
                    delivery_tag = delivery.delivery_tag(),
                    error = %e,
                    "Rejecting undecodable delivery"
                );
                delivery.reject();
                stats.rejected += 1;
                return;
            }
        };

        let name = event.name().to_string();
        let started = Instant::now();
        let outcome = self.manager.dispatch(event).await;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        stats
            .dispatch
            .update(&name, outcome.handlers, outcome.panicked, latency_ms);
        delivery.ack();
        stats.dispatched += 1;
    }
}

/// Encode and publish an event on a broker channel
pub async fn publish_event<C: BrokerChannel + Sync>(
    channel: &C,
    destination: &str,
    event: &Event,
) -> Result<(), ContractError> {
    let body = EventBridge::encode(event)?;
    channel.publish(destination, body).await
}
