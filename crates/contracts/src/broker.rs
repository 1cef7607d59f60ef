//! Broker transport contract
//!
//! The transport moves opaque byte payloads between producers and consumers.
//! Consumers drain deliveries one at a time and settle each one individually.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::ContractError;

/// Final state of a delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Processed; remove from the queue
    Ack,
    /// Not processable; discard without requeue
    Reject,
}

/// Settlement callback type
///
/// Invoked exactly once per delivery with its tag and final state.
pub type SettleCallback = Arc<dyn Fn(u64, Settlement) + Send + Sync>;

/// One consumed message
///
/// Dropping an unsettled delivery settles it as `Reject`.
pub struct Delivery {
    delivery_tag: u64,
    destination: String,
    body: Bytes,
    settle: Option<SettleCallback>,
}

impl Delivery {
    pub fn new(
        delivery_tag: u64,
        destination: impl Into<String>,
        body: Bytes,
        settle: SettleCallback,
    ) -> Self {
        Self {
            delivery_tag,
            destination: destination.into(),
            body,
            settle: Some(settle),
        }
    }

    /// Broker-assigned tag (monotonic per broker)
    pub fn delivery_tag(&self) -> u64 {
        self.delivery_tag
    }

    /// Queue the message was consumed from
    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Acknowledge successful processing
    pub fn ack(mut self) {
        self.settle_with(Settlement::Ack);
    }

    /// Reject without requeue
    pub fn reject(mut self) {
        self.settle_with(Settlement::Reject);
    }

    fn settle_with(&mut self, settlement: Settlement) {
        if let Some(settle) = self.settle.take() {
            settle(self.delivery_tag, settlement);
        }
    }
}

impl Drop for Delivery {
    fn drop(&mut self) {
        self.settle_with(Settlement::Reject);
    }
}

impl fmt::Debug for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delivery")
            .field("delivery_tag", &self.delivery_tag)
            .field("destination", &self.destination)
            .field("body_len", &self.body.len())
            .field("settled", &self.settle.is_none())
            .finish()
    }
}

/// Publishing side of a broker channel
#[trait_variant::make(BrokerChannel: Send)]
pub trait LocalBrokerChannel {
    /// Publish an opaque payload to a named destination
    ///
    /// # Errors
    /// Returns `BrokerClosed` once the owning connection is closed
    async fn publish(&self, destination: &str, payload: Bytes) -> Result<(), ContractError>;
}

/// Consuming side of a broker channel
#[trait_variant::make(DeliveryStream: Send)]
pub trait LocalDeliveryStream {
    /// Next delivery, or `None` once the source is closed and drained
    async fn next_delivery(&mut self) -> Option<Delivery>;
}
