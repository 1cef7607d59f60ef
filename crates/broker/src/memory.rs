//! In-process broker backed by bounded channels
//!
//! One bounded queue per destination, declared on first use. Messages never
//! leave the process.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_channel::{bounded, Receiver, Sender};
use bytes::Bytes;
use contracts::{
    BrokerChannel, BrokerConfig, ContractError, Delivery, DeliveryStream, SettleCallback,
    Settlement,
};
use tokio::sync::Notify;
use tracing::{debug, info, instrument, trace};

struct Message {
    tag: u64,
    body: Bytes,
}

#[derive(Clone)]
struct Queue {
    tx: Sender<Message>,
    rx: Receiver<Message>,
}

/// Broker-wide delivery counters
#[derive(Debug, Default)]
pub struct BrokerStats {
    published: AtomicU64,
    acked: AtomicU64,
    rejected: AtomicU64,
}

impl BrokerStats {
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    pub fn acked(&self) -> u64 {
        self.acked.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    /// Deliveries published but not settled yet
    pub fn in_flight(&self) -> u64 {
        self.published().saturating_sub(self.acked() + self.rejected())
    }
}

struct BrokerInner {
    capacity: usize,
    queues: Mutex<HashMap<String, Queue>>,
    next_tag: AtomicU64,
    stats: BrokerStats,
}

impl BrokerInner {
    /// Get or declare a queue
    fn queue(&self, name: &str) -> Queue {
        let mut queues = self.queues.lock().unwrap_or_else(PoisonError::into_inner);
        queues
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(queue = %name, capacity = self.capacity, "Queue declared");
                let (tx, rx) = bounded(self.capacity);
                Queue { tx, rx }
            })
            .clone()
    }

    /// Close a declared queue; it stays declared so later publishes fail
    fn close_queue(&self, name: &str) -> bool {
        let queues = self.queues.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(queue) = queues.get(name) else {
            return false;
        };
        let closed = queue.tx.close();
        if closed {
            debug!(queue = %name, pending = queue.rx.len(), "Queue closed");
        }
        closed
    }

    fn settle(&self, queue: &str, tag: u64, settlement: Settlement) {
        let acked = settlement == Settlement::Ack;
        if acked {
            self.stats.acked.fetch_add(1, Ordering::Relaxed);
        } else {
            self.stats.rejected.fetch_add(1, Ordering::Relaxed);
        }
        observability::record_delivery_settled(queue, acked);
        trace!(queue = %queue, delivery_tag = tag, ?settlement, "Delivery settled");
    }
}

/// Close flag shared by a connection and everything opened from it
#[derive(Default)]
struct CloseSignal {
    closed: AtomicBool,
    notify: Notify,
}

impl CloseSignal {
    fn close(&self) -> bool {
        let was_open = !self.closed.swap(true, Ordering::SeqCst);
        self.notify.notify_waiters();
        was_open
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_closed() {
                return;
            }
            notified.await;
        }
    }
}

/// In-process broker
///
/// Cloning shares the same queues.
#[derive(Clone)]
pub struct InMemoryBroker {
    inner: Arc<BrokerInner>,
}

impl InMemoryBroker {
    /// Create a broker whose queues hold up to `capacity` messages
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(BrokerInner {
                capacity: capacity.max(1),
                queues: Mutex::new(HashMap::new()),
                next_tag: AtomicU64::new(0),
                stats: BrokerStats::default(),
            }),
        }
    }

    pub fn from_config(config: &BrokerConfig) -> Self {
        Self::new(config.capacity)
    }

    /// Open a connection; it is closed on `close()` or drop
    pub fn connect(&self) -> InMemoryConnection {
        debug!("Broker connection opened");
        InMemoryConnection {
            inner: Arc::clone(&self.inner),
            signal: Arc::new(CloseSignal::default()),
        }
    }

    pub fn stats(&self) -> &BrokerStats {
        &self.inner.stats
    }

    /// Messages waiting in `queue` (0 for an undeclared queue)
    pub fn queue_len(&self, queue: &str) -> usize {
        self.inner
            .queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(queue)
            .map_or(0, |q| q.rx.len())
    }
}

/// Scoped broker connection
pub struct InMemoryConnection {
    inner: Arc<BrokerInner>,
    signal: Arc<CloseSignal>,
}

impl InMemoryConnection {
    /// Open a channel on this connection
    ///
    /// # Errors
    /// `BrokerClosed` after the connection is closed
    pub fn open_channel(&self) -> Result<InMemoryChannel, ContractError> {
        if self.signal.is_closed() {
            return Err(ContractError::BrokerClosed);
        }
        Ok(InMemoryChannel {
            inner: Arc::clone(&self.inner),
            signal: Arc::clone(&self.signal),
        })
    }

    pub fn is_closed(&self) -> bool {
        self.signal.is_closed()
    }

    /// Close the connection
    ///
    /// Channels stop publishing and consumers end. Queued messages stay in
    /// the broker.
    pub fn close(&self) {
        if self.signal.close() {
            info!("Broker connection closed");
        }
    }
}

impl Drop for InMemoryConnection {
    fn drop(&mut self) {
        self.close();
    }
}

/// Channel for publishing and consuming
pub struct InMemoryChannel {
    inner: Arc<BrokerInner>,
    signal: Arc<CloseSignal>,
}

impl InMemoryChannel {
    /// Start consuming `queue` (declared if needed)
    ///
    /// # Errors
    /// `BrokerClosed` after the connection is closed
    #[instrument(name = "broker_consume", skip(self))]
    pub fn consume(&self, queue: &str) -> Result<InMemoryConsumer, ContractError> {
        if self.signal.is_closed() {
            return Err(ContractError::BrokerClosed);
        }

        let rx = self.inner.queue(queue).rx;
        let inner = Arc::clone(&self.inner);
        let queue_name = queue.to_string();
        let settle: SettleCallback = Arc::new(move |tag: u64, settlement: Settlement| {
            inner.settle(&queue_name, tag, settlement);
        });

        Ok(InMemoryConsumer {
            queue: queue.to_string(),
            rx,
            signal: Arc::clone(&self.signal),
            settle,
        })
    }

    /// Stop accepting messages on `queue`
    ///
    /// Consumers drain what is already queued, then end. Later publishes to
    /// `queue` fail with `QueueClosed`. Returns false if the queue was never
    /// declared or is already closed.
    pub fn close_queue(&self, queue: &str) -> bool {
        self.inner.close_queue(queue)
    }
}

impl BrokerChannel for InMemoryChannel {
    async fn publish(&self, destination: &str, payload: Bytes) -> Result<(), ContractError> {
        if self.signal.is_closed() {
            return Err(ContractError::BrokerClosed);
        }

        let queue = self.inner.queue(destination);
        if queue.tx.is_closed() {
            return Err(ContractError::queue_closed(destination));
        }
        let tag = self.inner.next_tag.fetch_add(1, Ordering::Relaxed) + 1;
        let len = payload.len();

        // A consumer may settle this message before send() returns.
        let stats = &self.inner.stats;
        stats.published.fetch_add(1, Ordering::Relaxed);

        let sent = tokio::select! {
            sent = queue.tx.send(Message { tag, body: payload }) => {
                sent.map_err(|_| ContractError::queue_closed(destination))
            }
            _ = self.signal.wait() => Err(ContractError::BrokerClosed),
        };
        if let Err(e) = sent {
            stats.published.fetch_sub(1, Ordering::Relaxed);
            return Err(e);
        }

        trace!(queue = %destination, delivery_tag = tag, bytes = len, "Message published");
        Ok(())
    }
}

/// Delivery stream over one queue
pub struct InMemoryConsumer {
    queue: String,
    rx: Receiver<Message>,
    signal: Arc<CloseSignal>,
    settle: SettleCallback,
}

impl InMemoryConsumer {
    pub fn queue(&self) -> &str {
        &self.queue
    }
}

impl DeliveryStream for InMemoryConsumer {
    async fn next_delivery(&mut self) -> Option<Delivery> {
        if self.signal.is_closed() {
            return None;
        }

        let message = tokio::select! {
            received = self.rx.recv() => received.ok()?,
            _ = self.signal.wait() => return None,
        };

        Some(Delivery::new(
            message.tag,
            self.queue.clone(),
            message.body,
            Arc::clone(&self.settle),
        ))
    }
}
