//! In-memory broker implementing the [`Transport`] capability.

use crate::DEFAULT_QUEUE_CAPACITY;
use async_trait::async_trait;
use rpc_types::{ConsumeOptions, Delivery, QueueOptions, Transport, TransportError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// One declared queue: the send side plus the not-yet-claimed receive side.
struct QueueSlot {
    sender: mpsc::Sender<Delivery>,
    /// Taken by the first `consume` call; a queue has at most one consumer.
    receiver: Option<mpsc::Receiver<Delivery>>,
}

/// In-process broker with named, bounded queues.
///
/// `assert_queue` is idempotent; publishing to a queue nobody declared is
/// dropped with a warning (default-exchange drop semantics). A
/// `fail_publishes` toggle lets tests exercise publish-failure paths.
pub struct InMemoryBroker {
    queues: Mutex<HashMap<String, QueueSlot>>,
    capacity: usize,
    published: AtomicU64,
    dropped: AtomicU64,
    fail_publishes: AtomicBool,
}

impl InMemoryBroker {
    /// Create a broker with default per-queue capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// Create a broker with a specific per-queue capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queues: Mutex::new(HashMap::new()),
            capacity,
            published: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            fail_publishes: AtomicBool::new(false),
        }
    }

    /// Total messages accepted by the broker.
    #[must_use]
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Messages dropped for lack of a matching queue or consumer.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Make every subsequent publish fail with a transport error.
    pub fn fail_publishes(&self, fail: bool) {
        self.fail_publishes.store(fail, Ordering::SeqCst);
    }

    /// Number of declared queues.
    #[must_use]
    pub fn queue_count(&self) -> usize {
        self.queues.lock().map(|q| q.len()).unwrap_or(0)
    }

    fn sender_for(&self, queue: &str) -> Option<mpsc::Sender<Delivery>> {
        let queues = self.queues.lock().ok()?;
        queues.get(queue).map(|slot| slot.sender.clone())
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for InMemoryBroker {
    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        body: Vec<u8>,
    ) -> Result<(), TransportError> {
        if self.fail_publishes.load(Ordering::SeqCst) {
            return Err(TransportError::PublishFailed(
                "broker rejected publish".into(),
            ));
        }

        // Only default-exchange routing exists in-process: the routing key
        // names the queue directly.
        let Some(sender) = self.sender_for(routing_key) else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            warn!(
                exchange = exchange,
                routing_key = routing_key,
                "Message dropped (no such queue)"
            );
            return Ok(());
        };

        match sender.try_send(Delivery::new(body)) {
            Ok(()) => {
                self.published.fetch_add(1, Ordering::Relaxed);
                debug!(routing_key = routing_key, "Message enqueued");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(_)) => Err(TransportError::PublishFailed(
                format!("queue '{routing_key}' is full"),
            )),
            Err(mpsc::error::TrySendError::Closed(_)) => {
                // Consumer went away; the queue still exists, the message
                // is simply lost.
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(
                    routing_key = routing_key,
                    "Message dropped (consumer gone)"
                );
                Ok(())
            }
        }
    }

    async fn assert_queue(&self, name: &str, _opts: QueueOptions) -> Result<(), TransportError> {
        let mut queues = self
            .queues
            .lock()
            .map_err(|_| TransportError::Disconnected)?;

        if queues.contains_key(name) {
            return Ok(());
        }

        let (sender, receiver) = mpsc::channel(self.capacity);
        queues.insert(
            name.to_string(),
            QueueSlot {
                sender,
                receiver: Some(receiver),
            },
        );
        debug!(queue = name, "Queue declared");
        Ok(())
    }

    async fn consume(
        &self,
        queue: &str,
        _opts: ConsumeOptions,
    ) -> Result<mpsc::Receiver<Delivery>, TransportError> {
        let mut queues = self
            .queues
            .lock()
            .map_err(|_| TransportError::Disconnected)?;

        let slot = queues
            .get_mut(queue)
            .ok_or_else(|| TransportError::ConsumeFailed {
                queue: queue.to_string(),
                reason: "no such queue".into(),
            })?;

        if let Some(receiver) = slot.receiver.take() {
            return Ok(receiver);
        }

        // The previous consumer is gone once every receiver is dropped; a
        // reconnect may then attach to the same queue name. Buffered
        // messages from the dead channel are lost.
        if slot.sender.is_closed() {
            let (sender, receiver) = mpsc::channel(self.capacity);
            slot.sender = sender;
            debug!(queue = queue, "Queue consumer replaced");
            return Ok(receiver);
        }

        Err(TransportError::ConsumeFailed {
            queue: queue.to_string(),
            reason: "queue already has a consumer".into(),
        })
    }
}
