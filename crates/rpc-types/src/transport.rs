//! Transport capability trait over the underlying broker.
//!
//! The coordination layer consumes this interface; it never implements broker
//! topology, durability, or retry policy itself. An adapter over a real
//! broker (or the in-memory bus used in tests) provides it.

use crate::error::TransportError;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Queue declaration options.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueueOptions {
    /// Survive a broker restart.
    pub durable: bool,
    /// Restrict the queue to the declaring connection. Reply queues are
    /// declared non-exclusive so a reconnect can keep consuming the same
    /// queue name.
    pub exclusive: bool,
    /// Delete the queue once the last consumer disconnects.
    pub auto_delete: bool,
}

/// Consumer options.
#[derive(Debug, Clone, Copy)]
pub struct ConsumeOptions {
    /// Acknowledge deliveries automatically. Safe for reply queues because
    /// resolution is idempotent and redelivered replies are discarded on
    /// the unknown-ID path.
    pub auto_ack: bool,
}

impl Default for ConsumeOptions {
    fn default() -> Self {
        Self { auto_ack: true }
    }
}

/// A single message delivered to a consumer.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Raw message body.
    pub body: Vec<u8>,
    /// Whether the broker flagged this delivery as a redelivery.
    pub redelivered: bool,
}

impl Delivery {
    pub fn new(body: Vec<u8>) -> Self {
        Self {
            body,
            redelivered: false,
        }
    }
}

/// Capability interface over a publish/subscribe broker with at-least-once
/// delivery.
///
/// `consume` hands back a bounded delivery stream rather than taking a
/// callback; the caller drives its own consumer loop on the receiver. The
/// stream closes when the transport is dropped or disconnects.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Publish a message body to `routing_key` on `exchange` (empty string
    /// for direct-to-queue routing).
    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        body: Vec<u8>,
    ) -> Result<(), TransportError>;

    /// Declare a queue, idempotently.
    async fn assert_queue(&self, name: &str, opts: QueueOptions) -> Result<(), TransportError>;

    /// Begin consuming from `queue`, returning the delivery stream.
    async fn consume(
        &self,
        queue: &str,
        opts: ConsumeOptions,
    ) -> Result<mpsc::Receiver<Delivery>, TransportError>;
}
