//! Reply Listener - single consumer loop on the dedicated reply queue.
//!
//! Demultiplexes inbound responses to registry entries. Nothing a peer puts
//! on the wire may kill this loop: malformed bodies and unknown correlation
//! IDs are logged and discarded.

use crate::pending::{CallReply, PendingCallStore};
use rpc_types::{CallError, Delivery, ResponseEnvelope};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Consumer loop over the reply queue's delivery stream.
pub struct ReplyListener {
    store: Arc<PendingCallStore>,
    deliveries: mpsc::Receiver<Delivery>,
}

impl ReplyListener {
    pub fn new(store: Arc<PendingCallStore>, deliveries: mpsc::Receiver<Delivery>) -> Self {
        Self { store, deliveries }
    }

    /// Run until the delivery stream closes (transport dropped or
    /// disconnected).
    pub async fn run(mut self) {
        while let Some(delivery) = self.deliveries.recv().await {
            self.handle_delivery(&delivery);
        }
        debug!("Reply stream closed, listener stopping");
    }

    fn handle_delivery(&self, delivery: &Delivery) {
        let envelope: ResponseEnvelope = match serde_json::from_slice(&delivery.body) {
            Ok(envelope) => envelope,
            Err(e) => {
                // Cannot be correlated to any caller; recover locally.
                warn!(error = %e, bytes = delivery.body.len(), "Discarding malformed reply");
                return;
            }
        };

        let id = envelope.correlation_id;
        if !self.store.resolve(id, reply_from_envelope(envelope)) {
            // Late after timeout, already resolved, or genuinely foreign -
            // indistinguishable here, and harmless either way.
            warn!(correlation_id = %id, "Reply for unknown correlation ID discarded");
        }
    }
}

/// Map a wire response onto the caller-facing outcome.
fn reply_from_envelope(envelope: ResponseEnvelope) -> CallReply {
    if envelope.success {
        Ok(envelope.data.unwrap_or(serde_json::Value::Null))
    } else {
        let (code, message) = match envelope.error {
            Some(fault) => (fault.code, fault.message),
            None => ("unknown".to_string(), "remote reported failure".to_string()),
        };
        Err(CallError::Remote { code, message })
    }
}
