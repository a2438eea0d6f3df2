//! Pending Call Store - the correlation registry.
//!
//! Maps correlation IDs to the completion handles of outstanding calls.
//! Many callers register concurrently while the single reply listener
//! resolves; a single mutex guards the map and is held only for the map
//! mutation, never while a completion handle is signalled.

use parking_lot::Mutex;
use rpc_types::{CallError, CorrelationId};
use std::collections::HashMap;
use std::mem;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Outcome delivered to a waiting caller. The payload stays untyped until
/// the caller deserializes it into its expected response type.
pub type CallReply = Result<serde_json::Value, CallError>;

/// One outstanding request awaiting a response or a deadline.
///
/// Owned exclusively by the store from registration until it terminates;
/// the coordinator holds only the receiving half of the completion handle.
pub struct PendingCall {
    id: CorrelationId,
    sender: oneshot::Sender<CallReply>,
    registered_at: Instant,
    target: String,
}

impl PendingCall {
    /// Correlation ID of this call.
    pub fn id(&self) -> CorrelationId {
        self.id
    }

    /// Queue the request was addressed to (for logging).
    pub fn target(&self) -> &str {
        &self.target
    }

    /// How long the call has been outstanding.
    pub fn elapsed(&self) -> std::time::Duration {
        self.registered_at.elapsed()
    }

    /// Complete the call. Returns false if the waiting side already gave up.
    pub fn complete(self, reply: CallReply) -> bool {
        self.sender.send(reply).is_ok()
    }
}

/// Counters for the lifetime of the store.
#[derive(Debug, Default)]
pub struct PendingStats {
    /// Total calls registered
    pub total_registered: AtomicU64,
    /// Total calls completed by a reply
    pub total_completed: AtomicU64,
    /// Total calls expired by their deadline
    pub total_timeouts: AtomicU64,
    /// Total calls cancelled (shutdown, publish failure, caller gone)
    pub total_cancelled: AtomicU64,
}

/// Concurrency-safe registry of pending calls.
///
/// All four terminal paths (resolve, expire, cancel, drain) remove the
/// entry under the lock and complete the handle after releasing it, so a
/// slow caller can never stall the reply listener. A second attempt to
/// terminate the same ID finds no entry and is a no-op.
pub struct PendingCallStore {
    pending: Mutex<HashMap<CorrelationId, PendingCall>>,
    stats: PendingStats,
}

impl PendingCallStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            stats: PendingStats::default(),
        }
    }

    /// Register a pending call under `id` and hand back the receiver the
    /// coordinator awaits.
    ///
    /// `id` already present means two live calls share a correlation ID.
    /// That is a fatal caller bug, surfaced as an error rather than a
    /// silent overwrite that would orphan the first caller.
    pub fn register(
        &self,
        id: CorrelationId,
        target: &str,
    ) -> Result<oneshot::Receiver<CallReply>, CallError> {
        let (tx, rx) = oneshot::channel();
        let call = PendingCall {
            id,
            sender: tx,
            registered_at: Instant::now(),
            target: target.to_string(),
        };

        {
            let mut pending = self.pending.lock();
            if pending.contains_key(&id) {
                return Err(CallError::CorrelationCollision(id));
            }
            pending.insert(id, call);
        }
        self.stats.total_registered.fetch_add(1, Ordering::Relaxed);

        debug!(correlation_id = %id, target = target, "Registered pending call");
        Ok(rx)
    }

    /// Resolve the call registered under `id` with a reply.
    ///
    /// Returns true if an entry was present and removed; false for unknown
    /// IDs (already timed out, already resolved, or genuinely foreign),
    /// which callers treat as a harmless duplicate.
    pub fn resolve(&self, id: CorrelationId, reply: CallReply) -> bool {
        let Some(call) = self.pending.lock().remove(&id) else {
            return false;
        };

        let elapsed = call.elapsed();
        let target = call.target.clone();
        if call.complete(reply) {
            self.stats.total_completed.fetch_add(1, Ordering::Relaxed);
            debug!(
                correlation_id = %id,
                target = target,
                elapsed_ms = elapsed.as_millis() as u64,
                "Resolved pending call"
            );
        } else {
            // The awaiting side is gone; the entry is still consumed.
            self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
            debug!(correlation_id = %id, "Pending call receiver dropped");
        }
        true
    }

    /// Expire the call registered under `id` with a timeout failure.
    ///
    /// Returns false if the entry is already gone - the resolution won the
    /// race against the deadline.
    pub fn expire(&self, id: CorrelationId, timeout_ms: u64) -> bool {
        let Some(call) = self.pending.lock().remove(&id) else {
            return false;
        };

        warn!(
            correlation_id = %id,
            target = call.target(),
            timeout_ms = timeout_ms,
            "Pending call expired without a reply"
        );
        self.stats.total_timeouts.fetch_add(1, Ordering::Relaxed);
        call.complete(Err(CallError::Timeout { timeout_ms }));
        true
    }

    /// Remove the call registered under `id` without completing it.
    ///
    /// Used when the publish that follows registration fails synchronously
    /// and the caller reports its own error.
    pub fn remove(&self, id: CorrelationId) -> bool {
        if self.pending.lock().remove(&id).is_some() {
            self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// Atomically empty the store, returning every outstanding call so the
    /// caller can complete each one (used by shutdown).
    pub fn drain(&self) -> Vec<PendingCall> {
        let drained: HashMap<_, _> = {
            let mut pending = self.pending.lock();
            mem::take(&mut *pending)
        };
        self.stats
            .total_cancelled
            .fetch_add(drained.len() as u64, Ordering::Relaxed);
        drained.into_values().collect()
    }

    /// Number of currently outstanding calls.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Whether `id` is still outstanding.
    #[must_use]
    pub fn is_pending(&self, id: &CorrelationId) -> bool {
        self.pending.lock().contains_key(id)
    }

    /// Lifetime counters.
    pub fn stats(&self) -> &PendingStats {
        &self.stats
    }
}

impl Default for PendingCallStore {
    fn default() -> Self {
        Self::new()
    }
}
