//! Request Coordinator and lifecycle management.
//!
//! `RpcClient` owns the pending-call registry, the reply queue, and the
//! listener task. It is an explicit instance: callers receive it by
//! injection, there is no process-wide singleton.

use crate::config::RpcConfig;
use crate::listener::ReplyListener;
use crate::pending::{PendingCallStore, PendingStats};
use rpc_types::{
    CallError, ConsumeOptions, CorrelationId, QueueOptions, RequestEnvelope, Transport,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Snapshot of coordinator state.
#[derive(Debug, Clone)]
pub struct ClientStats {
    /// Calls currently awaiting a reply.
    pub pending_count: usize,
    /// Whether `initialize` has succeeded and `shutdown` has not run since.
    pub initialized: bool,
    /// Name of the dedicated reply queue.
    pub reply_queue: String,
}

/// Request/reply coordinator over a publish/subscribe transport.
///
/// Per-call state machine: `CREATED → PENDING → {RESOLVED, TIMED_OUT,
/// CANCELLED}`. `PENDING` is entered by registering before the publish;
/// the three terminal states are mutually exclusive and final.
pub struct RpcClient {
    transport: Arc<dyn Transport>,
    pending: Arc<PendingCallStore>,
    config: RpcConfig,
    /// Cheap gate checked by every `send_request`.
    initialized: AtomicBool,
    /// Listener task handle; the lock also serializes lifecycle
    /// transitions so concurrent initialize/shutdown cannot interleave.
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl RpcClient {
    /// Create a client. No broker work happens until [`initialize`].
    ///
    /// [`initialize`]: RpcClient::initialize
    pub fn new(transport: Arc<dyn Transport>, config: RpcConfig) -> Self {
        Self {
            transport,
            pending: Arc::new(PendingCallStore::new()),
            config,
            initialized: AtomicBool::new(false),
            listener: Mutex::new(None),
        }
    }

    /// Provision the reply queue and start the reply listener.
    ///
    /// Idempotent: a second call warns and returns `Ok`. Must succeed
    /// before any [`send_request`](RpcClient::send_request).
    pub async fn initialize(&self) -> Result<(), CallError> {
        let mut listener = self.listener.lock().await;
        if listener.is_some() {
            warn!("initialize called on a running client; ignoring");
            return Ok(());
        }

        self.transport
            .assert_queue(
                &self.config.reply_queue,
                QueueOptions {
                    durable: false,
                    // Non-exclusive: a reconnect keeps consuming the same
                    // queue name.
                    exclusive: false,
                    auto_delete: false,
                },
            )
            .await?;

        let deliveries = self
            .transport
            .consume(&self.config.reply_queue, ConsumeOptions { auto_ack: true })
            .await?;

        let handle = tokio::spawn(ReplyListener::new(self.pending.clone(), deliveries).run());
        *listener = Some(handle);
        self.initialized.store(true, Ordering::SeqCst);

        info!(reply_queue = %self.config.reply_queue, "RPC client initialized");
        Ok(())
    }

    /// Send `payload` to `queue` and await the correlated response.
    ///
    /// `timeout` defaults to the configured deadline; a zero duration is
    /// treated as unset. Exactly one outcome is returned within the
    /// deadline: the decoded response, the remote's reported error, or one
    /// of `Timeout`, `Transport`, `Shutdown`, `NotInitialized`.
    pub async fn send_request<TReq, TResp>(
        &self,
        queue: &str,
        payload: &TReq,
        timeout: Option<Duration>,
    ) -> Result<TResp, CallError>
    where
        TReq: Serialize + Sync,
        TResp: DeserializeOwned,
    {
        if !self.initialized.load(Ordering::SeqCst) {
            return Err(CallError::NotInitialized);
        }

        let timeout = match timeout {
            Some(t) if t > Duration::ZERO => t,
            _ => self.config.default_timeout,
        };
        let timeout_ms = timeout.as_millis() as u64;

        let id = CorrelationId::new();
        let envelope = RequestEnvelope::with_correlation_id(
            id,
            self.config.reply_queue.clone(),
            timeout_ms,
            payload,
        );
        let body = serde_json::to_vec(&envelope)
            .map_err(|e| CallError::Protocol(format!("request encoding failed: {e}")))?;

        // Register before publishing so a reply that beats the await below
        // still finds its entry.
        let mut rx = self.pending.register(id, queue)?;

        if let Err(e) = self.transport.publish("", queue, body).await {
            // The call never reached the wire; unregister and surface the
            // failure without retry.
            self.pending.remove(id);
            return Err(CallError::Transport(e));
        }
        debug!(correlation_id = %id, queue = queue, timeout_ms, "Published request");

        let reply = match tokio::time::timeout(timeout, &mut rx).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(_)) => {
                // Completion handle dropped without a value: the store was
                // torn down under us.
                return Err(CallError::Shutdown);
            }
            Err(_elapsed) => {
                if self.pending.expire(id, timeout_ms) {
                    return Err(CallError::Timeout { timeout_ms });
                }
                // A resolution removed the entry just as the deadline
                // fired; it won the race, take its value.
                match rx.try_recv() {
                    Ok(reply) => reply,
                    Err(_) => return Err(CallError::Timeout { timeout_ms }),
                }
            }
        };

        let value = reply?;
        serde_json::from_value(value)
            .map_err(|e| CallError::Protocol(format!("response decoding failed: {e}")))
    }

    /// Cancel every outstanding call and stop the reply listener.
    ///
    /// Safe with no calls pending and safe to call twice. Afterwards the
    /// client rejects `send_request` until initialized again.
    pub async fn shutdown(&self) -> Result<(), CallError> {
        let mut listener = self.listener.lock().await;

        // Reject new sends before cancelling the outstanding ones.
        self.initialized.store(false, Ordering::SeqCst);

        let drained = self.pending.drain();
        if !drained.is_empty() {
            warn!(
                cancelled = drained.len(),
                "Cancelling outstanding calls on shutdown"
            );
        }
        for call in drained {
            call.complete(Err(CallError::Shutdown));
        }

        if let Some(handle) = listener.take() {
            handle.abort();
            // Wait for the task to actually finish so its consumer is
            // released before a reinitialize reuses the queue.
            let _ = handle.await;
            info!(reply_queue = %self.config.reply_queue, "RPC client shut down");
        }
        Ok(())
    }

    /// Snapshot of coordinator state.
    pub fn stats(&self) -> ClientStats {
        ClientStats {
            pending_count: self.pending.pending_count(),
            initialized: self.initialized.load(Ordering::SeqCst),
            reply_queue: self.config.reply_queue.clone(),
        }
    }

    /// Lifetime call counters.
    pub fn pending_stats(&self) -> &PendingStats {
        self.pending.stats()
    }
}
