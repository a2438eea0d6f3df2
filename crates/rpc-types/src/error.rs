//! # Error Types
//!
//! Error taxonomy for the request/reply layer.

use crate::correlation::CorrelationId;
use thiserror::Error;

/// Errors at the broker boundary (publish/declare/consume).
///
/// Surfaced immediately; this layer performs no retry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Publishing a message failed.
    #[error("Publish failed: {0}")]
    PublishFailed(String),

    /// Declaring or asserting a queue failed.
    #[error("Queue declaration failed for '{queue}': {reason}")]
    QueueDeclarationFailed { queue: String, reason: String },

    /// Starting a consumer failed.
    #[error("Consume failed for '{queue}': {reason}")]
    ConsumeFailed { queue: String, reason: String },

    /// The connection to the broker is gone.
    #[error("Transport disconnected")]
    Disconnected,
}

/// Failure outcome of a single `send_request` call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CallError {
    /// The broker rejected the publish or declaration.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// No response arrived within the call's deadline.
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The remote responder explicitly reported failure.
    #[error("Remote error {code}: {message}")]
    Remote { code: String, message: String },

    /// The coordinator was shut down while the call was outstanding.
    #[error("Coordinator shut down while call was pending")]
    Shutdown,

    /// A call was attempted before `initialize()` succeeded.
    #[error("Coordinator not initialized")]
    NotInitialized,

    /// A correlated response payload could not be decoded into the
    /// caller's expected type.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A freshly generated correlation ID collided with a live entry.
    /// Never expected with UUID generation; a fatal caller bug, not
    /// something to silently overwrite.
    #[error("Correlation ID collision: {0}")]
    CorrelationCollision(CorrelationId),
}

impl CallError {
    /// Whether this outcome means the call never reached the wire.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::NotInitialized | Self::CorrelationCollision(_)
        )
    }
}
