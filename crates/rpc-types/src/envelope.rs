//! Wire envelopes for requests and responses.
//!
//! Serialized as camelCase JSON. Request payload fields are flattened into
//! the envelope; response payloads ride under the `data` member.

use crate::correlation::CorrelationId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request envelope published to a target queue.
///
/// `reply_to` names the queue the responder must publish its response to;
/// `timeout_ms` is advisory for the responder (the caller enforces its own
/// deadline locally).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope<T> {
    /// Correlation ID echoed back in the response
    pub correlation_id: CorrelationId,
    /// When the request was created
    pub timestamp: DateTime<Utc>,
    /// Queue the response must be published to
    pub reply_to: String,
    /// Deadline the caller will enforce, in milliseconds
    pub timeout_ms: u64,
    /// Domain payload, flattened into the envelope
    #[serde(flatten)]
    pub payload: T,
}

impl<T> RequestEnvelope<T> {
    /// Build an envelope for a fresh call.
    pub fn new(reply_to: impl Into<String>, timeout_ms: u64, payload: T) -> Self {
        Self {
            correlation_id: CorrelationId::new(),
            timestamp: Utc::now(),
            reply_to: reply_to.into(),
            timeout_ms,
            payload,
        }
    }

    /// Build an envelope with a specific correlation ID.
    pub fn with_correlation_id(
        correlation_id: CorrelationId,
        reply_to: impl Into<String>,
        timeout_ms: u64,
        payload: T,
    ) -> Self {
        Self {
            correlation_id,
            timestamp: Utc::now(),
            reply_to: reply_to.into(),
            timeout_ms,
            payload,
        }
    }
}

/// Error reported by the remote responder, carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFault {
    pub code: String,
    pub message: String,
}

/// Response envelope consumed from the reply queue.
///
/// `correlation_id` must echo the originating request's. The payload stays
/// untyped (`serde_json::Value`) until the caller that owns the correlation
/// ID deserializes it into its expected type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    /// Correlation ID of the request this answers
    pub correlation_id: CorrelationId,
    /// When the responder produced the response
    pub timestamp: DateTime<Utc>,
    /// Whether the responder succeeded
    pub success: bool,
    /// Remote fault, present when `success` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RemoteFault>,
    /// Domain payload, present when `success` is true
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ResponseEnvelope {
    /// Build a success response echoing `correlation_id`.
    pub fn success(correlation_id: CorrelationId, data: serde_json::Value) -> Self {
        Self {
            correlation_id,
            timestamp: Utc::now(),
            success: true,
            error: None,
            data: Some(data),
        }
    }

    /// Build a failure response echoing `correlation_id`.
    pub fn failure(
        correlation_id: CorrelationId,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            correlation_id,
            timestamp: Utc::now(),
            success: false,
            error: Some(RemoteFault {
                code: code.into(),
                message: message.into(),
            }),
            data: None,
        }
    }
}
