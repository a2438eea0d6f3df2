//! # RPC Types - Wire Contract for Request/Reply over a Message Bus
//!
//! Shared types for the queue-rpc coordination layer:
//!
//! - [`CorrelationId`] - unique identifier matching a reply to its request
//! - [`RequestEnvelope`] / [`ResponseEnvelope`] - JSON wire envelopes
//! - [`CallError`] / [`TransportError`] - error taxonomy
//! - [`Transport`] - capability trait over the underlying broker
//!
//! The envelopes are serialized as camelCase JSON so they interoperate with
//! responders written in other languages.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod correlation;
pub mod envelope;
pub mod error;
pub mod transport;

// Re-export main types
pub use correlation::CorrelationId;
pub use envelope::{RemoteFault, RequestEnvelope, ResponseEnvelope};
pub use error::{CallError, TransportError};
pub use transport::{ConsumeOptions, Delivery, QueueOptions, Transport};

/// Default deadline for a call when the caller does not specify one.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
