//! # RPC Client - Request/Reply Coordination over a Message Bus
//!
//! Turns a fire-and-forget, at-least-once publish/subscribe transport into
//! an awaitable call/response primitive.
//!
//! ## Flow
//!
//! ```text
//! caller ──► RpcClient::send_request
//!               │  register pending call, publish envelope
//!               ▼
//!          PendingCallStore ◄────── ReplyListener (single consumer loop
//!               │                    on the dedicated reply queue)
//!               ▼
//!          caller's await resolves, times out, or is cancelled
//! ```
//!
//! A pending call terminates in exactly one of four ways: resolved with a
//! success payload, resolved with the remote's reported error, expired by
//! its deadline, or cancelled by shutdown. Whichever happens first removes
//! the registry entry; everything later is a harmless no-op.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod client;
pub mod config;
pub mod listener;
pub mod pending;

// Re-export main types
pub use client::{ClientStats, RpcClient};
pub use config::RpcConfig;
pub use listener::ReplyListener;
pub use pending::{CallReply, PendingCall, PendingCallStore, PendingStats};

// Re-export the wire contract so callers need only this crate
pub use rpc_types::{CallError, CorrelationId, Transport, TransportError};
