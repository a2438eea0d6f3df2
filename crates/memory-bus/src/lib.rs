//! # Memory Bus - In-Process Transport
//!
//! A [`Transport`](rpc_types::Transport) implementation backed by
//! `tokio::sync::mpsc` channels. One bounded channel per declared queue;
//! publishing routes by routing key the way a default exchange routes
//! direct-to-queue.
//!
//! Suitable for tests and single-process wiring; distributed deployments
//! use a real broker adapter instead.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod broker;

pub use broker::InMemoryBroker;

/// Maximum messages buffered per queue before publishes fail.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;
