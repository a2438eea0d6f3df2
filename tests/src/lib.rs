//! # Queue-RPC Test Suite
//!
//! Unified test crate exercising the request/reply layer end to end over
//! the in-memory bus.
//!
//! ```bash
//! # All tests
//! cargo test -p queue-rpc-tests
//!
//! # By category
//! cargo test -p queue-rpc-tests integration::round_trip::
//! cargo test -p queue-rpc-tests integration::cancellation::
//! ```

#![allow(dead_code)]

pub mod integration;
